//! Folder-to-folder conversion of markdown documents into narrated audio.
//!
//! Documents are processed one at a time in file-name order. Each document
//! gets its own scratch waveform inside the output directory, removed as soon
//! as that document is done, whether it succeeded or not.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::markup::clean_markdown;
use crate::transcode::Transcoder;
use crate::{Error, Result, SynthesisEngine};

/// What to do when a single document fails to convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the batch at the first failure. Outputs already written are kept.
    #[default]
    Abort,
    /// Record the failure and move on to the next document.
    Continue,
}

/// Options for [`convert`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ConvertOptions {
    /// Extension (without the dot) a file name must end with to be converted.
    /// Matched case-sensitively.
    #[builder(setter(into))]
    pub extension: String,
    pub on_error: ErrorPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            on_error: ErrorPolicy::Abort,
        }
    }
}

impl ConvertOptionsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        match &self.extension {
            Some(ext) if ext.is_empty() => Err("extension must not be empty".to_string()),
            Some(ext) if ext.starts_with('.') => {
                Err(format!("extension {ext:?} must not start with a dot"))
            }
            _ => Ok(()),
        }
    }
}

/// A document that was converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub source: PathBuf,
    pub output: PathBuf,
    pub bytes: u64,
}

/// A document that failed under [`ErrorPolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub source: PathBuf,
    pub error: String,
}

/// Summary of one [`convert`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub converted: Vec<ConvertedDocument>,
    pub failed: Vec<FailedDocument>,
    pub elapsed_secs: f64,
}

impl BatchReport {
    fn new(input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            converted: Vec::new(),
            failed: Vec::new(),
            elapsed_secs: 0.0,
        }
    }

    /// True when no document failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Convert every matching document in `input_dir` into an audio file in
/// `output_dir`.
///
/// `output_dir` is created (with parents) if needed. Subdirectories of
/// `input_dir` are not traversed. Under [`ErrorPolicy::Abort`] the first
/// failure is returned as [`Error::Document`].
pub fn convert<E, T>(
    input_dir: &Path,
    output_dir: &Path,
    engine: &mut E,
    transcoder: &mut T,
    options: &ConvertOptions,
) -> Result<BatchReport>
where
    E: SynthesisEngine + ?Sized,
    T: Transcoder + ?Sized,
{
    let start = Instant::now();
    let documents = find_documents(input_dir, &options.extension)?;
    fs::create_dir_all(output_dir)?;

    log::info!(
        "Found {} document(s) in {}",
        documents.len(),
        input_dir.display()
    );

    let mut report = BatchReport::new(input_dir, output_dir);

    for source in documents {
        log::info!("Converting: {}", display_name(&source));
        match convert_document(&source, output_dir, engine, transcoder) {
            Ok(converted) => {
                log::info!("Saved: {}", converted.output.display());
                report.converted.push(converted);
            }
            Err(e) => match options.on_error {
                ErrorPolicy::Abort => return Err(e.in_document(source)),
                ErrorPolicy::Continue => {
                    log::error!("Failed to convert {}: {e}", source.display());
                    report.failed.push(FailedDocument {
                        source,
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    report.elapsed_secs = start.elapsed().as_secs_f64();
    if report.is_success() {
        log::info!(
            "All {} document(s) converted in {:.2}s",
            report.converted.len(),
            report.elapsed_secs
        );
    } else {
        log::warn!(
            "{} document(s) converted, {} failed",
            report.converted.len(),
            report.failed.len()
        );
    }

    Ok(report)
}

/// Regular files directly inside `dir` whose names end with `.{extension}`,
/// sorted by name.
pub fn find_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let input_err = |source| Error::InputDir {
        path: dir.to_path_buf(),
        source,
    };
    let suffix = format!(".{extension}");

    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(input_err)? {
        let entry = entry.map_err(input_err)?;
        // Names need not be UTF-8; compare the raw bytes.
        if !entry
            .file_name()
            .as_encoded_bytes()
            .ends_with(suffix.as_bytes())
        {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            log::debug!("Skipping {}: not a regular file", path.display());
            continue;
        }
        documents.push(path);
    }

    documents.sort();
    Ok(documents)
}

/// Where the audio for `source` is written: its stem plus `extension`.
pub fn output_path(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = source
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(extension);
    output_dir.join(name)
}

fn convert_document<E, T>(
    source: &Path,
    output_dir: &Path,
    engine: &mut E,
    transcoder: &mut T,
) -> Result<ConvertedDocument>
where
    E: SynthesisEngine + ?Sized,
    T: Transcoder + ?Sized,
{
    let raw = fs::read_to_string(source)?;
    let text = clean_markdown(&raw);
    log::debug!("{}: {} characters to speak", source.display(), text.len());

    let scratch = tempfile::Builder::new()
        .prefix(".mdnarrate-")
        .suffix(".wav")
        .tempfile_in(output_dir)?;
    engine.synthesize_to_file(&text, scratch.path())?;

    let output = output_path(source, output_dir, transcoder.extension());
    transcoder.transcode(scratch.path(), &output)?;

    if let Err(e) = scratch.close() {
        log::warn!("Failed to remove scratch waveform: {e}");
    }

    let bytes = fs::metadata(&output)?.len();
    Ok(ConvertedDocument {
        source: source.to_path_buf(),
        output,
        bytes,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynthesisResult;
    use std::collections::BTreeSet;

    /// Speaks every text as a short tone; fails on the `fail_on`-th call.
    #[derive(Default)]
    struct FakeEngine {
        spoken: Vec<String>,
        fail_on: Option<usize>,
    }

    impl SynthesisEngine for FakeEngine {
        fn synthesize(&mut self, text: &str) -> Result<SynthesisResult> {
            let call = self.spoken.len();
            self.spoken.push(text.to_string());
            if self.fail_on == Some(call) {
                return Err(Error::SynthesisFailed("engine exploded".into()));
            }
            Ok(SynthesisResult {
                samples: vec![0.25; 160 * (text.len() + 1)],
                sample_rate: 16000,
            })
        }
    }

    /// Copies the waveform to the output path, remembering where it came from.
    #[derive(Default)]
    struct CopyTranscoder {
        scratch_paths: Vec<PathBuf>,
    }

    impl Transcoder for CopyTranscoder {
        fn extension(&self) -> &str {
            "mp3"
        }

        fn transcode(&mut self, wav_path: &Path, out_path: &Path) -> Result<()> {
            hound::WavReader::open(wav_path)?;
            self.scratch_paths.push(wav_path.to_path_buf());
            fs::copy(wav_path, out_path)?;
            Ok(())
        }
    }

    fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
        for (name, content) in docs {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    fn dir_entries(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_note_produces_single_mp3() {
        let input = tempfile::tempdir().unwrap();
        let out_root = tempfile::tempdir().unwrap();
        let output = out_root.path().join("output");
        write_docs(input.path(), &[("note.md", "# Hello *world*")]);

        let mut engine = FakeEngine::default();
        let mut transcoder = CopyTranscoder::default();
        let report = convert(
            input.path(),
            &output,
            &mut engine,
            &mut transcoder,
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(engine.spoken, vec!["Hello world".to_string()]);
        assert_eq!(dir_entries(&output), set(&["note.mp3"]));
        assert!(report.is_success());
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.converted[0].output, output.join("note.mp3"));
        assert!(report.converted[0].bytes > 0);
    }

    #[test]
    fn empty_input_creates_empty_output_dir() {
        let input = tempfile::tempdir().unwrap();
        let out_root = tempfile::tempdir().unwrap();
        let output = out_root.path().join("nested").join("output");

        let report = convert(
            input.path(),
            &output,
            &mut FakeEngine::default(),
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap();

        assert!(output.is_dir());
        assert!(dir_entries(&output).is_empty());
        assert!(report.converted.is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn synthesis_failure_aborts_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(
            input.path(),
            &[("a.md", "first"), ("b.md", "second"), ("c.md", "third")],
        );

        let mut engine = FakeEngine {
            fail_on: Some(1),
            ..Default::default()
        };
        let err = convert(
            input.path(),
            output.path(),
            &mut engine,
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap_err();

        match err {
            Error::Document { path, source } => {
                assert_eq!(path, input.path().join("b.md"));
                assert!(matches!(*source, Error::SynthesisFailed(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(engine.spoken.len(), 2);
        assert_eq!(dir_entries(output.path()), set(&["a.mp3"]));
    }

    #[test]
    fn continue_policy_records_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(
            input.path(),
            &[("a.md", "first"), ("b.md", "second"), ("c.md", "third")],
        );

        let options = ConvertOptionsBuilder::default()
            .on_error(ErrorPolicy::Continue)
            .build()
            .unwrap();
        let mut engine = FakeEngine {
            fail_on: Some(1),
            ..Default::default()
        };
        let report = convert(
            input.path(),
            output.path(),
            &mut engine,
            &mut CopyTranscoder::default(),
            &options,
        )
        .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, input.path().join("b.md"));
        assert!(report.failed[0].error.contains("engine exploded"));
        assert_eq!(dir_entries(output.path()), set(&["a.mp3", "c.mp3"]));
    }

    #[test]
    fn only_top_level_lowercase_md_files_in_name_order() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(
            input.path(),
            &[
                ("zeta.md", "zeta"),
                ("alpha.md", "alpha"),
                ("Mid.md", "mid"),
                ("SHOUT.MD", "shout"),
                ("notes.txt", "text"),
                ("archive.md.bak", "bak"),
            ],
        );
        fs::create_dir(input.path().join("sub")).unwrap();
        fs::write(input.path().join("sub").join("deep.md"), "deep").unwrap();
        fs::create_dir(input.path().join("folder.md")).unwrap();

        let mut engine = FakeEngine::default();
        convert(
            input.path(),
            output.path(),
            &mut engine,
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(engine.spoken, vec!["mid", "alpha", "zeta"]);
        assert_eq!(
            dir_entries(output.path()),
            set(&["Mid.mp3", "alpha.mp3", "zeta.mp3"])
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_file_names_are_converted() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.md");
        fs::write(input.path().join(name), "bonjour").unwrap();

        let found = find_documents(input.path(), "md").unwrap();
        assert_eq!(found, vec![input.path().join(name)]);

        let report = convert(
            input.path(),
            output.path(),
            &mut FakeEngine::default(),
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap();

        let expected = output.path().join(OsStr::from_bytes(b"caf\xe9.mp3"));
        assert_eq!(report.converted[0].output, expected);
        assert!(expected.is_file());
    }

    #[test]
    fn scratch_waveforms_are_unique_and_removed() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(input.path(), &[("one.md", "one"), ("two.md", "two")]);

        let mut transcoder = CopyTranscoder::default();
        convert(
            input.path(),
            output.path(),
            &mut FakeEngine::default(),
            &mut transcoder,
            &ConvertOptions::default(),
        )
        .unwrap();

        let scratch = &transcoder.scratch_paths;
        assert_eq!(scratch.len(), 2);
        assert_ne!(scratch[0], scratch[1]);
        for path in scratch {
            assert_eq!(path.parent(), Some(output.path()));
            assert!(!path.exists(), "{} left behind", path.display());
        }
    }

    #[test]
    fn scratch_waveform_removed_after_transcode_failure() {
        struct FailingTranscoder;
        impl Transcoder for FailingTranscoder {
            fn extension(&self) -> &str {
                "mp3"
            }
            fn transcode(&mut self, _wav_path: &Path, _out_path: &Path) -> Result<()> {
                Err(Error::Encode("codec unavailable".into()))
            }
        }

        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(input.path(), &[("a.md", "text")]);

        let err = convert(
            input.path(),
            output.path(),
            &mut FakeEngine::default(),
            &mut FailingTranscoder,
            &ConvertOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Document { .. }));
        assert!(dir_entries(output.path()).is_empty());
    }

    #[test]
    fn missing_input_dir_is_an_input_error() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("output");

        let err = convert(
            &root.path().join("missing"),
            &output,
            &mut FakeEngine::default(),
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InputDir { .. }), "got {err:?}");
        assert!(!output.exists());
    }

    #[test]
    fn non_utf8_document_fails() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("bad.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let mut engine = FakeEngine::default();
        let err = convert(
            input.path(),
            output.path(),
            &mut engine,
            &mut CopyTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap_err();

        match err {
            Error::Document { source, .. } => assert!(matches!(*source, Error::Io(_))),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(engine.spoken.is_empty());
    }

    #[test]
    fn output_path_replaces_extension() {
        let out = Path::new("/out");
        assert_eq!(
            output_path(Path::new("/in/note.md"), out, "mp3"),
            PathBuf::from("/out/note.mp3")
        );
        assert_eq!(
            output_path(Path::new("/in/v1.2.md"), out, "mp3"),
            PathBuf::from("/out/v1.2.mp3")
        );
    }

    #[test]
    fn options_builder_validates_extension() {
        let options = ConvertOptionsBuilder::default().build().unwrap();
        assert_eq!(options, ConvertOptions::default());
        assert_eq!(options.extension, "md");

        let markdown = ConvertOptionsBuilder::default()
            .extension("markdown")
            .build()
            .unwrap();
        assert_eq!(markdown.extension, "markdown");

        assert!(ConvertOptionsBuilder::default().extension("").build().is_err());
        assert!(ConvertOptionsBuilder::default().extension(".md").build().is_err());
    }

    #[test]
    fn report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = BatchReport {
            input_dir: PathBuf::from("in"),
            output_dir: PathBuf::from("out"),
            converted: vec![ConvertedDocument {
                source: PathBuf::from("in/a.md"),
                output: PathBuf::from("out/a.mp3"),
                bytes: 42,
            }],
            failed: vec![FailedDocument {
                source: PathBuf::from("in/b.md"),
                error: "boom".to_string(),
            }],
            elapsed_secs: 1.5,
        };
        report.write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["converted"][0]["bytes"], 42);
        assert_eq!(json["failed"][0]["error"], "boom");
        assert_eq!(json["output_dir"], "out");
    }

    #[cfg(feature = "lame")]
    #[test]
    fn end_to_end_with_lame() {
        use crate::transcode::lame::LameTranscoder;

        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_docs(input.path(), &[("note.md", "# Hello *world*")]);

        let report = convert(
            input.path(),
            output.path(),
            &mut FakeEngine::default(),
            &mut LameTranscoder::default(),
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(dir_entries(output.path()), set(&["note.mp3"]));
        assert!(report.converted[0].bytes > 0);
    }
}

use std::borrow::Cow;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// Default speaking rate in words per minute.
pub const DEFAULT_RATE: u32 = 160;

/// How to invoke espeak-ng.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EspeakConfig {
    /// Path to the `espeak-ng` executable. `None` resolves `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Directory containing `espeak-ng-data`. `None` uses the built-in default.
    pub data_path: Option<PathBuf>,
    /// Voice name passed to `-v` (e.g. `"en-us"`). `None` uses espeak's default voice.
    pub voice: Option<String>,
    /// Speaking rate in words per minute.
    pub rate: u32,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            bin_path: None,
            data_path: None,
            voice: None,
            rate: DEFAULT_RATE,
        }
    }
}

impl EspeakConfig {
    fn program(&self) -> &Path {
        self.bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak-ng"))
    }

    /// Command-line arguments for rendering stdin text into `wav_path`.
    pub(crate) fn args(&self, wav_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-b".into(), "1".into()];
        args.push("-s".into());
        args.push(self.rate.to_string().into());
        if let Some(voice) = &self.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        if let Some(data) = &self.data_path {
            let mut path_arg = OsString::from("--path=");
            path_arg.push(data);
            args.push(path_arg);
        }
        args.push("-w".into());
        args.push(wav_path.into());
        args.push("--stdin".into());
        args
    }
}

/// Speak `text` into a WAV file at `wav_path`.
pub fn run_espeak(config: &EspeakConfig, text: &str, wav_path: &Path) -> Result<()> {
    log::debug!(
        "Running {} -s {} into {}",
        config.program().display(),
        config.rate,
        wav_path.display()
    );

    let mut child = Command::new(config.program())
        .args(config.args(wav_path))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EspeakNotFound
            } else {
                Error::Io(e)
            }
        })?;

    // espeak-ng reads stdin line by line; an unterminated last line can be dropped.
    // A write error (EPIPE when espeak exits early) is only reported once the
    // child is reaped and its own diagnostics are known.
    let write_result = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(canonicalize_stdin_payload(text).as_bytes()),
        None => Ok(()),
    };

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::SynthesisFailed(format!(
            "espeak-ng exited with code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }
    write_result?;

    Ok(())
}

/// Whether the configured executable can be launched.
pub fn espeak_available(config: &EspeakConfig) -> bool {
    Command::new(config.program())
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

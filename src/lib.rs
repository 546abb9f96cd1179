//! # mdnarrate
//!
//! Turn a folder of markdown documents into narrated MP3 files.
//!
//! ## Features
//!
//! - **Markup cleanup**: decoration characters, images and links are stripped
//!   before narration
//! - **espeak-ng synthesis**: text is spoken by the `espeak-ng` executable
//! - **LAME transcoding**: waveforms are encoded to constant-bitrate MP3
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! mdnarrate = { version = "0.1", features = ["espeak", "lame"] }
//! ```
//!
//! ```ignore
//! use std::path::Path;
//! use mdnarrate::{batch, engines::espeak::EspeakEngine, transcode::lame::LameTranscoder};
//!
//! let mut engine = EspeakEngine::new();
//! let mut transcoder = LameTranscoder::new(128)?;
//! let report = batch::convert(
//!     Path::new("notes"),
//!     Path::new("output"),
//!     &mut engine,
//!     &mut transcoder,
//!     &batch::ConvertOptions::default(),
//! )?;
//! println!("{} documents converted", report.converted.len());
//! # Ok::<(), mdnarrate::Error>(())
//! ```

pub mod batch;
pub mod engines;
pub mod error;
pub mod markup;
pub mod transcode;
pub mod wav;

use std::path::Path;

pub use error::{Error, Result};

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (22050 for espeak-ng)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Engines are configured once (voice, rate) and then asked to speak one
/// document at a time.
pub trait SynthesisEngine {
    /// Synthesize speech from the given text.
    fn synthesize(&mut self, text: &str) -> Result<SynthesisResult>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(&mut self, text: &str, wav_path: &Path) -> Result<()> {
        self.synthesize(text)?.write_wav(wav_path)
    }
}

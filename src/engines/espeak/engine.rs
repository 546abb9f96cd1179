use std::path::{Path, PathBuf};

use crate::wav::PcmAudio;
use crate::{Result, SynthesisEngine, SynthesisResult};

use super::process::{espeak_available, run_espeak, EspeakConfig};

/// Output sample rate of espeak-ng voices.
pub const SAMPLE_RATE: u32 = 22050;

/// espeak-ng text-to-speech engine.
///
/// Every call launches the `espeak-ng` executable, so the engine holds no
/// state beyond its configuration.
///
/// ```rust,no_run
/// use mdnarrate::{SynthesisEngine, engines::espeak::EspeakEngine};
/// use std::path::Path;
///
/// let mut engine = EspeakEngine::new().with_rate(180);
/// engine.synthesize_to_file("Hello, world!", Path::new("hello.wav"))?;
/// # Ok::<(), mdnarrate::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    config: EspeakConfig,
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH at the default rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Either path can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            config: EspeakConfig {
                bin_path,
                data_path,
                ..Default::default()
            },
        }
    }

    pub fn with_config(config: EspeakConfig) -> Self {
        Self { config }
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.config.rate = rate;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice = Some(voice.into());
        self
    }

    pub fn config(&self) -> &EspeakConfig {
        &self.config
    }

    /// Check that the configured executable runs.
    pub fn is_available(&self) -> bool {
        espeak_available(&self.config)
    }
}

impl SynthesisEngine for EspeakEngine {
    fn synthesize(&mut self, text: &str) -> Result<SynthesisResult> {
        let scratch = tempfile::Builder::new()
            .prefix("mdnarrate-")
            .suffix(".wav")
            .tempfile()?;
        self.synthesize_to_file(text, scratch.path())?;

        let pcm = PcmAudio::read(scratch.path())?;
        Ok(SynthesisResult {
            samples: pcm.to_mono_f32(),
            sample_rate: pcm.sample_rate(),
        })
    }

    fn synthesize_to_file(&mut self, text: &str, wav_path: &Path) -> Result<()> {
        if text.trim().is_empty() {
            log::debug!("Nothing to speak, writing silent {}", wav_path.display());
            return SynthesisResult {
                samples: Vec::new(),
                sample_rate: SAMPLE_RATE,
            }
            .write_wav(wav_path);
        }

        run_espeak(&self.config, text, wav_path)
    }
}

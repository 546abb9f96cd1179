//! espeak-ng text-to-speech engine.
//!
//! The engine shells out to the `espeak-ng` executable and lets it write the
//! waveform straight to disk (mono, 16-bit, 22050 Hz).
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Rate
//!
//! The rate is passed to `espeak-ng -s` and is measured in words per minute.
//! The default of 160 is a relaxed reading pace.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mdnarrate::{SynthesisEngine, engines::espeak::{EspeakConfig, EspeakEngine}};
//! use std::path::{Path, PathBuf};
//!
//! let mut engine = EspeakEngine::with_config(EspeakConfig {
//!     bin_path: Some(PathBuf::from("/app/resources/espeak-ng/espeak-ng")),
//!     voice: Some("en-gb".to_string()),
//!     ..Default::default()
//! });
//! engine.synthesize_to_file("Hello from Britain!", Path::new("out.wav"))?;
//! # Ok::<(), mdnarrate::Error>(())
//! ```

pub mod engine;
pub mod process;

pub use engine::{EspeakEngine, SAMPLE_RATE};
pub use process::{EspeakConfig, DEFAULT_RATE};

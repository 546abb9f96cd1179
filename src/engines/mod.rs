//! Speech synthesis engines.
//!
//! This module contains implementations of text-to-speech engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `espeak` - espeak-ng (external executable, must be on PATH or configured)

#[cfg(feature = "espeak")]
pub mod espeak;

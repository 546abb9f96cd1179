//! Waveform-to-compressed-audio transcoders.
//!
//! Enable transcoders via Cargo features:
//! - `lame` - MP3 via the LAME encoder (bundled, no system install needed)

#[cfg(feature = "lame")]
pub mod lame;

use std::path::Path;

use crate::Result;

/// Converts an uncompressed WAV file into a compressed audio file.
pub trait Transcoder {
    /// File extension of the produced files, without the leading dot.
    fn extension(&self) -> &str;

    /// Read the WAV at `wav_path` and write the compressed result to `out_path`.
    fn transcode(&mut self, wav_path: &Path, out_path: &Path) -> Result<()>;
}

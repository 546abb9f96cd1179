use std::path::PathBuf;

/// Errors produced while converting documents to audio.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Cannot read input directory {}: {source}", .path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("Unsupported waveform: {0}")]
    UnsupportedWaveform(String),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("MP3 encoding failed: {0}")]
    Encode(String),
    #[error("Failed to convert {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap `self` with the path of the document being converted.
    pub(crate) fn in_document(self, path: impl Into<PathBuf>) -> Self {
        Error::Document {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

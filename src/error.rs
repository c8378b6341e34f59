use thiserror::Error;

/// Failure of a transcript request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The input matched none of the recognized URL shapes. Carries the input.
    #[error("Не удалось найти ID в ссылке: {0}")]
    MalformedUrl(String),

    /// An id was extracted but the provider could not supply captions.
    #[error("{0}")]
    TranscriptUnavailable(String),
}

/// Failure reported by a transcript provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("video {video_id} is unavailable: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("no transcript for video {video_id} in languages {requested:?} (available: {available:?})")]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from YouTube: {0}")]
    Parse(String),
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Error::TranscriptUnavailable(err.to_string())
    }
}

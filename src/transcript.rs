use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::error::{Error, ProviderError};
use crate::{Segment, extract_video_id};

/// Preferred caption languages when the caller gives none: first choice, then fallback
pub const DEFAULT_LANGUAGES: [&str; 2] = ["ru", "en"];

/// Source of caption fragments for a video.
///
/// Implementations pick the first of `languages` they have captions for and
/// fail when none is available.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<Segment>, ProviderError>;
}

pub fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
}

/// Turns a video URL into its full transcript text
#[derive(Clone)]
pub struct TranscriptService {
    provider: Arc<dyn TranscriptProvider>,
}

impl TranscriptService {
    pub fn new(provider: Arc<dyn TranscriptProvider>) -> Self {
        Self { provider }
    }

    /// Fetch the transcript for `url` and join its fragments with single spaces.
    ///
    /// An empty `languages` slice means [`DEFAULT_LANGUAGES`].
    pub async fn get_transcript(&self, url: &str, languages: &[String]) -> Result<String, Error> {
        info!("Fetching transcript for {url}");

        let defaults;
        let languages: &[String] = if languages.is_empty() {
            defaults = default_languages();
            defaults.as_slice()
        } else {
            languages
        };

        let video_id = extract_video_id(url)?;
        debug!("Requesting captions for {video_id} in {languages:?}");

        let segments = self.provider.fetch(&video_id, languages).await?;
        debug!("Received {} transcript fragments", segments.len());

        let full_text = join_segments(&segments);
        debug!("Transcript length: {} chars", full_text.chars().count());
        Ok(full_text)
    }
}

/// Join fragment texts with a single space, in order, without any cleanup
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

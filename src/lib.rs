pub mod config;
pub mod error;
pub mod server;
pub mod summary;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

pub use error::{Error, ProviderError};

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// One recognized URL shape: a prefix followed by the captured id
struct Matcher {
    shape: &'static str,
    pattern: Regex,
}

impl Matcher {
    fn new(shape: &'static str, prefix: &str) -> Self {
        // id: word characters and hyphens, at least 10 long; `?` and `&` end it
        let pattern = Regex::new(&format!(r"{prefix}([\w-]{{10,}})")).expect("matcher pattern must compile");
        Self { shape, pattern }
    }
}

static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher::new("short", r"youtu\.be/"),
        Matcher::new("watch", r"youtube\.com/watch\?v="),
        Matcher::new("embed", r"youtube\.com/embed/"),
        Matcher::new("v", r"youtube\.com/v/"),
        Matcher::new("live", r"youtube\.com/live/"),
        Matcher::new("query", r"v="),
    ]
});

/// Extract video ID from various YouTube URL formats.
///
/// Every matcher is searched anywhere in the input; the match that starts
/// earliest wins, ties go to the matcher listed first.
pub fn extract_video_id(input: &str) -> Result<String, Error> {
    debug!("Extracting video id from: {input}");

    let found = MATCHERS
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| m.pattern.captures(input).map(|caps| (caps, idx, m.shape)))
        .min_by_key(|(caps, idx, _)| (caps.get(0).map_or(usize::MAX, |c| c.start()), *idx));

    match found {
        Some((caps, _, shape)) => {
            let video_id = caps[1].to_string();
            debug!("Found video id {video_id} ({shape} form)");
            Ok(video_id)
        }
        None => {
            let err = Error::MalformedUrl(input.to_string());
            debug!("{err}");
            Err(err)
        }
    }
}

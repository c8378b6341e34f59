use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use serde::Deserialize;

use crate::Segment;
use crate::error::ProviderError;
use crate::transcript::TranscriptProvider;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Where the watch page exposes the InnerTube key, most common layout first
static API_KEY_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("api key pattern must compile"),
        Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("api key pattern must compile"),
    ]
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` for auto-generated tracks
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

impl PlayerResponse {
    fn tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.player_captions_tracklist_renderer.as_ref())
            .and_then(|t| t.caption_tracks.as_deref())
            .unwrap_or_default()
    }
}

/// Caption provider backed by YouTube's InnerTube API
#[derive(Debug, Clone)]
pub struct YouTubeProvider {
    client: reqwest::Client,
}

impl YouTubeProvider {
    /// Build a provider whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let text = self.client.get(url).send().await?.error_for_status()?.text().await?;
        Ok(text)
    }

    async fn player(&self, video_id: &str) -> Result<PlayerResponse, ProviderError> {
        let watch_page = self
            .get_text(&format!("https://www.youtube.com/watch?v={video_id}"))
            .await?;
        let api_key = find_api_key(&watch_page)?;
        debug!("InnerTube key for {video_id}: {api_key}");

        let request = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let player = self
            .client
            .post(format!(
                "https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false"
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(player)
    }
}

#[async_trait]
impl TranscriptProvider for YouTubeProvider {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<Segment>, ProviderError> {
        let player = self.player(video_id).await?;
        let track = caption_track(&player, video_id, languages)?;
        debug!(
            "Caption track for {video_id}: lang={} generated={}",
            track.language_code,
            track.is_generated()
        );

        let xml = self.get_text(&track.base_url.replace("&fmt=srv3", "")).await?;
        parse_caption_xml(&xml)
    }
}

/// Map a player response onto the track to download, or the reason there is none
fn caption_track<'a>(
    player: &'a PlayerResponse,
    video_id: &str,
    languages: &[String],
) -> Result<&'a CaptionTrack, ProviderError> {
    // a response without playabilityStatus is treated as playable
    if let Some(playability) = &player.playability_status {
        let status = playability.status.as_deref().unwrap_or("OK");
        if status != "OK" {
            return Err(ProviderError::VideoUnavailable {
                video_id: video_id.to_string(),
                reason: playability.reason.clone().unwrap_or_else(|| status.to_string()),
            });
        }
    }

    let tracks = player.tracks();
    if tracks.is_empty() {
        return Err(ProviderError::TranscriptsDisabled(video_id.to_string()));
    }

    select_track(tracks, languages).ok_or_else(|| ProviderError::NoTranscriptFound {
        video_id: video_id.to_string(),
        requested: languages.to_vec(),
        available: tracks.iter().map(|t| t.language_code.clone()).collect(),
    })
}

/// Pick the first requested language that has a track; manual tracks win over generated ones
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        let matching = || tracks.iter().filter(move |t| &t.language_code == lang);
        matching().find(|t| !t.is_generated()).or_else(|| matching().next())
    })
}

fn find_api_key(html: &str) -> Result<String, ProviderError> {
    API_KEY_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ProviderError::Parse("watch page carries no InnerTube API key".to_string()))
}

/// A `<text>` cue being read
struct OpenCue {
    start: f64,
    duration: f64,
    text: String,
}

impl OpenCue {
    fn from_element(e: &BytesStart) -> Option<Self> {
        Some(Self {
            start: float_attr(e, b"start")?,
            // the last cue of a track may have no dur
            duration: float_attr(e, b"dur").unwrap_or(0.0),
            text: String::new(),
        })
    }

    fn close(self) -> Option<Segment> {
        let text = html_escape::decode_html_entities(&self.text).into_owned();
        (!text.is_empty()).then(|| Segment::new(text, self.start, self.duration))
    }
}

fn float_attr(e: &BytesStart, key: &[u8]) -> Option<f64> {
    let attr = e.try_get_attribute(key).ok()??;
    std::str::from_utf8(&attr.value).ok()?.trim().parse().ok()
}

/// Timed-text XML to segments. Only text inside a `<text>` element counts.
fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>, ProviderError> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut cue: Option<OpenCue> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ProviderError::Parse(format!("caption XML at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"text" => cue = OpenCue::from_element(&e),
            Event::Text(t) => {
                if let Some(open) = cue.as_mut() {
                    let chunk = t
                        .unescape()
                        .map_err(|e| ProviderError::Parse(format!("caption text: {e}")))?;
                    open.text.push_str(&chunk);
                }
            }
            Event::End(e) if e.name().as_ref() == b"text" => {
                segments.extend(cue.take().and_then(OpenCue::close));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(segments)
}

/*!
 * Sentence extraction from YouTube "json3" caption dumps.
 *
 * Caption events carry word segments with offsets relative to the event start. Segments
 * are joined into sentences ending at `.`, `!` or `?`; a sentence starts at the offset
 * of its first segment. The output is a handy first draft of a slide timeline.
 */

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::InputError;
use crate::file_utils::FileManager;

/// Caption file as downloaded from YouTube (only the fields used here)
#[derive(Debug, Deserialize)]
pub struct CaptionFile {
    #[serde(default)]
    pub events: Vec<CaptionEvent>,
}

#[derive(Debug, Deserialize)]
pub struct CaptionEvent {
    #[serde(rename = "tStartMs", default)]
    pub start_ms: u64,
    #[serde(default)]
    pub segs: Option<Vec<CaptionSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct CaptionSegment {
    #[serde(default)]
    pub utf8: String,
    #[serde(rename = "tOffsetMs", default)]
    pub offset_ms: u64,
}

/// A sentence with its start time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    /// Start in seconds
    pub t: f64,
    /// Start as `HH:MM:SS`
    pub time: String,
    pub text: String,
}

impl Sentence {
    fn new(start_ms: u64, words: &[String]) -> Self {
        Self {
            t: start_ms as f64 / 1000.0,
            time: format_hms(start_ms),
            text: words.join(" ").trim().to_string(),
        }
    }
}

/// Load a caption file from disk
pub fn load_captions<P: AsRef<Path>>(path: P) -> Result<CaptionFile> {
    let path = path.as_ref();
    let content = FileManager::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        InputError::MalformedJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Split caption events into sentences
pub fn sentences(events: &[CaptionEvent]) -> Vec<Sentence> {
    let mut result = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut sentence_start: Option<u64> = None;

    for event in events {
        let Some(segments) = &event.segs else {
            continue;
        };

        for segment in segments {
            let text = segment.utf8.trim();
            if text.is_empty() {
                continue;
            }

            let start = *sentence_start.get_or_insert(event.start_ms + segment.offset_ms);
            words.push(text.to_string());

            if text.contains(['.', '!', '?']) {
                result.push(Sentence::new(start, &words));
                words.clear();
                sentence_start = None;
            }
        }
    }

    if !words.is_empty() {
        result.push(Sentence::new(sentence_start.unwrap_or(0), &words));
    }

    result
}

fn format_hms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

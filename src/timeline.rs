use std::fmt;
use std::path::Path;

use anyhow::Result;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::errors::{InputError, TimelineError};
use crate::file_utils::FileManager;
use crate::interval_set::IntervalSet;

// @module: Timeline and cut list parsing

// @const: Clock-style time label, e.g. "1:02:03.5" or "02:03.5"
static CLOCK_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d+):(\d+(?:\.\d+)?)$").expect("valid time label regex")
});

// @struct: Slide switch on some timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePoint {
    // @field: Seconds from the start of the audio
    pub timestamp: f64,

    // @field: 0-based PDF page shown from this point on
    pub page: usize,
}

impl TimelinePoint {
    pub fn new(timestamp: f64, page: usize) -> Self {
        Self { timestamp, page }
    }
}

impl fmt::Display for TimelinePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} @ {}", self.page, format_clock(self.timestamp))
    }
}

/// A time value as written in input files: seconds, or a clock string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeLabel {
    Seconds(f64),
    Text(String),
}

impl TimeLabel {
    /// Resolve to seconds. Accepts `SS.s`, `MM:SS.s` and `HH:MM:SS.s`.
    pub fn to_seconds(&self) -> Result<f64, TimelineError> {
        match self {
            TimeLabel::Seconds(secs) => Ok(*secs),
            TimeLabel::Text(text) => parse_time_label(text),
        }
    }
}

/// Parse a textual time label into seconds
pub fn parse_time_label(text: &str) -> Result<f64, TimelineError> {
    let trimmed = text.trim();
    if let Ok(secs) = trimmed.parse::<f64>() {
        return Ok(secs);
    }

    let caps = CLOCK_LABEL_REGEX
        .captures(trimmed)
        .ok_or_else(|| TimelineError::InvalidTimeLabel(text.to_string()))?;

    let component = |idx: usize| -> Result<f64, TimelineError> {
        caps.get(idx)
            .map_or(Ok(0.0), |m| m.as_str().parse::<f64>())
            .map_err(|_| TimelineError::InvalidTimeLabel(text.to_string()))
    };

    Ok(component(1)? * 3600.0 + component(2)? * 60.0 + component(3)?)
}

/// Format seconds as `HH:MM:SS.mmm`
pub fn format_clock(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// One entry of the timeline file in its object form
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineRecord {
    pub t: TimeLabel,
    #[serde(default)]
    pub page: Option<usize>,
}

/// The two accepted shapes of a timeline file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimelineFile {
    /// `[12.3, 45.0, ...]`: the n-th value switches to page n
    Flat(Vec<TimeLabel>),
    /// `[{"t": 12.3, "page": 2}, ...]`
    Records(Vec<TimelineRecord>),
}

impl TimelineFile {
    /// Normalize either shape into timeline points. A record without a page gets
    /// its position in the list.
    pub fn into_points(self) -> Result<Vec<TimelinePoint>, TimelineError> {
        match self {
            TimelineFile::Flat(labels) => labels
                .iter()
                .enumerate()
                .map(|(page, label)| Ok(TimelinePoint::new(label.to_seconds()?, page)))
                .collect(),
            TimelineFile::Records(records) => records
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    Ok(TimelinePoint::new(record.t.to_seconds()?, record.page.unwrap_or(idx)))
                })
                .collect(),
        }
    }
}

/// Parse timeline JSON text into raw points (no ordering checks)
pub fn parse_timeline_str(content: &str) -> Result<Vec<TimelinePoint>, TimelineParseError> {
    let file: TimelineFile =
        serde_json::from_str(content).map_err(|e| TimelineParseError::Json(e.to_string()))?;
    Ok(file.into_points()?)
}

/// Parse cuts JSON text (`[[start, end], ...]`) into a normalized interval set
pub fn parse_cuts_str(content: &str) -> Result<IntervalSet, TimelineParseError> {
    let raw: Vec<(TimeLabel, TimeLabel)> =
        serde_json::from_str(content).map_err(|e| TimelineParseError::Json(e.to_string()))?;

    let pairs = raw
        .iter()
        .map(|(start, end)| Ok((start.to_seconds()?, end.to_seconds()?)))
        .collect::<Result<Vec<_>, TimelineError>>()?;

    Ok(IntervalSet::new(&pairs)?)
}

/// Failure of one of the string parsers, before a file path is attached
#[derive(Error, Debug)]
pub enum TimelineParseError {
    #[error("malformed JSON: {0}")]
    Json(String),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl TimelineParseError {
    fn with_path(self, path: &Path) -> anyhow::Error {
        match self {
            Self::Json(reason) => InputError::MalformedJson {
                path: path.to_path_buf(),
                reason,
            }
            .into(),
            Self::Timeline(error) => anyhow::Error::new(error)
                .context(format!("Invalid data in {:?}", path)),
        }
    }
}

/// A validated raw timeline on the original audio
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    points: Vec<TimelinePoint>,
}

impl Timeline {
    /// Validate points: non-empty, finite non-negative timestamps, non-decreasing order
    pub fn new(points: Vec<TimelinePoint>) -> Result<Self, TimelineError> {
        validate_points(&points)?;
        Ok(Self { points })
    }

    /// Load and validate a timeline file, applying `skew` seconds to every point
    pub fn load<P: AsRef<Path>>(path: P, skew: f64) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let mut points = parse_timeline_str(&content).map_err(|e| e.with_path(path))?;
        debug!("Raw timeline: {:?}", points);

        if skew != 0.0 {
            apply_skew(&mut points, skew);
        }

        Self::new(points).map_err(|e| anyhow::Error::new(e).context(format!("Invalid timeline in {:?}", path)))
    }

    pub fn points(&self) -> &[TimelinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest page referenced
    pub fn max_page(&self) -> usize {
        self.points.iter().map(|p| p.page).max().unwrap_or(0)
    }

    /// Make the first slide visible from time 0 when the first switch comes later
    pub fn with_lead_in(mut self) -> Self {
        let Some(first) = self.points.first().copied() else {
            return self;
        };
        if first.timestamp > 0.0 {
            debug!("First switch at {:.3}s, showing page 0 from the start", first.timestamp);
            if first.page == 0 {
                self.points[0].timestamp = 0.0;
            } else {
                self.points.insert(0, TimelinePoint::new(0.0, 0));
            }
        }
        self
    }
}

/// Load a cuts file. `None` means no cuts.
pub fn load_cuts<P: AsRef<Path>>(path: Option<P>, skew: f64) -> Result<IntervalSet> {
    let Some(path) = path else {
        return Ok(IntervalSet::empty());
    };
    let path = path.as_ref();
    let content = FileManager::read_to_string(path)?;
    let cuts = parse_cuts_str(&content).map_err(|e| e.with_path(path))?;

    if skew != 0.0 {
        Ok(cuts.offset_by(skew))
    } else {
        Ok(cuts)
    }
}

/// Validation shared by `Timeline::new` and the remapper
pub fn validate_points(points: &[TimelinePoint]) -> Result<(), TimelineError> {
    if points.is_empty() {
        return Err(TimelineError::EmptyTimeline);
    }

    for (index, point) in points.iter().enumerate() {
        if !point.timestamp.is_finite() || point.timestamp < 0.0 {
            return Err(TimelineError::InvalidTimestamp {
                index,
                value: point.timestamp,
            });
        }
    }

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(TimelineError::InvalidTimelineOrder {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }

    Ok(())
}

/// Shift all points by `skew` seconds; points pushed before 0 are clamped to 0
fn apply_skew(points: &mut [TimelinePoint], skew: f64) {
    let mut clamped = 0;
    for point in points.iter_mut() {
        point.timestamp += skew;
        if point.timestamp < 0.0 {
            point.timestamp = 0.0;
            clamped += 1;
        }
    }
    if clamped > 0 {
        warn!("Skew of {:.3}s moved {} point(s) before 0, clamped to 0", skew, clamped);
    }
}

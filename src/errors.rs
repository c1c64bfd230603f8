/*!
 * Error types for the slidecast application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating the files given on the command line
#[derive(Error, Debug)]
pub enum InputError {
    /// A required (or explicitly requested) input file does not exist
    #[error("{kind} file not found: {path:?}")]
    NotFound {
        /// What the file was supposed to be ("PDF", "audio", ...)
        kind: &'static str,
        /// Path as given by the user
        path: PathBuf,
    },

    /// The file exists but is not valid JSON of the expected shape
    #[error("Malformed JSON in {path:?}: {reason}")]
    MalformedJson {
        path: PathBuf,
        reason: String,
    },

    /// The audio container cannot be stream-copied by the cleaner
    #[error("Unsupported audio format '{extension}' (expected one of: wav, mp3, aac, m4a, flac, ogg)")]
    UnsupportedAudioFormat {
        extension: String,
    },
}

/// Errors in timeline or cut data
#[derive(Error, Debug, PartialEq)]
pub enum TimelineError {
    /// A cut interval whose end is not after its start, or with a negative/non-finite bound
    #[error("Malformed cut interval [{start}, {end}]: {reason}")]
    MalformedInterval {
        start: f64,
        end: f64,
        reason: &'static str,
    },

    /// Timeline points are not sorted ascending
    #[error("Timeline is not sorted: point {index} at {current}s comes after {previous}s")]
    InvalidTimelineOrder {
        index: usize,
        previous: f64,
        current: f64,
    },

    /// A timeline timestamp is negative or not a number
    #[error("Invalid timestamp {value} at timeline point {index}")]
    InvalidTimestamp {
        index: usize,
        value: f64,
    },

    /// No slide switch at all
    #[error("Timeline is empty: at least one slide-switch point is required")]
    EmptyTimeline,

    /// A time label string could not be parsed
    #[error("Invalid time label '{0}' (expected seconds, MM:SS.s or HH:MM:SS.s)")]
    InvalidTimeLabel(String),

    /// The timeline references a page the slide deck does not have
    #[error("Timeline references page {page} but only {available} slide image(s) exist")]
    PageOutOfRange {
        page: usize,
        available: usize,
    },
}

/// Errors returned by external tools (ffmpeg, ffprobe, pdftoppm)
#[derive(Error, Debug)]
pub enum ToolError {
    /// The process could not be started at all
    #[error("Failed to execute {tool}: {reason}")]
    Spawn {
        tool: String,
        reason: String,
    },

    /// The process exited with a non-zero status
    #[error("{tool} failed: {stderr}")]
    Failed {
        tool: String,
        stderr: String,
    },

    /// The process ran past the configured timeout
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        tool: String,
        secs: u64,
    },

    /// The process succeeded but did not produce what it should have
    #[error("{tool} produced no usable output: {reason}")]
    MissingOutput {
        tool: String,
        reason: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from input validation
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Error from timeline processing
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Error from an external tool
    #[error("External tool error: {0}")]
    Tool(#[from] ToolError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading
/// and validating configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Scratch directory for rendered slides, cleaned audio and intermediate video
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// PDF render DPI (accepted for compatibility, slides are scaled to `slide_height`)
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Output frame rate (accepted for compatibility, the slide stream is encoded at 1 fps)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Height in pixels every PDF page is rendered to
    #[serde(default = "default_slide_height")]
    pub slide_height: u32,

    /// Offset in seconds added to every slide switch and cut
    #[serde(default)]
    pub skew: f64,

    /// Accepted difference between expected and probed cleaned audio duration
    #[serde(default = "default_duration_tolerance_secs")]
    pub duration_tolerance_secs: f64,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External program locations and limits
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    // @field: ffmpeg executable
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    // @field: ffprobe executable
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    // @field: pdftoppm executable (poppler-utils)
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: String,

    // @field: Timeout per invocation in seconds, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            pdftoppm: default_pdftoppm(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Audio containers the cleaner can cut with stream copy
pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "aac", "m4a", "flac", "ogg"];

fn default_workdir() -> PathBuf {
    PathBuf::from("./_cast_build")
}

fn default_dpi() -> u32 {
    200
}

fn default_fps() -> u32 {
    30
}

fn default_slide_height() -> u32 {
    720
}

fn default_duration_tolerance_secs() -> f64 {
    0.05
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

fn default_timeout_secs() -> u64 {
    1800 // 30 minutes, long talks encode slowly
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.workdir.as_os_str().is_empty() {
            return Err(anyhow!("Work directory must not be empty"));
        }

        if self.slide_height == 0 {
            return Err(anyhow!("Slide height must be greater than 0"));
        }

        if !self.skew.is_finite() {
            return Err(anyhow!("Skew must be a finite number of seconds"));
        }

        if !(self.duration_tolerance_secs.is_finite() && self.duration_tolerance_secs >= 0.0) {
            return Err(anyhow!("Duration tolerance must be a non-negative number of seconds"));
        }

        for (name, value) in [
            ("ffmpeg", &self.tools.ffmpeg),
            ("ffprobe", &self.tools.ffprobe),
            ("pdftoppm", &self.tools.pdftoppm),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("Path to {} must not be empty", name));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            workdir: default_workdir(),
            dpi: default_dpi(),
            fps: default_fps(),
            slide_height: default_slide_height(),
            skew: 0.0,
            duration_tolerance_secs: default_duration_tolerance_secs(),
            tools: ToolsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

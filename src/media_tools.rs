use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{debug, error};
use tokio::process::Command;

use crate::app_config::ToolsConfig;
use crate::errors::ToolError;

// @module: External tool invocation (ffmpeg, ffprobe, pdftoppm)

// @struct: Runs external programs with the configured timeout
#[derive(Debug, Clone)]
pub struct ToolRunner {
    // @field: Tool locations and timeout
    tools: ToolsConfig,
}

impl ToolRunner {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolsConfig {
        &self.tools
    }

    /// Run `program` with `args`, failing on spawn errors, timeouts and non-zero exit
    pub async fn run<I, S>(&self, program: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<std::ffi::OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        debug!(
            "Running: {} {}",
            program,
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let future = Command::new(program).args(&args).kill_on_drop(true).output();

        let result = if self.tools.timeout_secs == 0 {
            future.await
        } else {
            let timeout_duration = Duration::from_secs(self.tools.timeout_secs);
            tokio::select! {
                result = future => result,
                _ = tokio::time::sleep(timeout_duration) => {
                    return Err(ToolError::Timeout {
                        tool: program.to_string(),
                        secs: self.tools.timeout_secs,
                    }.into());
                }
            }
        };

        let output = result.map_err(|e| ToolError::Spawn {
            tool: program.to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} exited with {}: {}", program, output.status, filtered);
            return Err(ToolError::Failed {
                tool: program.to_string(),
                stderr: filtered,
            }
            .into());
        }

        Ok(output)
    }

    /// Run ffmpeg with `-y` and quiet banner
    pub async fn ffmpeg<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut full: Vec<std::ffi::OsString> = vec!["-hide_banner".into(), "-y".into()];
        full.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self.run(&self.tools.ffmpeg, full).await
    }

    /// Duration of a media file in seconds, as reported by ffprobe
    pub async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = self
            .run(
                &self.tools.ffprobe,
                [
                    OsStr::new("-v"),
                    OsStr::new("error"),
                    OsStr::new("-show_entries"),
                    OsStr::new("format=duration"),
                    OsStr::new("-of"),
                    OsStr::new("default=noprint_wrappers=1:nokey=1"),
                    path.as_os_str(),
                ],
            )
            .await?;

        parse_duration_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            anyhow!(ToolError::MissingOutput {
                tool: self.tools.ffprobe.clone(),
                reason: format!("no duration reported for {:?}", path),
            })
        })
    }
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration_output(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "libavutil",
        "libavcodec",
        "libavformat",
        "libavdevice",
        "libavfilter",
        "libswscale",
        "libswresample",
        "libpostproc",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "encoder         :",
        "title           :",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
        "frame=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

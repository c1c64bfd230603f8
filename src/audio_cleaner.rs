use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};

use crate::errors::ToolError;
use crate::file_utils::FileManager;
use crate::media_tools::ToolRunner;

// @module: Removing cut intervals from the audio track

/// Audio operations the pipeline needs from an external encoder
#[async_trait]
pub trait AudioEditor: Send + Sync {
    /// Length of an audio file in seconds
    async fn probe_duration(&self, audio: &Path) -> Result<f64>;

    /// Write the `fragments` of `source` back to back into `target`, using `workdir`
    /// for intermediate files
    async fn cut(&self, source: &Path, fragments: &[(f64, f64)], target: &Path, workdir: &Path) -> Result<()>;
}

/// ffmpeg-backed editor: stream-copies each kept fragment, then joins them with the
/// concat demuxer
pub struct FfmpegAudioEditor {
    runner: ToolRunner,
}

impl FfmpegAudioEditor {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl AudioEditor for FfmpegAudioEditor {
    async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        self.runner.probe_duration(audio).await
    }

    async fn cut(&self, source: &Path, fragments: &[(f64, f64)], target: &Path, workdir: &Path) -> Result<()> {
        FileManager::ensure_dir(workdir)?;
        let extension = target
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "wav".to_string());

        let mut fragment_files = Vec::with_capacity(fragments.len());
        for (i, (start, end)) in fragments.iter().enumerate() {
            let fragment = fragment_path(workdir, i, &extension);
            debug!("Extracting fragment {}: {:.3} - {:.3}", i, start, end);
            let args: Vec<OsString> = vec![
                "-i".into(),
                source.into(),
                "-ss".into(),
                format!("{:.3}", start).into(),
                "-to".into(),
                format!("{:.3}", end).into(),
                "-c".into(),
                "copy".into(),
                fragment.clone().into(),
            ];
            self.runner.ffmpeg(args).await?;
            fragment_files.push(fragment);
        }

        let list_path = workdir.join("concat_list.txt");
        FileManager::write_to_file(&list_path, &concat_list(&fragment_files))?;

        info!("Concatenating {} fragment(s) into {:?}", fragment_files.len(), target);
        let args: Vec<OsString> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.into(),
            "-c".into(),
            "copy".into(),
            target.into(),
        ];
        self.runner.ffmpeg(args).await?;

        if !FileManager::file_exists(target) {
            return Err(ToolError::MissingOutput {
                tool: self.runner.tools().ffmpeg.clone(),
                reason: format!("cleaned audio {:?} was not written", target),
            }
            .into());
        }

        for fragment in &fragment_files {
            if let Err(e) = std::fs::remove_file(fragment) {
                warn!("Failed to remove fragment {:?}: {}", fragment, e);
            }
        }

        Ok(())
    }
}

/// `frag_000.mp3`, ...
pub fn fragment_path(dir: &Path, index: usize, extension: &str) -> PathBuf {
    dir.join(format!("frag_{:03}.{}", index, extension))
}

/// Quote a path for an ffmpeg concat list entry
pub fn concat_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Concat demuxer input listing `files` in order
pub fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|file| format!("file {}\n", concat_quote(file)))
        .collect()
}

/// Compare the probed cleaned duration with what the cuts should have left.
/// Returns `false` (and warns) when they differ by more than `tolerance`.
pub fn check_cleaned_duration(expected: f64, actual: f64, tolerance: f64) -> bool {
    let difference = (expected - actual).abs();
    if difference > tolerance {
        warn!(
            "Cleaned audio is {:.3}s long, expected {:.3}s (difference {:.3}s exceeds {:.3}s)",
            actual, expected, difference, tolerance
        );
        false
    } else {
        debug!("Cleaned audio duration {:.3}s matches expectation", actual);
        true
    }
}

/*!
 * Video composition: still slides held for their on-screen time, muxed with the
 * cleaned audio.
 *
 * The slide stream is built with ffmpeg's concat demuxer from an image list carrying
 * a duration per entry, encoded at 1 fps, then muxed with the audio by stream copy.
 */

use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};

use crate::audio_cleaner::concat_quote;
use crate::errors::ToolError;
use crate::file_utils::FileManager;
use crate::media_tools::ToolRunner;
use crate::remapper::CleanedTimeline;

/// Produces the final video from cleaned audio, slide images and the cleaned timeline
#[async_trait]
pub trait MediaComposer: Send + Sync {
    /// `images[n]` is page `n`. `total_duration` is the cleaned audio length.
    async fn compose(
        &self,
        audio: &Path,
        timeline: &CleanedTimeline,
        images: &[PathBuf],
        total_duration: f64,
        output: &Path,
        workdir: &Path,
    ) -> Result<()>;
}

/// ffmpeg-backed composer
pub struct FfmpegComposer {
    runner: ToolRunner,
}

impl FfmpegComposer {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaComposer for FfmpegComposer {
    async fn compose(
        &self,
        audio: &Path,
        timeline: &CleanedTimeline,
        images: &[PathBuf],
        total_duration: f64,
        output: &Path,
        workdir: &Path,
    ) -> Result<()> {
        timeline.check_pages(images.len())?;
        FileManager::ensure_dir(workdir)?;

        let list_path = workdir.join("img_list.txt");
        let list = image_list(timeline, images, total_duration);
        debug!("Image list for ffmpeg:\n{}", list);
        FileManager::write_to_file(&list_path, &list)?;

        let silent_video = workdir.join("video_no_audio.mp4");
        info!("Creating video from {} slide segment(s)", timeline.len());
        let args: Vec<OsString> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.into(),
            "-vf".into(),
            "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            "1".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "ultrafast".into(),
            "-crf".into(),
            "28".into(),
            "-g".into(),
            "300".into(),
            "-sc_threshold".into(),
            "0".into(),
            "-x264-params".into(),
            "keyint=300:min-keyint=300:no-scenecut=1".into(),
            "-threads".into(),
            "0".into(),
            silent_video.clone().into(),
        ];
        self.runner.ffmpeg(args).await?;

        info!("Merging video with audio");
        let args: Vec<OsString> = vec![
            "-i".into(),
            silent_video.into(),
            "-i".into(),
            audio.into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "copy".into(),
            output.into(),
        ];
        self.runner.ffmpeg(args).await?;

        if !FileManager::file_exists(output) {
            return Err(ToolError::MissingOutput {
                tool: self.runner.tools().ffmpeg.clone(),
                reason: format!("video {:?} was not written", output),
            }
            .into());
        }

        Ok(())
    }
}

/// Concat demuxer image list. Every slide carries its on-screen duration; the last one
/// is held until `total_duration` and listed a second time, since the demuxer ignores
/// the duration of the final entry.
pub fn image_list(timeline: &CleanedTimeline, images: &[PathBuf], total_duration: f64) -> String {
    let mut list = String::new();
    let segments = timeline.segments(total_duration);

    for (page, _, duration) in &segments {
        let Some(image) = images.get(*page) else {
            continue;
        };
        let _ = writeln!(list, "file {}", concat_quote(image));
        let _ = writeln!(list, "duration {:.3}", duration);
    }

    if let Some(image) = segments.last().and_then(|(page, _, _)| images.get(*page)) {
        let _ = writeln!(list, "file {}", concat_quote(image));
    }

    list
}

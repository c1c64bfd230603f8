use anyhow::{Result, Context, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{warn, info, debug};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::audio_cleaner::{AudioEditor, FfmpegAudioEditor, check_cleaned_duration};
use crate::composer::{FfmpegComposer, MediaComposer};
use crate::file_utils::FileManager;
use crate::interval_set::IntervalSet;
use crate::media_tools::ToolRunner;
use crate::remapper::{CleanedTimeline, TimelineRemapper};
use crate::slide_renderer::{PdftoppmRenderer, SlideRenderer, existing_slides};
use crate::timeline::{Timeline, format_clock, load_cuts};
use crate::workdir::{CacheKey, CacheStatus, WorkDir, cache_status, invalidate_manifest, write_manifest};

// @module: Application controller for slidecast builds

/// Everything a single build needs from the command line
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub pdf: PathBuf,
    pub audio: PathBuf,
    pub timeline: PathBuf,
    pub cuts: Option<PathBuf>,
    pub output: PathBuf,
    pub dry_run: bool,
    pub keep_audio: bool,
    pub keep_pdf: bool,
}

/// What a build did (or, in a dry run, would do)
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub workdir: PathBuf,
    pub output: PathBuf,
    pub original_duration: f64,
    pub cleaned_duration: f64,
    pub cuts: IntervalSet,
    pub kept_fragments: Vec<(f64, f64)>,
    pub raw_points: usize,
    pub timeline: CleanedTimeline,
    pub audio_source: PathBuf,
    pub audio_reused: bool,
    pub slides_reused: bool,
    pub slide_count: Option<usize>,
    pub dry_run: bool,
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Work directory: {:?}", self.workdir)?;
        writeln!(f, "Output: {:?}", self.output)?;
        writeln!(f, "Original audio: {}", format_clock(self.original_duration))?;
        writeln!(f, "Cuts: {} interval(s), {:.3}s removed", self.cuts.len(), self.original_duration - self.cleaned_duration)?;
        writeln!(f, "Cleaned audio: {} from {:?}", format_clock(self.cleaned_duration), self.audio_source)?;
        writeln!(f, "Slide switches: {} raw, {} after cuts", self.raw_points, self.timeline.len())?;
        if let Some(count) = self.slide_count {
            writeln!(f, "Slides: {}", count)?;
        }
        write!(f, "{}", self.timeline)
    }
}

/// Main application controller for building a slidecast
pub struct Controller {
    // @field: App configuration
    config: Config,
    renderer: Arc<dyn SlideRenderer>,
    audio: Arc<dyn AudioEditor>,
    composer: Arc<dyn MediaComposer>,
}

impl Controller {
    // @method: Create a new controller with the given configuration and ffmpeg/poppler tools
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let runner = ToolRunner::new(config.tools.clone());
        let renderer = Arc::new(PdftoppmRenderer::new(runner.clone(), config.slide_height));
        let audio = Arc::new(FfmpegAudioEditor::new(runner.clone()));
        let composer = Arc::new(FfmpegComposer::new(runner));
        Ok(Self::with_collaborators(config, renderer, audio, composer))
    }

    /// Create a controller around arbitrary collaborators
    pub fn with_collaborators(
        config: Config,
        renderer: Arc<dyn SlideRenderer>,
        audio: Arc<dyn AudioEditor>,
        composer: Arc<dyn MediaComposer>,
    ) -> Self {
        Self {
            config,
            renderer,
            audio,
            composer,
        }
    }

    /// Run the whole pipeline. Input validation happens before any external tool runs.
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildPlan> {
        let start_time = Instant::now();

        // 1) Inputs
        let audio_path = FileManager::require_file(&request.audio, "Audio")?;
        let audio_ext = FileManager::audio_extension(&audio_path)?;
        let pdf_path = FileManager::require_file(&request.pdf, "PDF")?;
        let timeline_path = FileManager::require_file(&request.timeline, "Timeline")?;
        let cuts_path = request
            .cuts
            .as_ref()
            .map(|p| FileManager::require_file(p, "Cuts"))
            .transpose()?;

        if !request
            .output
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("mp4"))
        {
            warn!("Output {:?} does not end in .mp4, the file will still be an MP4 container", request.output);
        }

        // 2) Timeline and cuts
        let skew = self.config.skew;
        let timeline = Timeline::load(&timeline_path, skew)?.with_lead_in();
        info!(
            "Timeline loaded: {} slide switch(es), highest page {}",
            timeline.len(),
            timeline.max_page()
        );

        let cuts = load_cuts(cuts_path.as_ref(), skew)?;
        info!("Cuts loaded: {} interval(s)", cuts.len());
        debug!("Cuts: {}", cuts);

        let workdir = WorkDir::new(&self.config.workdir);
        workdir.create()?;
        info!("Work directory: {:?}", workdir.root());

        // 3) Original duration
        let original_duration = self
            .audio
            .probe_duration(&audio_path)
            .await
            .context("Failed to determine audio duration")?;
        info!("Original audio: {:.2}s", original_duration);

        let kept_fragments = cuts.kept_fragments(original_duration);
        if !cuts.is_empty() && kept_fragments.is_empty() {
            return Err(anyhow!("Cuts remove the entire {:.2}s recording", original_duration));
        }
        let expected_duration = original_duration - cuts.removed_within(original_duration);

        // 4) Audio
        let (audio_source, audio_reused, cleaned_duration) = self
            .prepare_audio(request, &workdir, &audio_path, &audio_ext, &cuts, &kept_fragments, original_duration, expected_duration)
            .await?;
        info!("Cleaned audio: {:.2}s", cleaned_duration);

        // 5) Timeline remap
        let cleaned_timeline = TimelineRemapper::new(&cuts)
            .with_source_duration(original_duration)
            .remap(timeline.points())
            .with_context(|| format!("Invalid timeline in {:?}", timeline_path))?;
        debug!("Slide positions after cuts:\n{}", cleaned_timeline);

        let mut plan = BuildPlan {
            workdir: workdir.root().to_path_buf(),
            output: request.output.clone(),
            original_duration,
            cleaned_duration,
            cuts,
            kept_fragments,
            raw_points: timeline.len(),
            timeline: cleaned_timeline,
            audio_source: audio_source.clone(),
            audio_reused,
            slides_reused: false,
            slide_count: None,
            dry_run: request.dry_run,
        };

        if request.dry_run {
            warn!("Dry run: no slides rendered, no audio cleaned, no video composed");
            info!("Build plan:\n{}", plan);
            return Ok(plan);
        }

        // 6) Slides
        let (slides, slides_reused) = self.prepare_slides(request, &workdir, &pdf_path).await?;
        plan.slide_count = Some(slides.len());
        plan.slides_reused = slides_reused;
        plan.timeline.check_pages(slides.len())?;

        // 7) Video
        let target = workdir.final_video();
        let spinner = Self::spinner("Composing video");
        let composed = self
            .composer
            .compose(&audio_source, &plan.timeline, &slides, cleaned_duration, &target, &workdir.video_dir())
            .await;
        spinner.finish_and_clear();
        composed.context("Video composition failed")?;

        FileManager::move_file(&target, &request.output)?;
        info!(
            "Result saved: {:?} ({})",
            request.output,
            Self::format_duration(start_time.elapsed())
        );

        Ok(plan)
    }

    #[allow(clippy::too_many_arguments)]
    async fn prepare_audio(
        &self,
        request: &BuildRequest,
        workdir: &WorkDir,
        audio_path: &Path,
        audio_ext: &str,
        cuts: &IntervalSet,
        fragments: &[(f64, f64)],
        original_duration: f64,
        expected_duration: f64,
    ) -> Result<(PathBuf, bool, f64)> {
        if cuts.is_empty() {
            info!("No cuts given, audio is used as is");
            return Ok((audio_path.to_path_buf(), false, original_duration));
        }

        let cleaned = workdir.cleaned_audio(audio_ext);
        let stage_dir = workdir.audio_dir();
        let params: Vec<String> = fragments
            .iter()
            .map(|(start, end)| format!("{:.3}-{:.3}", start, end))
            .collect();
        let key = CacheKey::for_input(audio_path, &params)?;

        if request.keep_audio {
            let status = cache_status(&stage_dir, std::slice::from_ref(&cleaned), &key);
            match status {
                status if status.reusable() => {
                    if status == CacheStatus::Unverified {
                        warn!("Reusing cleaned audio without a cache manifest: {:?}", cleaned);
                    } else {
                        info!("Reusing cleaned audio: {:?}", cleaned);
                    }
                    let duration = if request.dry_run {
                        expected_duration
                    } else {
                        self.audio.probe_duration(&cleaned).await?
                    };
                    return Ok((cleaned, true, duration));
                }
                CacheStatus::Stale => warn!("Cleaned audio in {:?} was made from different input, rebuilding", stage_dir),
                _ => info!("No cleaned audio to reuse in {:?}", stage_dir),
            }
        }

        if request.dry_run {
            debug!("Dry run: would cut {} fragment(s) into {:?}", fragments.len(), cleaned);
            return Ok((cleaned, false, expected_duration));
        }

        invalidate_manifest(&stage_dir)?;
        let spinner = Self::spinner("Cleaning audio");
        let result = self.audio.cut(audio_path, fragments, &cleaned, &stage_dir).await;
        spinner.finish_and_clear();
        result.context("Audio cleaning failed")?;
        write_manifest(&stage_dir, &key)?;

        let duration = self.audio.probe_duration(&cleaned).await?;
        check_cleaned_duration(expected_duration, duration, self.config.duration_tolerance_secs);
        Ok((cleaned, false, duration))
    }

    async fn prepare_slides(&self, request: &BuildRequest, workdir: &WorkDir, pdf_path: &Path) -> Result<(Vec<PathBuf>, bool)> {
        let stage_dir = workdir.slides_dir();
        let params = vec![format!("height={}", self.config.slide_height)];
        let key = CacheKey::for_input(pdf_path, &params)?;

        if request.keep_pdf {
            let slides = existing_slides(&stage_dir)?;
            let status = cache_status(&stage_dir, &slides, &key);
            match status {
                status if status.reusable() => {
                    if status == CacheStatus::Unverified {
                        warn!("Reusing {} slide(s) without a cache manifest", slides.len());
                    } else {
                        info!("Reusing {} slide(s) from {:?}", slides.len(), stage_dir);
                    }
                    return Ok((slides, true));
                }
                CacheStatus::Stale => warn!("Slides in {:?} were rendered from a different PDF, rendering again", stage_dir),
                _ => info!("No slides to reuse in {:?}", stage_dir),
            }
        }

        info!("Rendering slides: {:?}", pdf_path);
        invalidate_manifest(&stage_dir)?;
        let spinner = Self::spinner("Rendering slides");
        let result = self.renderer.render(pdf_path, self.config.dpi, &stage_dir).await;
        spinner.finish_and_clear();
        let slides = result.context("Slide rendering failed")?;
        write_manifest(&stage_dir, &key)?;

        Ok((slides, false))
    }

    /// Spinner shown while an external tool runs
    fn spinner(message: &'static str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Format a duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }
}

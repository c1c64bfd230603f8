/*!
 * PDF to slide image rendering.
 *
 * Rendering is delegated to poppler's `pdftoppm`. Every page is scaled to a fixed pixel
 * height and stored as `slide_NNN.png` (1-based file numbering, 0-based pages).
 */

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ToolError;
use crate::file_utils::FileManager;
use crate::media_tools::ToolRunner;
use crate::workdir::slide_file_name;

// @const: pdftoppm names pages `<prefix>-<n>.png`, zero padded by page count
static PDFTOPPM_PAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-(\d+)\.png$").expect("valid pdftoppm page regex"));

// @const: Our own slide naming
static SLIDE_FILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^slide_(\d+)\.png$").expect("valid slide file regex"));

/// Turns a PDF into one image per page
#[async_trait]
pub trait SlideRenderer: Send + Sync {
    /// Render every page of `pdf` into `out_dir`. The returned paths are ordered by page:
    /// index `n` holds page `n`.
    async fn render(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// `pdftoppm`-backed renderer
pub struct PdftoppmRenderer {
    runner: ToolRunner,
    // @field: Target height of every page in pixels
    height: u32,
}

impl PdftoppmRenderer {
    pub fn new(runner: ToolRunner, height: u32) -> Self {
        Self { runner, height }
    }
}

#[async_trait]
impl SlideRenderer for PdftoppmRenderer {
    async fn render(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        FileManager::ensure_dir(out_dir)?;
        debug!("Rendering {:?} at {}px height (requested DPI {} is not used)", pdf, self.height, dpi);

        // Stale pages from a longer deck or an interrupted run would otherwise be picked up as slides.
        let removed = remove_stale_pages(out_dir)?;
        if removed > 0 {
            debug!("Removed {} stale page image(s) from {:?}", removed, out_dir);
        }

        let prefix = out_dir.join("page");
        let height = self.height.to_string();
        self.runner
            .run(
                &self.runner.tools().pdftoppm,
                [
                    OsStr::new("-png"),
                    OsStr::new("-scale-to-x"),
                    OsStr::new("-1"),
                    OsStr::new("-scale-to-y"),
                    OsStr::new(&height),
                    pdf.as_os_str(),
                    prefix.as_os_str(),
                ],
            )
            .await?;

        let slides = collect_rendered_pages(out_dir)?;
        if slides.is_empty() {
            return Err(ToolError::MissingOutput {
                tool: self.runner.tools().pdftoppm.clone(),
                reason: format!("no pages rendered from {:?}", pdf),
            }
            .into());
        }

        info!("Rendered {} slide(s) into {:?}", slides.len(), out_dir);
        Ok(slides)
    }
}

/// Rename `page-N.png` files produced by pdftoppm to `slide_NNN.png`, ordered by page
pub fn collect_rendered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<(usize, PathBuf)> = Vec::new();
    for path in FileManager::find_files(dir, "png")? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if let Some(caps) = PDFTOPPM_PAGE_REGEX.captures(&name) {
            let number: usize = caps[1].parse().context("Page number out of range")?;
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);

    let mut slides = Vec::with_capacity(pages.len());
    for (page, (_, path)) in pages.into_iter().enumerate() {
        let target = dir.join(slide_file_name(page));
        FileManager::move_file(&path, &target)?;
        slides.push(target);
    }
    Ok(slides)
}

/// Delete our slides and raw pdftoppm pages from `dir`, returning how many were removed
pub fn remove_stale_pages(dir: &Path) -> Result<usize> {
    if !FileManager::dir_exists(dir) {
        return Ok(0);
    }

    let mut removed = 0;
    for path in FileManager::find_files(dir, "png")? {
        let is_page = path.file_name().is_some_and(|name| {
            let name = name.to_string_lossy();
            SLIDE_FILE_REGEX.is_match(&name) || PDFTOPPM_PAGE_REGEX.is_match(&name)
        });
        if is_page {
            std::fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Slides already present in `dir`, ordered by their number
pub fn existing_slides(dir: &Path) -> Result<Vec<PathBuf>> {
    if !FileManager::dir_exists(dir) {
        return Ok(Vec::new());
    }

    let mut slides: Vec<(usize, PathBuf)> = FileManager::find_files(dir, "png")?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            let number = SLIDE_FILE_REGEX.captures(&name)?[1].parse::<usize>().ok()?;
            Some((number, path))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);
    Ok(slides.into_iter().map(|(_, path)| path).collect())
}

/*!
 * Work directory layout and stage cache manifests.
 *
 * Each pipeline stage writes into its own subdirectory. A stage that finished records
 * a manifest holding a key derived from its inputs; `--keep-*` reuses the stage output
 * only while that key still matches.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;

/// File name of the manifest inside each stage directory
pub const MANIFEST_FILE: &str = ".slidecast-cache.json";

/// Resolved locations inside the work directory
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the root and every stage directory
    pub fn create(&self) -> Result<()> {
        for dir in [self.root.clone(), self.slides_dir(), self.audio_dir(), self.video_dir()] {
            FileManager::ensure_dir(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn slides_dir(&self) -> PathBuf {
        self.root.join("slides")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.root.join("video")
    }

    /// Cleaned audio keeps the container of the source
    pub fn cleaned_audio(&self, extension: &str) -> PathBuf {
        self.audio_dir().join(format!("cleaned_audio.{}", extension))
    }

    pub fn final_video(&self) -> PathBuf {
        self.video_dir().join("final_video.mp4")
    }
}

/// `slide_001.png` for page 0
pub fn slide_file_name(page: usize) -> String {
    format!("slide_{:03}.png", page + 1)
}

/// Input fingerprint of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    pub key: String,
}

impl CacheKey {
    /// Hash an input file together with the parameters that shape the stage output
    pub fn for_input<P: AsRef<Path>>(input: P, params: &[String]) -> Result<Self> {
        let file_hash = FileManager::hash_file(input)?;
        let mut hasher = Sha256::new();
        hasher.update(file_hash.as_bytes());
        for param in params {
            hasher.update([0u8]);
            hasher.update(param.as_bytes());
        }
        Ok(Self {
            key: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Outcome of looking up a stage cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Outputs present and manifest matches
    Valid,
    /// Outputs present but written before manifests existed
    Unverified,
    /// Outputs present but produced from different inputs
    Stale,
    /// Expected outputs are missing
    Missing,
}

impl CacheStatus {
    /// Whether a `--keep-*` run may reuse the outputs
    pub fn reusable(&self) -> bool {
        matches!(self, CacheStatus::Valid | CacheStatus::Unverified)
    }
}

/// Check a stage directory for reusable output
pub fn cache_status(stage_dir: &Path, outputs: &[PathBuf], expected: &CacheKey) -> CacheStatus {
    if outputs.is_empty() || outputs.iter().any(|p| !FileManager::file_exists(p)) {
        return CacheStatus::Missing;
    }

    let manifest_path = stage_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return CacheStatus::Unverified;
    }

    match read_manifest(&manifest_path) {
        Ok(found) if &found == expected => CacheStatus::Valid,
        Ok(_) => CacheStatus::Stale,
        Err(e) => {
            warn!("Ignoring unreadable cache manifest {:?}: {}", manifest_path, e);
            CacheStatus::Stale
        }
    }
}

fn read_manifest(path: &Path) -> Result<CacheKey> {
    let content = FileManager::read_to_string(path)?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

/// Record the key a stage was produced from
pub fn write_manifest(stage_dir: &Path, key: &CacheKey) -> Result<()> {
    let path = stage_dir.join(MANIFEST_FILE);
    let content = serde_json::to_string_pretty(key).context("Failed to serialize cache manifest")?;
    FileManager::write_to_file(&path, &content)?;
    debug!("Wrote cache manifest {:?}", path);
    Ok(())
}

/// Drop a manifest before a stage starts over, so a failed run never looks valid
pub fn invalidate_manifest(stage_dir: &Path) -> Result<()> {
    let path = stage_dir.join(MANIFEST_FILE);
    if path.exists() {
        std::fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
    }
    Ok(())
}

/*!
 * Tests for the work directory layout and stage caches
 */

use anyhow::Result;
use std::path::PathBuf;
use slidecast::workdir::{
    CacheKey, CacheStatus, MANIFEST_FILE, WorkDir, cache_status, invalidate_manifest, slide_file_name,
    write_manifest,
};
use crate::common;

/// Test the artifact locations inside the work directory
#[test]
fn test_workdir_paths_withRoot_shouldFollowStageLayout() {
    let workdir = WorkDir::new("/tmp/build");
    assert_eq!(workdir.slides_dir(), PathBuf::from("/tmp/build/slides"));
    assert_eq!(workdir.audio_dir(), PathBuf::from("/tmp/build/audio"));
    assert_eq!(slide_file_name(0), "slide_001.png");
    assert_eq!(slide_file_name(41), "slide_042.png");
    assert_eq!(workdir.cleaned_audio("m4a"), PathBuf::from("/tmp/build/audio/cleaned_audio.m4a"));
    assert_eq!(workdir.final_video(), PathBuf::from("/tmp/build/video/final_video.mp4"));
}

/// Test that create makes every stage directory
#[test]
fn test_workdir_create_withFreshRoot_shouldCreateStageDirs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let workdir = WorkDir::new(temp_dir.path().join("work"));
    workdir.create()?;

    assert!(workdir.slides_dir().is_dir());
    assert!(workdir.audio_dir().is_dir());
    assert!(workdir.video_dir().is_dir());
    Ok(())
}

/// Test that cache keys depend on both content and parameters
#[test]
fn test_cache_key_withDifferentParams_shouldDiffer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "talk.pdf", "deck")?;

    let a = CacheKey::for_input(&input, &["height=720".to_string()])?;
    let b = CacheKey::for_input(&input, &["height=720".to_string()])?;
    let c = CacheKey::for_input(&input, &["height=1080".to_string()])?;
    assert_eq!(a, b);
    assert_ne!(a, c);
    Ok(())
}

/// Test the status of a stage through its lifecycle
#[test]
fn test_cache_status_withManifestLifecycle_shouldReportEachState() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let stage = temp_dir.path().join("audio");
    std::fs::create_dir_all(&stage)?;
    let input = common::create_test_file(temp_dir.path(), "talk.mp3", "audio v1")?;
    let key = CacheKey::for_input(&input, &[])?;
    let output = stage.join("cleaned_audio.mp3");

    assert_eq!(cache_status(&stage, &[output.clone()], &key), CacheStatus::Missing);

    std::fs::write(&output, "cleaned")?;
    let status = cache_status(&stage, &[output.clone()], &key);
    assert_eq!(status, CacheStatus::Unverified);
    assert!(status.reusable());

    write_manifest(&stage, &key)?;
    assert!(stage.join(MANIFEST_FILE).exists());
    assert_eq!(cache_status(&stage, &[output.clone()], &key), CacheStatus::Valid);

    std::fs::write(&input, "audio v2")?;
    let new_key = CacheKey::for_input(&input, &[])?;
    let status = cache_status(&stage, &[output.clone()], &new_key);
    assert_eq!(status, CacheStatus::Stale);
    assert!(!status.reusable());

    invalidate_manifest(&stage)?;
    assert!(!stage.join(MANIFEST_FILE).exists());
    Ok(())
}

/// Test that an empty output list is never reusable
#[test]
fn test_cache_status_withNoOutputs_shouldBeMissing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let key = CacheKey { key: "abc".to_string() };
    assert_eq!(cache_status(temp_dir.path(), &[], &key), CacheStatus::Missing);
    Ok(())
}

/// Test that a corrupt manifest is treated as stale
#[test]
fn test_cache_status_withCorruptManifest_shouldBeStale() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = common::create_test_file(temp_dir.path(), "slide_001.png", "png")?;
    common::create_test_file(temp_dir.path(), MANIFEST_FILE, "{{{")?;

    let key = CacheKey { key: "abc".to_string() };
    assert_eq!(cache_status(temp_dir.path(), &[output], &key), CacheStatus::Stale);
    Ok(())
}

/*!
 * Integration tests for input validation ahead of any expensive work
 */

use anyhow::Result;
use slidecast::app_config::Config;
use slidecast::errors::{InputError, TimelineError};
use slidecast::Controller;
use crate::common::TestProject;
use crate::common::mock_tools::MockSetup;

fn assert_no_work_done(setup: &MockSetup) {
    assert_eq!(setup.audio.probe_count(), 0, "audio was probed");
    assert_eq!(setup.audio.cut_count(), 0, "audio was cut");
    assert_eq!(setup.renderer.call_count(), 0, "slides were rendered");
    assert_eq!(setup.composer.call_count(), 0, "video was composed");
}

/// Test that a missing audio file is reported before anything runs
#[tokio::test]
async fn test_run_withMissingAudio_shouldReturnInputNotFound() -> Result<()> {
    let project = TestProject::new("[0]", None)?;
    let setup = MockSetup::new(project.config(), 1, 10.0);
    let mut request = project.request();
    request.audio = project.dir.path().join("nowhere.mp3");

    let error = setup.controller.run(&request).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<InputError>(),
        Some(InputError::NotFound { kind: "Audio", .. })
    ));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that a named but missing cuts file is an error, not "no cuts"
#[tokio::test]
async fn test_run_withMissingCutsFile_shouldReturnInputNotFound() -> Result<()> {
    let project = TestProject::new("[0]", None)?;
    let setup = MockSetup::new(project.config(), 1, 10.0);
    let mut request = project.request();
    request.cuts = Some(project.dir.path().join("cuts.json"));

    let error = setup.controller.run(&request).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<InputError>(),
        Some(InputError::NotFound { kind: "Cuts", .. })
    ));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that an audio container the cleaner cannot copy is rejected
#[tokio::test]
async fn test_run_withUnsupportedAudio_shouldReturnUnsupportedFormat() -> Result<()> {
    let project = TestProject::new("[0]", None)?;
    let audio = crate::common::create_test_file(project.dir.path(), "talk.wma", "audio")?;
    let setup = MockSetup::new(project.config(), 1, 10.0);
    let mut request = project.request();
    request.audio = audio;

    let error = setup.controller.run(&request).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<InputError>(),
        Some(InputError::UnsupportedAudioFormat { extension }) if extension == "wma"
    ));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that a reversed cut stops the build before any tool runs
#[tokio::test]
async fn test_run_withMalformedInterval_shouldFailBeforeAnyWork() -> Result<()> {
    let project = TestProject::new("[0, 10]", Some("[[20, 10]]"))?;
    let setup = MockSetup::new(project.config(), 2, 30.0);

    let error = setup.controller.run(&project.request()).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<TimelineError>(),
        Some(TimelineError::MalformedInterval { .. })
    ));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that an unsorted timeline stops the build before any tool runs
#[tokio::test]
async fn test_run_withUnsortedTimeline_shouldReturnInvalidOrder() -> Result<()> {
    let project = TestProject::new("[0, 30, 10]", None)?;
    let setup = MockSetup::new(project.config(), 3, 60.0);

    let error = setup.controller.run(&project.request()).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<TimelineError>(),
        Some(TimelineError::InvalidTimelineOrder { index: 2, .. })
    ));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that an empty timeline is rejected
#[tokio::test]
async fn test_run_withEmptyTimeline_shouldReturnEmptyTimeline() -> Result<()> {
    let project = TestProject::new("[]", None)?;
    let setup = MockSetup::new(project.config(), 1, 10.0);

    let error = setup.controller.run(&project.request()).await.unwrap_err();

    assert!(matches!(error.downcast_ref::<TimelineError>(), Some(TimelineError::EmptyTimeline)));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that timeline JSON of the wrong shape is a malformed JSON error
#[tokio::test]
async fn test_run_withMalformedTimelineJson_shouldReturnMalformedJson() -> Result<()> {
    let project = TestProject::new(r#"{"slides": []}"#, None)?;
    let setup = MockSetup::new(project.config(), 1, 10.0);

    let error = setup.controller.run(&project.request()).await.unwrap_err();

    assert!(matches!(error.downcast_ref::<InputError>(), Some(InputError::MalformedJson { .. })));
    assert_no_work_done(&setup);
    Ok(())
}

/// Test that an invalid configuration is refused when building the controller
#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let config = Config {
        slide_height: 0,
        ..Config::default()
    };
    assert!(Controller::with_config(config).is_err());
}

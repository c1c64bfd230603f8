/*!
 * Tests for caption to sentence extraction
 */

use anyhow::Result;
use slidecast::errors::InputError;
use slidecast::transcript::{load_captions, sentences};
use crate::common;

/// Test loading a caption dump and splitting it into sentences
#[test]
fn test_sentences_withCaptionFile_shouldSplitOnPunctuation() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "talk.json3",
        r#"{"wireMagic": "pb3", "events": [
            {"tStartMs": 1000, "segs": [{"utf8": "Hello"}, {"utf8": " everyone.", "tOffsetMs": 400}]},
            {"tStartMs": 2500, "segs": [{"utf8": "Is"}, {"utf8": " this", "tOffsetMs": 200}]},
            {"tStartMs": 3000, "segs": [{"utf8": "on?"}]},
            {"tStartMs": 64000, "segs": [{"utf8": "Let's begin"}]}
        ]}"#,
    )?;

    let captions = load_captions(&path)?;
    let result = sentences(&captions.events);
    let texts: Vec<&str> = result.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello everyone.", "Is this on?", "Let's begin"]);
    assert_eq!(result[0].t, 1.0);
    assert_eq!(result[1].t, 2.5);
    assert_eq!(result[2].time, "00:01:04");
    Ok(())
}

/// Test that events without segments produce nothing
#[test]
fn test_sentences_withNoSegments_shouldReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "empty.json3", r#"{"events": [{"tStartMs": 0}]}"#)?;

    let captions = load_captions(&path)?;
    assert!(sentences(&captions.events).is_empty());
    Ok(())
}

/// Test that sentences serialize with their start time fields
#[test]
fn test_sentences_serialize_shouldExposeTimeFields() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "talk.json3",
        r#"{"events": [{"tStartMs": 90000, "segs": [{"utf8": "Done."}]}]}"#,
    )?;

    let captions = load_captions(&path)?;
    let json = serde_json::to_value(sentences(&captions.events))?;
    assert_eq!(json, serde_json::json!([{"t": 90.0, "time": "00:01:30", "text": "Done."}]));
    Ok(())
}

/// Test that a broken caption file is a malformed JSON input error
#[test]
fn test_load_captions_withBrokenJson_shouldReturnMalformedJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json3", "{\"events\": [")?;

    let error = load_captions(&path).unwrap_err();
    assert!(matches!(error.downcast_ref::<InputError>(), Some(InputError::MalformedJson { .. })));
    Ok(())
}

/*!
 * Tests for timeline and cuts file parsing
 */

use anyhow::Result;
use slidecast::errors::{InputError, TimelineError};
use slidecast::timeline::{
    Timeline, TimelineParseError, TimelinePoint, load_cuts, parse_cuts_str, parse_timeline_str,
};
use crate::common;

/// Test the flat list shape: the n-th value switches to page n
#[test]
fn test_parse_timeline_withFlatList_shouldUseIndexAsPage() {
    let points = parse_timeline_str("[0, 12.5, 40]").unwrap();
    assert_eq!(
        points,
        vec![
            TimelinePoint::new(0.0, 0),
            TimelinePoint::new(12.5, 1),
            TimelinePoint::new(40.0, 2),
        ]
    );
}

/// Test the record shape with explicit pages
#[test]
fn test_parse_timeline_withRecords_shouldUseGivenPages() {
    let points = parse_timeline_str(r#"[{"t": 0, "page": 0}, {"t": 8, "page": 4}, {"t": 9.5, "page": 1}]"#).unwrap();
    assert_eq!(
        points,
        vec![
            TimelinePoint::new(0.0, 0),
            TimelinePoint::new(8.0, 4),
            TimelinePoint::new(9.5, 1),
        ]
    );
}

/// Test that a record without a page falls back to its index
#[test]
fn test_parse_timeline_withMissingPage_shouldUseIndex() {
    let points = parse_timeline_str(r#"[{"t": 0}, {"t": 5, "page": 7}, {"t": 9}]"#).unwrap();
    let pages: Vec<usize> = points.iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![0, 7, 2]);
}

/// Test clock-style string labels
#[test]
fn test_parse_timeline_withStringLabels_shouldConvertToSeconds() {
    let points = parse_timeline_str(r#"["0", "01:30", "1:00:00.5"]"#).unwrap();
    let times: Vec<f64> = points.iter().map(|p| p.timestamp).collect();
    assert_eq!(times, vec![0.0, 90.0, 3600.5]);
}

/// Test that an unparseable label is reported as such
#[test]
fn test_parse_timeline_withBadLabel_shouldReturnInvalidTimeLabel() {
    let result = parse_timeline_str(r#"["0", "later"]"#);
    assert!(matches!(
        result,
        Err(TimelineParseError::Timeline(TimelineError::InvalidTimeLabel(label))) if label == "later"
    ));
}

/// Test that JSON of the wrong shape is a JSON error
#[test]
fn test_parse_timeline_withWrongShape_shouldReturnJsonError() {
    assert!(matches!(parse_timeline_str(r#"{"t": 1}"#), Err(TimelineParseError::Json(_))));
    assert!(matches!(parse_timeline_str("[0, 1"), Err(TimelineParseError::Json(_))));
}

/// Test the cuts format with mixed labels
#[test]
fn test_parse_cuts_withMixedLabels_shouldBuildIntervalSet() {
    let cuts = parse_cuts_str(r#"[[15, 25], ["1:00", "1:30.5"]]"#).unwrap();
    let pairs: Vec<(f64, f64)> = cuts.intervals().iter().map(|i| (i.start, i.end)).collect();
    assert_eq!(pairs, vec![(15.0, 25.0), (60.0, 90.5)]);
}

/// Test the reversed interval from the cuts file
#[test]
fn test_parse_cuts_withReversedInterval_shouldReturnMalformedInterval() {
    let result = parse_cuts_str("[[20, 10]]");
    assert!(matches!(
        result,
        Err(TimelineParseError::Timeline(TimelineError::MalformedInterval { .. }))
    ));
}

/// Test that an empty cuts list is accepted
#[test]
fn test_parse_cuts_withEmptyList_shouldReturnEmptySet() {
    assert!(parse_cuts_str("[]").unwrap().is_empty());
}

/// Test that an empty timeline is rejected
#[test]
fn test_timeline_new_withNoPoints_shouldReturnEmptyTimeline() {
    assert_eq!(Timeline::new(Vec::new()), Err(TimelineError::EmptyTimeline));
}

/// Test that descending timestamps are rejected with the offending index
#[test]
fn test_timeline_new_withDescendingPoints_shouldReturnInvalidOrder() {
    let result = Timeline::new(vec![
        TimelinePoint::new(0.0, 0),
        TimelinePoint::new(10.0, 1),
        TimelinePoint::new(5.0, 2),
    ]);
    assert_eq!(
        result,
        Err(TimelineError::InvalidTimelineOrder {
            index: 2,
            previous: 10.0,
            current: 5.0,
        })
    );
}

/// Test that negative timestamps are rejected
#[test]
fn test_timeline_new_withNegativeTimestamp_shouldReturnInvalidTimestamp() {
    let result = Timeline::new(vec![TimelinePoint::new(-1.0, 0)]);
    assert_eq!(result, Err(TimelineError::InvalidTimestamp { index: 0, value: -1.0 }));
}

/// Test the lead-in page when the first switch comes later
#[test]
fn test_with_lead_in_withLateFirstPoint_shouldPrependFirstPage() {
    let timeline = Timeline::new(vec![TimelinePoint::new(4.0, 3)]).unwrap().with_lead_in();
    assert_eq!(
        timeline.points(),
        &[TimelinePoint::new(0.0, 0), TimelinePoint::new(4.0, 3)]
    );
}

/// Test that a late switch to page 0 is moved instead of duplicated
#[test]
fn test_with_lead_in_withLateFirstPageZero_shouldMoveItToZero() {
    let timeline = Timeline::new(vec![TimelinePoint::new(2.0, 0), TimelinePoint::new(9.0, 1)])
        .unwrap()
        .with_lead_in();
    assert_eq!(
        timeline.points(),
        &[TimelinePoint::new(0.0, 0), TimelinePoint::new(9.0, 1)]
    );
}

/// Test that a timeline starting at 0 is left alone
#[test]
fn test_with_lead_in_withPointAtZero_shouldNotChange() {
    let timeline = Timeline::new(vec![TimelinePoint::new(0.0, 2)]).unwrap().with_lead_in();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.max_page(), 2);
}

/// Test loading a file with malformed JSON
#[test]
fn test_timeline_load_withMalformedJson_shouldReturnMalformedJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "timeline.json", "[0, 10,")?;

    let error = Timeline::load(&path, 0.0).unwrap_err();
    match error.downcast_ref::<InputError>() {
        Some(InputError::MalformedJson { path: reported, .. }) => assert_eq!(reported, &path),
        other => panic!("expected MalformedJson, got {:?}", other),
    }
    Ok(())
}

/// Test that timeline errors stay downcastable through the context chain
#[test]
fn test_timeline_load_withUnsortedFile_shouldExposeTimelineError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "timeline.json", r#"[{"t": 10}, {"t": 2}]"#)?;

    let error = Timeline::load(&path, 0.0).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TimelineError>(),
        Some(TimelineError::InvalidTimelineOrder { index: 1, .. })
    ));
    Ok(())
}

/// Test that skew moves every point and clamps at zero
#[test]
fn test_timeline_load_withNegativeSkew_shouldShiftAndClamp() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "timeline.json", "[0, 1.5, 10]")?;

    let timeline = Timeline::load(&path, -2.0)?;
    let times: Vec<f64> = timeline.points().iter().map(|p| p.timestamp).collect();
    assert_eq!(times, vec![0.0, 0.0, 8.0]);
    Ok(())
}

/// Test that an absent cuts file means nothing is cut
#[test]
fn test_load_cuts_withNoPath_shouldReturnEmptySet() -> Result<()> {
    let cuts = load_cuts(None::<&std::path::Path>, 3.0)?;
    assert!(cuts.is_empty());
    Ok(())
}

/// Test that skew applies to cuts too
#[test]
fn test_load_cuts_withSkew_shouldOffsetIntervals() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "cuts.json", "[[10, 20]]")?;

    let cuts = load_cuts(Some(&path), 1.5)?;
    assert_eq!(cuts.intervals()[0].start, 11.5);
    assert_eq!(cuts.intervals()[0].end, 21.5);
    Ok(())
}

/// Test that a reversed cut in a file is reported with its typed error
#[test]
fn test_load_cuts_withReversedInterval_shouldExposeMalformedInterval() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "cuts.json", "[[20, 10]]")?;

    let error = load_cuts(Some(&path), 0.0).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TimelineError>(),
        Some(TimelineError::MalformedInterval { .. })
    ));
    Ok(())
}

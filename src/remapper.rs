/*!
 * Timeline remapping from original-audio coordinates to cleaned-audio coordinates.
 *
 * Once the cut intervals are removed from the audio, every surviving slide switch moves
 * earlier by the amount of audio removed before it. Switches that fall inside a cut have
 * no instant left to happen at and are dropped; the slide visible at the start of the
 * cleaned audio is always defined.
 */

use std::fmt;

use log::{debug, warn};

use crate::errors::TimelineError;
use crate::interval_set::IntervalSet;
use crate::timeline::{TimelinePoint, format_clock, validate_points};

/// Slide switches on the cleaned audio. Timestamps are strictly increasing and the
/// first one is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTimeline {
    points: Vec<TimelinePoint>,
}

impl CleanedTimeline {
    pub fn points(&self) -> &[TimelinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// On-screen segments as `(page, start, duration)`; the last slide is held until
    /// `total_duration`.
    pub fn segments(&self, total_duration: f64) -> Vec<(usize, f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let end = self
                    .points
                    .get(i + 1)
                    .map_or(total_duration, |next| next.timestamp);
                (point.page, point.timestamp, (end - point.timestamp).max(0.0))
            })
            .collect()
    }

    /// Check every page against the number of rendered slides
    pub fn check_pages(&self, available: usize) -> Result<(), TimelineError> {
        match self.points.iter().find(|p| p.page >= available) {
            Some(point) => Err(TimelineError::PageOutOfRange {
                page: point.page,
                available,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CleanedTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for point in &self.points {
            writeln!(f, "  {} page {}", format_clock(point.timestamp), point.page)?;
        }
        Ok(())
    }
}

/// Maps raw slide switches through a set of cuts
pub struct TimelineRemapper<'a> {
    cuts: &'a IntervalSet,
    source_duration: Option<f64>,
}

impl<'a> TimelineRemapper<'a> {
    pub fn new(cuts: &'a IntervalSet) -> Self {
        Self {
            cuts,
            source_duration: None,
        }
    }

    /// Length of the original audio. Switches at or past it are never shown and get
    /// dropped.
    pub fn with_source_duration(mut self, duration: f64) -> Self {
        self.source_duration = Some(duration);
        self
    }

    /// Remap raw points (original audio coordinates, sorted ascending) onto the
    /// cleaned audio.
    pub fn remap(&self, raw: &[TimelinePoint]) -> Result<CleanedTimeline, TimelineError> {
        validate_points(raw)?;

        let mut emitted: Vec<TimelinePoint> = Vec::with_capacity(raw.len() + 1);
        // Page of the last switch swallowed by a cut since the previous emitted point.
        let mut pending_cut: Option<usize> = None;
        // Page of the last cut switch seen before anything survived.
        let mut dropped_before_first: Option<usize> = None;

        for point in raw {
            if let Some(duration) = self.source_duration {
                if point.timestamp >= duration {
                    warn!(
                        "Slide switch to page {} at {:.3}s is past the end of the audio ({:.3}s), ignoring",
                        point.page, point.timestamp, duration
                    );
                    continue;
                }
            }

            if self.cuts.is_cut(point.timestamp) {
                debug!("Dropping switch to page {} at {:.3}s: inside a cut", point.page, point.timestamp);
                pending_cut = Some(point.page);
                if emitted.is_empty() {
                    dropped_before_first = Some(point.page);
                }
                continue;
            }

            let shifted = TimelinePoint::new(point.timestamp - self.cuts.shift_for(point.timestamp), point.page);

            if pending_cut.take().is_some() {
                if let Some(last) = emitted.last() {
                    if last.page == shifted.page {
                        debug!("Dropping switch to page {} at {:.3}s: already visible after cut", point.page, point.timestamp);
                        continue;
                    }
                }
            }

            // Two switches at the same instant: only the later one is ever on screen.
            if emitted.last().is_some_and(|last| last.timestamp >= shifted.timestamp) {
                emitted.pop();
                if emitted.last().is_some_and(|last| last.page == shifted.page) {
                    debug!("Dropping switch to page {} at {:.3}s: page is already showing", point.page, point.timestamp);
                    continue;
                }
            }
            emitted.push(shifted);
        }

        let starts_at_zero = emitted.first().is_some_and(|p| p.timestamp <= 0.0);
        if !starts_at_zero {
            let page = dropped_before_first
                .or_else(|| emitted.first().map(|p| p.page))
                .unwrap_or(0);
            debug!("No slide at 0s after cuts, showing page {} from the start", page);

            if emitted.first().is_some_and(|p| p.page == page) {
                emitted[0].timestamp = 0.0;
            } else {
                emitted.insert(0, TimelinePoint::new(0.0, page));
            }
        }

        Ok(CleanedTimeline { points: emitted })
    }
}

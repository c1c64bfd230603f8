/*!
 * Cut intervals on the original audio timeline.
 *
 * An `IntervalSet` is the normalized form of a user-supplied cut list: sorted by start,
 * with overlapping and touching intervals merged so that for any two consecutive
 * intervals `a` and `b`, `a.end < b.start`. Intervals are half-open, `[start, end)`.
 */

use std::fmt;

use log::debug;

use crate::errors::TimelineError;

/// A single time range (seconds) removed from the original audio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutInterval {
    pub start: f64,
    pub end: f64,
}

impl CutInterval {
    /// Creates a validated interval
    pub fn new(start: f64, end: f64) -> Result<Self, TimelineError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(TimelineError::MalformedInterval {
                start,
                end,
                reason: "bounds must be finite numbers",
            });
        }
        if start < 0.0 || end < 0.0 {
            return Err(TimelineError::MalformedInterval {
                start,
                end,
                reason: "bounds must not be negative",
            });
        }
        if end <= start {
            return Err(TimelineError::MalformedInterval {
                start,
                end,
                reason: "end must be greater than start",
            });
        }
        Ok(Self { start, end })
    }

    /// Length of the interval in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for CutInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.start, self.end)
    }
}

/// Sorted, disjoint, non-adjacent set of cut intervals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    intervals: Vec<CutInterval>,
}

impl IntervalSet {
    /// An empty set: nothing is cut
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the set from raw `(start, end)` pairs in any order.
    ///
    /// Every pair is validated before anything is merged, so a single malformed pair
    /// rejects the whole list.
    pub fn new(raw: &[(f64, f64)]) -> Result<Self, TimelineError> {
        let mut intervals = raw
            .iter()
            .map(|&(start, end)| CutInterval::new(start, end))
            .collect::<Result<Vec<_>, _>>()?;

        intervals.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<CutInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }

        if merged.len() < raw.len() {
            debug!("Merged {} cut(s) into {} interval(s)", raw.len(), merged.len());
        }

        Ok(Self { intervals: merged })
    }

    /// The normalized intervals
    pub fn intervals(&self) -> &[CutInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Whether `t` falls inside a cut. A point on `start` is cut, a point on `end` is not.
    pub fn is_cut(&self, t: f64) -> bool {
        // First interval whose end is past t is the only candidate.
        let idx = self.intervals.partition_point(|i| i.end <= t);
        self.intervals.get(idx).is_some_and(|i| i.contains(t))
    }

    /// Duration removed before `t`: whole intervals ending at or before `t`, plus the
    /// part of an interval that `t` falls inside of.
    pub fn shift_for(&self, t: f64) -> f64 {
        let mut removed = 0.0;
        for interval in &self.intervals {
            if interval.end <= t {
                removed += interval.duration();
            } else {
                if interval.start < t {
                    removed += t - interval.start;
                }
                break;
            }
        }
        removed
    }

    /// Sum of all interval lengths
    pub fn total_removed(&self) -> f64 {
        self.intervals.iter().map(CutInterval::duration).sum()
    }

    /// Removed duration restricted to `[0, duration]`, for cut lists running past the
    /// end of the recording
    pub fn removed_within(&self, duration: f64) -> f64 {
        self.intervals
            .iter()
            .map(|i| (i.end.min(duration) - i.start).max(0.0))
            .sum()
    }

    /// Complement of the set within `[0, duration]`: the pieces of audio to keep
    pub fn kept_fragments(&self, duration: f64) -> Vec<(f64, f64)> {
        let mut fragments = Vec::with_capacity(self.intervals.len() + 1);
        let mut cursor = 0.0;
        for interval in &self.intervals {
            if cursor >= duration {
                break;
            }
            if cursor < interval.start {
                fragments.push((cursor, interval.start.min(duration)));
            }
            cursor = cursor.max(interval.end);
        }
        if cursor < duration {
            fragments.push((cursor, duration));
        }
        fragments
    }

    /// Shift every interval by `offset` seconds. Intervals pushed below zero are clamped
    /// at zero; intervals that end up empty are dropped.
    pub fn offset_by(&self, offset: f64) -> Self {
        let intervals = self
            .intervals
            .iter()
            .filter_map(|i| {
                let start = (i.start + offset).max(0.0);
                let end = i.end + offset;
                (end > start).then_some(CutInterval { start, end })
            })
            .collect();
        Self { intervals }
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.intervals.iter().map(|i| i.to_string()).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

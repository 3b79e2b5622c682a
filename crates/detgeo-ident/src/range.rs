//! Legal value sets for a single field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The legal values of one field inside one dictionary region.
///
/// A closed interval, an explicit list of values, or a list of closed
/// intervals. Lists are sorted, deduplicated and merged when the owning
/// dictionary is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRange {
    /// Every integer in `min..=max`.
    Bounded {
        /// Smallest legal value.
        min: i32,
        /// Largest legal value.
        max: i32,
    },
    /// An explicit list of legal values.
    Enumerated(Vec<i32>),
    /// Closed `(min, max)` intervals, ascending and disjoint. Unions of
    /// ranges with gaps take this form.
    Intervals(Vec<(i32, i32)>),
}

impl FieldRange {
    /// Shorthand for [`FieldRange::Bounded`].
    pub fn bounded(min: i32, max: i32) -> Self {
        Self::Bounded { min, max }
    }

    /// A range holding exactly one value.
    pub fn single(value: i32) -> Self {
        Self::Bounded {
            min: value,
            max: value,
        }
    }

    /// Shorthand for [`FieldRange::Enumerated`].
    pub fn values_of(values: impl IntoIterator<Item = i32>) -> Self {
        Self::Enumerated(values.into_iter().collect())
    }

    /// Whether the range admits no value at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bounded { min, max } => min > max,
            Self::Enumerated(values) => values.is_empty(),
            Self::Intervals(spans) => spans.iter().all(|&(lo, hi)| lo > hi),
        }
    }

    /// Number of legal values.
    pub fn len(&self) -> u64 {
        match self {
            Self::Bounded { min, max } if min <= max => (*max as i64 - *min as i64 + 1) as u64,
            Self::Bounded { .. } => 0,
            Self::Enumerated(values) => values.len() as u64,
            Self::Intervals(spans) => spans.iter().map(|&(lo, hi)| span_len(lo, hi)).sum(),
        }
    }

    /// Whether `value` is legal.
    pub fn contains(&self, value: i32) -> bool {
        match self {
            Self::Bounded { min, max } => (*min..=*max).contains(&value),
            Self::Enumerated(values) => values.binary_search(&value).is_ok(),
            Self::Intervals(spans) => {
                let k = spans.partition_point(|&(_, hi)| hi < value);
                spans.get(k).is_some_and(|&(lo, _)| lo <= value)
            }
        }
    }

    /// Smallest legal value.
    pub fn min(&self) -> Option<i32> {
        match self {
            Self::Bounded { min, max } => (min <= max).then_some(*min),
            Self::Enumerated(values) => values.first().copied(),
            Self::Intervals(spans) => spans.first().map(|&(lo, _)| lo),
        }
    }

    /// Largest legal value.
    pub fn max(&self) -> Option<i32> {
        match self {
            Self::Bounded { min, max } => (min <= max).then_some(*max),
            Self::Enumerated(values) => values.last().copied(),
            Self::Intervals(spans) => spans.last().map(|&(_, hi)| hi),
        }
    }

    /// Smallest legal value strictly greater than `value`.
    pub fn next_after(&self, value: i32) -> Option<i32> {
        match self {
            Self::Bounded { min, max } => {
                let candidate = value.checked_add(1)?.max(*min);
                (candidate <= *max).then_some(candidate)
            }
            Self::Enumerated(values) => {
                let pos = values.partition_point(|&v| v <= value);
                values.get(pos).copied()
            }
            Self::Intervals(spans) => {
                let k = spans.partition_point(|&(_, hi)| hi <= value);
                let (lo, _) = *spans.get(k)?;
                Some(lo.max(value + 1))
            }
        }
    }

    /// Largest legal value strictly smaller than `value`.
    pub fn prev_before(&self, value: i32) -> Option<i32> {
        match self {
            Self::Bounded { min, max } => {
                let candidate = value.checked_sub(1)?.min(*max);
                (candidate >= *min).then_some(candidate)
            }
            Self::Enumerated(values) => {
                let pos = values.partition_point(|&v| v < value);
                pos.checked_sub(1).map(|i| values[i])
            }
            Self::Intervals(spans) => {
                let k = spans.partition_point(|&(lo, _)| lo < value);
                let (_, hi) = spans[..k].last()?;
                Some((*hi).min(value - 1))
            }
        }
    }

    /// All legal values in ascending order.
    pub fn values(&self) -> Vec<i32> {
        match self {
            Self::Bounded { min, max } => (*min..=*max).collect(),
            Self::Enumerated(values) => values.clone(),
            Self::Intervals(spans) => spans.iter().flat_map(|&(lo, hi)| lo..=hi).collect(),
        }
    }

    /// The range as closed intervals, ascending and non-overlapping.
    pub(crate) fn intervals(&self) -> Vec<(i32, i32)> {
        match self {
            Self::Bounded { min, max } if min <= max => vec![(*min, *max)],
            Self::Bounded { .. } => Vec::new(),
            Self::Enumerated(values) => merge_intervals(values.iter().map(|&v| (v, v)).collect()),
            Self::Intervals(spans) => merge_intervals(spans.clone()),
        }
    }

    /// Sort and deduplicate lists in place; merge intervals.
    pub(crate) fn normalize(&mut self) {
        match self {
            Self::Bounded { .. } => {}
            Self::Enumerated(values) => {
                values.sort_unstable();
                values.dedup();
            }
            Self::Intervals(spans) => *spans = merge_intervals(std::mem::take(spans)),
        }
    }
}

impl fmt::Display for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded { min, max } if min == max => write!(f, "{min}"),
            Self::Bounded { min, max } => write!(f, "{min}:{max}"),
            Self::Enumerated(values) => {
                let joined: Vec<String> = values.iter().map(i32::to_string).collect();
                write!(f, "{{{}}}", joined.join(","))
            }
            Self::Intervals(spans) => {
                let joined: Vec<String> = spans
                    .iter()
                    .map(|&(lo, hi)| {
                        if lo == hi {
                            lo.to_string()
                        } else {
                            format!("{lo}:{hi}")
                        }
                    })
                    .collect();
                write!(f, "{{{}}}", joined.join(","))
            }
        }
    }
}

/// Number of integers in `lo..=hi`.
pub(crate) fn span_len(lo: i32, hi: i32) -> u64 {
    if lo <= hi {
        (hi as i64 - lo as i64 + 1) as u64
    } else {
        0
    }
}

/// Merge closed intervals into an ascending, non-overlapping,
/// non-adjacent list.
pub(crate) fn merge_intervals(mut intervals: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    intervals.retain(|&(lo, hi)| lo <= hi);
    intervals.sort_unstable();
    let mut merged: Vec<(i32, i32)> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals {
        match merged.last_mut() {
            Some(last) if lo as i64 <= last.1 as i64 + 1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

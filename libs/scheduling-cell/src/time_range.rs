// libs/scheduling-cell/src/time_range.rs
//
// Interval arithmetic over the minutes of a single operating day.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minute offset from the start of the operating day.
pub type Minute = u32;

pub const DAY_END: Minute = 24 * 60;

/// Half-open interval `[start, end)` of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Minute,
    pub end: Minute,
}

impl TimeRange {
    pub const fn new(start: Minute, end: Minute) -> Self {
        Self { start, end }
    }

    /// `start < end` and the range stays inside the day.
    pub fn is_valid(&self) -> bool {
        self.start < self.end && self.end <= DAY_END
    }

    pub fn len(&self) -> Minute {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then(|| TimeRange::new(start, end))
    }

    /// Remove `other` from `self`, yielding the left and right remainders.
    pub fn subtract(&self, other: &TimeRange) -> (Option<TimeRange>, Option<TimeRange>) {
        if !self.overlaps(other) {
            return (Some(*self), None);
        }

        let left = (self.start < other.start).then(|| TimeRange::new(self.start, other.start));
        let right = (other.end < self.end).then(|| TimeRange::new(other.end, self.end));
        (left, right)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeSetError {
    #[error("range {}-{} does not start before it ends", .0.start, .0.end)]
    Inverted(TimeRange),

    #[error("range {}-{} extends past the end of the day", .0.start, .0.end)]
    OutOfDay(TimeRange),

    #[error("ranges {}-{} and {}-{} overlap", .0.start, .0.end, .1.start, .1.end)]
    Overlapping(TimeRange, TimeRange),
}

/// Validate a set of ranges and return it sorted with touching ranges merged.
///
/// Fails on any inverted or empty range and on any overlap. Ranges that only
/// touch (`a.end == b.start`) are legal and get coalesced.
pub fn normalize(ranges: &[TimeRange]) -> Result<Vec<TimeRange>, RangeSetError> {
    let mut sorted = Vec::with_capacity(ranges.len());
    for range in ranges {
        if range.start >= range.end {
            return Err(RangeSetError::Inverted(*range));
        }
        if range.end > DAY_END {
            return Err(RangeSetError::OutOfDay(*range));
        }
        sorted.push(*range);
    }
    sorted.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        if let Some(last) = merged.last_mut() {
            if last.overlaps(&range) {
                return Err(RangeSetError::Overlapping(*last, range));
            }
            if last.end == range.start {
                last.end = range.end;
                continue;
            }
        }
        merged.push(range);
    }

    Ok(merged)
}

/// Whether `slot` lies entirely inside one range of a normalised set.
pub fn covered_by(ranges: &[TimeRange], slot: &TimeRange) -> bool {
    ranges.iter().any(|range| range.contains(slot))
}

/// `available − taken` for a sorted, disjoint `available` and sorted, disjoint `taken`.
pub fn subtract_all<'a, I>(available: &[TimeRange], taken: I) -> Vec<TimeRange>
where
    I: IntoIterator<Item = &'a TimeRange>,
    I::IntoIter: Clone,
{
    let taken = taken.into_iter();
    let mut free = Vec::new();

    for range in available {
        let mut remaining = Some(*range);
        for busy in taken.clone() {
            let Some(current) = remaining else {
                break;
            };
            if busy.end <= current.start {
                continue;
            }
            if busy.start >= current.end {
                break;
            }
            let (left, right) = current.subtract(busy);
            free.extend(left);
            remaining = right;
        }
        free.extend(remaining);
    }

    free
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: Minute, end: Minute) -> TimeRange {
        TimeRange::new(start, end)
    }

    #[test]
    fn test_overlap_and_containment() {
        assert!(r(540, 600).overlaps(&r(570, 630)));
        assert!(!r(540, 600).overlaps(&r(600, 660)));
        assert!(r(540, 720).contains(&r(600, 630)));
        assert!(!r(540, 600).contains(&r(570, 630)));
        assert_eq!(r(540, 600).intersect(&r(570, 630)), Some(r(570, 600)));
        assert_eq!(r(540, 600).intersect(&r(600, 630)), None);
    }

    #[test]
    fn test_subtract() {
        assert_eq!(r(540, 720).subtract(&r(600, 630)), (Some(r(540, 600)), Some(r(630, 720))));
        assert_eq!(r(540, 720).subtract(&r(540, 600)), (None, Some(r(600, 720))));
        assert_eq!(r(540, 720).subtract(&r(500, 800)), (None, None));
        assert_eq!(r(540, 600).subtract(&r(700, 800)), (Some(r(540, 600)), None));
    }

    #[test]
    fn test_normalize_sorts_and_merges_touching_ranges() {
        let normalized = normalize(&[r(780, 840), r(540, 600), r(600, 660)]).unwrap();
        assert_eq!(normalized, vec![r(540, 660), r(780, 840)]);
    }

    #[test]
    fn test_normalize_rejects_invalid_sets() {
        assert_eq!(normalize(&[r(600, 600)]), Err(RangeSetError::Inverted(r(600, 600))));
        assert_eq!(normalize(&[r(660, 600)]), Err(RangeSetError::Inverted(r(660, 600))));
        assert_eq!(normalize(&[r(1400, 1500)]), Err(RangeSetError::OutOfDay(r(1400, 1500))));
        assert!(matches!(
            normalize(&[r(540, 630), r(600, 660)]),
            Err(RangeSetError::Overlapping(_, _))
        ));
        assert_eq!(normalize(&[]), Ok(vec![]));
    }

    #[test]
    fn test_subtract_all() {
        let available = vec![r(540, 570), r(600, 720)];
        let taken = vec![r(600, 630), r(660, 690)];
        assert_eq!(
            subtract_all(&available, &taken),
            vec![r(540, 570), r(630, 660), r(690, 720)]
        );
        assert_eq!(subtract_all(&available, &Vec::<TimeRange>::new()), available);
        assert_eq!(subtract_all(&[r(540, 600)], &[r(540, 600)]), vec![]);
    }
}

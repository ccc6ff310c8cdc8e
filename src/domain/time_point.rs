// Time-series domain models
use crate::domain::error::GraphError;
use std::collections::BTreeMap;
use std::fmt;

/// Milliseconds since the Unix epoch, UTC.
pub type TimestampMs = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub time_ms: TimestampMs,
    pub fields: BTreeMap<String, f64>,
}

impl TimePoint {
    pub fn new(time_ms: TimestampMs, fields: BTreeMap<String, f64>) -> Self {
        Self { time_ms, fields }
    }

    /// A sample with every named field set to zero.
    pub fn zeroed<'a>(time_ms: TimestampMs, names: impl IntoIterator<Item = &'a str>) -> Self {
        let fields = names.into_iter().map(|n| (n.to_string(), 0.0)).collect();
        Self { time_ms, fields }
    }

    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }
}

/// A half-open time range `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDomain {
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
}

impl TimeDomain {
    pub fn new(start_ms: TimestampMs, end_ms: TimestampMs) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_ms() as f64 / 60_000.0
    }

    pub fn shifted(&self, delta_ms: i64) -> Self {
        Self::new(self.start_ms + delta_ms, self.end_ms + delta_ms)
    }

    pub fn covers(&self, other: TimeDomain) -> bool {
        self.start_ms <= other.start_ms && other.end_ms <= self.end_ms
    }
}

/// Resolution a dataset was fetched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetTag {
    Reduced,
    Full,
    Tier(u64),
}

impl fmt::Display for DatasetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetTag::Reduced => write!(f, "Reduced"),
            DatasetTag::Full => write!(f, "Full"),
            DatasetTag::Tier(threshold) => write!(f, "Tier({})", threshold),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub range: TimeDomain,
    pub tag: DatasetTag,
    points: Vec<TimePoint>,
}

impl Dataset {
    /// Builds a dataset, rejecting points that are not in ascending time order.
    pub fn new(
        range: TimeDomain,
        tag: DatasetTag,
        points: Vec<TimePoint>,
    ) -> Result<Self, GraphError> {
        if !points.is_sorted_by_key(|p| p.time_ms) {
            return Err(GraphError::MalformedResponse(format!(
                "{} dataset points are not in ascending time order",
                tag
            )));
        }
        Ok(Self { range, tag, points })
    }

    /// Two zero-valued samples at exactly the range bounds, so the axis has a
    /// non-empty domain to render against.
    pub fn placeholder<'a>(
        range: TimeDomain,
        tag: DatasetTag,
        names: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Self {
        let points = vec![
            TimePoint::zeroed(range.start_ms, names.clone()),
            TimePoint::zeroed(range.end_ms, names),
        ];
        Self { range, tag, points }
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time span actually covered by the samples.
    pub fn span(&self) -> Option<TimeDomain> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some(TimeDomain::new(first.time_ms, last.time_ms)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time_ms: i64) -> TimePoint {
        TimePoint::new(time_ms, BTreeMap::from([("steps".to_string(), 1.0)]))
    }

    #[test]
    fn test_rejects_unsorted_points() {
        let range = TimeDomain::new(0, 100);
        let result = Dataset::new(range, DatasetTag::Full, vec![point(50), point(10)]);
        assert!(matches!(result, Err(GraphError::MalformedResponse(_))));

        let dataset = Dataset::new(range, DatasetTag::Full, vec![point(10), point(10), point(50)])
            .unwrap();
        assert_eq!(dataset.span(), Some(TimeDomain::new(10, 50)));
    }

    #[test]
    fn test_covers_needs_both_edges_inside() {
        let day = TimeDomain::new(0, 1_000);
        assert!(day.covers(day));
        assert!(day.covers(TimeDomain::new(100, 900)));
        assert!(!day.covers(TimeDomain::new(500, 1_500)));
        assert!(!day.covers(TimeDomain::new(-1, 900)));
    }

    #[test]
    fn test_placeholder_spans_range_with_zeroes() {
        let range = TimeDomain::new(1_000, 9_000);
        let dataset = Dataset::placeholder(range, DatasetTag::Reduced, ["heart_rate", "steps"]);

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.points()[0].time_ms, 1_000);
        assert_eq!(dataset.points()[1].time_ms, 9_000);
        for p in dataset.points() {
            assert_eq!(p.value("heart_rate"), Some(0.0));
            assert_eq!(p.value("steps"), Some(0.0));
        }
    }
}

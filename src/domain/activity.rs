// Activity regions anchored to the time axis
use crate::domain::time_point::{TimeDomain, TimestampMs};
use crate::domain::tier::DateGranularity;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRegion {
    pub id: String,
    pub kind: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
    pub stats: BTreeMap<String, f64>,
}

impl ActivityRegion {
    pub fn new(
        kind: String,
        start_ms: TimestampMs,
        end_ms: TimestampMs,
        stats: BTreeMap<String, f64>,
    ) -> Self {
        let id = Self::format_id(start_ms);
        Self {
            id,
            kind,
            start_ms,
            end_ms,
            stats,
        }
    }

    fn format_id(start_ms: TimestampMs) -> String {
        // "activity-2015-03-03 07:30Z"
        let start = DateTime::<Utc>::from_timestamp_millis(start_ms)
            .map(|t| t.format(DateGranularity::Minute.format()).to_string())
            .unwrap_or_else(|| start_ms.to_string());
        format!("activity-{}", start)
    }

    pub fn intersects(&self, domain: TimeDomain) -> bool {
        !(self.end_ms < domain.start_ms || self.start_ms > domain.end_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_uses_minute_start() {
        // 2015-03-03 07:30:09Z
        let region = ActivityRegion::new("walk".to_string(), 1_425_367_809_000, 1_425_368_447_000, BTreeMap::new());
        assert_eq!(region.id, "activity-2015-03-03 07:30Z");
    }

    #[test]
    fn test_intersects() {
        let region = ActivityRegion::new("run".to_string(), 100, 200, BTreeMap::new());
        assert!(region.intersects(TimeDomain::new(150, 300)));
        assert!(region.intersects(TimeDomain::new(0, 100)));
        assert!(!region.intersects(TimeDomain::new(201, 300)));
        assert!(!region.intersects(TimeDomain::new(0, 99)));
    }
}

// Viewport windower - Selects the samples relevant to the visible domain
use crate::domain::time_point::{TimeDomain, TimePoint};
use std::ops::Range;

/// Samples kept past each edge of the domain so lines and bars are not clipped.
const EDGE_PADDING: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibleWindow {
    pub range: Range<usize>,
    /// Extra bar slots reserved when the window runs into the start of the data.
    pub pad_start: usize,
    /// Extra bar slots reserved when the window runs into the end of the data.
    pub pad_end: usize,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn slice<'a>(&self, points: &'a [TimePoint]) -> &'a [TimePoint] {
        &points[self.range.clone()]
    }
}

/// Returns the window of `points` (sorted by time) that covers `domain`.
///
/// An empty window means no sample is currently visible. Boundaries are found
/// by probing at one and two thirds of the data and walking linearly toward
/// the domain edge, which is fast for evenly spaced samples. Irregular spacing
/// only lengthens the walk.
pub fn window_visible(points: &[TimePoint], domain: TimeDomain) -> VisibleWindow {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return VisibleWindow::default();
    };

    if domain.end_ms < first.time_ms || domain.start_ms > last.time_ms {
        return VisibleWindow::default();
    }

    let len = points.len();
    let third = len / 3;

    let lower = walk_lower_bound(points, third, domain.start_ms);
    let upper = walk_upper_bound(points, (2 * third).min(len - 1), domain.end_ms);

    let start = lower.saturating_sub(EDGE_PADDING);
    let end = (upper + EDGE_PADDING).min(len).max(start);

    VisibleWindow {
        range: start..end,
        pad_start: if start == 0 { EDGE_PADDING } else { 0 },
        pad_end: if end == len { EDGE_PADDING } else { 0 },
    }
}

/// Width available to each bar when the window fills `viewport_width_px`.
pub fn bar_width(viewport_width_px: f64, window: &VisibleWindow) -> f64 {
    let slots = window.len() + window.pad_start + window.pad_end;
    if slots == 0 {
        return viewport_width_px;
    }
    viewport_width_px / slots as f64
}

/// First index whose time is `>= start_ms`, walking from `probe`.
fn walk_lower_bound(points: &[TimePoint], probe: usize, start_ms: i64) -> usize {
    let mut i = probe;
    if points[i].time_ms < start_ms {
        while i < points.len() && points[i].time_ms < start_ms {
            i += 1;
        }
    } else {
        while i > 0 && points[i - 1].time_ms >= start_ms {
            i -= 1;
        }
    }
    i
}

/// First index whose time is `> end_ms`, walking from `probe`.
fn walk_upper_bound(points: &[TimePoint], probe: usize, end_ms: i64) -> usize {
    let mut i = probe;
    if points[i].time_ms <= end_ms {
        while i < points.len() && points[i].time_ms <= end_ms {
            i += 1;
        }
    } else {
        while i > 0 && points[i - 1].time_ms > end_ms {
            i -= 1;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn series(times: impl IntoIterator<Item = i64>) -> Vec<TimePoint> {
        times
            .into_iter()
            .map(|t| TimePoint::new(t, BTreeMap::from([("steps".to_string(), t as f64)])))
            .collect()
    }

    fn minute_series(count: i64) -> Vec<TimePoint> {
        series((0..count).map(|i| i * 60_000))
    }

    #[test]
    fn test_domain_outside_data_is_empty() {
        let points = minute_series(100);
        let before = TimeDomain::new(-500_000, -1);
        let after = TimeDomain::new(100 * 60_000, 200 * 60_000);

        assert!(window_visible(&points, before).is_empty());
        assert!(window_visible(&points, after).is_empty());
        assert!(window_visible(&[], TimeDomain::new(0, 10)).is_empty());
    }

    #[test]
    fn test_window_brackets_domain_within_padding() {
        let points = minute_series(1_000);

        for (start_min, end_min) in [(10, 20), (0, 999), (333, 334), (500, 900), (1, 3), (990, 998)] {
            let domain = TimeDomain::new(start_min * 60_000, end_min * 60_000);
            let window = window_visible(&points, domain);
            let visible = window.slice(&points);

            let first = visible.first().unwrap().time_ms;
            let last = visible.last().unwrap().time_ms;
            assert!(first <= domain.start_ms, "{:?}", domain);
            assert!(last >= domain.end_ms, "{:?}", domain);

            let before = visible.iter().filter(|p| p.time_ms < domain.start_ms).count();
            let after = visible.iter().filter(|p| p.time_ms > domain.end_ms).count();
            assert!(before <= 2 && after <= 2, "{:?}: {} / {}", domain, before, after);
        }
    }

    #[test]
    fn test_window_is_deterministic() {
        let points = series([0, 5, 7, 100, 101, 150, 400, 401, 402, 900]);
        let domain = TimeDomain::new(90, 410);

        let first = window_visible(&points, domain);
        let second = window_visible(&points, domain);
        assert_eq!(first, second);
        assert_eq!(first.range, 1..10);
    }

    #[test]
    fn test_padding_flags_at_data_edges() {
        let points = minute_series(100);

        let full = window_visible(&points, TimeDomain::new(0, 99 * 60_000));
        assert_eq!(full.range, 0..100);
        assert_eq!((full.pad_start, full.pad_end), (2, 2));

        let inner = window_visible(&points, TimeDomain::new(40 * 60_000, 60 * 60_000));
        assert_eq!(inner.range, 38..63);
        assert_eq!((inner.pad_start, inner.pad_end), (0, 0));
    }

    #[test]
    fn test_small_datasets() {
        let points = series([10, 20]);
        let window = window_visible(&points, TimeDomain::new(0, 30));
        assert_eq!(window.range, 0..2);

        let single = series([10]);
        assert_eq!(window_visible(&single, TimeDomain::new(10, 10)).range, 0..1);
    }

    #[test]
    fn test_bar_width_counts_edge_padding() {
        let window = VisibleWindow {
            range: 0..16,
            pad_start: 2,
            pad_end: 2,
        };
        assert_eq!(bar_width(400.0, &window), 20.0);
        assert_eq!(bar_width(400.0, &VisibleWindow::default()), 400.0);
    }
}

// Tier resolver - Picks the fetch resolution for a visible duration
use crate::domain::tier::{DownsamplingTier, TierTable};

/// Chooses the tier for `visible_ms` given the ratio of new to old zoom scale.
///
/// Zooming in (`zoom_direction > 1`) takes the finest tier still covering the
/// visible span; zooming out takes the coarsest tier that does not overshoot
/// it. An unchanged scale keeps `current`.
pub fn resolve_tier<'a>(
    table: &'a TierTable,
    visible_ms: u64,
    zoom_direction: f64,
    current: &'a DownsamplingTier,
) -> &'a DownsamplingTier {
    let tiers = table.tiers();

    if zoom_direction > 1.0 {
        return tiers
            .iter()
            .rev()
            .find(|t| t.threshold_ms <= visible_ms)
            .unwrap_or(table.finest());
    }

    if zoom_direction < 1.0 {
        return tiers
            .iter()
            .rev()
            .find(|t| t.threshold_ms < visible_ms)
            .unwrap_or(table.finest());
    }

    current
}

/// Scales the tier's reference density to the visible span.
pub fn target_point_count(visible_ms: u64, tier: &DownsamplingTier) -> u32 {
    (visible_ms as f64 / tier.threshold_ms as f64 * tier.point_count as f64).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTH: u64 = 2_629_746_000;
    const TWO_MONTHS: u64 = 5_256_900_000;
    const THREE_MONTHS: u64 = 7_889_000_000;
    const SIX_MONTHS: u64 = 15_778_476_000;
    const YEAR: u64 = 31_556_952_000;
    const TEN_YEARS: u64 = 315_569_520_000;

    fn table() -> TierTable {
        TierTable::new(vec![
            DownsamplingTier::new(MONTH, 31),
            DownsamplingTier::new(TWO_MONTHS, 31),
            DownsamplingTier::new(THREE_MONTHS, 40),
            DownsamplingTier::new(SIX_MONTHS, 40),
            DownsamplingTier::new(YEAR, 70),
            DownsamplingTier::new(TEN_YEARS, 200),
        ])
        .unwrap()
    }

    #[test]
    fn test_zoom_in_picks_largest_threshold_at_or_below_duration() {
        let table = table();
        let current = *table.coarsest();

        for (visible, expected) in [
            (MONTH, MONTH),
            (MONTH + 1, MONTH),
            (TWO_MONTHS - 1, MONTH),
            (TWO_MONTHS, TWO_MONTHS),
            (SIX_MONTHS, SIX_MONTHS),
            (YEAR - 1, SIX_MONTHS),
            (TEN_YEARS * 2, TEN_YEARS),
        ] {
            let tier = resolve_tier(&table, visible, 2.0, &current);
            assert_eq!(tier.threshold_ms, expected, "visible = {}", visible);
            assert!(tier.threshold_ms <= visible);
        }
    }

    #[test]
    fn test_zoom_in_below_every_threshold_returns_finest() {
        let table = table();
        let current = *table.coarsest();
        let tier = resolve_tier(&table, 86_400_000, 4.0, &current);
        assert_eq!(tier.threshold_ms, MONTH);
    }

    #[test]
    fn test_zoom_out_picks_coarsest_tier_below_duration() {
        let table = table();
        let current = *table.finest();

        for (visible, expected) in [
            (MONTH, MONTH),
            (MONTH + 1, MONTH),
            (TWO_MONTHS, MONTH),
            (TWO_MONTHS + 1, TWO_MONTHS),
            (YEAR, SIX_MONTHS),
            (YEAR + 1, YEAR),
            (TEN_YEARS * 3, TEN_YEARS),
        ] {
            let tier = resolve_tier(&table, visible, 0.5, &current);
            assert_eq!(tier.threshold_ms, expected, "visible = {}", visible);
        }
    }

    #[test]
    fn test_zoom_out_past_every_threshold_returns_coarsest() {
        let table = TierTable::new(vec![
            DownsamplingTier::new(MONTH, 31),
            DownsamplingTier::new(YEAR, 70),
        ])
        .unwrap();
        let current = *table.finest();

        let tier = resolve_tier(&table, 40_000_000_000, 0.5, &current);
        assert_eq!(tier.threshold_ms, YEAR);
        assert_eq!(tier.point_count, 70);
    }

    #[test]
    fn test_unchanged_scale_keeps_current_tier() {
        let table = table();
        let current = DownsamplingTier::new(THREE_MONTHS, 40);
        let tier = resolve_tier(&table, TEN_YEARS * 5, 1.0, &current);
        assert_eq!(*tier, current);
    }

    #[test]
    fn test_target_point_count_scales_density() {
        let tier = DownsamplingTier::new(YEAR, 70);
        assert_eq!(target_point_count(YEAR, &tier), 70);
        assert_eq!(target_point_count(YEAR / 2, &tier), 35);
        assert_eq!(target_point_count(40_000_000_000, &tier), 88);
    }
}

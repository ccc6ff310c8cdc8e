// Viewport and scale models
use crate::domain::time_point::{TimeDomain, TimestampMs};

/// Scale and horizontal translation applied on top of the base domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate_px: f64,
}

impl ZoomTransform {
    pub fn new(scale: f64, translate_px: f64) -> Self {
        Self {
            scale,
            translate_px,
        }
    }

    pub fn is_identity_scale(&self) -> bool {
        self.scale == 1.0
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

/// Maps a time domain onto `[0, width_px]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub domain: TimeDomain,
    pub width_px: f64,
}

impl TimeScale {
    pub fn new(domain: TimeDomain, width_px: f64) -> Self {
        Self { domain, width_px }
    }

    pub fn to_px(&self, time_ms: TimestampMs) -> f64 {
        let span = self.domain.duration_ms() as f64;
        if span <= 0.0 {
            return 0.0;
        }
        (time_ms - self.domain.start_ms) as f64 / span * self.width_px
    }

    pub fn invert(&self, px: f64) -> TimestampMs {
        if self.width_px <= 0.0 {
            return self.domain.start_ms;
        }
        let span = self.domain.duration_ms() as f64;
        self.domain.start_ms + (px / self.width_px * span).round() as i64
    }
}

/// Linear value scale, `domain` mapped onto `[bottom_px, top_px]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub bottom_px: f64,
    pub top_px: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), bottom_px: f64, top_px: f64) -> Self {
        Self {
            domain,
            bottom_px,
            top_px,
        }
    }

    pub fn to_px(&self, value: f64) -> f64 {
        let (lo, hi) = self.domain;
        if hi == lo {
            return self.bottom_px;
        }
        self.bottom_px + (value - lo) / (hi - lo) * (self.top_px - self.bottom_px)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    base: TimeDomain,
    width_px: f64,
    max_scale: f64,
    transform: ZoomTransform,
}

impl Viewport {
    pub fn new(base: TimeDomain, width_px: f64, max_scale: f64) -> Self {
        Self {
            base,
            width_px,
            max_scale,
            transform: ZoomTransform::default(),
        }
    }

    pub fn base(&self) -> TimeDomain {
        self.base
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Replaces the base domain and resets the zoom.
    pub fn reset(&mut self, base: TimeDomain) {
        self.base = base;
        self.transform = ZoomTransform::default();
    }

    /// Applies a transform, clamping scale to `[1, max_scale]` and translation
    /// so the base domain always covers the viewport.
    pub fn apply(&mut self, requested: ZoomTransform) -> ZoomTransform {
        let scale = if requested.scale.is_finite() {
            requested.scale.clamp(1.0, self.max_scale)
        } else {
            self.transform.scale
        };
        let translate = if requested.translate_px.is_finite() {
            requested.translate_px
        } else {
            self.transform.translate_px
        };
        let tx = translate.max(self.width_px * (1.0 - scale)).min(0.0);

        self.transform = ZoomTransform::new(scale, tx);
        self.transform
    }

    pub fn visible_domain(&self) -> TimeDomain {
        let ZoomTransform {
            scale,
            translate_px,
        } = self.transform;
        let base_scale = TimeScale::new(self.base, self.width_px);
        TimeDomain::new(
            base_scale.invert(-translate_px / scale),
            base_scale.invert((self.width_px - translate_px) / scale),
        )
    }

    pub fn time_scale(&self) -> TimeScale {
        TimeScale::new(self.visible_domain(), self.width_px)
    }

    /// Moves the visible domain by `delta_ms` without changing the scale.
    pub fn shift_by(&mut self, delta_ms: f64) -> ZoomTransform {
        let span = self.base.duration_ms() as f64;
        if span <= 0.0 {
            return self.transform;
        }
        let ZoomTransform {
            scale,
            translate_px,
        } = self.transform;
        let dx = delta_ms / span * self.width_px * scale;
        self.apply(ZoomTransform::new(scale, translate_px - dx))
    }

    /// Sets the transform whose visible domain matches `target`, within clamping.
    pub fn zoom_to(&mut self, target: TimeDomain) -> ZoomTransform {
        let span = self.base.duration_ms() as f64;
        let target_span = target.duration_ms() as f64;
        if span <= 0.0 || target_span <= 0.0 {
            return self.transform;
        }
        let scale = (span / target_span).clamp(1.0, self.max_scale);
        let start_px = TimeScale::new(self.base, self.width_px).to_px(target.start_ms);
        self.apply(ZoomTransform::new(scale, -start_px * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn viewport() -> Viewport {
        Viewport::new(TimeDomain::new(0, DAY_MS), 1000.0, 200.0)
    }

    #[test]
    fn test_identity_shows_base_domain() {
        let vp = viewport();
        assert_eq!(vp.visible_domain(), TimeDomain::new(0, DAY_MS));
    }

    #[test]
    fn test_scale_and_translate_are_clamped() {
        let mut vp = viewport();
        let t = vp.apply(ZoomTransform::new(0.5, 40.0));
        assert_eq!(t, ZoomTransform::new(1.0, 0.0));

        let t = vp.apply(ZoomTransform::new(2.0, -5000.0));
        assert_eq!(t, ZoomTransform::new(2.0, -1000.0));
        assert_eq!(vp.visible_domain(), TimeDomain::new(DAY_MS / 2, DAY_MS));

        let t = vp.apply(ZoomTransform::new(500.0, 0.0));
        assert_eq!(t.scale, 200.0);
    }

    #[test]
    fn test_shift_moves_visible_start() {
        let mut vp = viewport();
        vp.apply(ZoomTransform::new(4.0, 0.0));
        vp.shift_by(3_600_000.0);
        assert_eq!(vp.visible_domain().start_ms, 3_600_000);
    }

    #[test]
    fn test_zoom_to_matches_target() {
        let mut vp = viewport();
        let target = TimeDomain::new(6 * 3_600_000, 12 * 3_600_000);
        vp.zoom_to(target);
        assert_eq!(vp.visible_domain(), target);
    }

    #[test]
    fn test_linear_scale_maps_bottom_to_top() {
        let y = LinearScale::new((0.0, 200.0), 400.0, 50.0);
        assert_eq!(y.to_px(0.0), 400.0);
        assert_eq!(y.to_px(200.0), 50.0);
        assert_eq!(y.to_px(100.0), 225.0);
    }
}

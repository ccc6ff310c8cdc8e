// Gesture tracker - Zoom/pan classification, pan velocity and double taps
use crate::domain::interaction::InteractionState;

/// Velocity samples averaged when a pan turns into a fling.
const FLING_SAMPLE_COUNT: usize = 3;

/// Initial conditions of an inertial pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingStart {
    /// Domain movement per update tick, in milliseconds of time.
    pub velocity_ms: f64,
    /// `1.0` when moving forward in time, `-1.0` when moving backward.
    pub direction: f64,
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    state: InteractionState,
    prev_scale: f64,
    prev_start_ms: i64,
    last_update_ms: i64,
    velocity: Vec<f64>,
    direction: f64,
    last_touch_ms: Option<i64>,
    double_tap_ms: i64,
    fling_window_ms: i64,
}

impl GestureTracker {
    pub fn new(double_tap_ms: i64, fling_window_ms: i64) -> Self {
        Self {
            state: InteractionState::Idle,
            prev_scale: 1.0,
            prev_start_ms: 0,
            last_update_ms: 0,
            velocity: Vec::new(),
            direction: 0.0,
            last_touch_ms: None,
            double_tap_ms,
            fling_window_ms,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn set_state(&mut self, state: InteractionState) {
        self.state = state;
    }

    pub fn is_panning(&self) -> bool {
        self.state == InteractionState::Panning
    }

    /// At unity scale the gesture can only be a zoom. Otherwise this is the
    /// continuation of an existing zoom level and classification waits for
    /// the first update.
    pub fn start(&mut self, scale: f64, domain_start_ms: i64) {
        self.prev_scale = scale;
        self.prev_start_ms = domain_start_ms;
        self.velocity.clear();
        self.direction = 0.0;

        if scale == 1.0 {
            self.state = InteractionState::Zooming;
        }
    }

    pub fn update(&mut self, scale: f64, domain_start_ms: i64, now_ms: i64) -> InteractionState {
        self.last_update_ms = now_ms;

        if scale != 1.0 && scale == self.prev_scale && domain_start_ms != self.prev_start_ms {
            self.velocity
                .push((self.prev_start_ms - domain_start_ms).abs() as f64);
            self.direction = if self.prev_start_ms < domain_start_ms {
                1.0
            } else {
                -1.0
            };
            self.state = InteractionState::Panning;
            // a swipe is not a tap
            self.last_touch_ms = None;
        } else {
            self.state = InteractionState::Zooming;
        }

        self.prev_scale = scale;
        self.prev_start_ms = domain_start_ms;
        self.state
    }

    /// Ends the gesture. Returns the fling to run when a pan was released
    /// while still moving; the state is left as `Panning` in that case and
    /// reset to `Idle` otherwise.
    pub fn end(&mut self, now_ms: i64) -> Option<FlingStart> {
        let quick_release = now_ms - self.last_update_ms < self.fling_window_ms;

        if self.is_panning() && quick_release {
            let recent = &self.velocity[self.velocity.len().saturating_sub(FLING_SAMPLE_COUNT)..];
            if !recent.is_empty() {
                let velocity_ms = recent.iter().sum::<f64>() / recent.len() as f64;
                if velocity_ms > 0.0 {
                    return Some(FlingStart {
                        velocity_ms,
                        direction: self.direction,
                    });
                }
            }
        }

        self.state = InteractionState::Idle;
        None
    }

    /// Records a touch and reports whether it completes a double tap.
    pub fn register_touch(&mut self, now_ms: i64, touches: usize) -> bool {
        if touches != 1 {
            self.last_touch_ms = None;
            return false;
        }

        match self.last_touch_ms {
            Some(last) if now_ms - last < self.double_tap_ms => {
                self.last_touch_ms = None;
                true
            }
            _ => {
                self.last_touch_ms = Some(now_ms);
                false
            }
        }
    }

    pub fn cancel_tap(&mut self) {
        self.last_touch_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> GestureTracker {
        GestureTracker::new(500, 250)
    }

    #[test]
    fn test_double_tap_window() {
        let mut gestures = tracker();
        assert!(!gestures.register_touch(1_000, 1));
        assert!(gestures.register_touch(1_300, 1));

        let mut gestures = tracker();
        assert!(!gestures.register_touch(1_000, 1));
        assert!(!gestures.register_touch(1_600, 1));
    }

    #[test]
    fn test_multi_finger_touch_resets_double_tap() {
        let mut gestures = tracker();
        assert!(!gestures.register_touch(1_000, 1));
        assert!(!gestures.register_touch(1_100, 2));
        assert!(!gestures.register_touch(1_200, 1));
        assert!(gestures.register_touch(1_300, 1));
    }

    #[test]
    fn test_start_at_unity_scale_is_zoom() {
        let mut gestures = tracker();
        gestures.start(1.0, 0);
        assert_eq!(gestures.state(), InteractionState::Zooming);

        let mut gestures = tracker();
        gestures.start(2.0, 0);
        assert_eq!(gestures.state(), InteractionState::Idle);
    }

    #[test]
    fn test_constant_scale_with_moving_domain_is_pan() {
        let mut gestures = tracker();
        gestures.start(2.0, 1_000);

        assert_eq!(gestures.update(2.0, 1_500, 10), InteractionState::Panning);
        assert_eq!(gestures.update(2.5, 1_600, 20), InteractionState::Zooming);
        assert_eq!(gestures.update(2.5, 1_600, 30), InteractionState::Zooming);
        assert_eq!(gestures.update(2.5, 1_400, 40), InteractionState::Panning);
    }

    #[test]
    fn test_quick_release_flings_with_recent_average() {
        let mut gestures = tracker();
        gestures.start(2.0, 0);
        for (i, start) in [100, 1_100, 2_100, 3_100, 4_100].into_iter().enumerate() {
            gestures.update(2.0, start, i as i64 * 10);
        }

        let fling = gestures.end(100).unwrap();
        assert_eq!(fling.velocity_ms, 1_000.0);
        assert_eq!(fling.direction, 1.0);
        assert_eq!(gestures.state(), InteractionState::Panning);
    }

    #[test]
    fn test_backward_pan_flings_backward() {
        let mut gestures = tracker();
        gestures.start(2.0, 5_000);
        for (i, start) in [4_000, 3_000, 2_000].into_iter().enumerate() {
            gestures.update(2.0, start, i as i64 * 10);
        }

        let fling = gestures.end(40).unwrap();
        assert_eq!(fling.velocity_ms, 1_000.0);
        assert_eq!(fling.direction, -1.0);
    }

    #[test]
    fn test_slow_release_goes_idle() {
        let mut gestures = tracker();
        gestures.start(2.0, 0);
        gestures.update(2.0, 500, 0);
        gestures.update(2.0, 200, 10);

        assert_eq!(gestures.end(300), None);
        assert_eq!(gestures.state(), InteractionState::Idle);
    }
}

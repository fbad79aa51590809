use tracing::warn;

/// Milliseconds of slack when comparing against a fractional frame interval on an integer clock.
const PACER_SLACK_MS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDelta {
    /// Delta fed to frame-local state; 0 when the raw delta was discarded.
    pub dt_ms: u64,
    pub raw_ms: u64,
    pub discarded: bool,
}

impl FrameDelta {
    pub fn dt_seconds(&self) -> f32 {
        self.dt_ms as f32 / 1_000.0
    }
}

/// Per-frame delta with stall rejection. A frame implying more than
/// `max_frame_delta_ms` advances nothing instead of replaying the stall.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_frame_delta_ms: u64,
    last_ms: Option<u64>,
}

impl FrameClock {
    pub fn new(max_frame_delta_ms: u64) -> Self {
        Self {
            max_frame_delta_ms: max_frame_delta_ms.max(1),
            last_ms: None,
        }
    }

    pub fn advance(&mut self, now_ms: u64) -> FrameDelta {
        let previous = self.last_ms.replace(now_ms);
        let Some(previous) = previous else {
            return FrameDelta {
                dt_ms: 0,
                raw_ms: 0,
                discarded: false,
            };
        };
        let raw_ms = now_ms.saturating_sub(previous);
        if raw_ms > self.max_frame_delta_ms {
            warn!(
                raw_delta_ms = raw_ms,
                max_frame_delta_ms = self.max_frame_delta_ms,
                "frame_delta_discarded"
            );
            return FrameDelta {
                dt_ms: 0,
                raw_ms,
                discarded: true,
            };
        }
        FrameDelta {
            dt_ms: raw_ms,
            raw_ms,
            discarded: false,
        }
    }
}

/// Skips the draw phase when frames arrive faster than the target cadence.
#[derive(Debug, Clone)]
pub struct RenderPacer {
    interval_ms: Option<f64>,
    last_draw_ms: Option<u64>,
}

impl RenderPacer {
    pub fn new(target_fps: Option<u32>) -> Self {
        Self {
            interval_ms: normalize_target_fps(target_fps).map(|fps| 1_000.0 / fps as f64),
            last_draw_ms: None,
        }
    }

    pub fn target_fps(&self) -> Option<u32> {
        self.interval_ms.map(|interval| (1_000.0 / interval).round() as u32)
    }

    pub fn should_draw(&mut self, now_ms: u64) -> bool {
        let due = match (self.interval_ms, self.last_draw_ms) {
            (None, _) | (_, None) => true,
            (Some(interval), Some(last)) => {
                now_ms.saturating_sub(last) as f64 + PACER_SLACK_MS >= interval
            }
        };
        if due {
            self.last_draw_ms = Some(now_ms);
        }
        due
    }
}

fn normalize_target_fps(target_fps: Option<u32>) -> Option<u32> {
    target_fps.filter(|fps| *fps > 0)
}

pub fn format_fps_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_delta() {
        let mut clock = FrameClock::new(100);
        assert_eq!(clock.advance(5_000).dt_ms, 0);
        assert_eq!(clock.advance(5_016).dt_ms, 16);
    }

    #[test]
    fn stall_frames_are_discarded_not_clamped() {
        let mut clock = FrameClock::new(100);
        clock.advance(0);
        let stalled = clock.advance(2_000);
        assert!(stalled.discarded);
        assert_eq!(stalled.dt_ms, 0);
        assert_eq!(stalled.raw_ms, 2_000);

        let next = clock.advance(2_016);
        assert!(!next.discarded);
        assert_eq!(next.dt_ms, 16);
    }

    #[test]
    fn boundary_delta_is_kept() {
        let mut clock = FrameClock::new(100);
        clock.advance(0);
        assert_eq!(clock.advance(100).dt_ms, 100);
        assert!(clock.advance(201).discarded);
    }

    #[test]
    fn backwards_clock_yields_zero_delta() {
        let mut clock = FrameClock::new(100);
        clock.advance(500);
        let delta = clock.advance(400);
        assert_eq!(delta.dt_ms, 0);
        assert!(!delta.discarded);
    }

    #[test]
    fn pacer_without_cap_always_draws() {
        let mut pacer = RenderPacer::new(None);
        assert!(pacer.should_draw(0));
        assert!(pacer.should_draw(1));
        assert!(pacer.should_draw(1));
        assert_eq!(pacer.target_fps(), None);
    }

    #[test]
    fn pacer_skips_frames_faster_than_cadence() {
        let mut pacer = RenderPacer::new(Some(30));
        let drawn: Vec<u64> = (0..=100u64)
            .step_by(8)
            .filter(|now| pacer.should_draw(*now))
            .collect();
        assert_eq!(drawn, vec![0, 40, 80]);
    }

    #[test]
    fn pacer_accepts_integer_clock_for_fractional_interval() {
        let mut pacer = RenderPacer::new(Some(60));
        assert!(pacer.should_draw(0));
        assert!(!pacer.should_draw(10));
        assert!(pacer.should_draw(17));
        assert_eq!(pacer.target_fps(), Some(60));
    }

    #[test]
    fn zero_cap_means_off() {
        assert_eq!(RenderPacer::new(Some(0)).target_fps(), None);
        assert_eq!(format_fps_cap(None), "off");
        assert_eq!(format_fps_cap(Some(144)), "144");
    }
}

use serde::{Deserialize, Serialize};

/// Piecewise darkness schedule over one day/night cycle.
///
/// Progress 0 is the start of dawn. Darkness fades from `max_night_alpha` to 0
/// over `[0, dawn_end)`, stays at 0 until `dusk_start`, rises back to the
/// maximum over `[dusk_start, dusk_end)` and holds it until the cycle wraps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayNightSchedule {
    pub dawn_end: f32,
    pub dusk_start: f32,
    pub dusk_end: f32,
    pub max_night_alpha: f32,
}

impl Default for DayNightSchedule {
    fn default() -> Self {
        Self {
            dawn_end: 0.05,
            dusk_start: 0.70,
            dusk_end: 0.75,
            max_night_alpha: 0.90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl DayNightSchedule {
    pub fn validate(&self) -> Result<(), &'static str> {
        let bands = [self.dawn_end, self.dusk_start, self.dusk_end];
        if bands.iter().any(|value| !value.is_finite()) {
            return Err("band boundaries must be finite");
        }
        if !(self.dawn_end > 0.0
            && self.dawn_end <= self.dusk_start
            && self.dusk_start < self.dusk_end
            && self.dusk_end <= 1.0)
        {
            return Err("bands must satisfy 0 < dawn_end <= dusk_start < dusk_end <= 1");
        }
        if !(0.0..=1.0).contains(&self.max_night_alpha) {
            return Err("max_night_alpha must be within [0, 1]");
        }
        Ok(())
    }

    pub fn phase(&self, progress: f32) -> Option<CyclePhase> {
        let progress = wrap_progress(progress)?;
        Some(if progress < self.dawn_end {
            CyclePhase::Dawn
        } else if progress < self.dusk_start {
            CyclePhase::Day
        } else if progress < self.dusk_end {
            CyclePhase::Dusk
        } else {
            CyclePhase::Night
        })
    }

    /// Darkness alpha in `[0, max_night_alpha]`. Missing or non-finite progress reads as daytime.
    pub fn darkness_alpha(&self, progress: Option<f32>) -> f32 {
        let Some(progress) = progress.and_then(wrap_progress) else {
            return 0.0;
        };
        let max = self.max_night_alpha.clamp(0.0, 1.0);
        match self.phase(progress) {
            Some(CyclePhase::Dawn) => max * (1.0 - progress / self.dawn_end),
            Some(CyclePhase::Day) | None => 0.0,
            Some(CyclePhase::Dusk) => {
                max * (progress - self.dusk_start) / (self.dusk_end - self.dusk_start)
            }
            Some(CyclePhase::Night) => max,
        }
    }
}

fn wrap_progress(progress: f32) -> Option<f32> {
    if !progress.is_finite() {
        return None;
    }
    let wrapped = progress.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    Some(if wrapped >= 1.0 { 0.0 } else { wrapped })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn dusk_end_is_full_night() {
        let schedule = DayNightSchedule::default();
        assert!((schedule.darkness_alpha(Some(0.75)) - 0.90).abs() < EPS);
        assert_eq!(schedule.phase(0.75), Some(CyclePhase::Night));
    }

    #[test]
    fn midday_is_fully_lit() {
        let schedule = DayNightSchedule::default();
        assert_eq!(schedule.darkness_alpha(Some(0.375)), 0.0);
        assert_eq!(schedule.phase(0.375), Some(CyclePhase::Day));
    }

    #[test]
    fn transitions_interpolate_linearly() {
        let schedule = DayNightSchedule::default();
        assert!((schedule.darkness_alpha(Some(0.025)) - 0.45).abs() < EPS);
        assert!((schedule.darkness_alpha(Some(0.725)) - 0.45).abs() < EPS);
        assert!((schedule.darkness_alpha(Some(0.0)) - 0.90).abs() < EPS);
        assert_eq!(schedule.darkness_alpha(Some(0.05)), 0.0);
    }

    #[test]
    fn missing_or_invalid_progress_defaults_to_daytime() {
        let schedule = DayNightSchedule::default();
        assert_eq!(schedule.darkness_alpha(None), 0.0);
        assert_eq!(schedule.darkness_alpha(Some(f32::NAN)), 0.0);
        assert_eq!(schedule.darkness_alpha(Some(f32::INFINITY)), 0.0);
    }

    #[test]
    fn progress_wraps_outside_unit_range() {
        let schedule = DayNightSchedule::default();
        assert_eq!(
            schedule.darkness_alpha(Some(1.375)),
            schedule.darkness_alpha(Some(0.375))
        );
        assert!((schedule.darkness_alpha(Some(-0.25)) - 0.90).abs() < EPS);
    }

    #[test]
    fn asymmetric_bands_are_configurable() {
        let schedule = DayNightSchedule {
            dawn_end: 0.1,
            dusk_start: 0.5,
            dusk_end: 0.6,
            max_night_alpha: 0.8,
        };
        assert!(schedule.validate().is_ok());
        assert!((schedule.darkness_alpha(Some(0.55)) - 0.4).abs() < EPS);
        assert!((schedule.darkness_alpha(Some(0.9)) - 0.8).abs() < EPS);
    }

    #[test]
    fn validate_rejects_out_of_order_bands() {
        let schedule = DayNightSchedule {
            dusk_start: 0.8,
            dusk_end: 0.7,
            ..DayNightSchedule::default()
        };
        assert!(schedule.validate().is_err());
        let schedule = DayNightSchedule {
            max_night_alpha: 1.5,
            ..DayNightSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }
}

use crate::world::EntityId;

use super::targets::InteractionCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSession {
    pub target_id: EntityId,
    pub category: InteractionCategory,
    pub started_ms: u64,
    pub duration_ms: u64,
}

impl HoldSession {
    pub fn deadline_ms(&self) -> u64 {
        self.started_ms.saturating_add(self.duration_ms)
    }

    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms) as f32;
        (elapsed / self.duration_ms as f32).clamp(0.0, 1.0)
    }
}

/// Handle to an armed hold deadline. Only the handle of the current session resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldTimer {
    generation: u64,
    deadline_ms: u64,
}

impl HoldTimer {
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldProgress {
    pub target_id: EntityId,
    pub category: InteractionCategory,
    pub fraction: f32,
}

/// Owns the single hold slot. Session and timer live and die together.
#[derive(Debug, Default)]
pub struct HoldTracker {
    active: Option<(HoldSession, HoldTimer)>,
    next_generation: u64,
}

impl HoldTracker {
    /// Arms a new session; refuses while another one is active.
    pub fn start(&mut self, session: HoldSession) -> Option<HoldTimer> {
        if self.active.is_some() {
            return None;
        }
        let timer = HoldTimer {
            generation: self.next_generation,
            deadline_ms: session.deadline_ms(),
        };
        self.next_generation = self.next_generation.wrapping_add(1);
        self.active = Some((session, timer));
        Some(timer)
    }

    pub fn cancel(&mut self) -> Option<HoldSession> {
        self.active.take().map(|(session, _)| session)
    }

    pub fn session(&self) -> Option<&HoldSession> {
        self.active.as_ref().map(|(session, _)| session)
    }

    pub fn timer(&self) -> Option<HoldTimer> {
        self.active.as_ref().map(|(_, timer)| *timer)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Removes and returns the session when `timer` is still current and its deadline passed.
    pub fn complete(&mut self, timer: HoldTimer, now_ms: u64) -> Option<HoldSession> {
        let current = self.timer()?;
        if current != timer || now_ms < current.deadline_ms {
            return None;
        }
        self.cancel()
    }

    pub fn take_due(&mut self, now_ms: u64) -> Option<HoldSession> {
        let timer = self.timer()?;
        self.complete(timer, now_ms)
    }

    pub fn progress(&self, now_ms: u64) -> Option<HoldProgress> {
        self.session().map(|session| HoldProgress {
            target_id: session.target_id,
            category: session.category,
            fraction: session.progress(now_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campfire_session(started_ms: u64) -> HoldSession {
        HoldSession {
            target_id: EntityId(3),
            category: InteractionCategory::Campfire,
            started_ms,
            duration_ms: 250,
        }
    }

    #[test]
    fn only_one_session_can_be_armed() {
        let mut tracker = HoldTracker::default();
        assert!(tracker.start(campfire_session(0)).is_some());
        assert!(tracker.start(campfire_session(10)).is_none());
        assert_eq!(tracker.session().map(|s| s.started_ms), Some(0));
    }

    #[test]
    fn session_is_not_due_before_deadline() {
        let mut tracker = HoldTracker::default();
        tracker.start(campfire_session(100));
        assert!(tracker.take_due(349).is_none());
        assert!(tracker.is_active());
        assert_eq!(tracker.take_due(350).map(|s| s.target_id), Some(EntityId(3)));
        assert!(!tracker.is_active());
    }

    #[test]
    fn stale_timer_cannot_resolve_superseding_session() {
        let mut tracker = HoldTracker::default();
        let stale = tracker.start(campfire_session(0)).expect("timer");
        tracker.cancel();
        let fresh = tracker.start(campfire_session(0)).expect("timer");

        assert_ne!(stale, fresh);
        assert!(tracker.complete(stale, 1_000).is_none());
        assert!(tracker.is_active());
        assert!(tracker.complete(fresh, 1_000).is_some());
    }

    #[test]
    fn cancel_clears_progress_in_same_step() {
        let mut tracker = HoldTracker::default();
        tracker.start(campfire_session(0));
        assert!(tracker.progress(125).is_some());
        tracker.cancel();
        assert!(tracker.progress(125).is_none());
        assert!(tracker.timer().is_none());
    }

    #[test]
    fn progress_is_clamped_fraction() {
        let session = campfire_session(1_000);
        assert_eq!(session.progress(900), 0.0);
        assert!((session.progress(1_125) - 0.5).abs() < 1e-6);
        assert_eq!(session.progress(5_000), 1.0);
    }
}

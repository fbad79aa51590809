/// Cooldown gate for swing attempts.
///
/// An attempt is accepted only when the cooldown has elapsed since both the
/// last client-side attempt and the last server-confirmed swing. Whichever of
/// the two is more recent decides, so client spam can never get ahead of the
/// authoritative timestamp once it is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingGate {
    last_attempt_ms: Option<u64>,
}

impl SwingGate {
    pub fn try_accept(
        &mut self,
        now_ms: u64,
        cooldown_ms: u64,
        server_confirmed_ms: Option<u64>,
    ) -> bool {
        if !self.is_ready(now_ms, cooldown_ms, server_confirmed_ms) {
            return false;
        }
        self.last_attempt_ms = Some(now_ms);
        true
    }

    pub fn is_ready(&self, now_ms: u64, cooldown_ms: u64, server_confirmed_ms: Option<u64>) -> bool {
        cooldown_elapsed(self.last_attempt_ms, now_ms, cooldown_ms)
            && cooldown_elapsed(server_confirmed_ms, now_ms, cooldown_ms)
    }

    pub fn last_attempt_ms(&self) -> Option<u64> {
        self.last_attempt_ms
    }
}

fn cooldown_elapsed(last_ms: Option<u64>, now_ms: u64, cooldown_ms: u64) -> bool {
    match last_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
    }
}

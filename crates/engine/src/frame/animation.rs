use std::collections::HashMap;
use std::f32::consts::TAU;

use crate::world::{Entity, EntityId, EntityKind, Vec2, WorldSnapshot};

const IDLE_BOB_AMPLITUDE_PX: f32 = 0.6;
const IDLE_BOB_CYCLES_PER_SECOND: f32 = 0.75;
const WALK_BOB_AMPLITUDE_PX: f32 = 2.0;
const WALK_SWAY_AMPLITUDE_PX: f32 = 0.8;
const WALK_CYCLES_PER_SECOND: f32 = 4.8;
const WALK_SPRING_RATE_PER_SECOND: f32 = 15.0;
const ENTITY_PHASE_SEED: f32 = 0.173;
pub const JUMP_DURATION_MS: u64 = 450;
pub const JUMP_HEIGHT_PX: f32 = 18.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisualOffset {
    pub offset: Vec2,
    /// Scale of the ground shadow; shrinks while airborne.
    pub shadow_scale: f32,
}

/// Frame-local animation phases. Nothing here feeds back into the world.
#[derive(Debug, Default)]
pub struct AnimationState {
    elapsed_ms: u64,
    walk_amplitude: HashMap<EntityId, f32>,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Advances phase counters and walk springs; springs of vanished actors are dropped.
    pub fn advance(&mut self, dt_ms: u64, snapshot: &WorldSnapshot) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let dt_seconds = dt_ms as f32 / 1_000.0;
        let blend = 1.0 - (-WALK_SPRING_RATE_PER_SECOND * dt_seconds).exp();

        let mut live = HashMap::with_capacity(self.walk_amplitude.len());
        for kind in [EntityKind::Player, EntityKind::Creature] {
            let Some(collection) = snapshot.collection(kind) else {
                continue;
            };
            for entity in collection.values() {
                let target = if entity.actor().map(|actor| actor.moving).unwrap_or(false) {
                    1.0
                } else {
                    0.0
                };
                let previous = self.walk_amplitude.get(&entity.id).copied().unwrap_or(target);
                live.insert(entity.id, previous + (target - previous) * blend);
            }
        }
        self.walk_amplitude = live;
    }

    pub fn walk_amplitude(&self, id: EntityId) -> f32 {
        self.walk_amplitude.get(&id).copied().unwrap_or(0.0).clamp(0.0, 1.0)
    }

    /// Procedural offset for drawing `entity` at `now_ms`.
    pub fn offset_for(&self, entity: &Entity, now_ms: u64) -> VisualOffset {
        let Some(actor) = entity.actor() else {
            return VisualOffset {
                offset: Vec2::ZERO,
                shadow_scale: 1.0,
            };
        };
        if actor.dead {
            return VisualOffset {
                offset: Vec2::ZERO,
                shadow_scale: 1.0,
            };
        }

        let seconds = self.elapsed_ms as f32 / 1_000.0;
        let phase = entity.id.0 as f32 * ENTITY_PHASE_SEED;
        let walk = self.walk_amplitude(entity.id);

        let idle_theta = TAU * (seconds * IDLE_BOB_CYCLES_PER_SECOND + phase);
        let idle_y = idle_theta.sin() * IDLE_BOB_AMPLITUDE_PX * (1.0 - walk);

        let walk_theta = TAU * (seconds * WALK_CYCLES_PER_SECOND + phase);
        let walk_y = -walk_theta.sin().abs() * WALK_BOB_AMPLITUDE_PX * walk;
        let walk_x = walk_theta.cos() * WALK_SWAY_AMPLITUDE_PX * walk;

        let lift = actor
            .jump_started_ms
            .map(|started| jump_height(started, now_ms))
            .unwrap_or(0.0);

        VisualOffset {
            offset: Vec2::new(walk_x, idle_y + walk_y - lift),
            shadow_scale: 1.0 - 0.5 * (lift / JUMP_HEIGHT_PX),
        }
    }
}

/// Parabolic arc, zero outside `[started, started + JUMP_DURATION_MS]`.
pub fn jump_height(started_ms: u64, now_ms: u64) -> f32 {
    if now_ms < started_ms {
        return 0.0;
    }
    let elapsed = now_ms - started_ms;
    if elapsed >= JUMP_DURATION_MS {
        return 0.0;
    }
    let t = elapsed as f32 / JUMP_DURATION_MS as f32;
    4.0 * JUMP_HEIGHT_PX * t * (1.0 - t)
}

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ParticleConfig, MAX_PARTICLES_PER_SECOND};
use crate::view::VisibleSet;
use crate::world::{EntityId, EntityKind, Vec2, WorldSnapshot};

const TORCH_FLAME_OFFSET: Vec2 = Vec2::new(6.0, -14.0);
const SMOKE_EVERY_NTH_FIRE_PARTICLE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Ember,
    Smoke,
    Spark,
}

/// Cosmetic only; positions are in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub remaining_ms: f32,
    pub lifetime_ms: f32,
    pub size: f32,
}

impl Particle {
    /// 1 when freshly spawned, approaching 0 at expiry.
    pub fn life_fraction(&self) -> f32 {
        if self.lifetime_ms <= 0.0 {
            return 0.0;
        }
        (self.remaining_ms / self.lifetime_ms).clamp(0.0, 1.0)
    }

    pub fn color(&self) -> [u8; 4] {
        let fade = self.life_fraction();
        match self.kind {
            ParticleKind::Ember => [255, (120.0 + 100.0 * fade) as u8, 40, (255.0 * fade) as u8],
            ParticleKind::Smoke => [70, 70, 76, (140.0 * fade) as u8],
            ParticleKind::Spark => [255, 236, 150, (255.0 * fade) as u8],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitterKind {
    Fire,
    Torch,
}

#[derive(Debug, Clone, Copy)]
struct Emitter {
    kind: EmitterKind,
    position: Vec2,
    accumulator: f32,
    emitted: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticleStats {
    pub alive: usize,
    pub emitters: usize,
    pub spawned_last_advance: usize,
    pub dropped_at_capacity: usize,
}

/// Emitters are keyed by the entity that owns them and follow the snapshot.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    emitters: BTreeMap<EntityId, Emitter>,
    rng: StdRng,
    max_particles: usize,
    fire_per_second: f32,
    torch_per_second: f32,
    stats: ParticleStats,
}

impl ParticleSystem {
    pub fn new(config: &ParticleConfig) -> Self {
        Self {
            particles: Vec::new(),
            emitters: BTreeMap::new(),
            rng: StdRng::seed_from_u64(config.seed),
            max_particles: config.max_particles,
            fire_per_second: sanitize_rate(config.fire_particles_per_second),
            torch_per_second: sanitize_rate(config.torch_particles_per_second),
            stats: ParticleStats::default(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn stats(&self) -> ParticleStats {
        self.stats
    }

    /// Re-derives emitters from the snapshot, limited to sources in `visible`.
    /// Emitters whose entity stopped burning, vanished or left the padded
    /// viewport are dropped; live ones keep their accumulators.
    pub fn sync_emitters(&mut self, snapshot: &WorldSnapshot, visible: &VisibleSet) {
        let mut next = BTreeMap::new();
        if let Some(fires) = snapshot.collection(EntityKind::Campfire) {
            for entity in fires.values() {
                if entity.is_burning() && entity.position.is_finite() && visible.contains(entity.id) {
                    next.insert(entity.id, (EmitterKind::Fire, entity.position));
                }
            }
        }
        for kind in [EntityKind::Player, EntityKind::Creature] {
            let Some(actors) = snapshot.collection(kind) else {
                continue;
            };
            for entity in actors.values() {
                if entity.has_lit_torch() && entity.position.is_finite() && visible.contains(entity.id) {
                    next.insert(entity.id, (EmitterKind::Torch, entity.position + TORCH_FLAME_OFFSET));
                }
            }
        }

        self.emitters.retain(|id, emitter| match next.get(id) {
            Some((kind, _)) => *kind == emitter.kind,
            None => false,
        });
        for (id, (kind, position)) in next {
            self.emitters
                .entry(id)
                .and_modify(|emitter| emitter.position = position)
                .or_insert(Emitter {
                    kind,
                    position,
                    accumulator: 0.0,
                    emitted: 0,
                });
        }
        self.stats.emitters = self.emitters.len();
    }

    /// Ages, moves and spawns. A zero delta leaves everything untouched.
    pub fn advance(&mut self, dt_ms: u64) {
        self.stats.spawned_last_advance = 0;
        self.stats.dropped_at_capacity = 0;
        if dt_ms == 0 {
            return;
        }
        let dt_ms = dt_ms as f32;
        let dt_seconds = dt_ms / 1_000.0;

        for particle in &mut self.particles {
            particle.remaining_ms -= dt_ms;
            particle.position = particle.position + particle.velocity * dt_seconds;
            if particle.kind == ParticleKind::Smoke {
                particle.size += 4.0 * dt_seconds;
            }
        }
        self.particles.retain(|particle| particle.remaining_ms > 0.0);

        let mut emitters = std::mem::take(&mut self.emitters);
        for emitter in emitters.values_mut() {
            let rate = match emitter.kind {
                EmitterKind::Fire => self.fire_per_second,
                EmitterKind::Torch => self.torch_per_second,
            };
            emitter.accumulator += rate * dt_seconds;
            let due = emitter.accumulator.floor();
            emitter.accumulator -= due;
            let due = due as usize;
            let spawned = due.min(self.max_particles.saturating_sub(self.particles.len()));
            for _ in 0..spawned {
                let particle = self.spawn(emitter);
                self.particles.push(particle);
            }
            self.stats.spawned_last_advance += spawned;
            self.stats.dropped_at_capacity = self.stats.dropped_at_capacity.saturating_add(due - spawned);
        }
        self.emitters = emitters;
        self.stats.alive = self.particles.len();
    }

    fn spawn(&mut self, emitter: &mut Emitter) -> Particle {
        emitter.emitted = emitter.emitted.wrapping_add(1);
        let rng = &mut self.rng;
        match emitter.kind {
            EmitterKind::Fire if emitter.emitted % SMOKE_EVERY_NTH_FIRE_PARTICLE == 0 => {
                let lifetime_ms = rng.gen_range(1_200.0..2_000.0);
                Particle {
                    kind: ParticleKind::Smoke,
                    position: emitter.position + Vec2::new(rng.gen_range(-4.0..4.0), -8.0),
                    velocity: Vec2::new(rng.gen_range(-6.0..6.0), rng.gen_range(-28.0..-16.0)),
                    remaining_ms: lifetime_ms,
                    lifetime_ms,
                    size: rng.gen_range(2.0..4.0),
                }
            }
            EmitterKind::Fire => {
                let lifetime_ms = rng.gen_range(600.0..1_200.0);
                Particle {
                    kind: ParticleKind::Ember,
                    position: emitter.position + Vec2::new(rng.gen_range(-8.0..8.0), rng.gen_range(-4.0..2.0)),
                    velocity: Vec2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-60.0..-30.0)),
                    remaining_ms: lifetime_ms,
                    lifetime_ms,
                    size: rng.gen_range(1.0..3.0),
                }
            }
            EmitterKind::Torch => {
                let lifetime_ms = rng.gen_range(300.0..600.0);
                Particle {
                    kind: ParticleKind::Spark,
                    position: emitter.position + Vec2::new(rng.gen_range(-2.0..2.0), 0.0),
                    velocity: Vec2::new(rng.gen_range(-8.0..8.0), rng.gen_range(-40.0..-20.0)),
                    remaining_ms: lifetime_ms,
                    lifetime_ms,
                    size: 1.0,
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.emitters.clear();
        self.stats = ParticleStats::default();
    }
}

fn sanitize_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(0.0, MAX_PARTICLES_PER_SECOND)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ActorState, Entity, EntityState};

    fn config(max_particles: usize) -> ParticleConfig {
        ParticleConfig {
            max_particles,
            fire_particles_per_second: 20.0,
            torch_particles_per_second: 10.0,
            seed: 7,
        }
    }

    fn everything_visible(snapshot: &WorldSnapshot) -> VisibleSet {
        let mut visible = VisibleSet::default();
        for (_, collection) in snapshot.collections() {
            for entity in collection.values() {
                visible.insert(entity, entity.position);
            }
        }
        visible
    }

    fn sync_all(system: &mut ParticleSystem, snapshot: &WorldSnapshot) {
        system.sync_emitters(snapshot, &everything_visible(snapshot));
    }

    fn burning_snapshot(burning: bool) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(
            Entity::new(EntityId(3), EntityKind::Campfire, Vec2::new(100.0, 100.0))
                .with_state(EntityState::Fire { burning }),
        );
        snapshot
    }

    #[test]
    fn burning_fire_emits_at_configured_rate() {
        let mut system = ParticleSystem::new(&config(1_000));
        sync_all(&mut system, &burning_snapshot(true));
        assert_eq!(system.emitter_count(), 1);

        for _ in 0..10 {
            system.advance(50);
        }
        // 20 per second over 500 ms, none old enough to expire.
        assert_eq!(system.len(), 10);
    }

    #[test]
    fn zero_delta_changes_nothing() {
        let mut system = ParticleSystem::new(&config(1_000));
        sync_all(&mut system, &burning_snapshot(true));
        system.advance(200);
        let before = system.particles().to_vec();
        system.advance(0);
        assert_eq!(system.particles(), before.as_slice());
    }

    #[test]
    fn extinguished_fire_drops_emitter_and_particles_expire() {
        let mut system = ParticleSystem::new(&config(1_000));
        sync_all(&mut system, &burning_snapshot(true));
        system.advance(100);
        assert!(!system.is_empty());

        sync_all(&mut system, &burning_snapshot(false));
        assert_eq!(system.emitter_count(), 0);
        system.advance(2_500);
        assert!(system.is_empty());
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut system = ParticleSystem::new(&config(5));
        sync_all(&mut system, &burning_snapshot(true));
        let mut dropped = 0;
        for _ in 0..20 {
            system.advance(100);
            assert!(system.len() <= 5);
            dropped += system.stats().dropped_at_capacity;
        }
        assert!(dropped > 0);
    }

    #[test]
    fn huge_rate_fills_capacity_in_one_step() {
        let mut config = config(64);
        config.fire_particles_per_second = 1.0e30;
        let mut system = ParticleSystem::new(&config);
        sync_all(&mut system, &burning_snapshot(true));

        system.advance(1_000);
        assert_eq!(system.len(), 64);
        let stats = system.stats();
        assert_eq!(stats.spawned_last_advance, 64);
        assert_eq!(stats.dropped_at_capacity, MAX_PARTICLES_PER_SECOND as usize - 64);

        system.advance(u64::MAX / 2);
        assert!(system.len() <= 64);
    }

    #[test]
    fn sources_outside_the_visible_set_do_not_emit() {
        let snapshot = burning_snapshot(true);
        let mut system = ParticleSystem::new(&config(100));
        system.sync_emitters(&snapshot, &VisibleSet::default());
        assert_eq!(system.emitter_count(), 0);
        system.advance(500);
        assert!(system.is_empty());

        sync_all(&mut system, &snapshot);
        assert_eq!(system.emitter_count(), 1);
        system.sync_emitters(&snapshot, &VisibleSet::default());
        assert_eq!(system.emitter_count(), 0);
    }

    #[test]
    fn lit_torch_emits_sparks_above_actor() {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(
            Entity::new(EntityId(1), EntityKind::Player, Vec2::new(0.0, 0.0)).with_state(
                EntityState::Actor(ActorState {
                    torch_lit: true,
                    ..ActorState::default()
                }),
            ),
        );
        let mut system = ParticleSystem::new(&config(100));
        sync_all(&mut system, &snapshot);
        system.advance(100);
        assert_eq!(system.len(), 1);
        let spark = system.particles()[0];
        assert_eq!(spark.kind, ParticleKind::Spark);
        assert!(spark.position.y < 0.0);
    }

    #[test]
    fn same_seed_replays_identically() {
        let run = || {
            let mut system = ParticleSystem::new(&config(100));
            sync_all(&mut system, &burning_snapshot(true));
            for _ in 0..8 {
                system.advance(33);
            }
            system.particles().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn life_fraction_fades_color() {
        let mut particle = Particle {
            kind: ParticleKind::Ember,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            remaining_ms: 500.0,
            lifetime_ms: 1_000.0,
            size: 1.0,
        };
        assert!((particle.life_fraction() - 0.5).abs() < 1e-6);
        let half = particle.color()[3];
        particle.remaining_ms = 1_000.0;
        assert!(particle.color()[3] > half);
    }
}

use ember_engine::interaction::{ClosestTarget, PlaceableItem};
use ember_engine::world::{ActorState, EquippedItem, TileKind};
use ember_engine::{
    Entity, EntityId, EntityKind, EntityState, FrameSource, Intent, IntentError, IntentSink,
    InteractionCategory, InteractionTargets, Tilemap, Vec2, Weather, WorldSnapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

const MAP_WIDTH_TILES: u32 = 48;
const MAP_HEIGHT_TILES: u32 = 36;
const TILE_SIZE_PX: f32 = 32.0;
const PLAYER_SPEED_PX_PER_SECOND: f32 = 140.0;
const CREATURE_SPEED_PX_PER_SECOND: f32 = 40.0;
const INTERACT_RADIUS_PX: f32 = 48.0;
const CYCLE_LENGTH_MS: u64 = 180_000;
const RAIN_START: f32 = 0.40;
const RAIN_END: f32 = 0.52;
const GROWTH_STEP_MS: u64 = 6_000;
const MATURE_STAGE: u8 = 3;
const CREATURE_TURN_MS: u64 = 2_500;
const LOCAL_PLAYER: EntityId = EntityId(1);

/// A small local world that stands in for the network layer: it answers
/// intents immediately and recomputes interaction targets every frame.
pub(crate) struct DemoFeed {
    snapshot: WorldSnapshot,
    targets: InteractionTargets,
    rng: StdRng,
    movement: Vec2,
    creature_heading: Vec2,
    last_update_ms: Option<u64>,
    next_growth_ms: u64,
    next_turn_ms: u64,
    now_ms: u64,
    next_id: u64,
}

impl DemoFeed {
    pub(crate) fn new(seed: u64) -> Self {
        let mut feed = Self {
            snapshot: WorldSnapshot::new(),
            targets: InteractionTargets::new(),
            rng: StdRng::seed_from_u64(seed),
            movement: Vec2::ZERO,
            creature_heading: Vec2::ZERO,
            last_update_ms: None,
            next_growth_ms: GROWTH_STEP_MS,
            next_turn_ms: 0,
            now_ms: 0,
            next_id: LOCAL_PLAYER.0 + 1,
        };
        feed.populate();
        feed
    }

    fn populate(&mut self) {
        self.snapshot.tilemap = build_tilemap();
        self.snapshot.local_player = Some(LOCAL_PLAYER);
        self.snapshot.cycle_progress = Some(0.0);

        let center = Vec2::new(
            MAP_WIDTH_TILES as f32 * TILE_SIZE_PX * 0.5,
            MAP_HEIGHT_TILES as f32 * TILE_SIZE_PX * 0.5,
        );
        self.snapshot.insert(
            Entity::new(LOCAL_PLAYER, EntityKind::Player, center).with_state(EntityState::Actor(ActorState {
                name: "you".to_string(),
                torch_lit: true,
                equipped: Some(EquippedItem {
                    name: "stone axe".to_string(),
                    cooldown_ms: 600,
                    ranged: false,
                }),
                ..ActorState::default()
            })),
        );

        let offset = |x: f32, y: f32| Vec2::new(center.x + x, center.y + y);
        self.spawn(EntityKind::Player, offset(-90.0, 60.0), EntityState::Actor(ActorState {
            name: "rook".to_string(),
            downed: true,
            health: 0.0,
            ..ActorState::default()
        }));
        self.spawn(EntityKind::Creature, offset(220.0, -140.0), EntityState::Actor(ActorState::default()));
        self.spawn(EntityKind::Campfire, offset(60.0, 40.0), EntityState::Fire { burning: true });
        self.spawn(EntityKind::Campfire, offset(-320.0, -180.0), EntityState::Fire { burning: false });
        for (index, (x, y)) in [(-40.0, -70.0), (-10.0, -90.0), (30.0, -75.0), (150.0, 120.0)]
            .into_iter()
            .enumerate()
        {
            let stage = (index as u8).min(MATURE_STAGE);
            self.spawn(EntityKind::Plant, offset(x, y), EntityState::Growth {
                stage,
                mature: stage >= MATURE_STAGE,
            });
        }
        self.spawn(EntityKind::Container, offset(110.0, -20.0), EntityState::Storage {
            empty: false,
            hidden: false,
        });
        self.spawn(EntityKind::Container, offset(-140.0, 10.0), EntityState::Storage {
            empty: true,
            hidden: false,
        });
        self.spawn(EntityKind::Stash, offset(-60.0, 130.0), EntityState::Storage {
            empty: false,
            hidden: false,
        });
        self.spawn(EntityKind::Corpse, offset(200.0, 60.0), EntityState::Inert);
        self.spawn(EntityKind::DroppedItem, offset(24.0, 20.0), EntityState::Inert);
        self.spawn(EntityKind::Structure, offset(-200.0, 80.0), EntityState::Inert);
    }

    fn spawn(&mut self, kind: EntityKind, position: Vec2, state: EntityState) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.snapshot.insert(Entity::new(id, kind, position).with_state(state));
        id
    }

    fn local_position(&self) -> Option<Vec2> {
        self.snapshot.local_actor().map(|entity| entity.position)
    }

    fn advance_player(&mut self, dt_seconds: f32) {
        let step = Vec2::new(
            self.movement.x * PLAYER_SPEED_PX_PER_SECOND * dt_seconds,
            self.movement.y * PLAYER_SPEED_PX_PER_SECOND * dt_seconds,
        );
        let moving = step.length_sq() > 0.0;
        let blocked = |snapshot: &WorldSnapshot, to: Vec2| {
            snapshot
                .tilemap
                .as_ref()
                .map(|tilemap| tilemap.tile_at_world(to).map_or(true, TileKind::is_water))
                .unwrap_or(false)
        };
        let Some(from) = self.local_position() else {
            return;
        };
        let to = Vec2::new(from.x + step.x, from.y + step.y);
        let can_move = !blocked(&self.snapshot, to);
        if let Some(player) = self.snapshot.find_mut(LOCAL_PLAYER) {
            if can_move {
                player.position = to;
            }
            if let EntityState::Actor(actor) = &mut player.state {
                actor.moving = moving && can_move;
            }
        }
    }

    fn advance_creatures(&mut self, dt_seconds: f32) {
        if self.now_ms >= self.next_turn_ms {
            self.next_turn_ms = self.now_ms + CREATURE_TURN_MS;
            self.creature_heading = Vec2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0))
                .normalized_or_zero();
        }
        let heading = self.creature_heading;
        let ids: Vec<EntityId> = self
            .snapshot
            .collection(EntityKind::Creature)
            .map(|creatures| creatures.keys().copied().collect())
            .unwrap_or_default();
        for id in ids {
            if let Some(creature) = self.snapshot.find_mut(id) {
                creature.position.x += heading.x * CREATURE_SPEED_PX_PER_SECOND * dt_seconds;
                creature.position.y += heading.y * CREATURE_SPEED_PX_PER_SECOND * dt_seconds;
                if let EntityState::Actor(actor) = &mut creature.state {
                    actor.moving = heading.length_sq() > 0.0;
                }
            }
        }
    }

    fn advance_growth(&mut self) {
        if self.now_ms < self.next_growth_ms {
            return;
        }
        self.next_growth_ms = self.now_ms + GROWTH_STEP_MS;
        let ids: Vec<EntityId> = self
            .snapshot
            .collection(EntityKind::Plant)
            .map(|plants| plants.keys().copied().collect())
            .unwrap_or_default();
        for id in ids {
            if let Some(Entity {
                state: EntityState::Growth { stage, mature },
                ..
            }) = self.snapshot.find_mut(id)
            {
                if !*mature {
                    *stage = (*stage + 1).min(MATURE_STAGE);
                    *mature = *stage >= MATURE_STAGE;
                }
            }
        }
    }

    fn advance_cycle(&mut self) {
        let progress = (self.now_ms % CYCLE_LENGTH_MS) as f32 / CYCLE_LENGTH_MS as f32;
        self.snapshot.cycle_progress = Some(progress);
        self.snapshot.weather = if (RAIN_START..RAIN_END).contains(&progress) {
            let mid = (RAIN_START + RAIN_END) * 0.5;
            let half = (RAIN_END - RAIN_START) * 0.5;
            Weather::Rain {
                intensity: (1.0 - (progress - mid).abs() / half).clamp(0.2, 1.0),
            }
        } else {
            Weather::Clear
        };
    }

    fn recompute_targets(&mut self) {
        self.targets.clear();
        let Some(origin) = self.local_position() else {
            return;
        };
        for category in InteractionCategory::ALL {
            let closest = self
                .snapshot
                .entities()
                .filter(|entity| entity.id != LOCAL_PLAYER && category_of(entity) == Some(category))
                .map(|entity| (entity.id, entity.position.distance_sq(origin)))
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            self.targets.set(
                category,
                closest.map(|(id, distance_sq)| ClosestTarget {
                    id,
                    distance_sq,
                    threshold_sq: INTERACT_RADIUS_PX * INTERACT_RADIUS_PX,
                }),
            );
        }
    }

    fn require(&self, target: EntityId, category: InteractionCategory) -> Result<(), IntentError> {
        match self.snapshot.find(target) {
            Some(entity) if category_of(entity) == Some(category) => Ok(()),
            Some(_) => Err(rejected("NOTHING TO DO THERE")),
            None => Err(rejected("IT IS GONE")),
        }
    }

    fn drop_item_near(&mut self, position: Vec2) {
        let jitter = Vec2::new(self.rng.gen_range(-10.0..=10.0), self.rng.gen_range(6.0..=14.0));
        self.spawn(
            EntityKind::DroppedItem,
            Vec2::new(position.x + jitter.x, position.y + jitter.y),
            EntityState::Inert,
        );
    }

    fn position_of(&self, target: EntityId) -> Vec2 {
        self.snapshot
            .find(target)
            .map(|entity| entity.position)
            .unwrap_or(Vec2::ZERO)
    }
}

impl FrameSource for DemoFeed {
    fn update(&mut self, now_ms: u64) {
        let dt_ms = self
            .last_update_ms
            .map(|last| now_ms.saturating_sub(last).min(100))
            .unwrap_or(0);
        self.last_update_ms = Some(now_ms);
        self.now_ms = now_ms;
        let dt_seconds = dt_ms as f32 / 1_000.0;

        self.advance_player(dt_seconds);
        self.advance_creatures(dt_seconds);
        self.advance_growth();
        self.advance_cycle();
        self.recompute_targets();
    }

    fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    fn targets(&self) -> &InteractionTargets {
        &self.targets
    }
}

impl IntentSink for DemoFeed {
    fn submit(&mut self, intent: &Intent) -> Result<(), IntentError> {
        match intent {
            Intent::Move { direction } => {
                self.movement = direction.normalized_or_zero();
                return Ok(());
            }
            Intent::PickUpItem { target } => {
                self.require(*target, InteractionCategory::DroppedItem)?;
                self.snapshot.remove(*target);
            }
            Intent::Harvest { target } => {
                self.require(*target, InteractionCategory::Harvestable)?;
                let position = self.position_of(*target);
                if let Some(plant) = self.snapshot.find_mut(*target) {
                    plant.state = EntityState::Growth {
                        stage: 0,
                        mature: false,
                    };
                }
                self.drop_item_near(position);
            }
            Intent::OpenContainer { target } => {
                self.require(*target, InteractionCategory::Container)?;
                let position = self.position_of(*target);
                if let Some(container) = self.snapshot.find_mut(*target) {
                    container.state = EntityState::Storage {
                        empty: true,
                        hidden: false,
                    };
                }
                self.drop_item_near(position);
            }
            Intent::LootCorpse { target } => {
                self.require(*target, InteractionCategory::Corpse)?;
                let position = self.position_of(*target);
                self.snapshot.remove(*target);
                self.drop_item_near(position);
            }
            Intent::ToggleBurn { target } => {
                self.require(*target, InteractionCategory::Campfire)?;
                if let Some(Entity {
                    state: EntityState::Fire { burning },
                    ..
                }) = self.snapshot.find_mut(*target)
                {
                    *burning = !*burning;
                }
            }
            Intent::ToggleStashVisibility { target } => {
                self.require(*target, InteractionCategory::Stash)?;
                if let Some(Entity {
                    state: EntityState::Storage { hidden, .. },
                    ..
                }) = self.snapshot.find_mut(*target)
                {
                    *hidden = !*hidden;
                }
            }
            Intent::PickUpContainer { target } => {
                self.require(*target, InteractionCategory::EmptyContainer)?;
                self.snapshot.remove(*target);
            }
            Intent::Revive { target } => {
                self.require(*target, InteractionCategory::DownedAlly)?;
                if let Some(Entity {
                    state: EntityState::Actor(actor),
                    ..
                }) = self.snapshot.find_mut(*target)
                {
                    actor.downed = false;
                    actor.health = actor.max_health * 0.25;
                }
            }
            Intent::Swing | Intent::FireProjectile { .. } => {
                self.snapshot.last_confirmed_swing_ms = Some(self.now_ms);
            }
            Intent::Place { item, position } => {
                let on_water = self
                    .snapshot
                    .tilemap
                    .as_ref()
                    .and_then(|tilemap| tilemap.tile_at_world(*position))
                    .map_or(true, TileKind::is_water);
                if on_water {
                    warn!(item = item.label(), "demo_place_rejected");
                    return Err(rejected("CANNOT PLACE THERE"));
                }
                let (kind, state) = placed_entity(*item);
                self.spawn(kind, *position, state);
            }
        }
        debug!(intent = intent.name(), target = ?intent.target(), "demo_intent_applied");
        Ok(())
    }
}

/// What the local actor can do with `entity`, if anything.
fn category_of(entity: &Entity) -> Option<InteractionCategory> {
    match (&entity.kind, &entity.state) {
        (EntityKind::DroppedItem, _) => Some(InteractionCategory::DroppedItem),
        (EntityKind::Plant, EntityState::Growth { mature: true, .. }) => Some(InteractionCategory::Harvestable),
        (EntityKind::Container, EntityState::Storage { empty: false, .. }) => Some(InteractionCategory::Container),
        (EntityKind::Container, EntityState::Storage { empty: true, .. }) => {
            Some(InteractionCategory::EmptyContainer)
        }
        (EntityKind::Corpse, _) => Some(InteractionCategory::Corpse),
        (EntityKind::Campfire, _) => Some(InteractionCategory::Campfire),
        (EntityKind::Stash, _) => Some(InteractionCategory::Stash),
        (EntityKind::Player, EntityState::Actor(actor)) if actor.downed && !actor.dead => {
            Some(InteractionCategory::DownedAlly)
        }
        _ => None,
    }
}

fn placed_entity(item: PlaceableItem) -> (EntityKind, EntityState) {
    match item {
        PlaceableItem::Campfire => (EntityKind::Campfire, EntityState::Fire { burning: false }),
        PlaceableItem::StorageBox => (
            EntityKind::Container,
            EntityState::Storage {
                empty: true,
                hidden: false,
            },
        ),
        PlaceableItem::Stash => (
            EntityKind::Stash,
            EntityState::Storage {
                empty: true,
                hidden: false,
            },
        ),
        PlaceableItem::WoodWall | PlaceableItem::Bedroll => (EntityKind::Structure, EntityState::Inert),
    }
}

fn rejected(reason: &str) -> IntentError {
    IntentError::Rejected {
        reason: reason.to_string(),
    }
}

/// Grass field with a dirt ring, a sandy pond and a rock outcrop.
fn build_tilemap() -> Option<Tilemap> {
    let mut tiles = Vec::with_capacity((MAP_WIDTH_TILES * MAP_HEIGHT_TILES) as usize);
    for y in 0..MAP_HEIGHT_TILES {
        for x in 0..MAP_WIDTH_TILES {
            tiles.push(tile_for(x as i32, y as i32));
        }
    }
    match Tilemap::new(MAP_WIDTH_TILES, MAP_HEIGHT_TILES, TILE_SIZE_PX, Vec2::ZERO, tiles) {
        Ok(tilemap) => Some(tilemap),
        Err(error) => {
            warn!(error = %error, "demo_tilemap_invalid");
            None
        }
    }
}

fn tile_for(x: i32, y: i32) -> TileKind {
    let pond = (x - 34) * (x - 34) + (y - 9) * (y - 9);
    if pond <= 12 {
        return TileKind::Water;
    }
    if pond <= 22 {
        return TileKind::Sand;
    }
    if (6..10).contains(&x) && (24..29).contains(&y) {
        return TileKind::Rock;
    }
    let ring = (x - 24) * (x - 24) + (y - 18) * (y - 18);
    if (36..=49).contains(&ring) {
        return TileKind::Dirt;
    }
    TileKind::Grass
}

pub(crate) fn log_demo_summary(feed: &DemoFeed) {
    info!(
        entity_count = feed.snapshot.entity_count(),
        map_tiles = MAP_WIDTH_TILES * MAP_HEIGHT_TILES,
        cycle_length_ms = CYCLE_LENGTH_MS,
        "demo_world_ready"
    );
}

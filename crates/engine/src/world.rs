use std::collections::BTreeMap;
use std::ops::{Add, Mul, Sub};

use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        (self - other).length_sq()
    }

    pub fn normalized_or_zero(self) -> Vec2 {
        let length_sq = self.length_sq();
        if !length_sq.is_finite() || length_sq <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let inv = length_sq.sqrt().recip();
        Vec2::new(self.x * inv, self.y * inv)
    }

    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        Vec2::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Player,
    Creature,
    Campfire,
    Plant,
    Container,
    Corpse,
    DroppedItem,
    Stash,
    Structure,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Player,
        EntityKind::Creature,
        EntityKind::Campfire,
        EntityKind::Plant,
        EntityKind::Container,
        EntityKind::Corpse,
        EntityKind::DroppedItem,
        EntityKind::Stash,
        EntityKind::Structure,
    ];

    /// Moving actors are drawn in the y-sorted layer; everything else sits on the ground.
    pub fn is_dynamic(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Creature)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Creature => "creature",
            EntityKind::Campfire => "campfire",
            EntityKind::Plant => "plant",
            EntityKind::Container => "container",
            EntityKind::Corpse => "corpse",
            EntityKind::DroppedItem => "item",
            EntityKind::Stash => "stash",
            EntityKind::Structure => "structure",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquippedItem {
    pub name: String,
    pub cooldown_ms: u64,
    pub ranged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub downed: bool,
    pub dead: bool,
    pub torch_lit: bool,
    pub moving: bool,
    pub equipped: Option<EquippedItem>,
    pub jump_started_ms: Option<u64>,
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            name: String::new(),
            health: 100.0,
            max_health: 100.0,
            downed: false,
            dead: false,
            torch_lit: false,
            moving: false,
            equipped: None,
            jump_started_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityState {
    Inert,
    Actor(ActorState),
    Fire { burning: bool },
    Growth { stage: u8, mature: bool },
    Storage { empty: bool, hidden: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub state: EntityState,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            state: EntityState::Inert,
        }
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn actor(&self) -> Option<&ActorState> {
        match &self.state {
            EntityState::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn is_burning(&self) -> bool {
        matches!(self.state, EntityState::Fire { burning: true })
    }

    pub fn has_lit_torch(&self) -> bool {
        self.actor()
            .map(|actor| actor.torch_lit && !actor.dead)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Grass,
    Dirt,
    Sand,
    Water,
    Rock,
}

impl TileKind {
    pub fn is_water(self) -> bool {
        matches!(self, TileKind::Water)
    }
}

/// `origin` is the world position of the top-left corner of tile (0,0);
/// tile (x,y) covers `origin + [x, x+1) * tile_size` horizontally and likewise vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size: f32,
    origin: Vec2,
    tiles: Vec<TileKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        origin: Vec2,
        tiles: Vec<TileKind>,
    ) -> Result<Self, TilemapError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(TilemapError::InvalidTileSize(tile_size));
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            origin,
            tiles,
        })
    }

    pub fn filled(width: u32, height: u32, tile_size: f32, fill: TileKind) -> Result<Self, TilemapError> {
        Self::new(
            width,
            height,
            tile_size,
            Vec2::ZERO,
            vec![fill; width as usize * height as usize],
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<TileKind> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn set_tile(&mut self, x: u32, y: u32, tile: TileKind) -> bool {
        let Some(index) = self.index_of(x, y) else {
            return false;
        };
        self.tiles[index] = tile;
        true
    }

    pub fn tile_coords_at_world(&self, world: Vec2) -> Option<(u32, u32)> {
        if !world.is_finite() {
            return None;
        }
        let local = world - self.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let x = (local.x / self.tile_size).floor() as u32;
        let y = (local.y / self.tile_size).floor() as u32;
        self.index_of(x, y).map(|_| (x, y))
    }

    pub fn tile_at_world(&self, world: Vec2) -> Option<TileKind> {
        let (x, y) = self.tile_coords_at_world(world)?;
        self.tile_at(x, y)
    }

    pub fn tile_origin_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        Some(Vec2::new(
            self.origin.x + x as f32 * self.tile_size,
            self.origin.y + y as f32 * self.tile_size,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Weather {
    #[default]
    Clear,
    Rain {
        intensity: f32,
    },
}

pub type EntityCollection = BTreeMap<EntityId, Entity>;

/// Read-only view of the authoritative world as of the latest network update.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    collections: BTreeMap<EntityKind, EntityCollection>,
    pub local_player: Option<EntityId>,
    pub tilemap: Option<Tilemap>,
    pub cycle_progress: Option<f32>,
    pub weather: Weather,
    pub last_confirmed_swing_ms: Option<u64>,
}

impl WorldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        let previous_kind = self.kind_of(entity.id);
        if let Some(kind) = previous_kind.filter(|kind| *kind != entity.kind) {
            if let Some(collection) = self.collections.get_mut(&kind) {
                collection.remove(&entity.id);
            }
        }
        self.collections
            .entry(entity.kind)
            .or_default()
            .insert(entity.id, entity)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let kind = self.kind_of(id)?;
        self.collections.get_mut(&kind)?.remove(&id)
    }

    pub fn collection(&self, kind: EntityKind) -> Option<&EntityCollection> {
        self.collections.get(&kind)
    }

    pub fn collections(&self) -> impl Iterator<Item = (EntityKind, &EntityCollection)> {
        self.collections
            .iter()
            .map(|(kind, collection)| (*kind, collection))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.collections.values().flat_map(|collection| collection.values())
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.collections
            .values()
            .find_map(|collection| collection.get(&id))
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.collections
            .values_mut()
            .find_map(|collection| collection.get_mut(&id))
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.find(id).map(|entity| entity.kind)
    }

    pub fn entity_count(&self) -> usize {
        self.collections.values().map(|collection| collection.len()).sum()
    }

    pub fn local_actor(&self) -> Option<&Entity> {
        self.local_player.and_then(|id| self.find(id))
    }

    pub fn local_actor_state(&self) -> Option<&ActorState> {
        self.local_actor().and_then(Entity::actor)
    }

    pub fn local_actor_dead(&self) -> bool {
        self.local_actor_state()
            .map(|actor| actor.dead)
            .unwrap_or(false)
    }
}

use std::collections::HashMap;

use crate::frame::VisualOffset;
use crate::world::{Entity, EntityKind, EntityState};

use super::assets::{AssetHandle, AssetStore};
use super::Canvas;

const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;
const DEAD_TINT: [u8; 4] = [40, 40, 40, 160];

/// Everything a renderer needs to draw one entity at its final screen spot.
#[derive(Debug, Clone, Copy)]
pub struct EntityDraw<'a> {
    pub entity: &'a Entity,
    /// Screen position after the procedural animation offset.
    pub screen: (i32, i32),
    pub offset: VisualOffset,
    pub sprite: AssetHandle<'a>,
    pub now_ms: u64,
}

/// Draws one kind of entity. Implementations must tolerate any entity state
/// and any sprite handle, including `Pending` and `Failed`.
pub trait EntityRenderer {
    fn sprite_key(&self, entity: &Entity) -> Option<&str>;

    fn draw(&self, canvas: &mut Canvas<'_>, draw: &EntityDraw<'_>);

    /// Half width of the ground shadow, 0 for none.
    fn shadow_radius(&self, _entity: &Entity) -> i32 {
        0
    }
}

/// Outline square used for kinds nobody registered a renderer for.
#[derive(Debug, Default)]
pub struct PlaceholderRenderer;

impl EntityRenderer for PlaceholderRenderer {
    fn sprite_key(&self, _entity: &Entity) -> Option<&str> {
        None
    }

    fn draw(&self, canvas: &mut Canvas<'_>, draw: &EntityDraw<'_>) {
        let (x, y) = draw.screen;
        let size = PLACEHOLDER_HALF_SIZE_PX * 2 + 1;
        canvas.rect_outline(
            x - PLACEHOLDER_HALF_SIZE_PX,
            y - PLACEHOLDER_HALF_SIZE_PX,
            size,
            size,
            PLACEHOLDER_COLOR,
        );
    }
}

/// Sprite when ready, a solid state-dependent block otherwise.
#[derive(Debug)]
pub struct SpriteRenderer {
    key: String,
    half_extent_px: i32,
    shadow_radius_px: i32,
}

impl SpriteRenderer {
    pub fn new(key: impl Into<String>, half_extent_px: i32, shadow_radius_px: i32) -> Self {
        Self {
            key: key.into(),
            half_extent_px,
            shadow_radius_px,
        }
    }

    pub fn for_kind(kind: EntityKind) -> Self {
        let (half_extent_px, shadow_radius_px) = match kind {
            EntityKind::Player | EntityKind::Creature => (10, 9),
            EntityKind::Campfire => (12, 11),
            EntityKind::Plant => (8, 6),
            EntityKind::Container | EntityKind::Stash => (10, 10),
            EntityKind::Corpse => (10, 0),
            EntityKind::DroppedItem => (5, 4),
            EntityKind::Structure => (16, 0),
        };
        Self::new(kind.label(), half_extent_px, shadow_radius_px)
    }
}

impl EntityRenderer for SpriteRenderer {
    fn sprite_key(&self, _entity: &Entity) -> Option<&str> {
        Some(&self.key)
    }

    fn draw(&self, canvas: &mut Canvas<'_>, draw: &EntityDraw<'_>) {
        let (x, y) = draw.screen;
        let half = scaled_half_extent(draw.entity, self.half_extent_px);
        match draw.sprite.ready() {
            Some(sprite) => {
                let scale = if sprite.width == 0 {
                    1.0
                } else {
                    (half * 2) as f32 / sprite.width as f32
                };
                canvas.blit_centered(x, y, sprite, scale);
            }
            None => {
                canvas.fill_rect(x - half, y - half, half * 2 + 1, half * 2 + 1, fallback_color(draw.entity));
            }
        }
        if draw.entity.actor().map(|actor| actor.dead).unwrap_or(false) {
            canvas.fill_rect(x - half, y - half, half * 2 + 1, half * 2 + 1, DEAD_TINT);
        }
    }

    fn shadow_radius(&self, _entity: &Entity) -> i32 {
        self.shadow_radius_px
    }
}

fn scaled_half_extent(entity: &Entity, base: i32) -> i32 {
    match entity.state {
        EntityState::Growth { stage, mature } if !mature => (base * (stage as i32 + 2) / 5).clamp(2, base),
        _ => base,
    }
}

/// Deterministic solid color for an entity whose sprite is not ready.
pub fn fallback_color(entity: &Entity) -> [u8; 4] {
    match (&entity.kind, &entity.state) {
        (EntityKind::Player, EntityState::Actor(actor)) if actor.downed => [200, 160, 60, 255],
        (EntityKind::Player, _) => [70, 130, 220, 255],
        (EntityKind::Creature, _) => [170, 70, 60, 255],
        (EntityKind::Campfire, EntityState::Fire { burning: true }) => [250, 140, 40, 255],
        (EntityKind::Campfire, _) => [90, 80, 70, 255],
        (EntityKind::Plant, EntityState::Growth { mature: true, .. }) => [80, 190, 90, 255],
        (EntityKind::Plant, _) => [60, 130, 70, 255],
        (EntityKind::Container, EntityState::Storage { empty: true, .. }) => [130, 100, 70, 255],
        (EntityKind::Container, _) => [160, 120, 70, 255],
        (EntityKind::Stash, EntityState::Storage { hidden: true, .. }) => [90, 90, 60, 140],
        (EntityKind::Stash, _) => [120, 110, 70, 255],
        (EntityKind::Corpse, _) => [110, 100, 100, 255],
        (EntityKind::DroppedItem, _) => [240, 220, 120, 255],
        (EntityKind::Structure, _) => [140, 110, 80, 255],
    }
}

/// Renderer per entity kind, falling back to `PlaceholderRenderer`.
pub struct RendererRegistry {
    by_kind: HashMap<EntityKind, Box<dyn EntityRenderer>>,
    placeholder: PlaceholderRenderer,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl RendererRegistry {
    pub fn empty() -> Self {
        Self {
            by_kind: HashMap::new(),
            placeholder: PlaceholderRenderer,
        }
    }

    /// A `SpriteRenderer` for every kind, keyed by the kind label.
    pub fn with_sprite_renderers() -> Self {
        let mut registry = Self::empty();
        for kind in EntityKind::ALL {
            registry.register(kind, Box::new(SpriteRenderer::for_kind(kind)));
        }
        registry
    }

    pub fn register(&mut self, kind: EntityKind, renderer: Box<dyn EntityRenderer>) -> Option<Box<dyn EntityRenderer>> {
        self.by_kind.insert(kind, renderer)
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    pub fn get(&self, kind: EntityKind) -> &dyn EntityRenderer {
        match self.by_kind.get(&kind) {
            Some(renderer) => renderer.as_ref(),
            None => &self.placeholder,
        }
    }

    /// Resolves the sprite handle for `entity`, queueing a load on first sight.
    pub fn sprite_for<'s>(&self, entity: &Entity, assets: &'s mut AssetStore) -> AssetHandle<'s> {
        match self.get(entity.kind).sprite_key(entity) {
            Some(key) => assets.request(key),
            None => AssetHandle::Failed,
        }
    }
}

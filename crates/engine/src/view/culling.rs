use std::collections::{BTreeMap, HashMap};

use crate::world::{Entity, EntityId, EntityKind, Tilemap, Vec2, WorldSnapshot};

use super::camera::{Camera, Viewport};

/// Screen-space rectangle `[-margin, w+margin] x [-margin, h+margin]`, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddedViewport {
    pub min: Vec2,
    pub max: Vec2,
}

impl PaddedViewport {
    pub fn new(viewport: Viewport, margin: f32) -> Self {
        let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
        Self {
            min: Vec2::new(-margin, -margin),
            max: Vec2::new(viewport.width as f32 + margin, viewport.height as f32 + margin),
        }
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        screen.is_finite()
            && screen.x >= self.min.x
            && screen.x <= self.max.x
            && screen.y >= self.min.y
            && screen.y <= self.max.y
    }
}

/// Visibility of a single world point; depends only on position, camera and viewport.
pub fn is_visible(position: Vec2, camera: &Camera, margin: f32) -> bool {
    PaddedViewport::new(camera.viewport, margin).contains(camera.world_to_screen(position))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleEntry {
    pub kind: EntityKind,
    pub screen: Vec2,
}

/// Ids per kind in id order, plus an id-keyed index for label and interaction lookups.
#[derive(Debug, Clone, Default)]
pub struct VisibleSet {
    by_kind: BTreeMap<EntityKind, Vec<EntityId>>,
    index: HashMap<EntityId, VisibleEntry>,
}

impl VisibleSet {
    pub fn clear(&mut self) {
        for ids in self.by_kind.values_mut() {
            ids.clear();
        }
        self.index.clear();
    }

    pub fn insert(&mut self, entity: &Entity, screen: Vec2) {
        self.by_kind.entry(entity.kind).or_default().push(entity.id);
        self.index.insert(
            entity.id,
            VisibleEntry {
                kind: entity.kind,
                screen,
            },
        );
    }

    pub fn of_kind(&self, kind: EntityKind) -> &[EntityId] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: EntityId) -> Option<&VisibleEntry> {
        self.index.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.by_kind.values().flat_map(|ids| ids.iter().copied())
    }
}

/// Seam for swapping the per-frame visibility query, e.g. for a grid index.
pub trait CullStrategy {
    fn collect(&mut self, snapshot: &WorldSnapshot, camera: &Camera, margin: f32, out: &mut VisibleSet);
}

/// O(N) padded-viewport test over every collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl CullStrategy for LinearScan {
    fn collect(&mut self, snapshot: &WorldSnapshot, camera: &Camera, margin: f32, out: &mut VisibleSet) {
        out.clear();
        let padded = PaddedViewport::new(camera.viewport, margin);
        for (_, collection) in snapshot.collections() {
            for entity in collection.values() {
                let screen = camera.world_to_screen(entity.position);
                if padded.contains(screen) {
                    out.insert(entity, screen);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

/// Inclusive range of tiles overlapping the unpadded viewport.
pub fn visible_tile_range(tilemap: &Tilemap, camera: &Camera) -> Option<TileRange> {
    if tilemap.width() == 0 || tilemap.height() == 0 || camera.viewport.is_empty() {
        return None;
    }
    let top_left = camera.screen_to_world(Vec2::ZERO) - tilemap.origin();
    let bottom_right = camera.screen_to_world(Vec2::new(
        camera.viewport.width as f32,
        camera.viewport.height as f32,
    )) - tilemap.origin();
    if !top_left.is_finite() || !bottom_right.is_finite() {
        return None;
    }

    let size = tilemap.tile_size();
    let x_min = ((top_left.x / size).floor() as i64).max(0);
    let y_min = ((top_left.y / size).floor() as i64).max(0);
    let x_max = ((bottom_right.x / size).ceil() as i64 - 1).min(tilemap.width() as i64 - 1);
    let y_max = ((bottom_right.y / size).ceil() as i64 - 1).min(tilemap.height() as i64 - 1);
    if x_min > x_max || y_min > y_max {
        return None;
    }
    Some(TileRange {
        x_min: x_min as u32,
        x_max: x_max as u32,
        y_min: y_min as u32,
        y_max: y_max as u32,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::world::TileKind;

    fn camera(offset: Vec2, width: u32, height: u32) -> Camera {
        Camera::from_offset(offset, Viewport::new(width, height))
    }

    #[test]
    fn margin_edge_is_inclusive() {
        let camera = camera(Vec2::ZERO, 800, 600);
        let margin = 96.0;
        assert!(is_visible(Vec2::new(800.0 + margin - 1.0, 300.0), &camera, margin));
        assert!(is_visible(Vec2::new(800.0 + margin, 300.0), &camera, margin));
        assert!(!is_visible(Vec2::new(800.0 + margin + 1.0, 300.0), &camera, margin));
        assert!(is_visible(Vec2::new(-margin, -margin), &camera, margin));
        assert!(!is_visible(Vec2::new(-margin - 1.0, 0.0), &camera, margin));
    }

    #[test]
    fn non_finite_positions_are_never_visible() {
        let camera = camera(Vec2::ZERO, 100, 100);
        assert!(!is_visible(Vec2::new(f32::NAN, 10.0), &camera, 50.0));
        assert!(!is_visible(Vec2::new(10.0, f32::INFINITY), &camera, 50.0));
    }

    #[test]
    fn linear_scan_groups_by_kind_with_lookup() {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(Entity::new(EntityId(1), EntityKind::Player, Vec2::new(10.0, 10.0)));
        snapshot.insert(Entity::new(EntityId(2), EntityKind::Plant, Vec2::new(50.0, 40.0)));
        snapshot.insert(Entity::new(EntityId(3), EntityKind::Plant, Vec2::new(5_000.0, 40.0)));
        let camera = camera(Vec2::new(100.0, 0.0), 200, 100);
        let mut visible = VisibleSet::default();

        LinearScan.collect(&snapshot, &camera, 16.0, &mut visible);

        assert_eq!(visible.of_kind(EntityKind::Plant), &[EntityId(2)]);
        assert_eq!(visible.of_kind(EntityKind::Player), &[EntityId(1)]);
        assert_eq!(visible.of_kind(EntityKind::Corpse), &[] as &[EntityId]);
        assert_eq!(
            visible.get(EntityId(2)).map(|entry| entry.screen),
            Some(Vec2::new(150.0, 40.0))
        );
        assert!(!visible.contains(EntityId(3)));
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn collect_replaces_previous_frame() {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(Entity::new(EntityId(1), EntityKind::Creature, Vec2::new(10.0, 10.0)));
        let mut visible = VisibleSet::default();
        LinearScan.collect(&snapshot, &camera(Vec2::ZERO, 100, 100), 0.0, &mut visible);
        assert_eq!(visible.len(), 1);

        LinearScan.collect(&snapshot, &camera(Vec2::new(-1_000.0, 0.0), 100, 100), 0.0, &mut visible);
        assert!(visible.is_empty());
        assert!(visible.of_kind(EntityKind::Creature).is_empty());
    }

    #[test]
    fn tile_range_covers_viewport_and_clamps_to_map() {
        let tilemap = Tilemap::filled(10, 10, 32.0, TileKind::Grass).expect("tilemap");
        let range = visible_tile_range(&tilemap, &camera(Vec2::new(-40.0, -10.0), 64, 64))
            .expect("range");
        assert_eq!(
            range,
            TileRange {
                x_min: 1,
                x_max: 3,
                y_min: 0,
                y_max: 2,
            }
        );

        let range = visible_tile_range(&tilemap, &camera(Vec2::new(100.0, 100.0), 1_000, 1_000))
            .expect("range");
        assert_eq!((range.x_min, range.x_max, range.y_min, range.y_max), (0, 9, 0, 9));

        assert!(visible_tile_range(&tilemap, &camera(Vec2::new(5_000.0, 0.0), 64, 64)).is_none());
    }

    proptest! {
        #[test]
        fn scan_matches_padded_rectangle_definition(
            positions in proptest::collection::vec((-2_000.0f32..2_000.0, -2_000.0f32..2_000.0), 0..64),
            offset in (-1_000.0f32..1_000.0, -1_000.0f32..1_000.0),
            size in (1u32..1_200, 1u32..900),
            margin in 0.0f32..200.0,
        ) {
            let mut snapshot = WorldSnapshot::new();
            for (index, (x, y)) in positions.iter().enumerate() {
                let kind = EntityKind::ALL[index % EntityKind::ALL.len()];
                snapshot.insert(Entity::new(EntityId(index as u64), kind, Vec2::new(*x, *y)));
            }
            let camera = camera(Vec2::new(offset.0, offset.1), size.0, size.1);
            let mut visible = VisibleSet::default();
            LinearScan.collect(&snapshot, &camera, margin, &mut visible);

            for entity in snapshot.entities() {
                let sx = entity.position.x + offset.0;
                let sy = entity.position.y + offset.1;
                let expected = sx >= -margin
                    && sx <= size.0 as f32 + margin
                    && sy >= -margin
                    && sy <= size.1 as f32 + margin;
                prop_assert_eq!(visible.contains(entity.id), expected, "entity {:?}", entity.id);
                prop_assert_eq!(
                    visible.of_kind(entity.kind).contains(&entity.id),
                    expected
                );
            }
        }
    }
}

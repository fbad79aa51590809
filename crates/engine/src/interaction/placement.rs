use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{Vec2, WorldSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceableItem {
    Campfire,
    StorageBox,
    Stash,
    WoodWall,
    Bedroll,
}

impl PlaceableItem {
    pub const ALL: [PlaceableItem; 5] = [
        PlaceableItem::Campfire,
        PlaceableItem::StorageBox,
        PlaceableItem::Stash,
        PlaceableItem::WoodWall,
        PlaceableItem::Bedroll,
    ];

    pub fn from_slot(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(PlaceableItem::Campfire),
            2 => Some(PlaceableItem::StorageBox),
            3 => Some(PlaceableItem::Stash),
            4 => Some(PlaceableItem::WoodWall),
            5 => Some(PlaceableItem::Bedroll),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaceableItem::Campfire => "campfire",
            PlaceableItem::StorageBox => "storage box",
            PlaceableItem::Stash => "stash",
            PlaceableItem::WoodWall => "wood wall",
            PlaceableItem::Bedroll => "bedroll",
        }
    }

    pub fn footprint_half_px(self) -> i32 {
        match self {
            PlaceableItem::WoodWall => 16,
            PlaceableItem::Bedroll => 14,
            _ => 12,
        }
    }
}

/// Client-side advisory outcomes; the simulation stays authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlacementRejection {
    #[error("too far away to place that")]
    TooFar { distance: f32, max_distance: f32 },
    #[error("cannot place on water")]
    OnWater,
    #[error("cannot place outside the world")]
    OutsideWorld,
    #[error("you cannot build right now")]
    NoActor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementMode {
    selected: Option<PlaceableItem>,
}

impl PlacementMode {
    /// Selecting the already selected item leaves placement mode.
    pub fn select(&mut self, item: PlaceableItem) {
        if self.selected == Some(item) {
            self.selected = None;
        } else {
            self.selected = Some(item);
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.selected.take().is_some()
    }

    pub fn active(&self) -> Option<PlaceableItem> {
        self.selected
    }

    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }
}

pub fn check_placement(
    snapshot: &WorldSnapshot,
    position: Vec2,
    max_distance: f32,
) -> Result<(), PlacementRejection> {
    let Some(actor) = snapshot.local_actor() else {
        return Err(PlacementRejection::NoActor);
    };
    if snapshot.local_actor_dead() || !actor.position.is_finite() || !position.is_finite() {
        return Err(PlacementRejection::NoActor);
    }

    let distance = actor.position.distance_sq(position).sqrt();
    if distance > max_distance {
        return Err(PlacementRejection::TooFar {
            distance,
            max_distance,
        });
    }

    if let Some(tilemap) = &snapshot.tilemap {
        match tilemap.tile_at_world(position) {
            None => return Err(PlacementRejection::OutsideWorld),
            Some(tile) if tile.is_water() => return Err(PlacementRejection::OnWater),
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ActorState, Entity, EntityId, EntityKind, EntityState, TileKind, Tilemap};

    fn snapshot_with_actor_at(position: Vec2) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(
            Entity::new(EntityId(1), EntityKind::Player, position)
                .with_state(EntityState::Actor(ActorState::default())),
        );
        snapshot.local_player = Some(EntityId(1));
        let mut tilemap = Tilemap::filled(10, 10, 32.0, TileKind::Grass).expect("tilemap");
        tilemap.set_tile(3, 1, TileKind::Water);
        snapshot.tilemap = Some(tilemap);
        snapshot
    }

    #[test]
    fn accepts_nearby_dry_tile() {
        let snapshot = snapshot_with_actor_at(Vec2::new(50.0, 50.0));
        assert_eq!(check_placement(&snapshot, Vec2::new(70.0, 50.0), 100.0), Ok(()));
    }

    #[test]
    fn rejects_far_water_and_outside_positions() {
        let snapshot = snapshot_with_actor_at(Vec2::new(50.0, 50.0));

        assert!(matches!(
            check_placement(&snapshot, Vec2::new(300.0, 50.0), 100.0),
            Err(PlacementRejection::TooFar { .. })
        ));
        assert_eq!(
            check_placement(&snapshot, Vec2::new(100.0, 40.0), 100.0),
            Err(PlacementRejection::OnWater)
        );
        assert_eq!(
            check_placement(&snapshot, Vec2::new(-10.0, 50.0), 100.0),
            Err(PlacementRejection::OutsideWorld)
        );
    }

    #[test]
    fn rejects_without_living_actor() {
        let mut snapshot = snapshot_with_actor_at(Vec2::new(50.0, 50.0));
        snapshot.local_player = None;
        assert_eq!(
            check_placement(&snapshot, Vec2::new(60.0, 50.0), 100.0),
            Err(PlacementRejection::NoActor)
        );
    }

    #[test]
    fn reselecting_same_item_leaves_placement_mode() {
        let mut mode = PlacementMode::default();
        mode.select(PlaceableItem::Campfire);
        assert_eq!(mode.active(), Some(PlaceableItem::Campfire));
        mode.select(PlaceableItem::Stash);
        assert_eq!(mode.active(), Some(PlaceableItem::Stash));
        mode.select(PlaceableItem::Stash);
        assert!(!mode.is_active());
        assert!(!mode.cancel());
    }
}

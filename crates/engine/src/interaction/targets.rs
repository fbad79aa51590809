use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::EntityId;

use super::intents::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionCategory {
    DroppedItem,
    Harvestable,
    Container,
    Corpse,
    Campfire,
    Stash,
    EmptyContainer,
    DownedAlly,
}

impl InteractionCategory {
    pub const ALL: [InteractionCategory; 8] = [
        InteractionCategory::DroppedItem,
        InteractionCategory::Harvestable,
        InteractionCategory::Container,
        InteractionCategory::Corpse,
        InteractionCategory::Campfire,
        InteractionCategory::Stash,
        InteractionCategory::EmptyContainer,
        InteractionCategory::DownedAlly,
    ];

    pub fn tap_intent(self, target: EntityId) -> Option<Intent> {
        match self {
            InteractionCategory::DroppedItem => Some(Intent::PickUpItem { target }),
            InteractionCategory::Harvestable => Some(Intent::Harvest { target }),
            InteractionCategory::Container => Some(Intent::OpenContainer { target }),
            InteractionCategory::Corpse => Some(Intent::LootCorpse { target }),
            _ => None,
        }
    }

    pub fn hold_intent(self, target: EntityId) -> Option<Intent> {
        match self {
            InteractionCategory::Campfire => Some(Intent::ToggleBurn { target }),
            InteractionCategory::Stash => Some(Intent::ToggleStashVisibility { target }),
            InteractionCategory::EmptyContainer => Some(Intent::PickUpContainer { target }),
            InteractionCategory::DownedAlly => Some(Intent::Revive { target }),
            _ => None,
        }
    }

    pub fn is_tap_capable(self) -> bool {
        self.tap_intent(EntityId(0)).is_some()
    }

    pub fn is_hold_capable(self) -> bool {
        self.hold_intent(EntityId(0)).is_some()
    }

    pub fn hint_label(self) -> &'static str {
        match self {
            InteractionCategory::DroppedItem => "PICK UP",
            InteractionCategory::Harvestable => "HARVEST",
            InteractionCategory::Container => "OPEN",
            InteractionCategory::Corpse => "LOOT",
            InteractionCategory::Campfire => "HOLD: TOGGLE FIRE",
            InteractionCategory::Stash => "HOLD: TOGGLE STASH",
            InteractionCategory::EmptyContainer => "HOLD: PICK UP BOX",
            InteractionCategory::DownedAlly => "HOLD: REVIVE",
        }
    }
}

pub const DEFAULT_TAP_PRIORITY: [InteractionCategory; 4] = [
    InteractionCategory::DroppedItem,
    InteractionCategory::Harvestable,
    InteractionCategory::Container,
    InteractionCategory::Corpse,
];

pub const DEFAULT_HOLD_PRIORITY: [InteractionCategory; 4] = [
    InteractionCategory::DownedAlly,
    InteractionCategory::Campfire,
    InteractionCategory::Stash,
    InteractionCategory::EmptyContainer,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestTarget {
    pub id: EntityId,
    pub distance_sq: f32,
    pub threshold_sq: f32,
}

impl ClosestTarget {
    pub fn in_range(&self) -> bool {
        self.distance_sq.is_finite() && self.distance_sq <= self.threshold_sq
    }
}

/// Closest interactable per category, recomputed by the simulation side every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionTargets {
    entries: BTreeMap<InteractionCategory, ClosestTarget>,
}

impl InteractionTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: InteractionCategory, id: EntityId) -> Self {
        self.set(
            category,
            Some(ClosestTarget {
                id,
                distance_sq: 0.0,
                threshold_sq: f32::MAX,
            }),
        );
        self
    }

    pub fn set(&mut self, category: InteractionCategory, target: Option<ClosestTarget>) {
        match target {
            Some(target) => {
                self.entries.insert(category, target);
            }
            None => {
                self.entries.remove(&category);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn raw(&self, category: InteractionCategory) -> Option<ClosestTarget> {
        self.entries.get(&category).copied()
    }

    /// Closest id for `category`, only when it sits inside its interaction threshold.
    pub fn valid(&self, category: InteractionCategory) -> Option<EntityId> {
        self.raw(category)
            .filter(ClosestTarget::in_range)
            .map(|target| target.id)
    }

    pub fn first_valid(
        &self,
        priority: &[InteractionCategory],
    ) -> Option<(InteractionCategory, EntityId)> {
        priority
            .iter()
            .find_map(|category| self.valid(*category).map(|id| (*category, id)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_priority_prefers_dropped_item_over_plant_and_container() {
        let targets = InteractionTargets::new()
            .with(InteractionCategory::Corpse, EntityId(4))
            .with(InteractionCategory::Container, EntityId(3))
            .with(InteractionCategory::Harvestable, EntityId(2))
            .with(InteractionCategory::DroppedItem, EntityId(1));

        assert_eq!(
            targets.first_valid(&DEFAULT_TAP_PRIORITY),
            Some((InteractionCategory::DroppedItem, EntityId(1)))
        );

        let without_item = InteractionTargets::new()
            .with(InteractionCategory::Corpse, EntityId(4))
            .with(InteractionCategory::Container, EntityId(3))
            .with(InteractionCategory::Harvestable, EntityId(2));
        assert_eq!(
            without_item.first_valid(&DEFAULT_TAP_PRIORITY),
            Some((InteractionCategory::Harvestable, EntityId(2)))
        );

        let only_corpse = InteractionTargets::new().with(InteractionCategory::Corpse, EntityId(4));
        assert_eq!(
            only_corpse.first_valid(&DEFAULT_TAP_PRIORITY),
            Some((InteractionCategory::Corpse, EntityId(4)))
        );
    }

    #[test]
    fn out_of_range_targets_are_not_valid() {
        let mut targets = InteractionTargets::new();
        targets.set(
            InteractionCategory::Harvestable,
            Some(ClosestTarget {
                id: EntityId(9),
                distance_sq: 101.0,
                threshold_sq: 100.0,
            }),
        );
        assert_eq!(targets.valid(InteractionCategory::Harvestable), None);
        assert!(targets.raw(InteractionCategory::Harvestable).is_some());

        targets.set(
            InteractionCategory::Harvestable,
            Some(ClosestTarget {
                id: EntityId(9),
                distance_sq: 100.0,
                threshold_sq: 100.0,
            }),
        );
        assert_eq!(targets.valid(InteractionCategory::Harvestable), Some(EntityId(9)));
    }

    #[test]
    fn every_category_is_exactly_one_of_tap_or_hold() {
        for category in InteractionCategory::ALL {
            assert_ne!(
                category.is_tap_capable(),
                category.is_hold_capable(),
                "{category:?}"
            );
        }
        assert!(DEFAULT_TAP_PRIORITY.iter().all(|c| c.is_tap_capable()));
        assert!(DEFAULT_HOLD_PRIORITY.iter().all(|c| c.is_hold_capable()));
    }
}

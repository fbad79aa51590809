use thiserror::Error;
use tracing::warn;

use crate::world::{EntityId, Vec2};

use super::placement::PlaceableItem;

/// Fire-and-forget request to the authoritative simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Move { direction: Vec2 },
    PickUpItem { target: EntityId },
    Harvest { target: EntityId },
    OpenContainer { target: EntityId },
    LootCorpse { target: EntityId },
    ToggleBurn { target: EntityId },
    ToggleStashVisibility { target: EntityId },
    PickUpContainer { target: EntityId },
    Revive { target: EntityId },
    Swing,
    FireProjectile { toward: Vec2 },
    Place { item: PlaceableItem, position: Vec2 },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Move { .. } => "move",
            Intent::PickUpItem { .. } => "pick_up_item",
            Intent::Harvest { .. } => "harvest",
            Intent::OpenContainer { .. } => "open_container",
            Intent::LootCorpse { .. } => "loot_corpse",
            Intent::ToggleBurn { .. } => "toggle_burn",
            Intent::ToggleStashVisibility { .. } => "toggle_stash_visibility",
            Intent::PickUpContainer { .. } => "pick_up_container",
            Intent::Revive { .. } => "revive",
            Intent::Swing => "swing",
            Intent::FireProjectile { .. } => "fire_projectile",
            Intent::Place { .. } => "place",
        }
    }

    pub fn target(&self) -> Option<EntityId> {
        match self {
            Intent::PickUpItem { target }
            | Intent::Harvest { target }
            | Intent::OpenContainer { target }
            | Intent::LootCorpse { target }
            | Intent::ToggleBurn { target }
            | Intent::ToggleStashVisibility { target }
            | Intent::PickUpContainer { target }
            | Intent::Revive { target } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("connection unavailable: {0}")]
    Transport(String),
    #[error("{reason}")]
    Rejected { reason: String },
}

/// Boundary to the network/simulation layer. Implementations must not block.
pub trait IntentSink {
    fn submit(&mut self, intent: &Intent) -> Result<(), IntentError>;
}

impl IntentSink for Vec<Intent> {
    fn submit(&mut self, intent: &Intent) -> Result<(), IntentError> {
        self.push(intent.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct IntentQueue {
    pending: Vec<Intent>,
}

impl IntentQueue {
    pub fn push(&mut self, intent: Intent) {
        self.pending.push(intent);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[Intent] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Submits every queued intent in order. Failures are returned, never retried.
    pub fn flush(&mut self, sink: &mut dyn IntentSink) -> Vec<(Intent, IntentError)> {
        let mut failures = Vec::new();
        for intent in self.pending.drain(..) {
            if let Err(error) = sink.submit(&intent) {
                warn!(intent = intent.name(), error = %error, "intent_rejected");
                failures.push((intent, error));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySink {
        accepted: Vec<Intent>,
        reject_names: &'static [&'static str],
    }

    impl IntentSink for FlakySink {
        fn submit(&mut self, intent: &Intent) -> Result<(), IntentError> {
            if self.reject_names.contains(&intent.name()) {
                return Err(IntentError::Rejected {
                    reason: "too far away".to_string(),
                });
            }
            self.accepted.push(intent.clone());
            Ok(())
        }
    }

    #[test]
    fn flush_submits_in_order_and_drains() {
        let mut queue = IntentQueue::default();
        queue.push(Intent::Harvest {
            target: EntityId(7),
        });
        queue.push(Intent::Swing);
        let mut sink: Vec<Intent> = Vec::new();

        let failures = queue.flush(&mut sink);

        assert!(failures.is_empty());
        assert!(queue.is_empty());
        assert_eq!(
            sink,
            vec![
                Intent::Harvest {
                    target: EntityId(7)
                },
                Intent::Swing
            ]
        );
    }

    #[test]
    fn rejected_intents_are_reported_and_others_still_sent() {
        let mut queue = IntentQueue::default();
        queue.push(Intent::ToggleBurn {
            target: EntityId(3),
        });
        queue.push(Intent::Swing);
        let mut sink = FlakySink {
            accepted: Vec::new(),
            reject_names: &["toggle_burn"],
        };

        let failures = queue.flush(&mut sink);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.target(), Some(EntityId(3)));
        assert_eq!(failures[0].1.to_string(), "too far away");
        assert_eq!(sink.accepted, vec![Intent::Swing]);
    }
}

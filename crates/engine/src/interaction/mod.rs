mod hold;
mod intents;
mod machine;
mod placement;
mod swing;
mod targets;

pub use hold::{HoldProgress, HoldSession, HoldTimer, HoldTracker};
pub use intents::{Intent, IntentError, IntentQueue, IntentSink};
pub use machine::{
    CancelReason, CycleResolution, InteractPhase, InteractionMachine, NoOpReason, TickInput,
    UiMode,
};
pub use placement::{check_placement, PlaceableItem, PlacementMode, PlacementRejection};
pub use swing::SwingGate;
pub use targets::{
    ClosestTarget, InteractionCategory, InteractionTargets, DEFAULT_HOLD_PRIORITY,
    DEFAULT_TAP_PRIORITY,
};

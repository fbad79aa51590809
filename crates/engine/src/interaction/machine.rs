use tracing::{debug, info};

use crate::app::{ActionStates, InputAction, InputEvent, Modifiers, PointerButton};
use crate::config::InteractionConfig;
use crate::world::{EntityId, Vec2, WorldSnapshot};

use super::hold::{HoldProgress, HoldSession, HoldTracker};
use super::intents::{Intent, IntentError, IntentQueue, IntentSink};
use super::placement::{check_placement, PlaceableItem, PlacementMode};
use super::swing::SwingGate;
use super::targets::{InteractionCategory, InteractionTargets};

const FACING_REACH_PX: f32 = 96.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UiMode {
    #[default]
    Playing,
    Chat,
    Inventory,
    Menu,
}

impl UiMode {
    pub fn is_blocking(self) -> bool {
        !matches!(self, UiMode::Playing)
    }

    pub fn label(self) -> &'static str {
        match self {
            UiMode::Playing => "playing",
            UiMode::Chat => "chat",
            UiMode::Inventory => "inventory",
            UiMode::Menu => "menu",
        }
    }
}

/// Where the interact key is within one press/release cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractPhase {
    #[default]
    Idle,
    Holding,
    /// The cycle already resolved; waiting for the key to come up.
    AwaitingRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    FocusLost,
    Death,
    UiMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NoTarget,
    TargetChanged,
    Cancelled(CancelReason),
}

/// Exactly one of these is recorded per interact key cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResolution {
    Tap {
        category: InteractionCategory,
        target: EntityId,
    },
    Hold {
        category: InteractionCategory,
        target: EntityId,
    },
    NoOp(NoOpReason),
}

/// Per-tick inputs pulled from the current frame.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub now_ms: u64,
    pub snapshot: &'a WorldSnapshot,
    pub targets: &'a InteractionTargets,
    pub camera_offset: Vec2,
}

/// Turns raw input plus the closest-interactable map into intents.
///
/// Input events may arrive at any point between ticks; they only touch state
/// owned here and read the targets captured by the most recent tick.
#[derive(Debug)]
pub struct InteractionMachine {
    config: InteractionConfig,
    actions: ActionStates,
    modifiers: Modifiers,
    ui_mode: UiMode,
    minimap_open: bool,
    phase: InteractPhase,
    hold: HoldTracker,
    targets: InteractionTargets,
    actor_alive: bool,
    pointer_screen: Option<Vec2>,
    attack_held: bool,
    auto_attack: bool,
    swing: SwingGate,
    placement: PlacementMode,
    pending_placements: Vec<Vec2>,
    last_move: Vec2,
    facing: Vec2,
    intents: IntentQueue,
    resolutions: Vec<CycleResolution>,
    notices: Vec<String>,
}

impl InteractionMachine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            actions: ActionStates::default(),
            modifiers: Modifiers::default(),
            ui_mode: UiMode::Playing,
            minimap_open: false,
            phase: InteractPhase::Idle,
            hold: HoldTracker::default(),
            targets: InteractionTargets::new(),
            actor_alive: true,
            pointer_screen: None,
            attack_held: false,
            auto_attack: false,
            swing: SwingGate::default(),
            placement: PlacementMode::default(),
            pending_placements: Vec::new(),
            last_move: Vec2::ZERO,
            facing: Vec2::new(0.0, 1.0),
            intents: IntentQueue::default(),
            resolutions: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn ui_mode(&self) -> UiMode {
        self.ui_mode
    }

    pub fn phase(&self) -> InteractPhase {
        self.phase
    }

    pub fn minimap_open(&self) -> bool {
        self.minimap_open
    }

    pub fn auto_attack(&self) -> bool {
        self.auto_attack
    }

    pub fn placement(&self) -> Option<PlaceableItem> {
        self.placement.active()
    }

    pub fn pointer_screen(&self) -> Option<Vec2> {
        self.pointer_screen
    }

    pub fn targets(&self) -> &InteractionTargets {
        &self.targets
    }

    pub fn hold_session(&self) -> Option<&HoldSession> {
        self.hold.session()
    }

    pub fn hold_progress(&self, now_ms: u64) -> Option<HoldProgress> {
        self.hold.progress(now_ms)
    }

    pub fn pending_intents(&self) -> &[Intent] {
        self.intents.pending()
    }

    pub fn take_intents(&mut self) -> Vec<Intent> {
        let intents = self.intents.pending().to_vec();
        self.intents.clear();
        intents
    }

    pub fn flush_intents(&mut self, sink: &mut dyn IntentSink) -> Vec<(Intent, IntentError)> {
        self.intents.flush(sink)
    }

    pub fn take_resolutions(&mut self) -> Vec<CycleResolution> {
        std::mem::take(&mut self.resolutions)
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Replaces the targets used by input arriving before the next tick.
    pub fn set_targets(&mut self, targets: &InteractionTargets) {
        self.targets.clone_from(targets);
    }

    pub fn handle_event(&mut self, event: InputEvent, now_ms: u64) {
        match event {
            InputEvent::KeyDown { repeat: true, .. } => {}
            InputEvent::KeyDown { action, .. } => {
                self.actions.set(action, true);
                self.on_key_down(action, now_ms);
            }
            InputEvent::KeyUp { action } => {
                self.actions.set(action, false);
                if action == InputAction::Interact {
                    self.on_interact_up(now_ms);
                }
            }
            InputEvent::PointerMoved { position } => {
                self.pointer_screen = position.is_finite().then_some(position);
            }
            InputEvent::PointerLeft => {
                self.pointer_screen = None;
            }
            InputEvent::PointerDown { button, position } => {
                if position.is_finite() {
                    self.pointer_screen = Some(position);
                }
                self.on_pointer_down(button, position);
            }
            InputEvent::PointerUp { button } => {
                if button == PointerButton::Primary {
                    self.attack_held = false;
                }
            }
            InputEvent::Wheel { steps } => self.on_wheel(steps),
            InputEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers;
            }
            InputEvent::FocusLost => self.on_focus_lost(),
        }
    }

    /// Samples held state once per frame and emits continuous intents.
    pub fn tick(&mut self, input: TickInput<'_>) {
        self.set_targets(input.targets);
        let actor = input.snapshot.local_actor();
        let alive = actor
            .and_then(|entity| entity.actor())
            .map(|state| !state.dead && !state.downed)
            .unwrap_or(false);
        if self.actor_alive && !alive {
            self.cancel_hold(CancelReason::Death);
            self.attack_held = false;
            self.pending_placements.clear();
        }
        self.actor_alive = alive;

        self.complete_due_hold(input.now_ms);
        self.sample_movement();
        self.resolve_placements(input);
        self.attempt_swing(input);
    }

    fn on_key_down(&mut self, action: InputAction, now_ms: u64) {
        match action {
            InputAction::Chat => {
                let next = match self.ui_mode {
                    UiMode::Chat => UiMode::Playing,
                    _ => UiMode::Chat,
                };
                self.set_ui_mode(next);
            }
            InputAction::Inventory => {
                let next = match self.ui_mode {
                    UiMode::Inventory => UiMode::Playing,
                    UiMode::Playing => UiMode::Inventory,
                    other => other,
                };
                self.set_ui_mode(next);
            }
            InputAction::Menu => {
                if self.ui_mode.is_blocking() {
                    self.set_ui_mode(UiMode::Playing);
                } else if self.placement.cancel() {
                    self.pending_placements.clear();
                    debug!("placement_cancelled");
                } else {
                    self.set_ui_mode(UiMode::Menu);
                }
            }
            _ if self.ui_mode.is_blocking() => {}
            InputAction::Interact => self.on_interact_down(now_ms),
            InputAction::ToggleAutoAttack => {
                self.auto_attack = !self.auto_attack;
                info!(enabled = self.auto_attack, "auto_attack_toggled");
                let notice = if self.auto_attack {
                    "AUTO-ATTACK ON"
                } else {
                    "AUTO-ATTACK OFF"
                };
                self.notices.push(notice.to_string());
            }
            InputAction::ToggleMinimap => {
                self.minimap_open = !self.minimap_open;
            }
            _ => {
                if let Some(item) = action.slot_number().and_then(PlaceableItem::from_slot) {
                    self.placement.select(item);
                    self.pending_placements.clear();
                    debug!(item = item.label(), active = self.placement.is_active(), "placement_selected");
                }
            }
        }
    }

    fn on_interact_down(&mut self, now_ms: u64) {
        if self.phase != InteractPhase::Idle || !self.actor_alive {
            return;
        }
        if let Some((category, target_id)) = self.targets.first_valid(&self.config.hold_priority) {
            let session = HoldSession {
                target_id,
                category,
                started_ms: now_ms,
                duration_ms: self.config.hold_duration_for(category),
            };
            if self.hold.start(session).is_some() {
                self.phase = InteractPhase::Holding;
                debug!(
                    target_id = target_id.0,
                    category = ?category,
                    deadline_ms = session.deadline_ms(),
                    "hold_started"
                );
                return;
            }
        }
        // Nothing holdable in range: the press can only be a tap.
        self.resolve_tap();
        self.phase = InteractPhase::AwaitingRelease;
    }

    fn on_interact_up(&mut self, now_ms: u64) {
        match self.phase {
            InteractPhase::Idle => {}
            InteractPhase::AwaitingRelease => self.phase = InteractPhase::Idle,
            InteractPhase::Holding => {
                let due = self
                    .hold
                    .timer()
                    .filter(|timer| now_ms >= timer.deadline_ms())
                    .and_then(|timer| self.hold.complete(timer, now_ms));
                match due {
                    Some(session) => self.finish_hold(session),
                    None => {
                        if let Some(session) = self.hold.cancel() {
                            debug!(
                                target_id = session.target_id.0,
                                held_ms = now_ms.saturating_sub(session.started_ms),
                                "hold_released_early"
                            );
                        }
                        self.resolve_tap();
                    }
                }
                self.phase = InteractPhase::Idle;
            }
        }
    }

    fn complete_due_hold(&mut self, now_ms: u64) {
        if self.phase != InteractPhase::Holding {
            return;
        }
        if let Some(session) = self.hold.take_due(now_ms) {
            self.finish_hold(session);
            self.phase = InteractPhase::AwaitingRelease;
        }
    }

    fn finish_hold(&mut self, session: HoldSession) {
        let still_closest = self.targets.valid(session.category) == Some(session.target_id);
        let intent = still_closest
            .then(|| session.category.hold_intent(session.target_id))
            .flatten();
        match intent {
            Some(intent) => {
                debug!(
                    target_id = session.target_id.0,
                    category = ?session.category,
                    intent = intent.name(),
                    "hold_completed"
                );
                self.intents.push(intent);
                self.resolutions.push(CycleResolution::Hold {
                    category: session.category,
                    target: session.target_id,
                });
            }
            None => {
                debug!(
                    target_id = session.target_id.0,
                    category = ?session.category,
                    "hold_target_changed"
                );
                self.resolutions
                    .push(CycleResolution::NoOp(NoOpReason::TargetChanged));
            }
        }
    }

    fn resolve_tap(&mut self) {
        let tap = self
            .targets
            .first_valid(&self.config.tap_priority)
            .and_then(|(category, target)| {
                category
                    .tap_intent(target)
                    .map(|intent| (category, target, intent))
            });
        match tap {
            Some((category, target, intent)) => {
                debug!(target_id = target.0, intent = intent.name(), "tap_resolved");
                self.intents.push(intent);
                self.resolutions
                    .push(CycleResolution::Tap { category, target });
            }
            None => self
                .resolutions
                .push(CycleResolution::NoOp(NoOpReason::NoTarget)),
        }
    }

    fn cancel_hold(&mut self, reason: CancelReason) {
        let Some(session) = self.hold.cancel() else {
            return;
        };
        debug!(target_id = session.target_id.0, reason = ?reason, "hold_cancelled");
        self.resolutions
            .push(CycleResolution::NoOp(NoOpReason::Cancelled(reason)));
        if self.phase == InteractPhase::Holding {
            self.phase = if self.actions.is_down(InputAction::Interact) {
                InteractPhase::AwaitingRelease
            } else {
                InteractPhase::Idle
            };
        }
    }

    fn set_ui_mode(&mut self, mode: UiMode) {
        if mode == self.ui_mode {
            return;
        }
        info!(from = self.ui_mode.label(), to = mode.label(), "ui_mode_changed");
        self.ui_mode = mode;
        if mode.is_blocking() {
            self.cancel_hold(CancelReason::UiMode);
            self.attack_held = false;
            self.pending_placements.clear();
        }
    }

    fn on_focus_lost(&mut self) {
        self.cancel_hold(CancelReason::FocusLost);
        // Key-up events for keys held while unfocused never arrive.
        self.actions.release_all();
        self.modifiers = Modifiers::default();
        self.attack_held = false;
        self.phase = InteractPhase::Idle;
    }

    fn on_pointer_down(&mut self, button: PointerButton, position: Vec2) {
        if self.ui_mode.is_blocking() || !self.actor_alive {
            return;
        }
        match (button, self.placement.is_active()) {
            (PointerButton::Primary, true) => {
                if position.is_finite() {
                    self.pending_placements.push(position);
                }
            }
            (PointerButton::Primary, false) => self.attack_held = true,
            (PointerButton::Secondary, true) => {
                self.placement.cancel();
                self.pending_placements.clear();
                debug!("placement_cancelled");
            }
            (PointerButton::Secondary, false) => {}
        }
    }

    fn on_wheel(&mut self, steps: i32) {
        if steps == 0 || self.ui_mode.is_blocking() {
            return;
        }
        let Some(current) = self.placement.active() else {
            return;
        };
        let slot = PlaceableItem::ALL
            .iter()
            .position(|item| *item == current)
            .unwrap_or(0) as i32;
        let count = PlaceableItem::ALL.len() as i32;
        let next = PlaceableItem::ALL[(slot + steps).rem_euclid(count) as usize];
        if next != current {
            self.placement.select(next);
        }
    }

    fn sample_movement(&mut self) {
        let direction = if self.ui_mode.is_blocking() || !self.actor_alive {
            Vec2::ZERO
        } else {
            self.actions.movement_axis().normalized_or_zero()
        };
        if direction != Vec2::ZERO {
            self.facing = direction;
            self.intents.push(Intent::Move { direction });
        } else if self.last_move != Vec2::ZERO {
            self.intents.push(Intent::Move {
                direction: Vec2::ZERO,
            });
        }
        self.last_move = direction;
    }

    fn resolve_placements(&mut self, input: TickInput<'_>) {
        if self.pending_placements.is_empty() {
            return;
        }
        let clicks = std::mem::take(&mut self.pending_placements);
        for screen in clicks {
            let Some(item) = self.placement.active() else {
                break;
            };
            let world = screen - input.camera_offset;
            match check_placement(input.snapshot, world, self.config.placement_max_distance_px) {
                Ok(()) => {
                    debug!(item = item.label(), x = world.x, y = world.y, "placement_requested");
                    self.intents.push(Intent::Place {
                        item,
                        position: world,
                    });
                    if !self.modifiers.shift {
                        self.placement.cancel();
                    }
                }
                Err(rejection) => {
                    debug!(item = item.label(), reason = %rejection, "placement_rejected");
                    self.notices.push(rejection.to_string());
                }
            }
        }
    }

    fn attempt_swing(&mut self, input: TickInput<'_>) {
        if !(self.attack_held || self.auto_attack)
            || self.ui_mode.is_blocking()
            || !self.actor_alive
            || self.placement.is_active()
        {
            return;
        }
        let Some(actor) = input.snapshot.local_actor() else {
            return;
        };
        let equipped = actor.actor().and_then(|state| state.equipped.as_ref());
        let cooldown_ms = equipped
            .map(|item| item.cooldown_ms)
            .unwrap_or(self.config.unarmed_cooldown_ms);
        if !self
            .swing
            .try_accept(input.now_ms, cooldown_ms, input.snapshot.last_confirmed_swing_ms)
        {
            return;
        }
        let ranged = equipped.map(|item| item.ranged).unwrap_or(false);
        if ranged {
            let toward = self
                .pointer_screen
                .map(|screen| screen - input.camera_offset)
                .unwrap_or(actor.position + self.facing * FACING_REACH_PX);
            self.intents.push(Intent::FireProjectile { toward });
        } else {
            self.intents.push(Intent::Swing);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::world::{
        ActorState, Entity, EntityKind, EntityState, EquippedItem, TileKind, Tilemap,
    };

    fn snapshot() -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new();
        snapshot.insert(
            Entity::new(EntityId(1), EntityKind::Player, Vec2::new(100.0, 100.0))
                .with_state(EntityState::Actor(ActorState::default())),
        );
        snapshot.local_player = Some(EntityId(1));
        snapshot.tilemap = Some(Tilemap::filled(20, 20, 32.0, TileKind::Grass).expect("tilemap"));
        snapshot
    }

    fn machine() -> InteractionMachine {
        InteractionMachine::new(InteractionConfig::default())
    }

    fn tick(machine: &mut InteractionMachine, snapshot: &WorldSnapshot, targets: &InteractionTargets, now_ms: u64) {
        machine.tick(TickInput {
            now_ms,
            snapshot,
            targets,
            camera_offset: Vec2::ZERO,
        });
    }

    fn key_down(action: InputAction) -> InputEvent {
        InputEvent::KeyDown {
            action,
            repeat: false,
        }
    }

    fn key_up(action: InputAction) -> InputEvent {
        InputEvent::KeyUp { action }
    }

    fn targeted(intents: &[Intent]) -> Vec<Intent> {
        intents
            .iter()
            .filter(|intent| intent.target().is_some())
            .cloned()
            .collect()
    }

    #[test]
    fn quick_tap_harvests_mushroom_without_hold_session() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Harvestable, EntityId(7));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 10);
        let mut now = 10;
        while now < 90 {
            now += 16;
            tick(&mut machine, &snapshot, &targets, now);
            assert!(machine.hold_progress(now).is_none());
        }
        machine.handle_event(key_up(InputAction::Interact), 100);
        tick(&mut machine, &snapshot, &targets, 116);

        assert_eq!(
            targeted(&machine.take_intents()),
            vec![Intent::Harvest {
                target: EntityId(7)
            }]
        );
        assert_eq!(machine.phase(), InteractPhase::Idle);
    }

    #[test]
    fn long_hold_toggles_campfire_once() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Campfire, EntityId(3));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        let mut now = 0;
        let mut observed_until = 0;
        while now < 300 {
            if let Some(progress) = machine.hold_progress(now) {
                assert_eq!(progress.target_id, EntityId(3));
                observed_until = now;
            }
            now += 10;
            tick(&mut machine, &snapshot, &targets, now);
        }
        machine.handle_event(key_up(InputAction::Interact), 300);

        assert!(observed_until >= 240, "session vanished early at {observed_until}");
        assert!(machine.hold_session().is_none());
        assert_eq!(
            targeted(&machine.take_intents()),
            vec![Intent::ToggleBurn {
                target: EntityId(3)
            }]
        );
        assert_eq!(
            machine.take_resolutions(),
            vec![CycleResolution::Hold {
                category: InteractionCategory::Campfire,
                target: EntityId(3)
            }]
        );
    }

    #[test]
    fn early_release_next_to_fire_falls_back_to_tap() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new()
            .with(InteractionCategory::Campfire, EntityId(3))
            .with(InteractionCategory::DroppedItem, EntityId(8));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        tick(&mut machine, &snapshot, &targets, 100);
        machine.handle_event(key_up(InputAction::Interact), 120);

        assert_eq!(
            targeted(&machine.take_intents()),
            vec![Intent::PickUpItem {
                target: EntityId(8)
            }]
        );
    }

    #[test]
    fn release_after_deadline_without_tick_still_completes_hold() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Stash, EntityId(5));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        machine.handle_event(key_up(InputAction::Interact), 260);

        assert_eq!(
            targeted(&machine.take_intents()),
            vec![Intent::ToggleStashVisibility {
                target: EntityId(5)
            }]
        );
    }

    #[test]
    fn hold_is_silent_when_target_changed_before_completion() {
        let snapshot = snapshot();
        let before = InteractionTargets::new().with(InteractionCategory::Campfire, EntityId(3));
        let after = InteractionTargets::new().with(InteractionCategory::Campfire, EntityId(4));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &before, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        tick(&mut machine, &snapshot, &before, 100);
        tick(&mut machine, &snapshot, &after, 260);
        machine.handle_event(key_up(InputAction::Interact), 300);

        assert!(targeted(&machine.take_intents()).is_empty());
        assert_eq!(
            machine.take_resolutions(),
            vec![CycleResolution::NoOp(NoOpReason::TargetChanged)]
        );
    }

    #[test]
    fn revive_uses_longer_duration() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::DownedAlly, EntityId(9));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        tick(&mut machine, &snapshot, &targets, 1_000);
        assert!(machine.hold_session().is_some());
        tick(&mut machine, &snapshot, &targets, 1_500);
        assert!(machine.hold_session().is_none());
        assert_eq!(
            targeted(&machine.take_intents()),
            vec![Intent::Revive {
                target: EntityId(9)
            }]
        );
    }

    #[test]
    fn focus_loss_cancels_hold_and_clears_progress() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Campfire, EntityId(3));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        machine.handle_event(key_down(InputAction::MoveUp), 0);
        machine.handle_event(InputEvent::FocusLost, 100);

        assert!(machine.hold_progress(100).is_none());
        tick(&mut machine, &snapshot, &targets, 400);
        assert!(targeted(&machine.take_intents()).is_empty());
        assert_eq!(machine.phase(), InteractPhase::Idle);
    }

    #[test]
    fn opening_inventory_cancels_hold_and_release_is_not_a_tap() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new()
            .with(InteractionCategory::Campfire, EntityId(3))
            .with(InteractionCategory::Harvestable, EntityId(7));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        machine.handle_event(key_down(InputAction::Inventory), 50);
        assert_eq!(machine.ui_mode(), UiMode::Inventory);
        assert!(machine.hold_session().is_none());
        machine.handle_event(key_up(InputAction::Interact), 80);

        assert!(targeted(&machine.take_intents()).is_empty());
        assert_eq!(
            machine.take_resolutions(),
            vec![CycleResolution::NoOp(NoOpReason::Cancelled(CancelReason::UiMode))]
        );
    }

    #[test]
    fn death_cancels_hold_at_next_tick() {
        let mut snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Campfire, EntityId(3));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);
        machine.handle_event(key_down(InputAction::Interact), 0);

        if let Some(entity) = snapshot.find_mut(EntityId(1)) {
            entity.state = EntityState::Actor(ActorState {
                dead: true,
                ..ActorState::default()
            });
        }
        tick(&mut machine, &snapshot, &targets, 100);
        tick(&mut machine, &snapshot, &targets, 400);

        assert!(targeted(&machine.take_intents()).is_empty());
        assert_eq!(
            machine.take_resolutions(),
            vec![CycleResolution::NoOp(NoOpReason::Cancelled(CancelReason::Death))]
        );
    }

    #[test]
    fn diagonal_movement_is_normalized_and_stop_is_sent_once() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new();
        let mut machine = machine();

        machine.handle_event(key_down(InputAction::MoveUp), 0);
        machine.handle_event(key_down(InputAction::MoveRight), 0);
        tick(&mut machine, &snapshot, &targets, 16);
        let intents = machine.take_intents();
        let Some(Intent::Move { direction }) = intents.first() else {
            panic!("expected move intent, got {intents:?}");
        };
        assert!((direction.length_sq() - 1.0).abs() < 1e-5);
        assert!(direction.x > 0.0 && direction.y < 0.0);

        machine.handle_event(key_up(InputAction::MoveUp), 20);
        machine.handle_event(key_up(InputAction::MoveRight), 20);
        tick(&mut machine, &snapshot, &targets, 32);
        tick(&mut machine, &snapshot, &targets, 48);
        assert_eq!(
            machine.take_intents(),
            vec![Intent::Move {
                direction: Vec2::ZERO
            }]
        );
    }

    #[test]
    fn key_repeat_is_ignored() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new().with(InteractionCategory::Harvestable, EntityId(7));
        let mut machine = machine();
        tick(&mut machine, &snapshot, &targets, 0);

        machine.handle_event(key_down(InputAction::Interact), 0);
        for now in [30, 60, 90] {
            machine.handle_event(
                InputEvent::KeyDown {
                    action: InputAction::Interact,
                    repeat: true,
                },
                now,
            );
        }
        machine.handle_event(key_up(InputAction::Interact), 120);
        assert_eq!(targeted(&machine.take_intents()).len(), 1);
    }

    #[test]
    fn held_attack_swings_at_cooldown_cadence() {
        let mut snapshot = snapshot();
        if let Some(entity) = snapshot.find_mut(EntityId(1)) {
            entity.state = EntityState::Actor(ActorState {
                equipped: Some(EquippedItem {
                    name: "axe".to_string(),
                    cooldown_ms: 300,
                    ranged: false,
                }),
                ..ActorState::default()
            });
        }
        let targets = InteractionTargets::new();
        let mut machine = machine();
        machine.handle_event(
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                position: Vec2::new(10.0, 10.0),
            },
            0,
        );
        for now in (0..=1_000).step_by(16) {
            tick(&mut machine, &snapshot, &targets, now);
        }
        let swings = machine
            .take_intents()
            .into_iter()
            .filter(|intent| *intent == Intent::Swing)
            .count();
        // Accepted at 0, 304, 608, 912.
        assert_eq!(swings, 4);
    }

    #[test]
    fn ranged_item_fires_toward_pointer_world_point() {
        let mut snapshot = snapshot();
        if let Some(entity) = snapshot.find_mut(EntityId(1)) {
            entity.state = EntityState::Actor(ActorState {
                equipped: Some(EquippedItem {
                    name: "bow".to_string(),
                    cooldown_ms: 800,
                    ranged: true,
                }),
                ..ActorState::default()
            });
        }
        let targets = InteractionTargets::new();
        let mut machine = machine();
        machine.handle_event(
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                position: Vec2::new(300.0, 200.0),
            },
            0,
        );
        machine.tick(TickInput {
            now_ms: 0,
            snapshot: &snapshot,
            targets: &targets,
            camera_offset: Vec2::new(100.0, 50.0),
        });
        assert_eq!(
            machine.take_intents(),
            vec![Intent::FireProjectile {
                toward: Vec2::new(200.0, 150.0)
            }]
        );
    }

    #[test]
    fn placement_takes_priority_over_swing_and_checks_distance() {
        let snapshot = snapshot();
        let targets = InteractionTargets::new();
        let mut machine = machine();
        machine.handle_event(key_down(InputAction::Slot1), 0);
        assert_eq!(machine.placement(), Some(PlaceableItem::Campfire));

        machine.handle_event(
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                position: Vec2::new(600.0, 100.0),
            },
            0,
        );
        tick(&mut machine, &snapshot, &targets, 16);
        assert!(machine.take_intents().is_empty());
        assert_eq!(machine.take_notices(), vec!["too far away to place that".to_string()]);
        assert_eq!(machine.placement(), Some(PlaceableItem::Campfire));

        machine.handle_event(InputEvent::PointerUp { button: PointerButton::Primary }, 20);
        machine.handle_event(
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                position: Vec2::new(140.0, 100.0),
            },
            30,
        );
        tick(&mut machine, &snapshot, &targets, 32);
        assert_eq!(
            machine.take_intents(),
            vec![Intent::Place {
                item: PlaceableItem::Campfire,
                position: Vec2::new(140.0, 100.0)
            }]
        );
        assert_eq!(machine.placement(), None);
    }

    #[test]
    fn escape_cancels_placement_before_opening_menu() {
        let mut machine = machine();
        machine.handle_event(key_down(InputAction::Slot2), 0);
        machine.handle_event(key_down(InputAction::Menu), 0);
        assert_eq!(machine.placement(), None);
        assert_eq!(machine.ui_mode(), UiMode::Playing);
        machine.handle_event(key_up(InputAction::Menu), 0);
        machine.handle_event(key_down(InputAction::Menu), 10);
        assert_eq!(machine.ui_mode(), UiMode::Menu);
        machine.handle_event(key_down(InputAction::Menu), 20);
        assert_eq!(machine.ui_mode(), UiMode::Playing);
    }

    #[test]
    fn wheel_cycles_placeable_item() {
        let mut machine = machine();
        machine.handle_event(key_down(InputAction::Slot5), 0);
        machine.handle_event(InputEvent::Wheel { steps: 1 }, 0);
        assert_eq!(machine.placement(), Some(PlaceableItem::Campfire));
        machine.handle_event(InputEvent::Wheel { steps: -2 }, 0);
        assert_eq!(machine.placement(), Some(PlaceableItem::WoodWall));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Down,
        Up,
        Advance(u64),
        Tick,
        FocusLost,
        Targets { hold: bool, tap: bool },
        Inventory,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Down),
            3 => Just(Op::Up),
            4 => (0u64..400).prop_map(Op::Advance),
            4 => Just(Op::Tick),
            1 => Just(Op::FocusLost),
            2 => (any::<bool>(), any::<bool>()).prop_map(|(hold, tap)| Op::Targets { hold, tap }),
            1 => Just(Op::Inventory),
        ]
    }

    fn targets_for(hold: bool, tap: bool) -> InteractionTargets {
        let mut targets = InteractionTargets::new();
        if hold {
            targets = targets.with(InteractionCategory::Campfire, EntityId(3));
        }
        if tap {
            targets = targets.with(InteractionCategory::Harvestable, EntityId(7));
        }
        targets
    }

    proptest! {
        #[test]
        fn every_interact_cycle_resolves_exactly_once(ops in proptest::collection::vec(op_strategy(), 1..80)) {
            let snapshot = snapshot();
            let mut targets = targets_for(true, true);
            let mut machine = machine();
            let mut now = 0u64;
            let mut cycles = 0usize;
            tick(&mut machine, &snapshot, &targets, now);

            for op in ops {
                match op {
                    Op::Down => {
                        if machine.phase() == InteractPhase::Idle && machine.ui_mode() == UiMode::Playing {
                            cycles += 1;
                        }
                        machine.handle_event(key_down(InputAction::Interact), now);
                    }
                    Op::Up => machine.handle_event(key_up(InputAction::Interact), now),
                    Op::Advance(ms) => now += ms,
                    Op::Tick => tick(&mut machine, &snapshot, &targets, now),
                    Op::FocusLost => machine.handle_event(InputEvent::FocusLost, now),
                    Op::Targets { hold, tap } => targets = targets_for(hold, tap),
                    Op::Inventory => {
                        machine.handle_event(key_down(InputAction::Inventory), now);
                        machine.handle_event(key_up(InputAction::Inventory), now);
                    }
                }
                prop_assert_eq!(
                    machine.hold_session().is_some(),
                    machine.phase() == InteractPhase::Holding
                );
            }
            machine.handle_event(key_up(InputAction::Interact), now);
            tick(&mut machine, &snapshot, &targets, now);

            let resolutions = machine.take_resolutions();
            prop_assert_eq!(resolutions.len(), cycles);
            let fired = resolutions
                .iter()
                .filter(|resolution| !matches!(resolution, CycleResolution::NoOp(_)))
                .count();
            prop_assert_eq!(targeted(&machine.take_intents()).len(), fired);
        }
    }
}

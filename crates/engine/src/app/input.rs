use crate::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    ToggleAutoAttack,
    ToggleMinimap,
    Chat,
    Inventory,
    Menu,
    Slot1,
    Slot2,
    Slot3,
    Slot4,
    Slot5,
}

const ACTION_COUNT: usize = 15;

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::ToggleAutoAttack => 5,
            InputAction::ToggleMinimap => 6,
            InputAction::Chat => 7,
            InputAction::Inventory => 8,
            InputAction::Menu => 9,
            InputAction::Slot1 => 10,
            InputAction::Slot2 => 11,
            InputAction::Slot3 => 12,
            InputAction::Slot4 => 13,
            InputAction::Slot5 => 14,
        }
    }

    pub fn slot_number(self) -> Option<u8> {
        match self {
            InputAction::Slot1 => Some(1),
            InputAction::Slot2 => Some(2),
            InputAction::Slot3 => Some(3),
            InputAction::Slot4 => Some(4),
            InputAction::Slot5 => Some(5),
            _ => None,
        }
    }

    pub fn is_movement(self) -> bool {
        matches!(
            self,
            InputAction::MoveUp
                | InputAction::MoveDown
                | InputAction::MoveLeft
                | InputAction::MoveRight
        )
    }
}

/// Physical held-state per action, independent of any UI mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn release_all(&mut self) {
        self.down = [false; ACTION_COUNT];
    }

    /// Sum of held movement keys, y down. Opposing keys cancel out.
    pub fn movement_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_down(InputAction::MoveUp) {
            axis.y -= 1.0;
        }
        if self.is_down(InputAction::MoveDown) {
            axis.y += 1.0;
        }
        if self.is_down(InputAction::MoveLeft) {
            axis.x -= 1.0;
        }
        if self.is_down(InputAction::MoveRight) {
            axis.x += 1.0;
        }
        axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Platform-neutral input, delivered between frames in arrival order.
/// Pointer positions are in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { action: InputAction, repeat: bool },
    KeyUp { action: InputAction },
    PointerMoved { position: Vec2 },
    PointerLeft,
    PointerDown { button: PointerButton, position: Vec2 },
    PointerUp { button: PointerButton },
    Wheel { steps: i32 },
    ModifiersChanged(Modifiers),
    FocusLost,
}

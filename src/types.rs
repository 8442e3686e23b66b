use serde::{Deserialize, Serialize};
use std::fmt;

/// A control pad button the harness can hold for one pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Up, Button::Down, Button::Left, Button::Right];

    pub fn symbol(self) -> char {
        match self {
            Button::Up => 'U',
            Button::Down => 'D',
            Button::Left => 'L',
            Button::Right => 'R',
        }
    }
}

/// What is on the pad during a single pulse: exactly one button, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ControlEvent {
    Held(Button),
    #[default]
    Released,
}

impl ControlEvent {
    pub const RELEASED_SYMBOL: char = '_';

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'U' => Some(ControlEvent::Held(Button::Up)),
            'D' => Some(ControlEvent::Held(Button::Down)),
            'L' => Some(ControlEvent::Held(Button::Left)),
            'R' => Some(ControlEvent::Held(Button::Right)),
            Self::RELEASED_SYMBOL => Some(ControlEvent::Released),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            ControlEvent::Held(button) => button.symbol(),
            ControlEvent::Released => Self::RELEASED_SYMBOL,
        }
    }

    pub fn button(self) -> Option<Button> {
        match self {
            ControlEvent::Held(button) => Some(button),
            ControlEvent::Released => None,
        }
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

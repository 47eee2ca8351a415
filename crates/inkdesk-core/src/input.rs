//! Pointer events delivered to the drawing surface.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are in surface coordinates (the canvas' own pixel space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    /// Primary-button press at `(x, y)`. Touch input maps onto this too.
    pub fn down(x: f64, y: f64) -> Self {
        Self::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    /// Primary-button release at `(x, y)`.
    pub fn up(x: f64, y: f64) -> Self {
        Self::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    /// Pointer motion to `(x, y)`.
    pub fn moved(x: f64, y: f64) -> Self {
        Self::Move {
            position: Point::new(x, y),
        }
    }

    /// Where the event happened.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }
}

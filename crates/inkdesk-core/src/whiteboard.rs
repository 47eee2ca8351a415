//! Freehand stroke capture for the whiteboard surface.
//!
//! The surface keeps no drawing model. While the pointer is held down, every
//! move produces one [`StrokeSegment`] that is handed straight to a
//! [`RenderTarget`] and then forgotten.

use crate::input::{MouseButton, PointerEvent};
use kurbo::{Line, Point};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Thinnest stroke the surface accepts.
pub const MIN_STROKE_WIDTH: f64 = 1.0;
/// Thickest stroke the surface accepts.
pub const MAX_STROKE_WIDTH: f64 = 10.0;
/// Stroke width of a fresh session.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// RGBA8 stroke colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for StrokeColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// One straight piece of a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSegment {
    pub from: Point,
    pub to: Point,
    pub color: StrokeColor,
    pub width: f64,
}

impl StrokeSegment {
    /// The segment as a kurbo line, ready to be stroked.
    pub fn line(&self) -> Line {
        Line::new(self.from, self.to)
    }
}

/// Anything that can draw stroke segments.
///
/// Implementations render immediately; the surface never asks for a segment
/// back.
pub trait RenderTarget {
    fn stroke_segment(&mut self, segment: &StrokeSegment);
}

/// Recording target, mostly useful in tests and for headless capture.
impl RenderTarget for Vec<StrokeSegment> {
    fn stroke_segment(&mut self, segment: &StrokeSegment) {
        self.push(*segment);
    }
}

/// Pointer state of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    /// The pointer is held down; `anchor` is where the next segment starts.
    Drawing { anchor: Point },
}

/// Stroke-capture state machine.
#[derive(Debug, Clone)]
pub struct WhiteboardSurface {
    state: PointerState,
    color: StrokeColor,
    width: f64,
}

impl Default for WhiteboardSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl WhiteboardSurface {
    /// Create an idle surface with a black, 2px pen.
    pub fn new() -> Self {
        Self {
            state: PointerState::Idle,
            color: StrokeColor::black(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, PointerState::Drawing { .. })
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Change the pen colour for segments drawn from now on.
    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    /// Change the pen width for segments drawn from now on.
    /// Clamped to `MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH`; NaN is ignored.
    pub fn set_width(&mut self, width: f64) {
        if width.is_nan() {
            return;
        }
        self.width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }

    /// Start a stroke at `point`.
    pub fn pointer_down(&mut self, point: Point) {
        self.state = PointerState::Drawing { anchor: point };
    }

    /// Move the pointer to `point`.
    ///
    /// While drawing, returns the segment from the previous anchor to `point`
    /// and moves the anchor. While idle, returns `None`.
    pub fn pointer_move(&mut self, point: Point) -> Option<StrokeSegment> {
        let PointerState::Drawing { anchor } = self.state else {
            return None;
        };
        self.state = PointerState::Drawing { anchor: point };
        Some(StrokeSegment {
            from: anchor,
            to: point,
            color: self.color,
            width: self.width,
        })
    }

    /// End the current stroke.
    pub fn pointer_up(&mut self) {
        self.state = PointerState::Idle;
    }

    /// Feed a pointer event, rendering any resulting segment into `target`.
    ///
    /// Only the primary button starts a stroke; releasing any button ends it.
    pub fn handle_pointer(&mut self, event: PointerEvent, target: &mut dyn RenderTarget) {
        match event {
            PointerEvent::Down { position, button: MouseButton::Left } => {
                self.pointer_down(position);
            }
            PointerEvent::Up { .. } => {
                self.pointer_up();
            }
            PointerEvent::Move { position } => {
                if let Some(segment) = self.pointer_move(position) {
                    target.stroke_segment(&segment);
                }
            }
            PointerEvent::Down { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_moves_emit_two_segments() {
        let mut surface = WhiteboardSurface::new();
        let mut target: Vec<StrokeSegment> = Vec::new();

        surface.handle_pointer(PointerEvent::down(0.0, 0.0), &mut target);
        surface.handle_pointer(PointerEvent::moved(10.0, 0.0), &mut target);
        surface.handle_pointer(PointerEvent::moved(10.0, 10.0), &mut target);
        surface.handle_pointer(PointerEvent::up(10.0, 10.0), &mut target);

        assert_eq!(target.len(), 2);
        assert_eq!(target[0].from, Point::new(0.0, 0.0));
        assert_eq!(target[0].to, Point::new(10.0, 0.0));
        assert_eq!(target[1].from, Point::new(10.0, 0.0));
        assert_eq!(target[1].to, Point::new(10.0, 10.0));
        assert_eq!(surface.state(), PointerState::Idle);
    }

    #[test]
    fn test_move_while_idle_draws_nothing() {
        let mut surface = WhiteboardSurface::new();
        assert!(surface.pointer_move(Point::new(5.0, 5.0)).is_none());

        surface.pointer_down(Point::new(0.0, 0.0));
        surface.pointer_up();
        assert!(surface.pointer_move(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_style_change_only_affects_later_segments() {
        let mut surface = WhiteboardSurface::new();
        let mut target: Vec<StrokeSegment> = Vec::new();

        surface.handle_pointer(PointerEvent::down(0.0, 0.0), &mut target);
        surface.handle_pointer(PointerEvent::moved(1.0, 0.0), &mut target);
        surface.set_color(StrokeColor::red());
        surface.set_width(7.0);
        surface.handle_pointer(PointerEvent::moved(2.0, 0.0), &mut target);

        assert_eq!(target[0].color, StrokeColor::black());
        assert_eq!(target[0].width, DEFAULT_STROKE_WIDTH);
        assert_eq!(target[1].color, StrokeColor::red());
        assert_eq!(target[1].width, 7.0);
    }

    #[test]
    fn test_secondary_button_does_not_draw() {
        let mut surface = WhiteboardSurface::new();
        let mut target: Vec<StrokeSegment> = Vec::new();

        surface.handle_pointer(
            PointerEvent::Down { position: Point::ZERO, button: MouseButton::Right },
            &mut target,
        );
        surface.handle_pointer(PointerEvent::moved(3.0, 3.0), &mut target);

        assert!(target.is_empty());
        assert!(!surface.is_drawing());
    }

    #[test]
    fn test_any_button_release_ends_stroke() {
        let mut surface = WhiteboardSurface::new();
        let mut target: Vec<StrokeSegment> = Vec::new();

        surface.handle_pointer(PointerEvent::down(0.0, 0.0), &mut target);
        surface.handle_pointer(
            PointerEvent::Up { position: Point::ZERO, button: MouseButton::Right },
            &mut target,
        );
        surface.handle_pointer(PointerEvent::moved(3.0, 3.0), &mut target);

        assert!(target.is_empty());
        assert_eq!(surface.state(), PointerState::Idle);
    }

    #[test]
    fn test_width_is_clamped() {
        let mut surface = WhiteboardSurface::new();
        surface.set_width(0.0);
        assert_eq!(surface.width(), MIN_STROKE_WIDTH);
        surface.set_width(25.0);
        assert_eq!(surface.width(), MAX_STROKE_WIDTH);
        surface.set_width(f64::NAN);
        assert_eq!(surface.width(), MAX_STROKE_WIDTH);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(StrokeColor::from_hex("#000000"), Some(StrokeColor::black()));
        assert_eq!(StrokeColor::from_hex("ff0000"), Some(StrokeColor::red()));
        assert_eq!(StrokeColor::from_hex("#12345"), None);
        assert_eq!(StrokeColor::from_hex("#zz0000"), None);
        assert_eq!(StrokeColor::red().to_hex(), "#ff0000");
    }

    #[test]
    fn test_peniko_color_conversion() {
        let color: Color = StrokeColor::new(10, 20, 30, 255).into();
        assert_eq!(StrokeColor::from(color), StrokeColor::new(10, 20, 30, 255));
    }

    #[test]
    fn test_segment_line() {
        let segment = StrokeSegment {
            from: Point::new(0.0, 0.0),
            to: Point::new(3.0, 4.0),
            color: StrokeColor::black(),
            width: 2.0,
        };
        assert_eq!(segment.line().p1, Point::new(3.0, 4.0));
    }
}

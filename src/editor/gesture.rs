//! Input model: modifier keys, keys, resize handles, and the gesture state.
//!
//! A gesture lives between pointer-down and pointer-up. Its session carries
//! everything needed to compute the live preview from the current pointer
//! position and to commit (or revert) on release.

use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect, Size};
use crate::template::ElementId;
use crate::units::CanvasRect;

/// Keyboard modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Command key on macOS
    pub meta: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard key, parsed from the browser's `KeyboardEvent.key` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    Delete,
    Backspace,
    Char(char),
    Other(String),
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Escape" | "Esc" => Key::Escape,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => Key::Other(name.to_string()),
                }
            }
        }
    }

    /// Unit direction for arrow keys, `None` for everything else.
    pub fn arrow_direction(&self) -> Option<(f64, f64)> {
        match self {
            Key::ArrowUp => Some((0.0, -1.0)),
            Key::ArrowDown => Some((0.0, 1.0)),
            Key::ArrowLeft => Some((-1.0, 0.0)),
            Key::ArrowRight => Some((1.0, 0.0)),
            _ => None,
        }
    }
}

/// Resize handle position on the selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
        ResizeHandle::Nw,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }
}

/// An in-progress move of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub id: ElementId,
    /// Pointer offset from the element's top-left at pointer-down, in mm
    pub click_offset: Point,
    /// Canvas screen rectangle captured at pointer-down
    pub canvas: CanvasRect,
    /// Committed geometry at pointer-down
    pub origin: Rect,
    /// Live geometry, not yet committed
    pub preview: Rect,
}

/// An in-progress resize of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub id: ElementId,
    pub handle: ResizeHandle,
    /// Pointer position at pointer-down, in canvas mm
    pub start_pointer: Point,
    pub canvas: CanvasRect,
    pub origin: Rect,
    pub preview: Rect,
}

/// The active gesture. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

impl Gesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    /// Element id and live geometry of the active gesture.
    pub fn preview(&self) -> Option<(&str, Rect)> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging(s) => Some((s.id.as_str(), s.preview)),
            Gesture::Resizing(s) => Some((s.id.as_str(), s.preview)),
        }
    }

    /// Offset of the live preview from the committed position.
    pub fn preview_offset(&self) -> Option<Point> {
        let (origin, preview) = match self {
            Gesture::Idle => return None,
            Gesture::Dragging(s) => (s.origin, s.preview),
            Gesture::Resizing(s) => (s.origin, s.preview),
        };
        Some(Point::new(preview.x - origin.x, preview.y - origin.y))
    }
}

/// Apply a pointer delta (mm) to `origin` through `handle`.
///
/// Shrinking stops at `min_size`; growing stops at the canvas edge. Both are
/// applied by capping the delta, so the handle keeps tracking the pointer
/// once it comes back into range. An element already smaller than the floor
/// cannot shrink further but may still grow.
pub fn resize_rect(origin: Rect, handle: ResizeHandle, delta: Point, canvas: Size, min_size: Size) -> Rect {
    let mut r = origin;

    if handle.moves_right() {
        let grow = (canvas.width - origin.right()).max(0.0);
        let shrink = (origin.width - min_size.width).max(0.0);
        r.width = origin.width + delta.x.min(grow).max(-shrink);
    } else if handle.moves_left() {
        let grow = origin.x.max(0.0);
        let shrink = (origin.width - min_size.width).max(0.0);
        let dx = delta.x.max(-grow).min(shrink);
        r.x = origin.x + dx;
        r.width = origin.width - dx;
    }

    if handle.moves_bottom() {
        let grow = (canvas.height - origin.bottom()).max(0.0);
        let shrink = (origin.height - min_size.height).max(0.0);
        r.height = origin.height + delta.y.min(grow).max(-shrink);
    } else if handle.moves_top() {
        let grow = origin.y.max(0.0);
        let shrink = (origin.height - min_size.height).max(0.0);
        let dy = delta.y.max(-grow).min(shrink);
        r.y = origin.y + dy;
        r.height = origin.height - dy;
    }

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Size = Size {
        width: 58.0,
        height: 40.0,
    };
    const MIN: Size = Size {
        width: 10.0,
        height: 5.0,
    };

    fn origin() -> Rect {
        Rect::new(10.0, 10.0, 20.0, 10.0)
    }

    #[test]
    fn test_key_from_name() {
        assert_eq!(Key::from_name("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("Z"), Key::Char('z'));
        assert_eq!(Key::from_name("F5"), Key::Other("F5".into()));
        assert_eq!(Key::ArrowUp.arrow_direction(), Some((0.0, -1.0)));
        assert_eq!(Key::Delete.arrow_direction(), None);
    }

    #[test]
    fn test_modifiers_command() {
        assert!(Modifiers::ctrl().command());
        let cmd = Modifiers {
            meta: true,
            ..Default::default()
        };
        assert!(cmd.command());
        assert!(!Modifiers::shift().command());
    }

    #[test]
    fn test_east_grows_width_anchored_left() {
        let r = resize_rect(origin(), ResizeHandle::E, Point::new(5.0, 3.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(10.0, 10.0, 25.0, 10.0));
    }

    #[test]
    fn test_west_moves_x_and_shrinks_width() {
        let r = resize_rect(origin(), ResizeHandle::W, Point::new(4.0, 0.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(14.0, 10.0, 16.0, 10.0));
    }

    #[test]
    fn test_corner_changes_both_dimensions() {
        let r = resize_rect(origin(), ResizeHandle::Nw, Point::new(-2.0, -3.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(8.0, 7.0, 22.0, 13.0));

        let r = resize_rect(origin(), ResizeHandle::Se, Point::new(2.0, 3.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(10.0, 10.0, 22.0, 13.0));
    }

    #[test]
    fn test_min_size_caps_delta() {
        let r = resize_rect(origin(), ResizeHandle::E, Point::new(-50.0, 0.0), CANVAS, MIN);
        assert_eq!(r.width, 10.0);

        let r = resize_rect(origin(), ResizeHandle::N, Point::new(0.0, 50.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(10.0, 15.0, 20.0, 5.0));
    }

    #[test]
    fn test_growth_stops_at_canvas_edge() {
        let r = resize_rect(origin(), ResizeHandle::Se, Point::new(100.0, 100.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(10.0, 10.0, 48.0, 30.0));

        let r = resize_rect(origin(), ResizeHandle::Nw, Point::new(-100.0, -100.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(0.0, 0.0, 30.0, 20.0));
    }

    #[test]
    fn test_edge_handle_ignores_other_axis() {
        let r = resize_rect(origin(), ResizeHandle::S, Point::new(7.0, 2.0), CANVAS, MIN);
        assert_eq!(r, Rect::new(10.0, 10.0, 20.0, 12.0));
    }

    #[test]
    fn test_gesture_preview_offset() {
        let session = DragSession {
            id: "a".into(),
            click_offset: Point::default(),
            canvas: CanvasRect::default(),
            origin: Rect::new(5.0, 5.0, 10.0, 10.0),
            preview: Rect::new(8.0, 4.0, 10.0, 10.0),
        };
        let gesture = Gesture::Dragging(session);
        assert!(gesture.is_active());
        assert_eq!(gesture.preview_offset(), Some(Point::new(3.0, -1.0)));
        assert_eq!(Gesture::Idle.preview_offset(), None);
    }
}

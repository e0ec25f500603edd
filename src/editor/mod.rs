//! # Template Editor
//!
//! Headless editing core for a label template: pointer gestures (drag,
//! resize), keyboard shortcuts, element operations and undo/redo.
//!
//! ## State model
//!
//! ```text
//!            pointer_down_body            pointer_up / pointer_leave
//!   Idle ───────────────────▶ Dragging ───────────────────────────▶ Idle (+1 history entry)
//!     │                                   cancel_gesture
//!     │                          ──────────────────────────────────▶ Idle (reverted)
//!     │  pointer_down_handle
//!     └────────────────────▶ Resizing ──── same exits ────────────▶ Idle
//! ```
//!
//! During a gesture the committed element array is untouched; the live
//! geometry is a preview held by the gesture session. Only the commit on
//! release reaches history, so one drag is one undo step.
//!
//! ## Example
//!
//! ```ignore
//! let mut editor = Editor::new(elements, settings, EditorConfig::default());
//! editor.pointer_down_body("qr-1", Point::new(120.0, 80.0), canvas_rect);
//! editor.pointer_move(Point::new(150.0, 90.0));
//! editor.pointer_up();
//! editor.undo();
//! ```

pub mod gesture;
pub mod history;
pub mod snap;

pub use gesture::{DragSession, Gesture, Key, Modifiers, ResizeHandle, ResizeSession, resize_rect};
pub use history::{COMPACT_HISTORY_CAP, DEFAULT_HISTORY_CAP, History, HistoryEntry};
pub use snap::{SnapResult, SnapStrategy, compute_snap, compute_snap_with, snap_to_grid};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geom::{Point, Rect, Size, clamp_to_span};
use crate::template::{ElementId, ElementKind, TemplateElement, TemplateSettings, new_element_id};
use crate::units::CanvasRect;

/// Offset applied to a duplicated element, in mm.
pub const DUPLICATE_OFFSET_MM: f64 = 5.0;

/// Editor behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Round drag positions to `grid_step` before element snapping
    pub grid_enabled: bool,
    pub grid_step: f64,
    pub snap_enabled: bool,
    /// Snap distance in mm
    pub snap_threshold: f64,
    pub snap_strategy: SnapStrategy,
    /// Arrow-key step in mm
    pub nudge_step: f64,
    /// Arrow-key step with Shift held, in mm
    pub nudge_step_large: f64,
    pub history_cap: usize,
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_enabled: false,
            grid_step: 1.0,
            snap_enabled: true,
            snap_threshold: 2.0,
            snap_strategy: SnapStrategy::FirstMatch,
            nudge_step: 1.0,
            nudge_step_large: 5.0,
            history_cap: DEFAULT_HISTORY_CAP,
            min_width: 10.0,
            min_height: 5.0,
        }
    }
}

impl EditorConfig {
    /// Settings of the compact editor: smaller history.
    pub fn compact() -> Self {
        Self {
            history_cap: COMPACT_HISTORY_CAP,
            ..Default::default()
        }
    }

    pub fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }
}

/// What an editor call did, for the host to decide whether to redraw or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed.
    Unchanged,
    /// The live preview moved; committed state is untouched.
    Preview,
    /// A new history entry was recorded.
    Committed,
    /// Undo/redo moved to another history entry.
    Restored,
    /// Only the selection changed.
    SelectionChanged,
}

/// The editing session for one template.
#[derive(Debug, Clone)]
pub struct Editor {
    elements: Vec<TemplateElement>,
    settings: TemplateSettings,
    history: History,
    config: EditorConfig,
    selection: Vec<ElementId>,
    gesture: Gesture,
    guides: SnapResult,
}

impl Editor {
    pub fn new(elements: Vec<TemplateElement>, settings: TemplateSettings, config: EditorConfig) -> Self {
        let history = History::with_initial(elements.clone(), config.history_cap);
        Self {
            elements,
            settings,
            history,
            config,
            selection: Vec::new(),
            gesture: Gesture::Idle,
            guides: SnapResult::default(),
        }
    }

    // --- Queries ---

    /// Committed element array, in z-order.
    pub fn elements(&self) -> &[TemplateElement] {
        &self.elements
    }

    /// Elements as they should be drawn: committed state with the live
    /// gesture preview applied.
    pub fn display_elements(&self) -> Vec<TemplateElement> {
        let mut out = self.elements.clone();
        if let Some((id, rect)) = self.gesture.preview()
            && let Some(el) = out.iter_mut().find(|e| e.id == id)
        {
            el.set_rect(rect);
        }
        out
    }

    pub fn element(&self, id: &str) -> Option<&TemplateElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Active alignment guides (empty outside a drag).
    pub fn guides(&self) -> &SnapResult {
        &self.guides
    }

    pub fn canvas_size(&self) -> Size {
        self.settings.size()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Serialize the committed element array for storage.
    pub fn elements_json(&self) -> Result<String, crate::error::EtiquetaError> {
        Ok(serde_json::to_string(&self.elements)?)
    }

    /// Replace canvas settings. Not an undoable edit.
    pub fn set_settings(&mut self, settings: TemplateSettings) {
        self.settings = settings;
    }

    /// Replace the configuration. A smaller `history_cap` evicts the oldest
    /// history entries right away.
    pub fn set_config(&mut self, config: EditorConfig) {
        self.history.set_cap(config.history_cap);
        self.config = config;
    }

    // --- Pointer gestures ---

    /// Start dragging `id`. Ignored while another gesture is active.
    pub fn pointer_down_body(&mut self, id: &str, client: Point, canvas: CanvasRect) -> Outcome {
        if self.gesture.is_active() {
            return Outcome::Unchanged;
        }
        let Some(origin) = self.element(id).map(TemplateElement::rect) else {
            return Outcome::Unchanged;
        };

        let pointer = canvas.pointer_to_mm(client, self.canvas_size());
        self.gesture = Gesture::Dragging(DragSession {
            id: id.to_string(),
            click_offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
            canvas,
            origin,
            preview: origin,
        });
        if !self.selection.iter().any(|s| s == id) {
            self.selection = vec![id.to_string()];
        }
        Outcome::SelectionChanged
    }

    /// Start resizing `id` by `handle`. Ignored while another gesture is active.
    pub fn pointer_down_handle(&mut self, id: &str, handle: ResizeHandle, client: Point, canvas: CanvasRect) -> Outcome {
        if self.gesture.is_active() {
            return Outcome::Unchanged;
        }
        let Some(origin) = self.element(id).map(TemplateElement::rect) else {
            return Outcome::Unchanged;
        };

        self.gesture = Gesture::Resizing(ResizeSession {
            id: id.to_string(),
            handle,
            start_pointer: canvas.pointer_to_mm(client, self.canvas_size()),
            canvas,
            origin,
            preview: origin,
        });
        self.selection = vec![id.to_string()];
        Outcome::SelectionChanged
    }

    /// Update the live preview from the current pointer position.
    pub fn pointer_move(&mut self, client: Point) -> Outcome {
        let canvas_size = self.canvas_size();
        let min_size = self.config.min_size();

        match &mut self.gesture {
            Gesture::Idle => Outcome::Unchanged,
            Gesture::Dragging(session) => {
                let pointer = session.canvas.pointer_to_mm(client, canvas_size);
                let mut target = session.origin.with_origin(Point::new(
                    pointer.x - session.click_offset.x,
                    pointer.y - session.click_offset.y,
                ));

                if self.config.grid_enabled {
                    target.x = snap_to_grid(target.x, self.config.grid_step);
                    target.y = snap_to_grid(target.y, self.config.grid_step);
                }

                let mut guides = SnapResult {
                    x: target.x,
                    y: target.y,
                    ..Default::default()
                };
                if self.config.snap_enabled {
                    let others: Vec<Rect> = self
                        .elements
                        .iter()
                        .filter(|e| e.id != session.id)
                        .map(TemplateElement::rect)
                        .collect();
                    guides = compute_snap_with(
                        target,
                        &others,
                        canvas_size,
                        self.config.snap_threshold,
                        self.config.snap_strategy,
                    );
                }

                target.x = clamp_to_span(guides.x, canvas_size.width - target.width);
                target.y = clamp_to_span(guides.y, canvas_size.height - target.height);
                session.preview = target;
                self.guides = guides;
                Outcome::Preview
            }
            Gesture::Resizing(session) => {
                let pointer = session.canvas.pointer_to_mm(client, canvas_size);
                let delta = Point::new(pointer.x - session.start_pointer.x, pointer.y - session.start_pointer.y);
                session.preview = resize_rect(session.origin, session.handle, delta, canvas_size, min_size);
                Outcome::Preview
            }
        }
    }

    /// Finish the active gesture and commit its geometry.
    pub fn pointer_up(&mut self) -> Outcome {
        let gesture = std::mem::take(&mut self.gesture);
        self.guides = SnapResult::default();

        let Some((id, rect)) = gesture.preview() else {
            return Outcome::Unchanged;
        };
        let mut next = self.elements.clone();
        let Some(el) = next.iter_mut().find(|e| e.id == id) else {
            return Outcome::Unchanged;
        };
        el.set_rect(rect);
        debug!(id, x = rect.x, y = rect.y, w = rect.width, h = rect.height, "gesture committed");
        self.commit(next)
    }

    /// The pointer left the canvas. Commits like [`Editor::pointer_up`].
    pub fn pointer_leave(&mut self) -> Outcome {
        self.pointer_up()
    }

    /// Abort the active gesture, restoring the pre-gesture geometry.
    pub fn cancel_gesture(&mut self) -> Outcome {
        if !self.gesture.is_active() {
            return Outcome::Unchanged;
        }
        self.gesture = Gesture::Idle;
        self.guides = SnapResult::default();
        Outcome::Preview
    }

    // --- Keyboard ---

    /// Handle a key press. Keys are ignored while a gesture is active.
    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Outcome {
        if self.gesture.is_active() {
            return Outcome::Unchanged;
        }

        if modifiers.command() {
            return match key {
                Key::Char('z') if modifiers.shift => self.redo(),
                Key::Char('z') => self.undo(),
                Key::Char('y') => self.redo(),
                _ => Outcome::Unchanged,
            };
        }

        if let Some((dx, dy)) = key.arrow_direction() {
            let step = if modifiers.shift {
                self.config.nudge_step_large
            } else {
                self.config.nudge_step
            };
            return self.nudge_selection(dx * step, dy * step);
        }

        match key {
            Key::Escape => self.clear_selection(),
            Key::Delete | Key::Backspace => self.delete_selected(),
            _ => Outcome::Unchanged,
        }
    }

    /// Move every selected element by (dx, dy) mm, clamped to the canvas.
    pub fn nudge_selection(&mut self, dx: f64, dy: f64) -> Outcome {
        if self.selection.is_empty() {
            return Outcome::Unchanged;
        }
        let canvas = self.canvas_size();
        let mut next = self.elements.clone();
        for el in next.iter_mut().filter(|e| self.selection.contains(&e.id)) {
            el.x = clamp_to_span(el.x + dx, canvas.width - el.width);
            el.y = clamp_to_span(el.y + dy, canvas.height - el.height);
        }
        self.commit(next)
    }

    // --- History ---

    pub fn undo(&mut self) -> Outcome {
        match self.history.undo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                self.prune_selection();
                Outcome::Restored
            }
            None => Outcome::Unchanged,
        }
    }

    pub fn redo(&mut self) -> Outcome {
        match self.history.redo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                self.prune_selection();
                Outcome::Restored
            }
            None => Outcome::Unchanged,
        }
    }

    // --- Element operations ---

    /// Append a new element with a fresh id and select it.
    pub fn add_element(&mut self, kind: ElementKind) -> ElementId {
        let mut el = TemplateElement::new(kind);
        self.clamp_into_canvas(&mut el);
        let id = el.id.clone();

        let mut next = self.elements.clone();
        next.push(el);
        self.commit(next);
        self.selection = vec![id.clone()];
        id
    }

    /// Append a new element of the named type with editor defaults.
    pub fn add_element_of_type(&mut self, type_name: &str) -> Option<ElementId> {
        let kind = TemplateElement::from_type_name(type_name)?.kind;
        Some(self.add_element(kind))
    }

    /// Edit one element in place. The id is preserved.
    pub fn update_element(&mut self, id: &str, edit: impl FnOnce(&mut TemplateElement)) -> Outcome {
        let mut next = self.elements.clone();
        let Some(el) = next.iter_mut().find(|e| e.id == id) else {
            return Outcome::Unchanged;
        };
        edit(el);
        el.id = id.to_string();
        self.commit(next)
    }

    /// Copy an element, offset it and select the copy.
    pub fn duplicate(&mut self, id: &str) -> Option<ElementId> {
        let mut copy = self.element(id)?.clone();
        copy.id = new_element_id();
        copy.x += DUPLICATE_OFFSET_MM;
        copy.y += DUPLICATE_OFFSET_MM;
        self.clamp_into_canvas(&mut copy);
        let new_id = copy.id.clone();

        let mut next = self.elements.clone();
        next.push(copy);
        self.commit(next);
        self.selection = vec![new_id.clone()];
        Some(new_id)
    }

    pub fn delete(&mut self, id: &str) -> Outcome {
        let next: Vec<_> = self.elements.iter().filter(|e| e.id != id).cloned().collect();
        if next.len() == self.elements.len() {
            return Outcome::Unchanged;
        }
        self.selection.retain(|s| s != id);
        self.commit(next)
    }

    /// Remove every selected element as one history entry.
    pub fn delete_selected(&mut self) -> Outcome {
        if self.selection.is_empty() {
            return Outcome::Unchanged;
        }
        let next: Vec<_> = self
            .elements
            .iter()
            .filter(|e| !self.selection.contains(&e.id))
            .cloned()
            .collect();
        self.selection.clear();
        self.commit(next)
    }

    /// Move an element to the end of the array (drawn last, on top).
    pub fn bring_to_front(&mut self, id: &str) -> Outcome {
        let mut next = self.elements.clone();
        let Some(idx) = next.iter().position(|e| e.id == id) else {
            return Outcome::Unchanged;
        };
        let el = next.remove(idx);
        next.push(el);
        self.commit(next)
    }

    /// Move an element to the start of the array (drawn first, underneath).
    pub fn send_to_back(&mut self, id: &str) -> Outcome {
        let mut next = self.elements.clone();
        let Some(idx) = next.iter().position(|e| e.id == id) else {
            return Outcome::Unchanged;
        };
        let el = next.remove(idx);
        next.insert(0, el);
        self.commit(next)
    }

    // --- Selection ---

    /// Select exactly one element, or nothing.
    pub fn select(&mut self, id: Option<&str>) -> Outcome {
        let next: Vec<ElementId> = match id {
            Some(id) if self.element(id).is_some() => vec![id.to_string()],
            Some(_) => return Outcome::Unchanged,
            None => Vec::new(),
        };
        if next == self.selection {
            return Outcome::Unchanged;
        }
        self.selection = next;
        Outcome::SelectionChanged
    }

    /// Add or remove an element from a multi-selection.
    pub fn toggle_select(&mut self, id: &str) -> Outcome {
        if self.element(id).is_none() {
            return Outcome::Unchanged;
        }
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
        } else {
            self.selection.push(id.to_string());
        }
        Outcome::SelectionChanged
    }

    pub fn clear_selection(&mut self) -> Outcome {
        if self.selection.is_empty() {
            return Outcome::Unchanged;
        }
        self.selection.clear();
        Outcome::SelectionChanged
    }

    // --- Internals ---

    fn commit(&mut self, next: Vec<TemplateElement>) -> Outcome {
        if self.history.push(next.clone()) {
            self.elements = next;
            Outcome::Committed
        } else {
            Outcome::Unchanged
        }
    }

    fn clamp_into_canvas(&self, el: &mut TemplateElement) {
        let canvas = self.canvas_size();
        el.x = clamp_to_span(el.x, canvas.width - el.width);
        el.y = clamp_to_span(el.y, canvas.height - el.height);
    }

    fn prune_selection(&mut self) {
        let elements = &self.elements;
        self.selection.retain(|id| elements.iter().any(|e| &e.id == id));
    }
}

//! # Editor Workflow Tests
//!
//! End-to-end editing sessions on a 58x40 mm label: load a stored
//! template, drag and resize with snapping, undo/redo, and write the
//! element array back as JSON.

use etiqueta::editor::{Editor, EditorConfig, Key, Modifiers, Outcome, ResizeHandle, compute_snap};
use etiqueta::geom::{Point, Rect, Size};
use etiqueta::template::{self, ElementKind, TemplateSettings};
use etiqueta::units::CanvasRect;
use pretty_assertions::assert_eq;

const CANVAS: Size = Size {
    width: 58.0,
    height: 40.0,
};

/// Canvas drawn at 4 px/mm with its top-left at (100, 50) in client space.
fn canvas_rect() -> CanvasRect {
    CanvasRect::new(100.0, 50.0, 232.0, 160.0)
}

fn client(x_mm: f64, y_mm: f64) -> Point {
    Point::new(100.0 + x_mm * 4.0, 50.0 + y_mm * 4.0)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn stored_elements() -> &'static str {
    r#"[
        {"id": "a", "type": "rectangle", "x": 5, "y": 5, "width": 20, "height": 10},
        {"id": "b", "type": "text", "x": 2.8, "y": 20, "width": 3, "height": 5, "content": "{{price}}"},
        {"type": "bogus", "x": 1},
        {"id": "q", "type": "qrcode", "x": 40, "y": 0, "width": 16, "height": 16, "dataField": "sku"}
    ]"#
}

fn load_editor() -> Editor {
    let elements = template::parse_elements(stored_elements());
    let settings = template::parse_settings(r#"{"width": 58, "height": 40}"#);
    Editor::new(elements, settings, EditorConfig::default())
}

// ============================================================================
// SNAPPING
// ============================================================================

#[test]
fn test_right_edge_snaps_to_left_edge_of_neighbor() {
    let a = Rect::new(5.0, 5.0, 20.0, 10.0);
    let b = Rect::new(2.8, 20.0, 3.0, 5.0);

    let result = compute_snap(b, &[a], CANVAS, 2.0);
    assert!(close(result.x, 2.0));
    assert!(result.guides_x.contains(&5.0));
    assert_eq!(result.y, 20.0);
    assert!(result.guides_y.is_empty());
}

#[test]
fn test_drag_snaps_against_other_elements() {
    let mut ed = load_editor();
    assert_eq!(ed.elements().len(), 3, "malformed element is skipped");

    // Grab b at its top-left and nudge it 0.1 mm; its right edge (5.9) is
    // within 2 mm of a's left edge (5)
    ed.pointer_down_body("b", client(2.8, 20.0), canvas_rect());
    ed.pointer_move(client(2.9, 20.0));
    assert!(ed.guides().guides_x.contains(&5.0));
    assert_eq!(ed.pointer_up(), Outcome::Committed);

    let b = ed.element("b").unwrap().rect();
    assert!(close(b.x, 2.0), "x = {}", b.x);
    assert!(close(b.y, 20.0), "y = {}", b.y);
}

#[test]
fn test_drag_past_canvas_edge_clamps() {
    let mut ed = load_editor();
    ed.pointer_down_body("q", client(42.0, 2.0), canvas_rect());
    ed.pointer_move(client(80.0, 90.0));
    ed.pointer_up();

    assert_eq!(ed.element("q").unwrap().rect(), Rect::new(42.0, 24.0, 16.0, 16.0));
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
fn test_resize_respects_minimum_size() {
    let mut ed = load_editor();
    ed.pointer_down_handle("a", ResizeHandle::Se, client(25.0, 15.0), canvas_rect());
    ed.pointer_move(client(0.0, 0.0));
    ed.pointer_up();

    let a = ed.element("a").unwrap().rect();
    assert!(close(a.width, 10.0));
    assert!(close(a.height, 5.0));
    assert!(close(a.x, 5.0) && close(a.y, 5.0));
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn test_undo_redo_round_trip_through_json() {
    let mut ed = load_editor();
    let original = ed.elements_json().unwrap();

    ed.select(Some("a"));
    ed.key_down(&Key::ArrowRight, Modifiers::default());
    ed.key_down(&Key::ArrowDown, Modifiers::shift());
    assert_eq!(ed.element("a").unwrap().rect(), Rect::new(6.0, 10.0, 20.0, 10.0));
    assert_eq!(ed.history().len(), 3);

    assert_eq!(ed.key_down(&Key::Char('z'), Modifiers::ctrl()), Outcome::Restored);
    assert_eq!(ed.key_down(&Key::Char('z'), Modifiers::ctrl()), Outcome::Restored);
    assert_eq!(ed.elements_json().unwrap(), original);
    assert!(!ed.can_undo());

    ed.redo();
    assert_eq!(ed.element("a").unwrap().rect(), Rect::new(6.0, 5.0, 20.0, 10.0));

    // A new edit after undo drops the redo branch
    ed.delete("q");
    assert!(!ed.can_redo());
    assert!(ed.element("q").is_none());
}

#[test]
fn test_edited_elements_reload_identically() {
    let mut ed = Editor::new(Vec::new(), TemplateSettings::default(), EditorConfig::compact());
    let text = ed.add_element_of_type("text").unwrap();
    ed.update_element(&text, |el| {
        el.data_field = Some("name".into());
        if let ElementKind::Text(props) = &mut el.kind {
            props.font_size = 16.0;
        }
    });
    let copy = ed.duplicate(&text).unwrap();
    ed.bring_to_front(&text);

    let reloaded = template::parse_elements(&ed.elements_json().unwrap());
    assert_eq!(reloaded, ed.elements().to_vec());
    assert_eq!(reloaded.last().map(|e| e.id.as_str()), Some(text.as_str()));
    assert_eq!(reloaded[0].id, copy);
}

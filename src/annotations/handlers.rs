//! Annotation message handlers
//!
//! Handles DrawMsg and PointerMsg. In a drawing mode a press/drag/release
//! gesture becomes an arrow, line or rectangle; in idle the pointer selects,
//! promotes and drags existing items.

use std::time::Instant;

use crate::core::app::{ComposerApp, Response};
use crate::domain::{ItemId, Point};
use crate::session::messages::{DrawMsg, Modifiers, PointerMsg};

/// Pick radius around arrows and lines, in scene units
pub const HIT_TOLERANCE: f64 = 5.0;

/// Handle a DrawMsg, modifying the app state
pub fn handle_draw_msg(app: &mut ComposerApp, msg: DrawMsg, now: Instant) -> Response {
    match msg {
        DrawMsg::ModeToggle(kind) => {
            app.interaction.toggle_mode(kind, now);
            match app.interaction.mode().kind() {
                Some(kind) => Response::Status(format!("Drawing mode: {}", kind.name())),
                None => Response::Status("Drawing mode off".to_string()),
            }
        }
        DrawMsg::ExitMode => {
            app.interaction.exit_mode();
            Response::None
        }
        DrawMsg::Tick => {
            if app.interaction.expire_if_due(now) {
                Response::Status("Drawing mode timed out".to_string())
            } else {
                Response::None
            }
        }
        DrawMsg::Undo => {
            if app.history.undo(&mut app.scene) {
                Response::Status("Undone".to_string())
            } else {
                Response::Status("Nothing to undo".to_string())
            }
        }
        DrawMsg::Redo => {
            if app.history.redo(&mut app.scene) {
                Response::Status("Redone".to_string())
            } else {
                Response::Status("Nothing to redo".to_string())
            }
        }
    }
}

/// Handle a PointerMsg in either drawing or idle mode
pub fn handle_pointer_msg(app: &mut ComposerApp, msg: PointerMsg, now: Instant) -> Response {
    match msg {
        PointerMsg::Down(at, modifiers) => {
            if !app.interaction.begin_gesture(at, now) {
                press_idle(app, at, modifiers);
            }
            Response::None
        }
        PointerMsg::Move(at) => {
            if !app.interaction.update_gesture(at) {
                drag_selection(app, at);
            }
            Response::None
        }
        PointerMsg::Up(at) => {
            if app.interaction.is_gesture_active() {
                return complete_gesture(app, at);
            }
            drag_selection(app, at);
            app.interaction.end_drag();
            Response::None
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn complete_gesture(app: &mut ComposerApp, at: Point) -> Response {
    let Some(gesture) = app.interaction.finish_gesture(at) else {
        return Response::None;
    };
    let kind = gesture
        .kind
        .build(gesture.start, gesture.end, app.config.shape_color);
    let id = app.scene.add(kind);
    app.history.record_add(id);
    log::debug!("Added {} {}", gesture.kind.name(), id);
    Response::Status(format!("Added {}", gesture.kind.name()))
}

// ============================================================================
// Idle direct manipulation
// ============================================================================

fn press_idle(app: &mut ComposerApp, at: Point, modifiers: Modifiers) {
    let Some(id) = app.scene.hit_test(at, HIT_TOLERANCE) else {
        if !modifiers.ctrl {
            app.scene.clear_selection();
        }
        return;
    };

    if modifiers.ctrl {
        app.scene.toggle_selected(id);
    } else if !is_selected(app, id) {
        app.scene.select_only(id);
    }
    app.scene.promote_to_top(id);
    app.interaction.begin_drag(at);
}

fn drag_selection(app: &mut ComposerApp, at: Point) {
    if let Some(delta) = app.interaction.drag_to(at) {
        app.scene.translate_selected(delta);
    }
}

fn is_selected(app: &ComposerApp, id: ItemId) -> bool {
    app.scene.get(id).is_some_and(|item| item.selected)
}

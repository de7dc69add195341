use crate::domain::AnnotationKind;
use crate::scene::Scene;
use crate::session::messages::{Modifiers, Msg};
use crate::session::state::ToolMode;

/// Keys the composer reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Character(String),
    Named(Named),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Named {
    Delete,
    Escape,
}

impl Key {
    pub fn char(c: &str) -> Self {
        Key::Character(c.to_string())
    }
}

pub fn handle_key_event(mode: ToolMode, key: &Key, modifiers: Modifiers) -> Option<Msg> {
    match key {
        Key::Named(Named::Delete) => Some(Msg::delete_selected()),
        Key::Named(Named::Escape) if mode.is_drawing() => Some(Msg::exit_mode()),
        // Zoom the selected images
        Key::Character(c) if modifiers.ctrl && (c.as_str() == "=" || c.as_str() == "+") => {
            Some(Msg::zoom_in_selected())
        }
        Key::Character(c) if modifiers.ctrl && c.as_str() == "-" => Some(Msg::zoom_out_selected()),
        Key::Character(c) if modifiers.ctrl && c.as_str() == "0" => {
            Some(Msg::reset_size_selected())
        }
        // Undo/redo
        Key::Character(c) if modifiers.ctrl && c.eq_ignore_ascii_case("z") && !modifiers.shift => {
            Some(Msg::undo())
        }
        Key::Character(c)
            if modifiers.ctrl
                && (c.eq_ignore_ascii_case("y")
                    || (c.eq_ignore_ascii_case("z") && modifiers.shift)) =>
        {
            Some(Msg::redo())
        }
        // Export (Ctrl+S kept for compatibility)
        Key::Character(c)
            if modifiers.ctrl && (c.eq_ignore_ascii_case("e") || c.eq_ignore_ascii_case("s")) =>
        {
            Some(Msg::export())
        }
        Key::Character(c) if modifiers.ctrl && c.eq_ignore_ascii_case("p") => Some(Msg::fit_view()),
        Key::Character(_) if modifiers.ctrl => None,
        // Drawing mode toggles
        Key::Character(c) if c.as_str() == "a" => Some(Msg::mode_toggle(AnnotationKind::Arrow)),
        Key::Character(c) if c.as_str() == "l" => Some(Msg::mode_toggle(AnnotationKind::Line)),
        Key::Character(c) if c.as_str() == "r" => Some(Msg::mode_toggle(AnnotationKind::Rectangle)),
        _ => None,
    }
}

/// Ctrl+wheel zooms selected images; anything else is left to the view
pub fn handle_wheel_event(scene: &Scene, delta_y: f64, modifiers: Modifiers) -> Option<Msg> {
    if !modifiers.ctrl || delta_y == 0.0 || scene.selected_images().is_empty() {
        return None;
    }
    if delta_y > 0.0 {
        Some(Msg::zoom_in_selected())
    } else {
        Some(Msg::zoom_out_selected())
    }
}

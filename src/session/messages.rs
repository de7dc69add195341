//! Message types for the composer command surface
//!
//! Collaborators (window, toolbar, hotkey listener) translate their raw input
//! into these messages and feed them to `ComposerApp::update`.

use std::path::PathBuf;

use crate::domain::{AnnotationKind, ItemId, Point};

// ============================================================================
// Input Types
// ============================================================================

/// Keyboard modifiers held during a pointer or key event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
}

/// Pointer events in scene coordinates
#[derive(Debug, Clone)]
pub enum PointerMsg {
    Down(Point, Modifiers),
    Move(Point),
    Up(Point),
}

// ============================================================================
// Drawing Types
// ============================================================================

/// Drawing mode and history messages
#[derive(Debug, Clone)]
pub enum DrawMsg {
    /// Toggle a drawing mode on/off
    ModeToggle(AnnotationKind),
    /// Leave any drawing mode
    ExitMode,
    /// Poll the idle timer
    Tick,
    /// Undo last annotation change
    Undo,
    /// Redo undone annotation change
    Redo,
}

// ============================================================================
// Editing Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    In,
    Out,
    Reset,
}

/// Which items an edit applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Selected,
    Items(Vec<ItemId>),
}

#[derive(Debug, Clone)]
pub enum EditMsg {
    Delete(Target),
    /// Remove every item; history is kept
    ClearScene,
    Zoom(ZoomAction, Target),
    Promote(ItemId),
    Select(ItemId, bool),
    ClearSelection,
}

// ============================================================================
// Top-level Message
// ============================================================================

#[derive(Debug, Clone)]
pub enum Msg {
    Import(Vec<PathBuf>),
    Draw(DrawMsg),
    Pointer(PointerMsg),
    Edit(EditMsg),
    /// Export to a timestamped file in the configured directory
    Export,
    /// Export to a file picked by the caller; format follows the extension
    ExportTo(PathBuf),
    FitView,
    Quit,
}

impl Msg {
    pub fn import(paths: Vec<PathBuf>) -> Self {
        Msg::Import(paths)
    }

    pub fn mode_toggle(kind: AnnotationKind) -> Self {
        Msg::Draw(DrawMsg::ModeToggle(kind))
    }

    pub fn exit_mode() -> Self {
        Msg::Draw(DrawMsg::ExitMode)
    }

    pub fn tick() -> Self {
        Msg::Draw(DrawMsg::Tick)
    }

    pub fn undo() -> Self {
        Msg::Draw(DrawMsg::Undo)
    }

    pub fn redo() -> Self {
        Msg::Draw(DrawMsg::Redo)
    }

    pub fn pointer_down(at: Point) -> Self {
        Msg::Pointer(PointerMsg::Down(at, Modifiers::NONE))
    }

    pub fn pointer_down_with(at: Point, modifiers: Modifiers) -> Self {
        Msg::Pointer(PointerMsg::Down(at, modifiers))
    }

    pub fn pointer_move(at: Point) -> Self {
        Msg::Pointer(PointerMsg::Move(at))
    }

    pub fn pointer_up(at: Point) -> Self {
        Msg::Pointer(PointerMsg::Up(at))
    }

    pub fn delete_selected() -> Self {
        Msg::Edit(EditMsg::Delete(Target::Selected))
    }

    pub fn delete(ids: Vec<ItemId>) -> Self {
        Msg::Edit(EditMsg::Delete(Target::Items(ids)))
    }

    pub fn clear_scene() -> Self {
        Msg::Edit(EditMsg::ClearScene)
    }

    pub fn zoom_in_selected() -> Self {
        Msg::Edit(EditMsg::Zoom(ZoomAction::In, Target::Selected))
    }

    pub fn zoom_out_selected() -> Self {
        Msg::Edit(EditMsg::Zoom(ZoomAction::Out, Target::Selected))
    }

    pub fn reset_size_selected() -> Self {
        Msg::Edit(EditMsg::Zoom(ZoomAction::Reset, Target::Selected))
    }

    pub fn zoom(action: ZoomAction, ids: Vec<ItemId>) -> Self {
        Msg::Edit(EditMsg::Zoom(action, Target::Items(ids)))
    }

    pub fn promote(id: ItemId) -> Self {
        Msg::Edit(EditMsg::Promote(id))
    }

    pub fn select(id: ItemId, selected: bool) -> Self {
        Msg::Edit(EditMsg::Select(id, selected))
    }

    pub fn clear_selection() -> Self {
        Msg::Edit(EditMsg::ClearSelection)
    }

    pub fn export() -> Self {
        Msg::Export
    }

    pub fn export_to(path: PathBuf) -> Self {
        Msg::ExportTo(path)
    }

    pub fn fit_view() -> Self {
        Msg::FitView
    }

    pub fn quit() -> Self {
        Msg::Quit
    }
}

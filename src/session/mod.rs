//! Editing session management
//!
//! This module contains:
//! - Interaction state (drawing modes, gestures, idle timer)
//! - The undo/redo command log
//! - Message types for the command surface
//! - Keyboard and wheel shortcuts

pub mod history;
pub mod messages;
pub mod shortcuts;
pub mod state;

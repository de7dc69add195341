//! Core application module
//!
//! This module contains:
//! - The `ComposerApp` context and its `update` entry point
//! - The cross-thread control channel

pub mod app;
pub mod control;

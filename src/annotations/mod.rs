//! Pointer gesture and drawing message handlers
//!
//! This module turns `DrawMsg` and `PointerMsg` into scene mutations and
//! command log entries.

pub mod handlers;

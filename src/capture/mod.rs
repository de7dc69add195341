//! Image import module
//!
//! Decodes files handed over by the open dialog or the command line into
//! pixel buffers the scene can place.

pub mod image;

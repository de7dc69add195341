//! Annotation rendering module
//!
//! This module contains:
//! - Geometry calculations shared by every rasterized shape
//! - Scene rasterization using tiny-skia and image (for export)

pub mod geometry;
pub mod image;

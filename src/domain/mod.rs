//! Pure domain types with minimal dependencies
//!
//! Types here know nothing about rendering, history or interaction, so every
//! other module can depend on them without cycles.

pub mod geometry;
pub mod item;

pub use geometry::*;
pub use item::*;

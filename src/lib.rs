//! Place, scale and annotate images on a canvas, then flatten them into one
//! raster.
//!
//! [`ComposerApp`] is the entry point. Window, toolbar and dialog
//! collaborators translate their input into [`Msg`] values and act on the
//! returned [`Response`].

pub mod annotations;
pub mod capture;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod render;
pub mod scene;
pub mod session;

pub use crate::config::ComposerConfig;
pub use crate::core::app::{ComposerApp, Response};
pub use crate::core::control::{ControlCommand, control_channel};
pub use crate::export::{ExportError, ExportReport, OutputFormat};
pub use crate::session::messages::Msg;

//! Configuration persistence for composer settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::export::OutputFormat;

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self {
            r: 0.9,
            g: 0.1,
            b: 0.1,
        }
    }
}

impl ShapeColor {
    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Directory for exported pictures (None = Pictures/ImageComposer)
    pub output_dir: Option<PathBuf>,
    /// Encoding of exported pictures
    pub output_format: OutputFormat,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Margin added around the scene bounds on export
    pub padding: u32,
    /// Delete imported source files once an export has been written
    pub delete_sources_after_export: bool,
    /// Remove all items and history once an export has been written
    pub clear_scene_after_export: bool,
    /// Seconds of inactivity before a drawing mode turns itself off
    pub drawing_idle_timeout_secs: u64,
    /// Shortest drag (Manhattan length) that produces a shape
    pub min_drag_distance: f64,
    /// Maximum number of undo steps kept
    pub history_limit: usize,
    /// Color for new annotations
    pub shape_color: ShapeColor,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            output_format: OutputFormat::Png,
            jpeg_quality: 95,
            padding: 50,
            // consumed inputs are removed after export
            delete_sources_after_export: true,
            clear_scene_after_export: true,
            drawing_idle_timeout_secs: 60,
            min_drag_distance: 10.0,
            history_limit: 100,
            shape_color: ShapeColor::default(),
        }
    }
}

impl ComposerConfig {
    /// Directory name used under the platform config and pictures folders
    pub const APP_DIR: &'static str = "image-composer";

    /// Default config file location
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(Self::APP_DIR).join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(err) => {
                    log::warn!("Error parsing config, using defaults: {}", err);
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Could not read config file: {}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing config {:?}", path))?;
        Ok(())
    }

    /// Where exports are written
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ImageComposer")
    }
}

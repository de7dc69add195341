//! Compositing the scene into one raster and writing it to disk
//!
//! An export is split in two halves. [`ExportJob::snapshot`] runs on the UI
//! thread and copies everything rendering needs (pixel buffers are shared
//! through `Arc`). [`ExportJob::run`] renders, encodes and writes, and can be
//! moved to a blocking worker. The post-export cleanup is applied back on the
//! UI thread by [`cleanup`].

use std::io;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::domain::{ItemId, Point, RectDimension, SceneItem};
use crate::render;
use crate::scene::Scene;
use crate::session::history::CommandLog;

/// Largest canvas an export will allocate (1 GiB of RGBA)
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Raster format of the exported file
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// RGBA on an opaque white background
    #[default]
    Png,
    /// Opaque RGB on white
    Jpeg,
}

impl OutputFormat {
    /// Pick the format from a destination file name (`.jpg`/`.jpeg` vs `.png`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the canvas is empty")]
    EmptyScene,
    #[error("could not write the output: {0}")]
    IoFailure(String),
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::IoFailure(err.to_string())
    }
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        ExportError::IoFailure(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::IoFailure(err.to_string())
    }
}

/// Where the raster goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Timestamped file inside this directory, created if absent
    Directory(PathBuf),
    /// Exact file chosen by the caller
    File(PathBuf),
}

/// Settings an export reads from the configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    pub padding: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            jpeg_quality: 95,
            padding: 50,
        }
    }
}

/// What happens to the scene once the raster is on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    pub delete_sources: bool,
    pub clear_scene: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            delete_sources: true,
            clear_scene: true,
        }
    }
}

/// A raster that has been committed to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenRaster {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Items that were rendered; cleanup removes only these
    pub items: Vec<ItemId>,
    /// Source files of the images that were rendered
    pub sources: Vec<PathBuf>,
}

/// Result handed back to the caller after cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub deleted_sources: u32,
    /// Annotation shapes removed from the scene
    pub cleared_shapes: u32,
    pub failed_deletions: u32,
}

/// Everything needed to render and write one export, detached from the scene
#[derive(Debug, Clone)]
pub struct ExportJob {
    items: Vec<SceneItem>,
    origin: Point,
    size: RectDimension,
    format: OutputFormat,
    jpeg_quality: u8,
    destination: Destination,
}

impl ExportJob {
    /// Capture the scene as it is now.
    ///
    /// A `File` destination picks the format from its extension and falls back
    /// to `settings.format` for unknown extensions.
    pub fn snapshot(
        scene: &Scene,
        settings: ExportSettings,
        destination: Destination,
    ) -> Result<Self, ExportError> {
        let bounds = scene.bounding_box().ok_or(ExportError::EmptyScene)?;
        let padded = bounds.expand(f64::from(settings.padding));
        let size = padded
            .dimensions()
            .ok_or_else(|| ExportError::IoFailure("the canvas has no area to render".to_string()))?;
        let pixels = u64::from(size.width()) * u64::from(size.height());
        // dimensions() saturates at u32::MAX, which always lands above the cap
        if pixels > MAX_CANVAS_PIXELS {
            return Err(ExportError::IoFailure(format!(
                "the canvas is too large to render ({:.0}x{:.0})",
                padded.width(),
                padded.height()
            )));
        }

        let format = match &destination {
            Destination::File(path) => OutputFormat::from_path(path).unwrap_or(settings.format),
            Destination::Directory(_) => settings.format,
        };

        Ok(Self {
            items: scene.items().cloned().collect(),
            origin: padded.origin(),
            size,
            format,
            jpeg_quality: settings.jpeg_quality,
            destination,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Output raster size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.size.width(), self.size.height())
    }

    /// Render, encode and write the raster
    pub fn run(self) -> Result<WrittenRaster, ExportError> {
        let path = self.resolve_path()?;
        let canvas = render::image::render_items(&self.items, self.origin, self.size);

        let mut file = io::BufWriter::new(std::fs::File::create(&path)?);
        match self.format {
            OutputFormat::Png => write_png(&mut file, &canvas)?,
            OutputFormat::Jpeg => write_jpeg(&mut file, canvas, self.jpeg_quality)?,
        }
        io::Write::flush(&mut file)?;

        let mut sources: Vec<PathBuf> = Vec::new();
        for source in self
            .items
            .iter()
            .filter_map(|item| item.as_image()?.source_path.clone())
        {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        log::info!(
            "Exported {} item(s) to {:?} ({}x{})",
            self.items.len(),
            path,
            self.size.width(),
            self.size.height()
        );
        Ok(WrittenRaster {
            path,
            width: self.size.width(),
            height: self.size.height(),
            items: self.items.iter().map(|item| item.id).collect(),
            sources,
        })
    }

    fn resolve_path(&self) -> Result<PathBuf, ExportError> {
        match &self.destination {
            Destination::Directory(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(dir.join(output_file_name(self.format, chrono::Local::now())))
            }
            Destination::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(path.clone())
            }
        }
    }
}

/// Timestamped file name for exports into a directory
pub fn output_file_name(format: OutputFormat, now: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}.{}",
        now.format("Composite_%Y-%m-%d_%H-%M-%S_%3f"),
        format.extension()
    )
}

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// The canvas is opaque, so dropping alpha equals compositing onto white
fn write_jpeg<W: io::Write>(w: W, image: RgbaImage, quality: u8) -> Result<(), image::ImageError> {
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    let encoder = JpegEncoder::new_with_quality(w, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
}

/// Apply the post-export side effects and build the report.
///
/// Source deletions run first and never abort; each failure is logged and
/// counted. Removing the rendered items also clears the log, whose entries would
/// otherwise point at items that no longer exist.
pub fn cleanup(
    scene: &mut Scene,
    history: &mut CommandLog,
    written: WrittenRaster,
    policy: CleanupPolicy,
) -> ExportReport {
    let mut deleted_sources = 0;
    let mut failed_deletions = 0;
    if policy.delete_sources {
        // the output may overwrite one of the inputs
        let output =
            std::fs::canonicalize(&written.path).unwrap_or_else(|_| written.path.clone());
        for source in &written.sources {
            let target = std::fs::canonicalize(source).unwrap_or_else(|_| source.clone());
            if target == output {
                log::warn!("Keeping source {:?}: it is the exported file", source);
                continue;
            }
            match std::fs::remove_file(source) {
                Ok(()) => {
                    log::debug!("Deleted source {:?}", source);
                    deleted_sources += 1;
                }
                Err(err) => {
                    log::warn!("Could not delete source {:?}: {}", source, err);
                    failed_deletions += 1;
                }
            }
        }
    }

    let mut cleared_shapes = 0;
    if policy.clear_scene {
        // items added while the export was running stay on the canvas
        let removed: Vec<SceneItem> = written
            .items
            .iter()
            .filter_map(|id| scene.remove(*id))
            .collect();
        cleared_shapes = removed.iter().filter(|item| item.is_annotation()).count() as u32;
        history.clear();
        log::debug!(
            "Cleared {} item(s) after export ({} shape(s))",
            removed.len(),
            cleared_shapes
        );
    }

    ExportReport {
        path: written.path,
        width: written.width,
        height: written.height,
        deleted_sources,
        cleared_shapes,
        failed_deletions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::domain::{AnnotationKind, ImageItem, ItemKind};
    use chrono::TimeZone;
    use image::Rgba;

    fn scene_with_image(pixels: RgbaImage, at: Point, source: Option<PathBuf>) -> Scene {
        let mut scene = Scene::new();
        scene.add(ItemKind::Image(ImageItem::new(pixels, at, source)));
        scene
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/out.JPEG")),
            Some(OutputFormat::Jpeg)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.png")),
            Some(OutputFormat::Png)
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.tiff")), None);
        assert_eq!(OutputFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn test_output_file_name() {
        let now = chrono::Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap();
        assert_eq!(
            output_file_name(OutputFormat::Jpeg, now),
            "Composite_2024-03-09_14-05-07_000.jpg"
        );
    }

    #[test]
    fn test_snapshot_empty_scene() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let err = ExportJob::snapshot(
            &Scene::new(),
            ExportSettings::default(),
            Destination::Directory(out.clone()),
        )
        .unwrap_err();
        assert_eq!(err, ExportError::EmptyScene);
        assert!(!out.exists());
    }

    #[test]
    fn test_padded_size_and_origin() {
        let scene = scene_with_image(RgbaImage::new(100, 40), Point::new(-20.0, 10.0), None);
        let job = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::Directory(PathBuf::from("unused")),
        )
        .unwrap();
        assert_eq!(job.size(), (200, 140));
        assert_eq!(job.origin, Point::new(-70.0, -40.0));
    }

    #[test]
    fn test_file_destination_picks_format() {
        let scene = scene_with_image(RgbaImage::new(4, 4), Point::ORIGIN, None);
        let job = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::File(PathBuf::from("x/out.jpg")),
        )
        .unwrap();
        assert_eq!(job.format(), OutputFormat::Jpeg);

        let settings = ExportSettings {
            format: OutputFormat::Jpeg,
            ..Default::default()
        };
        let job = ExportJob::snapshot(
            &scene,
            settings,
            Destination::File(PathBuf::from("out.bmp")),
        )
        .unwrap();
        assert_eq!(job.format(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_run_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let scene = scene_with_image(
            RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])),
            Point::ORIGIN,
            None,
        );
        let settings = ExportSettings {
            format: OutputFormat::Jpeg,
            jpeg_quality: 90,
            padding: 5,
        };
        let destination = Destination::Directory(dir.path().into());
        let written = ExportJob::snapshot(&scene, settings, destination)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(written.path.extension().unwrap(), "jpg");
        let decoded = image::open(&written.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 20));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_run_into_unwritable_dir_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let scene = scene_with_image(RgbaImage::new(2, 2), Point::ORIGIN, None);
        let err = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::Directory(blocker.join("sub")),
        )
        .unwrap()
        .run()
        .unwrap_err();
        assert!(matches!(err, ExportError::IoFailure(_)));
    }

    #[test]
    fn test_cleanup_counts_failed_deletions() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.png");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("missing.png");

        let pixels = RgbaImage::new(2, 2);
        let mut scene = scene_with_image(pixels, Point::ORIGIN, Some(present.clone()));
        scene.add(AnnotationKind::Line.build(
            Point::ORIGIN,
            Point::new(30.0, 0.0),
            ShapeColor::default(),
        ));
        let line = scene.items().last().unwrap().id;
        let mut history = CommandLog::default();
        history.record_add(line);

        let written = WrittenRaster {
            path: dir.path().join("out.png"),
            width: 1,
            height: 1,
            items: scene.items().map(|item| item.id).collect(),
            sources: vec![present.clone(), missing],
        };
        let report = cleanup(&mut scene, &mut history, written, CleanupPolicy::default());

        assert_eq!(report.deleted_sources, 1);
        assert_eq!(report.failed_deletions, 1);
        assert_eq!(report.cleared_shapes, 1);
        assert!(!present.exists());
        assert!(scene.is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_cleanup_policy_off_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("keep.png");
        std::fs::write(&source, b"x").unwrap();

        let mut scene = scene_with_image(RgbaImage::new(2, 2), Point::ORIGIN, Some(source.clone()));
        let mut history = CommandLog::default();
        let written = WrittenRaster {
            path: dir.path().join("out.png"),
            width: 1,
            height: 1,
            items: scene.items().map(|item| item.id).collect(),
            sources: vec![source.clone()],
        };
        let policy = CleanupPolicy {
            delete_sources: false,
            clear_scene: false,
        };
        let report = cleanup(&mut scene, &mut history, written, policy);

        assert_eq!(report.deleted_sources, 0);
        assert!(source.exists());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_cleanup_keeps_source_overwritten_by_output() {
        let dir = tempfile::tempdir().unwrap();
        let shot = dir.path().join("shot.png");
        RgbaImage::new(4, 4).save(&shot).unwrap();

        let mut scene = scene_with_image(RgbaImage::new(4, 4), Point::ORIGIN, Some(shot.clone()));
        let written = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::File(dir.path().join(".").join("shot.png")),
        )
        .unwrap()
        .run()
        .unwrap();
        let report = cleanup(
            &mut scene,
            &mut CommandLog::default(),
            written,
            CleanupPolicy::default(),
        );

        assert!(report.path.exists());
        assert_eq!(report.deleted_sources, 0);
        assert_eq!(report.failed_deletions, 0);
        assert_eq!(image::open(&shot).unwrap().width(), 104);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_cleanup_leaves_items_added_after_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = scene_with_image(RgbaImage::new(4, 4), Point::ORIGIN, None);
        let job = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::Directory(dir.path().into()),
        )
        .unwrap();
        let late = scene.add(AnnotationKind::Rectangle.build(
            Point::ORIGIN,
            Point::new(30.0, 30.0),
            ShapeColor::default(),
        ));

        let report = cleanup(
            &mut scene,
            &mut CommandLog::default(),
            job.run().unwrap(),
            CleanupPolicy::default(),
        );

        assert_eq!(report.cleared_shapes, 0);
        assert_eq!(scene.len(), 1);
        assert!(scene.contains(late));
    }

    #[test]
    fn test_oversized_canvas_is_io_failure() {
        let mut scene = Scene::new();
        scene.add(AnnotationKind::Line.build(
            Point::ORIGIN,
            Point::new(5e9, 5e9),
            ShapeColor::default(),
        ));
        let err = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::Directory(PathBuf::from("unused")),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::IoFailure(_)));

        // just under the cap is still accepted
        let mut scene = Scene::new();
        scene.add(AnnotationKind::Line.build(
            Point::ORIGIN,
            Point::new(16_000.0, 16_000.0),
            ShapeColor::default(),
        ));
        let job = ExportJob::snapshot(
            &scene,
            ExportSettings::default(),
            Destination::Directory(PathBuf::from("unused")),
        )
        .unwrap();
        assert_eq!(job.size(), (16_100, 16_100));
    }
}

//! Composer application context
//!
//! `ComposerApp` owns the scene, the command log, the interaction state and
//! the configuration. Collaborators serialize their calls onto the thread
//! that owns it and drive everything through [`ComposerApp::update`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::annotations::handlers;
use crate::capture::image::{ImportSummary, LoadedImage};
use crate::config::ComposerConfig;
use crate::domain::{AnnotationKind, ImageItem, ItemId, ItemKind, Point, Rect};
use crate::export::{
    self, CleanupPolicy, Destination, ExportError, ExportJob, ExportReport, ExportSettings,
    WrittenRaster,
};
use crate::scene::Scene;
use crate::session::history::CommandLog;
use crate::session::messages::{EditMsg, Msg, Target, ZoomAction};
use crate::session::state::InteractionState;

/// Top-left of the first image of an import batch
const IMPORT_ORIGIN: f64 = 100.0;
/// Diagonal step between images of one batch
const IMPORT_STAGGER: f64 = 40.0;

/// What the caller should show or do after a message
#[derive(Debug, Clone)]
pub enum Response {
    None,
    /// Status bar text
    Status(String),
    Imported(ImportSummary),
    Exported(ExportReport),
    ExportFailed(ExportError),
    Quit,
}

pub struct ComposerApp {
    pub(crate) scene: Scene,
    pub(crate) history: CommandLog,
    pub(crate) interaction: InteractionState,
    pub(crate) config: ComposerConfig,
}

impl ComposerApp {
    pub fn new(config: ComposerConfig) -> Self {
        let interaction = InteractionState::new(
            Duration::from_secs(config.drawing_idle_timeout_secs),
            config.min_drag_distance,
        );
        Self {
            scene: Scene::new(),
            history: CommandLog::with_limit(config.history_limit),
            interaction,
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &CommandLog {
        &self.history
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn update(&mut self, msg: Msg) -> Response {
        self.update_at(msg, Instant::now())
    }

    /// Same as [`update`](Self::update) with an explicit clock for the idle timer
    pub fn update_at(&mut self, msg: Msg, now: Instant) -> Response {
        match msg {
            Msg::Import(paths) => Response::Imported(self.import_images(&paths)),
            Msg::Draw(msg) => handlers::handle_draw_msg(self, msg, now),
            Msg::Pointer(msg) => handlers::handle_pointer_msg(self, msg, now),
            Msg::Edit(msg) => self.handle_edit_msg(msg),
            Msg::Export => self.export_response(None),
            Msg::ExportTo(path) => self.export_response(Some(path)),
            Msg::FitView => match self.fit_view() {
                Some(rect) => Response::Status(format!(
                    "Showing {:.0}x{:.0} at ({:.0}, {:.0})",
                    rect.width(),
                    rect.height(),
                    rect.left,
                    rect.top
                )),
                None => Response::Status("Canvas is empty".to_string()),
            },
            Msg::Quit => Response::Quit,
        }
    }

    fn handle_edit_msg(&mut self, msg: EditMsg) -> Response {
        match msg {
            EditMsg::Delete(target) => {
                let ids = self.resolve(target);
                if ids.is_empty() {
                    return Response::Status("Nothing selected".to_string());
                }
                let removed = self.delete(&ids);
                Response::Status(format!("Deleted {} item(s)", removed))
            }
            EditMsg::ClearScene => {
                self.clear_scene();
                Response::Status("Canvas cleared".to_string())
            }
            EditMsg::Zoom(action, target) => {
                let ids = self.resolve(target);
                let touched = match action {
                    ZoomAction::In => self.scene.zoom_in(&ids),
                    ZoomAction::Out => self.scene.zoom_out(&ids),
                    ZoomAction::Reset => self.scene.reset_scale(&ids),
                };
                if touched == 0 {
                    return Response::Status("Select an image first".to_string());
                }
                let verb = match action {
                    ZoomAction::In => "Zoomed in",
                    ZoomAction::Out => "Zoomed out",
                    ZoomAction::Reset => "Reset size of",
                };
                Response::Status(format!("{} {} image(s)", verb, touched))
            }
            EditMsg::Promote(id) => {
                self.promote(id);
                Response::None
            }
            EditMsg::Select(id, selected) => {
                self.scene.set_selected(id, selected);
                Response::None
            }
            EditMsg::ClearSelection => {
                self.scene.clear_selection();
                Response::None
            }
        }
    }

    fn resolve(&self, target: Target) -> Vec<ItemId> {
        match target {
            Target::Selected => self.scene.selected(),
            Target::Items(ids) => ids,
        }
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Decode and place files, staggered diagonally by their batch index.
    /// Failed files still take up their slot.
    pub fn import_images(&mut self, paths: &[PathBuf]) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for (i, path) in paths.iter().enumerate() {
            let offset = IMPORT_ORIGIN + IMPORT_STAGGER * i as f64;
            match LoadedImage::open(path) {
                Ok(loaded) => {
                    let id = self.add_image(
                        loaded.rgba,
                        Some(loaded.path),
                        Point::new(offset, offset),
                    );
                    summary.imported.push(id);
                }
                Err(err) => {
                    log::warn!("Skipping import: {}", err);
                    summary.failures.push(err);
                }
            }
        }
        log::info!(
            "Imported {} image(s), {} failed, {} on canvas",
            summary.imported.len(),
            summary.failures.len(),
            self.scene.image_count()
        );
        summary
    }

    /// Place already decoded pixels on top of the scene. Not undoable.
    pub fn add_image(
        &mut self,
        pixels: RgbaImage,
        source_path: Option<PathBuf>,
        position: Point,
    ) -> ItemId {
        self.scene
            .add(ItemKind::Image(ImageItem::new(pixels, position, source_path)))
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Remove items; only the annotations among them go into the log, as one
    /// entry. Returns how many items were removed.
    pub fn delete(&mut self, ids: &[ItemId]) -> usize {
        let removed: Vec<_> = ids.iter().filter_map(|id| self.scene.remove(*id)).collect();
        let count = removed.len();
        if self.history.record_delete(removed) {
            log::debug!("Recorded deletion of annotations");
        }
        count
    }

    pub fn delete_selected(&mut self) -> usize {
        let ids = self.scene.selected();
        self.delete(&ids)
    }

    /// Remove every item; the log is left alone
    pub fn clear_scene(&mut self) {
        let removed = self.scene.clear();
        self.interaction.cancel_gesture();
        log::debug!("Cleared {} item(s)", removed.len());
    }

    /// Enter a drawing mode even if it is already active; re-arms the timer
    pub fn begin_drawing_mode(&mut self, kind: AnnotationKind) {
        self.interaction.enter_mode(kind, Instant::now());
    }

    pub fn promote(&mut self, id: ItemId) -> bool {
        self.scene.promote_to_top(id)
    }

    /// Area the view should fit, `None` when there is nothing to show
    pub fn fit_view(&self) -> Option<Rect> {
        self.scene.bounding_box()
    }

    // ========================================================================
    // Export
    // ========================================================================

    fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            format: self.config.output_format,
            jpeg_quality: self.config.jpeg_quality,
            padding: self.config.padding,
        }
    }

    fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            delete_sources: self.config.delete_sources_after_export,
            clear_scene: self.config.clear_scene_after_export,
        }
    }

    /// Snapshot the scene for an export. `None` writes a timestamped file
    /// into the configured output directory.
    pub fn begin_export(&self, path: Option<PathBuf>) -> Result<ExportJob, ExportError> {
        let destination = match path {
            Some(path) => Destination::File(path),
            None => Destination::Directory(self.config.resolved_output_dir()),
        };
        ExportJob::snapshot(&self.scene, self.export_settings(), destination)
    }

    /// Apply the outcome of [`ExportJob::run`]. A failed export leaves the
    /// scene untouched.
    pub fn finish_export(
        &mut self,
        written: Result<WrittenRaster, ExportError>,
    ) -> Result<ExportReport, ExportError> {
        let written = written.inspect_err(|err| log::error!("Export failed: {}", err))?;
        let policy = self.cleanup_policy();
        Ok(export::cleanup(
            &mut self.scene,
            &mut self.history,
            written,
            policy,
        ))
    }

    /// Export on the calling thread
    pub fn export(&mut self) -> Result<ExportReport, ExportError> {
        let job = self.begin_export(None)?;
        self.finish_export(job.run())
    }

    /// Export to an explicit file on the calling thread
    pub fn export_to(&mut self, path: &Path) -> Result<ExportReport, ExportError> {
        let job = self.begin_export(Some(path.to_path_buf()))?;
        self.finish_export(job.run())
    }

    fn export_response(&mut self, path: Option<PathBuf>) -> Response {
        let result = match path {
            Some(path) => self.export_to(&path),
            None => self.export(),
        };
        match result {
            Ok(report) => Response::Exported(report),
            Err(err) => Response::ExportFailed(err),
        }
    }
}

impl Default for ComposerApp {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::session::state::ToolMode;
    use image::Rgba;

    fn app_in(dir: &Path) -> ComposerApp {
        ComposerApp::new(ComposerConfig {
            output_dir: Some(dir.to_path_buf()),
            ..Default::default()
        })
    }

    fn add_line(app: &mut ComposerApp, from: Point, to: Point) -> ItemId {
        let id = app
            .scene
            .add(AnnotationKind::Line.build(from, to, ShapeColor::default()));
        app.history.record_add(id);
        id
    }

    #[test]
    fn test_import_staggers_and_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.png");
        let bad = dir.path().join("b.png");
        let third = dir.path().join("c.png");
        RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))
            .save(&good)
            .unwrap();
        std::fs::write(&bad, b"garbage").unwrap();
        std::fs::copy(&good, &third).unwrap();

        let mut app = app_in(dir.path());
        let summary = app.import_images(&[good.clone(), bad, third]);

        assert_eq!(summary.imported.len(), 2);
        assert_eq!(summary.failures.len(), 1);
        let first = app.scene.get(summary.imported[0]).unwrap();
        assert_eq!(first.position(), Point::new(100.0, 100.0));
        assert_eq!(
            first.as_image().unwrap().source_path.as_deref(),
            Some(good.as_path())
        );
        // the failed file still used slot 1
        let last = app.scene.get(summary.imported[1]).unwrap();
        assert_eq!(last.position(), Point::new(180.0, 180.0));
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_delete_records_only_annotations() {
        let mut app = ComposerApp::default();
        let img = app.add_image(RgbaImage::new(4, 4), None, Point::ORIGIN);
        let line = add_line(&mut app, Point::ORIGIN, Point::new(40.0, 0.0));
        app.scene.set_selected(img, true);
        app.scene.set_selected(line, true);

        let response = app.update(Msg::delete_selected());
        assert!(matches!(response, Response::Status(ref s) if s == "Deleted 2 item(s)"));
        assert_eq!(app.history.undo_count(), 2);

        app.update(Msg::undo());
        assert!(app.scene.contains(line));
        assert!(!app.scene.contains(img));
    }

    #[test]
    fn test_delete_nothing_selected() {
        let mut app = ComposerApp::default();
        let response = app.update(Msg::delete_selected());
        assert!(matches!(response, Response::Status(ref s) if s == "Nothing selected"));
    }

    #[test]
    fn test_zoom_requires_selected_image() {
        let mut app = ComposerApp::default();
        let line = add_line(&mut app, Point::ORIGIN, Point::new(40.0, 0.0));
        app.scene.set_selected(line, true);

        let response = app.update(Msg::zoom_in_selected());
        assert!(matches!(response, Response::Status(ref s) if s == "Select an image first"));

        let img = app.add_image(RgbaImage::new(4, 4), None, Point::ORIGIN);
        app.scene.set_selected(img, true);
        let response = app.update(Msg::zoom_in_selected());
        assert!(matches!(response, Response::Status(ref s) if s == "Zoomed in 1 image(s)"));
    }

    #[test]
    fn test_clear_scene_keeps_history() {
        let mut app = ComposerApp::default();
        add_line(&mut app, Point::ORIGIN, Point::new(40.0, 0.0));
        app.update(Msg::clear_scene());

        assert!(app.scene.is_empty());
        assert_eq!(app.history.undo_count(), 1);
        // undo of the cleared add is a no-op that still moves to redo
        assert!(app.history.undo(&mut app.scene));
        assert!(app.scene.is_empty());
        assert!(app.history.can_redo());
    }

    #[test]
    fn test_failed_export_leaves_scene() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let mut app = app_in(&blocker.join("out"));
        add_line(&mut app, Point::ORIGIN, Point::new(40.0, 0.0));
        let response = app.update(Msg::export());

        assert!(matches!(
            response,
            Response::ExportFailed(ExportError::IoFailure(_))
        ));
        assert_eq!(app.scene.len(), 1);
        assert_eq!(app.history.undo_count(), 1);
    }

    #[test]
    fn test_export_to_file_keeps_sources_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.png");
        RgbaImage::new(4, 4).save(&source).unwrap();

        let mut app = ComposerApp::new(ComposerConfig {
            delete_sources_after_export: false,
            ..Default::default()
        });
        app.import_images(std::slice::from_ref(&source));
        let target = dir.path().join("nested").join("out.jpg");
        let report = app.export_to(&target).unwrap();

        assert_eq!(report.path, target);
        assert_eq!((report.width, report.height), (104, 104));
        assert_eq!(report.deleted_sources, 0);
        assert!(source.exists());
        assert!(app.scene.is_empty());
    }

    #[test]
    fn test_export_over_imported_source_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        let shot = dir.path().join("shot.png");
        let other = dir.path().join("other.png");
        RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))
            .save(&shot)
            .unwrap();
        std::fs::copy(&shot, &other).unwrap();

        let mut app = ComposerApp::default();
        app.import_images(&[shot.clone(), other.clone()]);
        let report = app.export_to(&shot).unwrap();

        assert!(shot.exists());
        assert!(!other.exists());
        assert_eq!(report.deleted_sources, 1);
        assert_eq!(report.failed_deletions, 0);
        let written = image::open(&report.path).unwrap();
        assert_eq!((written.width(), written.height()), (144, 144));
    }

    #[test]
    fn test_oversized_export_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut app = app_in(&out);
        add_line(&mut app, Point::ORIGIN, Point::new(5e9, 5e9));

        let response = app.update(Msg::export());

        assert!(matches!(
            response,
            Response::ExportFailed(ExportError::IoFailure(_))
        ));
        assert!(!out.exists());
        assert_eq!(app.scene.len(), 1);
        assert_eq!(app.history.undo_count(), 1);
    }

    #[test]
    fn test_items_added_during_export_survive_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.add_image(RgbaImage::new(4, 4), None, Point::ORIGIN);
        let job = app.begin_export(None).unwrap();

        let late = add_line(&mut app, Point::ORIGIN, Point::new(40.0, 0.0));
        let report = app.finish_export(job.run()).unwrap();

        assert_eq!(report.cleared_shapes, 0);
        assert_eq!(app.scene.len(), 1);
        assert!(app.scene.contains(late));
    }

    #[test]
    fn test_begin_drawing_mode_does_not_toggle_off() {
        let mut app = ComposerApp::default();
        app.begin_drawing_mode(AnnotationKind::Rectangle);
        app.begin_drawing_mode(AnnotationKind::Rectangle);
        assert_eq!(app.interaction.mode(), ToolMode::DrawingRectangle);
    }

    #[test]
    fn test_fit_view() {
        let mut app = ComposerApp::default();
        assert!(app.fit_view().is_none());
        app.add_image(RgbaImage::new(10, 20), None, Point::new(5.0, 5.0));
        assert_eq!(app.fit_view(), Some(Rect::new(5.0, 5.0, 15.0, 25.0)));
    }
}

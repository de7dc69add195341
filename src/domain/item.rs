//! Scene item types: placed images and vector annotations
//!
//! All coordinates are scene-space; no item is positioned relative to another.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

use super::geometry::{self, Point, Rect, Vector};
use crate::config::ShapeColor;

/// Stable identity of a scene item, never reused within a scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Longest side an image may be enlarged to, in pixels. Larger sources keep
/// their own size as the limit.
pub const MAX_IMAGE_SIDE: u32 = 16_384;

/// A raster placed on the canvas
#[derive(Clone, Debug)]
pub struct ImageItem {
    /// Decoded pixels at full resolution, shared with in-flight exports
    pub original_pixels: Arc<RgbaImage>,
    /// Scale applied when the image was placed (always 1.0 for imports)
    pub origin_scale: f64,
    /// Scale accumulated from zoom operations, always > 0
    pub user_scale: f64,
    /// Top-left corner in scene coordinates
    pub position: Point,
    /// File the pixels came from, consumed by export cleanup
    pub source_path: Option<PathBuf>,
}

impl ImageItem {
    pub fn new(pixels: RgbaImage, position: Point, source_path: Option<PathBuf>) -> Self {
        Self {
            original_pixels: Arc::new(pixels),
            origin_scale: 1.0,
            user_scale: 1.0,
            position,
            source_path,
        }
    }

    /// Combined scale from original pixels to scene units
    pub fn effective_scale(&self) -> f64 {
        self.origin_scale * self.user_scale
    }

    /// Size in whole pixels after scaling, never smaller than 1x1
    pub fn scaled_size(&self) -> (u32, u32) {
        self.size_at(self.effective_scale())
    }

    /// Whether `user_scale` would keep the image positive and within bounds
    pub fn accepts_user_scale(&self, user_scale: f64) -> bool {
        if !(user_scale.is_normal() && user_scale > 0.0) {
            return false;
        }
        let scale = self.origin_scale * user_scale;
        let longest = self.original_pixels.width().max(self.original_pixels.height());
        scale <= 1.0 || f64::from(longest) * scale <= f64::from(MAX_IMAGE_SIDE)
    }

    fn size_at(&self, scale: f64) -> (u32, u32) {
        let side = |len: u32| {
            let limit = len.max(MAX_IMAGE_SIDE);
            (f64::from(len) * scale).floor().clamp(1.0, f64::from(limit)) as u32
        };
        (side(self.original_pixels.width()), side(self.original_pixels.height()))
    }

    pub fn bounds(&self) -> Rect {
        let (w, h) = self.scaled_size();
        Rect::from_origin_size(self.position, w as f64, h as f64)
    }
}

/// Straight segment shared by arrows and lines
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub color: ShapeColor,
}

/// Axis-aligned outline box spanning two arbitrary corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectShape {
    pub corner_a: Point,
    pub corner_b: Point,
    pub color: ShapeColor,
}

impl RectShape {
    /// Corners normalized so the first one is the minimum corner
    pub fn normalized(&self) -> Rect {
        Rect::from_corners(self.corner_a, self.corner_b)
    }
}

/// Per-variant payload of a scene item
#[derive(Clone, Debug)]
pub enum ItemKind {
    Image(ImageItem),
    Arrow(Segment),
    Line(Segment),
    Rectangle(RectShape),
}

/// Annotation kinds that drawing modes produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Arrow,
    Line,
    Rectangle,
}

impl AnnotationKind {
    /// Build the shape a completed gesture describes
    pub fn build(self, start: Point, end: Point, color: ShapeColor) -> ItemKind {
        match self {
            AnnotationKind::Arrow => ItemKind::Arrow(Segment { start, end, color }),
            AnnotationKind::Line => ItemKind::Line(Segment { start, end, color }),
            AnnotationKind::Rectangle => ItemKind::Rectangle(RectShape {
                corner_a: start,
                corner_b: end,
                color,
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Line => "line",
            AnnotationKind::Rectangle => "rectangle",
        }
    }
}

/// An item living in (or detached from) the scene
#[derive(Clone, Debug)]
pub struct SceneItem {
    pub id: ItemId,
    /// Render order, ascending
    pub z: i64,
    pub selected: bool,
    pub kind: ItemKind,
}

impl SceneItem {
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ItemKind::Image(_))
    }

    /// Check if this is an annotation (arrow, line, rectangle)
    pub fn is_annotation(&self) -> bool {
        self.annotation_kind().is_some()
    }

    pub fn annotation_kind(&self) -> Option<AnnotationKind> {
        match self.kind {
            ItemKind::Image(_) => None,
            ItemKind::Arrow(_) => Some(AnnotationKind::Arrow),
            ItemKind::Line(_) => Some(AnnotationKind::Line),
            ItemKind::Rectangle(_) => Some(AnnotationKind::Rectangle),
        }
    }

    pub fn as_image(&self) -> Option<&ImageItem> {
        match &self.kind {
            ItemKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageItem> {
        match &mut self.kind {
            ItemKind::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Axis-aligned bounds of the item's geometry (stroke width excluded)
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ItemKind::Image(img) => img.bounds(),
            ItemKind::Arrow(seg) | ItemKind::Line(seg) => Rect::from_corners(seg.start, seg.end),
            ItemKind::Rectangle(rect) => rect.normalized(),
        }
    }

    /// Reference point used as the item's position
    pub fn position(&self) -> Point {
        match &self.kind {
            ItemKind::Image(img) => img.position,
            ItemKind::Arrow(seg) | ItemKind::Line(seg) => seg.start,
            ItemKind::Rectangle(rect) => rect.corner_a,
        }
    }

    /// Move the whole item so its reference point lands on `position`
    pub fn set_position(&mut self, position: Point) {
        let delta = position - self.position();
        self.translate(delta);
    }

    pub fn translate(&mut self, delta: Vector) {
        match &mut self.kind {
            ItemKind::Image(img) => img.position += delta,
            ItemKind::Arrow(seg) | ItemKind::Line(seg) => {
                seg.start += delta;
                seg.end += delta;
            }
            ItemKind::Rectangle(rect) => {
                rect.corner_a += delta;
                rect.corner_b += delta;
            }
        }
    }

    /// Whether `p` hits the item. Segments use `tolerance` around the stroke.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        match &self.kind {
            ItemKind::Image(img) => img.bounds().contains_point(p),
            ItemKind::Arrow(seg) | ItemKind::Line(seg) => {
                geometry::distance_to_segment(p, seg.start, seg.end) <= tolerance
            }
            ItemKind::Rectangle(rect) => rect.normalized().expand(tolerance).contains_point(p),
        }
    }
}

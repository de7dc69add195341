//! Scene rasterization using image and tiny-skia
//!
//! Everything is drawn onto an opaque white `RgbaImage`. Because the canvas
//! is opaque throughout, its straight and premultiplied representations are
//! identical and the buffer can be handed to tiny-skia without conversion.

use std::borrow::Cow;

use image::{Rgba, RgbaImage, imageops};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::geometry::{self, arrow, line, shape};
use crate::domain::{ImageItem, ItemKind, Point, RectDimension, RectShape, SceneItem, Segment};

pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    img.copy_from_slice(pixmap.data());
}

fn paint_for(color: [u8; 4]) -> Paint<'static> {
    let [r, g, b, a] = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Build the straight segment path shared by lines and arrow shafts
fn build_segment_path(start: Point, end: Point) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(start.x as f32, start.y as f32);
    pb.line_to(end.x as f32, end.y as f32);
    pb.finish()
}

/// Build the filled triangle at the tip of an arrow
fn build_head_path(tip: Point, left: Point, right: Point) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(tip.x as f32, tip.y as f32);
    pb.line_to(left.x as f32, left.y as f32);
    pb.line_to(right.x as f32, right.y as f32);
    pb.close();
    pb.finish()
}

fn draw_arrow(pixmap: &mut Pixmap, seg: &Segment, transform: Transform) {
    let paint = paint_for(seg.color.to_rgba_u8());
    let Some((tip, left, right, base)) = arrow::head_points(seg.start, seg.end) else {
        return;
    };

    // Shaft stops at the head's base so the tip stays sharp
    if let Some(path) = build_segment_path(seg.start, base) {
        let stroke = Stroke {
            width: arrow::THICKNESS,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }
    if let Some(path) = build_head_path(tip, left, right) {
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
}

fn draw_line(pixmap: &mut Pixmap, seg: &Segment, transform: Transform) {
    let Some(path) = build_segment_path(seg.start, seg.end) else {
        return;
    };
    let paint = paint_for(seg.color.to_rgba_u8());
    let stroke = Stroke {
        width: line::THICKNESS,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
}

fn draw_rect_outline(pixmap: &mut Pixmap, rect: &RectShape, transform: Transform) {
    let (min_x, min_y, max_x, max_y) = geometry::normalize_rect(
        rect.corner_a.x as f32,
        rect.corner_a.y as f32,
        rect.corner_b.x as f32,
        rect.corner_b.y as f32,
    );

    let mut pb = PathBuilder::new();
    pb.move_to(min_x, min_y);
    pb.line_to(max_x, min_y);
    pb.line_to(max_x, max_y);
    pb.line_to(min_x, max_y);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    let paint = paint_for(rect.color.to_rgba_u8());
    let stroke = Stroke {
        width: shape::THICKNESS,
        line_cap: LineCap::Square,
        line_join: LineJoin::Miter,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
}

/// Paste an image at full source resolution, resampled to its user scale
fn draw_image(canvas: &mut RgbaImage, img: &ImageItem, origin: Point) {
    let (w, h) = img.scaled_size();
    let source = img.original_pixels.as_ref();
    let pixels: Cow<'_, RgbaImage> = if (w, h) == source.dimensions() {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(imageops::resize(
            source,
            w,
            h,
            imageops::FilterType::Lanczos3,
        ))
    };

    let x = (img.position.x - origin.x) as i64;
    let y = (img.position.y - origin.y) as i64;
    imageops::overlay(canvas, &*pixels, x, y);
}

/// Draw a run of vector items in one pixmap round-trip
fn draw_vectors(canvas: &mut RgbaImage, items: &[&SceneItem], origin: Point) {
    if items.is_empty() {
        return;
    }
    let transform = Transform::from_translate(-origin.x as f32, -origin.y as f32);
    with_pixmap(canvas, |pixmap| {
        for item in items {
            match &item.kind {
                ItemKind::Arrow(seg) => draw_arrow(pixmap, seg, transform),
                ItemKind::Line(seg) => draw_line(pixmap, seg, transform),
                ItemKind::Rectangle(rect) => draw_rect_outline(pixmap, rect, transform),
                ItemKind::Image(_) => {}
            }
        }
    });
}

/// Rasterize items in ascending z onto a white canvas.
///
/// `origin` is the scene point mapped to pixel (0, 0).
pub fn render_items(items: &[SceneItem], origin: Point, size: RectDimension) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(size.width(), size.height(), BACKGROUND);

    let mut ordered: Vec<&SceneItem> = items.iter().collect();
    ordered.sort_by_key(|item| (item.z, item.id));

    let mut pending: Vec<&SceneItem> = Vec::new();
    for item in ordered {
        match &item.kind {
            ItemKind::Image(img) => {
                draw_vectors(&mut canvas, &pending, origin);
                pending.clear();
                draw_image(&mut canvas, img, origin);
            }
            _ => pending.push(item),
        }
    }
    draw_vectors(&mut canvas, &pending, origin);

    log::debug!(
        "Rendered {} item(s) onto {}x{} canvas",
        items.len(),
        canvas.width(),
        canvas.height()
    );
    canvas
}

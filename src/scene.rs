//! Scene manager: the live collection of placed images and annotations
//!
//! The scene owns every item. Items handed out by [`Scene::remove`] are fully
//! detached; the command log parks them until they are restored or dropped.

use crate::domain::{ItemId, ItemKind, Point, Rect, SceneItem, Vector};

/// Factor applied to selected images by zoom in
pub const ZOOM_IN_FACTOR: f64 = 1.1;
/// Factor applied to selected images by zoom out (not the reciprocal of zoom in)
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

#[derive(Debug, Default)]
pub struct Scene {
    items: Vec<SceneItem>,
    next_id: u64,
    /// Highest z ever handed out; only grows
    z_counter: i64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created item on top of everything else
    pub fn add(&mut self, kind: ItemKind) -> ItemId {
        self.next_id += 1;
        let id = ItemId(self.next_id);
        let z = self.next_z();
        log::debug!("Scene add {} at z={}", id, z);
        self.items.push(SceneItem {
            id,
            z,
            selected: false,
            kind,
        });
        id
    }

    /// Re-insert a previously detached item, keeping its id and z
    pub fn restore(&mut self, item: SceneItem) {
        if self.contains(item.id) {
            log::warn!("Scene restore skipped: {} is already live", item.id);
            return;
        }
        self.z_counter = self.z_counter.max(item.z);
        self.next_id = self.next_id.max(item.id.0);
        self.items.push(item);
    }

    /// Detach an item. Absent ids are a no-op.
    pub fn remove(&mut self, id: ItemId) -> Option<SceneItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.swap_remove(index))
    }

    /// Remove every item unconditionally
    pub fn clear(&mut self) -> Vec<SceneItem> {
        std::mem::take(&mut self.items)
    }

    pub fn get(&self, id: ItemId) -> Option<&SceneItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut SceneItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in render order (ascending z)
    pub fn items(&self) -> impl Iterator<Item = &SceneItem> {
        let mut sorted: Vec<&SceneItem> = self.items.iter().collect();
        sorted.sort_by_key(|item| (item.z, item.id));
        sorted.into_iter()
    }

    pub fn image_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_image()).count()
    }

    pub fn annotation_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_annotation()).count()
    }

    pub fn max_z(&self) -> Option<i64> {
        self.items.iter().map(|item| item.z).max()
    }

    fn next_z(&mut self) -> i64 {
        self.z_counter = self.z_counter.max(self.max_z().unwrap_or(0)) + 1;
        self.z_counter
    }

    /// Raise an item above every other item. Returns false if the id is absent.
    pub fn promote_to_top(&mut self, id: ItemId) -> bool {
        let Some(current) = self.get(id).map(|item| item.z) else {
            return false;
        };
        let others_max = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .map(|item| item.z)
            .max();
        if others_max.is_none_or(|max| max < current) {
            return true;
        }
        let z = self.next_z();
        if let Some(item) = self.get_mut(id) {
            item.z = z;
        }
        true
    }

    /// Union of all item bounds, `None` for an empty scene
    pub fn bounding_box(&self) -> Option<Rect> {
        self.items
            .iter()
            .map(SceneItem::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Topmost item under `p`
    pub fn hit_test(&self, p: Point, tolerance: f64) -> Option<ItemId> {
        self.items
            .iter()
            .filter(|item| item.hit_test(p, tolerance))
            .max_by_key(|item| (item.z, item.id))
            .map(|item| item.id)
    }

    // Selection. The UI decides what is selected; the scene only stores it.

    /// Ids of selected items in render order
    pub fn selected(&self) -> Vec<ItemId> {
        self.items()
            .filter(|item| item.selected)
            .map(|item| item.id)
            .collect()
    }

    pub fn set_selected(&mut self, id: ItemId, selected: bool) {
        if let Some(item) = self.get_mut(id) {
            item.selected = selected;
        }
    }

    pub fn toggle_selected(&mut self, id: ItemId) {
        if let Some(item) = self.get_mut(id) {
            item.selected = !item.selected;
        }
    }

    pub fn select_only(&mut self, id: ItemId) {
        for item in &mut self.items {
            item.selected = item.id == id;
        }
    }

    pub fn clear_selection(&mut self) {
        for item in &mut self.items {
            item.selected = false;
        }
    }

    /// Ids of selected images only
    pub fn selected_images(&self) -> Vec<ItemId> {
        self.items()
            .filter(|item| item.selected && item.is_image())
            .map(|item| item.id)
            .collect()
    }

    pub fn translate_selected(&mut self, delta: Vector) {
        for item in self.items.iter_mut().filter(|item| item.selected) {
            item.translate(delta);
        }
    }

    // Image scaling. Non-image ids are ignored; none of this is undoable.

    /// Multiply the scale of every listed image by 1.1; returns images changed
    pub fn zoom_in(&mut self, ids: &[ItemId]) -> usize {
        self.scale_images(ids, |scale| scale * ZOOM_IN_FACTOR)
    }

    /// Multiply the scale of every listed image by 0.9; returns images changed
    pub fn zoom_out(&mut self, ids: &[ItemId]) -> usize {
        self.scale_images(ids, |scale| scale * ZOOM_OUT_FACTOR)
    }

    /// Set the scale of every listed image back to 1.0
    pub fn reset_scale(&mut self, ids: &[ItemId]) -> usize {
        self.scale_images(ids, |_| 1.0)
    }

    fn scale_images(&mut self, ids: &[ItemId], f: impl Fn(f64) -> f64) -> usize {
        let mut touched = 0;
        for item in self.items.iter_mut().filter(|item| ids.contains(&item.id)) {
            let Some(img) = item.as_image_mut() else {
                continue;
            };
            let scale = f(img.user_scale);
            if !img.accepts_user_scale(scale) {
                log::debug!("Zoom of {} to {} rejected", item.id, scale);
                continue;
            }
            img.user_scale = scale;
            touched += 1;
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::domain::{AnnotationKind, ImageItem};
    use image::RgbaImage;

    fn add_image(scene: &mut Scene, x: f64, y: f64, w: u32, h: u32) -> ItemId {
        scene.add(ItemKind::Image(ImageItem::new(
            RgbaImage::new(w, h),
            Point::new(x, y),
            None,
        )))
    }

    fn add_arrow(scene: &mut Scene, start: Point, end: Point) -> ItemId {
        scene.add(AnnotationKind::Arrow.build(start, end, ShapeColor::default()))
    }

    #[test]
    fn test_add_assigns_increasing_z() {
        let mut scene = Scene::new();
        let a = add_image(&mut scene, 0.0, 0.0, 10, 10);
        let b = add_arrow(&mut scene, Point::ORIGIN, Point::new(50.0, 0.0));
        assert!(scene.get(b).unwrap().z > scene.get(a).unwrap().z);
        let order: Vec<ItemId> = scene.items().map(|item| item.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut scene = Scene::new();
        let a = add_image(&mut scene, 0.0, 0.0, 10, 10);
        assert!(scene.remove(ItemId(999)).is_none());
        assert_eq!(scene.len(), 1);
        assert!(scene.remove(a).is_some());
        assert!(scene.remove(a).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_promote_to_top_across_kinds() {
        let mut scene = Scene::new();
        let img = add_image(&mut scene, 0.0, 0.0, 10, 10);
        let arrow = add_arrow(&mut scene, Point::ORIGIN, Point::new(50.0, 0.0));
        let img2 = add_image(&mut scene, 5.0, 5.0, 10, 10);

        assert!(scene.promote_to_top(img));
        let z = scene.get(img).unwrap().z;
        assert_eq!(Some(z), scene.max_z());
        assert!(z > scene.get(arrow).unwrap().z);
        assert!(z > scene.get(img2).unwrap().z);

        // already on top: stays strictly above the others
        assert!(scene.promote_to_top(img));
        assert_eq!(scene.get(img).unwrap().z, z);
        assert!(!scene.promote_to_top(ItemId(42)));
    }

    #[test]
    fn test_promote_breaks_ties() {
        let mut scene = Scene::new();
        let a = add_image(&mut scene, 0.0, 0.0, 10, 10);
        let item = scene.remove(a).unwrap();
        let b = add_image(&mut scene, 0.0, 0.0, 10, 10);
        // restored item shares no z with b, but force a tie to check promotion
        let mut tied = item;
        tied.z = scene.get(b).unwrap().z;
        scene.restore(tied);
        scene.promote_to_top(a);
        assert!(scene.get(a).unwrap().z > scene.get(b).unwrap().z);
    }

    #[test]
    fn test_bounding_box() {
        let mut scene = Scene::new();
        assert!(scene.bounding_box().is_none());
        add_image(&mut scene, 0.0, 0.0, 100, 100);
        add_arrow(&mut scene, Point::new(-20.0, 50.0), Point::new(150.0, 60.0));
        assert_eq!(
            scene.bounding_box(),
            Some(Rect::new(-20.0, 0.0, 150.0, 100.0))
        );
    }

    #[test]
    fn test_zoom_is_not_invertible() {
        let mut scene = Scene::new();
        let img = add_image(&mut scene, 0.0, 0.0, 10, 10);
        let arrow = add_arrow(&mut scene, Point::ORIGIN, Point::new(50.0, 0.0));

        assert_eq!(scene.zoom_in(&[img, arrow]), 1);
        assert_eq!(scene.zoom_out(&[img]), 1);
        let scale = scene.get(img).unwrap().as_image().unwrap().user_scale;
        assert_eq!(scale, 1.1 * 0.9);
        assert_ne!(scale, 1.0);

        scene.reset_scale(&[img]);
        let scale = scene.get(img).unwrap().as_image().unwrap().user_scale;
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn test_zoom_in_stops_at_size_limit() {
        let mut scene = Scene::new();
        let img = add_image(&mut scene, 0.0, 0.0, 1000, 10);
        let mut changed = 0;
        for _ in 0..100 {
            changed += scene.zoom_in(&[img]);
        }
        let item = scene.get(img).unwrap().as_image().unwrap();
        // 1000 * 1.1^29 < 16384 < 1000 * 1.1^30
        assert_eq!(changed, 29);
        assert!(item.scaled_size().0 <= crate::domain::MAX_IMAGE_SIDE);
        assert_eq!(scene.zoom_in(&[img]), 0);
        assert_eq!(scene.zoom_out(&[img]), 1);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut scene = Scene::new();
        let low = add_image(&mut scene, 0.0, 0.0, 100, 100);
        let high = add_image(&mut scene, 50.0, 50.0, 100, 100);
        assert_eq!(scene.hit_test(Point::new(75.0, 75.0), 4.0), Some(high));
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0), 4.0), Some(low));
        assert_eq!(scene.hit_test(Point::new(500.0, 500.0), 4.0), None);
    }

    #[test]
    fn test_selection_helpers() {
        let mut scene = Scene::new();
        let img = add_image(&mut scene, 0.0, 0.0, 10, 10);
        let arrow = add_arrow(&mut scene, Point::ORIGIN, Point::new(50.0, 0.0));
        scene.set_selected(img, true);
        scene.toggle_selected(arrow);
        assert_eq!(scene.selected(), vec![img, arrow]);
        assert_eq!(scene.selected_images(), vec![img]);

        scene.translate_selected(Point::new(10.0, 0.0));
        assert_eq!(scene.get(img).unwrap().position(), Point::new(10.0, 0.0));

        scene.select_only(arrow);
        assert_eq!(scene.selected(), vec![arrow]);
        scene.clear_selection();
        assert!(scene.selected().is_empty());
    }
}

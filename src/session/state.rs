//! Interaction state: drawing modes, in-progress gestures and the idle timer
//!
//! Time is passed in explicitly so the timer can be driven by any event loop.

use std::time::{Duration, Instant};

use crate::domain::{AnnotationKind, Point, Vector};

/// Exclusive interaction mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolMode {
    /// Select and drag existing items
    #[default]
    Idle,
    DrawingArrow,
    DrawingLine,
    DrawingRectangle,
}

impl ToolMode {
    pub fn drawing(kind: AnnotationKind) -> Self {
        match kind {
            AnnotationKind::Arrow => ToolMode::DrawingArrow,
            AnnotationKind::Line => ToolMode::DrawingLine,
            AnnotationKind::Rectangle => ToolMode::DrawingRectangle,
        }
    }

    /// Annotation kind drawn in this mode, `None` when idle
    pub fn kind(self) -> Option<AnnotationKind> {
        match self {
            ToolMode::Idle => None,
            ToolMode::DrawingArrow => Some(AnnotationKind::Arrow),
            ToolMode::DrawingLine => Some(AnnotationKind::Line),
            ToolMode::DrawingRectangle => Some(AnnotationKind::Rectangle),
        }
    }

    pub fn is_drawing(self) -> bool {
        self != ToolMode::Idle
    }
}

/// Cursor the view should show for the current mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorShape {
    /// Pan-drag hand (idle)
    OpenHand,
    Crosshair,
}

/// Transient dashed shape shown while a gesture is in progress.
/// Never part of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewShape {
    pub kind: AnnotationKind,
    pub start: Point,
    pub end: Point,
}

/// A drawing gesture that completed above the drag threshold
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedGesture {
    pub kind: AnnotationKind,
    pub start: Point,
    pub end: Point,
}

#[derive(Clone, Debug)]
pub struct InteractionState {
    mode: ToolMode,
    /// Preview of the gesture in progress (drawing modes only)
    preview: Option<PreviewShape>,
    /// Last pointer position of an idle-mode drag
    drag_last: Option<Point>,
    /// Single-shot inactivity deadline, armed while drawing
    deadline: Option<Instant>,
    idle_timeout: Duration,
    min_drag_distance: f64,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 10.0)
    }
}

impl InteractionState {
    pub fn new(idle_timeout: Duration, min_drag_distance: f64) -> Self {
        Self {
            mode: ToolMode::Idle,
            preview: None,
            drag_last: None,
            deadline: None,
            idle_timeout,
            min_drag_distance,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn cursor(&self) -> CursorShape {
        if self.mode.is_drawing() {
            CursorShape::Crosshair
        } else {
            CursorShape::OpenHand
        }
    }

    /// Canvas panning is only available outside drawing modes
    pub fn panning_enabled(&self) -> bool {
        !self.mode.is_drawing()
    }

    pub fn preview(&self) -> Option<PreviewShape> {
        self.preview
    }

    /// When the idle timer fires, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Toggle a drawing mode: leaves it if active, otherwise switches to it.
    /// Returns the mode now active.
    pub fn toggle_mode(&mut self, kind: AnnotationKind, now: Instant) -> ToolMode {
        if self.mode.kind() == Some(kind) {
            self.exit_mode();
        } else {
            self.enter_mode(kind, now);
        }
        self.mode
    }

    /// Enter a drawing mode, leaving any other one first
    pub fn enter_mode(&mut self, kind: AnnotationKind, now: Instant) {
        if self.mode.is_drawing() {
            self.exit_mode();
        }
        self.drag_last = None;
        self.mode = ToolMode::drawing(kind);
        self.deadline = Some(now + self.idle_timeout);
        log::debug!("Entered {} mode", kind.name());
    }

    /// Back to idle: cancel the timer and discard any preview
    pub fn exit_mode(&mut self) {
        if let Some(kind) = self.mode.kind() {
            log::debug!("Left {} mode", kind.name());
        }
        self.mode = ToolMode::Idle;
        self.deadline = None;
        self.preview = None;
    }

    /// Fire the idle timer if it is due and no gesture is in progress.
    /// Returns true if the mode was left.
    pub fn expire_if_due(&mut self, now: Instant) -> bool {
        let due = self.deadline.is_some_and(|deadline| now >= deadline);
        if due && self.preview.is_none() {
            log::debug!("Drawing mode timed out");
            self.exit_mode();
            return true;
        }
        false
    }

    /// Pointer pressed in a drawing mode. Returns false when not drawing.
    pub fn begin_gesture(&mut self, at: Point, now: Instant) -> bool {
        self.expire_if_due(now);
        let Some(kind) = self.mode.kind() else {
            return false;
        };
        self.preview = Some(PreviewShape {
            kind,
            start: at,
            end: at,
        });
        // an active user keeps the mode alive
        self.deadline = Some(now + self.idle_timeout);
        true
    }

    /// Pointer moved; updates the preview end point
    pub fn update_gesture(&mut self, at: Point) -> bool {
        match &mut self.preview {
            Some(preview) => {
                preview.end = at;
                true
            }
            None => false,
        }
    }

    /// Pointer released. The preview is always removed; the gesture is
    /// returned only if it was dragged farther than the threshold.
    pub fn finish_gesture(&mut self, at: Point) -> Option<CompletedGesture> {
        let preview = self.preview.take()?;
        let travel = (at - preview.start).manhattan_length();
        if travel <= self.min_drag_distance {
            log::debug!("Discarded {} gesture ({:.1} units)", preview.kind.name(), travel);
            return None;
        }
        Some(CompletedGesture {
            kind: preview.kind,
            start: preview.start,
            end: at,
        })
    }

    pub fn is_gesture_active(&self) -> bool {
        self.preview.is_some()
    }

    // Idle-mode direct manipulation

    pub fn begin_drag(&mut self, at: Point) {
        if !self.mode.is_drawing() {
            self.drag_last = Some(at);
        }
    }

    /// Offset since the last pointer position of the drag
    pub fn drag_to(&mut self, at: Point) -> Option<Vector> {
        let last = self.drag_last.replace(at)?;
        Some(at - last)
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag_last.take().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_last.is_some()
    }

    /// Drop transient state without leaving the current mode
    pub fn cancel_gesture(&mut self) {
        self.preview = None;
        self.drag_last = None;
    }
}

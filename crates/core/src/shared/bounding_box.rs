use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixel coordinates.
///
/// A box covers the pixels `x..x + width` horizontally, so its last column
/// is `x + width - 1` (inclusive bounds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from floating-point corners, clamping both corners to
    /// `[0, image_width - 1] × [0, image_height - 1]`.
    ///
    /// The origin is truncated and the extents are truncated deltas of the
    /// clamped corners, so the result never has a negative size and always
    /// lies inside the image.
    pub fn from_corners(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let max_x = (image_width as f32 - 1.0).max(0.0);
        let max_y = (image_height as f32 - 1.0).max(0.0);
        let x1 = x1.clamp(0.0, max_x);
        let y1 = y1.clamp(0.0, max_y);
        let x2 = x2.clamp(0.0, max_x);
        let y2 = y2.clamp(0.0, max_y);
        Self {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1).max(0.0) as i32,
            height: (y2 - y1).max(0.0) as i32,
        }
    }

    /// Like [`from_corners`](Self::from_corners), but each corner is
    /// truncated to a whole pixel first, so extents are integer differences
    /// of the corners.
    pub fn from_truncated_corners(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        Self::from_corners(
            x1.trunc(),
            y1.trunc(),
            x2.trunc(),
            y2.trunc(),
            image_width,
            image_height,
        )
    }

    /// Last covered column.
    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    /// Last covered row.
    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Intersection over union using inclusive pixel bounds.
    ///
    /// Returns 0.0 when the boxes do not intersect or when the union is
    /// empty (two coincident zero-area boxes).
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter_w = (self.right().min(other.right()) - self.x.max(other.x) + 1).max(0) as i64;
        let inter_h = (self.bottom().min(other.bottom()) - self.y.max(other.y) + 1).max(0) as i64;
        let inter = inter_w * inter_h;
        if inter <= 0 {
            return 0.0;
        }

        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }

    /// Whether the box lies inside `[0, image_width) × [0, image_height)`.
    pub fn is_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 0
            && self.height >= 0
            && (self.x + self.width) < image_width as i32
            && (self.y + self.height) < image_height as i32
    }
}

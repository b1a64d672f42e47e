//! Box arithmetic in image pixel space.
//!
//! OCR detectors report quadrilaterals; everything downstream treats them as
//! axis-aligned boxes spanned by their vertices.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Four vertices ordered top-left, top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Axis-aligned quad from its left/top corner and size.
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        let right = left + width;
        let bottom = top + height;
        Quad([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    /// Axis-aligned quad centred on a point.
    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self::from_rect(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.0.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    pub fn right(&self) -> f32 {
        self.0.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn top(&self) -> f32 {
        self.0.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    pub fn bottom(&self) -> f32 {
        self.0.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn width(&self) -> f32 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left() + self.right()) / 2.0,
            (self.top() + self.bottom()) / 2.0,
        )
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Bounding box covering both quads.
    pub fn union(&self, other: &Quad) -> Quad {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Quad::from_rect(left, top, right - left, bottom - top)
    }

    /// Height of the vertical overlap between two boxes (0 when disjoint).
    pub fn vertical_overlap(&self, other: &Quad) -> f32 {
        (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0)
    }

    /// Integer pixel rectangle, clamped to an image of the given size.
    pub fn to_pixel_rect(&self, img_w: u32, img_h: u32) -> PixelRect {
        PixelRect::from_bounds(self.left(), self.top(), self.right(), self.bottom(), img_w, img_h)
    }
}

/// An integer rectangle inside an image. Zero width or height means the
/// region could not be computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rounds float bounds to pixels and clamps them to the image.
    pub fn from_bounds(left: f32, top: f32, right: f32, bottom: f32, img_w: u32, img_h: u32) -> Self {
        let clamp = |v: f32, max: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                (v.round() as u32).min(max)
            }
        };
        let x0 = clamp(left, img_w);
        let y0 = clamp(top, img_h);
        let x1 = clamp(right, img_w).max(x0);
        let y1 = clamp(bottom, img_h).max(y0);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sub-rectangle with fractions of this rectangle removed from each side.
    pub fn shrink(&self, left: f32, top: f32, right: f32, bottom: f32) -> PixelRect {
        let w = self.width as f32;
        let h = self.height as f32;
        let x0 = self.x as f32 + w * left;
        let y0 = self.y as f32 + h * top;
        let x1 = self.x as f32 + w * (1.0 - right);
        let y1 = self.y as f32 + h * (1.0 - bottom);
        if x1 <= x0 || y1 <= y0 {
            return PixelRect::new(x0.max(0.0) as u32, y0.max(0.0) as u32, 0, 0);
        }
        PixelRect::new(
            x0.round() as u32,
            y0.round() as u32,
            (x1 - x0).round() as u32,
            (y1 - y0).round() as u32,
        )
    }
}

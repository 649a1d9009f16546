//! 2D primitives shared by the transform controller and the export compositor.
//!
//! # Coordinate System
//!
//! - Workspace coordinates, origin at the top-left, y grows downwards
//! - Angles are in degrees, positive = clockwise on screen
//! - Rotation of a vector by θ: `(x cosθ − y sinθ, x sinθ + y cosθ)`

use serde::{Deserialize, Serialize};

/// A point (or vector) in workspace coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[inline]
    pub fn offset(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Vector from `origin` to `self`.
    #[inline]
    pub fn delta_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// Divide both components by a zoom factor.
    ///
    /// A non-positive or non-finite zoom is treated as 1.0.
    #[inline]
    pub fn unzoom(self, zoom: f64) -> Point {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        Point::new(self.x / zoom, self.y / zoom)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn translate(&self, by: Point) -> Rect {
        Rect::new(self.left + by.x, self.top + by.y, self.width, self.height)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.left - margin,
            self.top - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Intersect with `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> Rect {
        Rect::from_edges(
            self.left.clamp(0.0, width),
            self.top.clamp(0.0, height),
            self.right().clamp(0.0, width),
            self.bottom().clamp(0.0, height),
        )
    }

    /// Union of every rectangle in the iterator, `None` when it is empty.
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects
            .into_iter()
            .fold(None, |acc: Option<Rect>, r| match acc {
                Some(a) => Some(a.union(r)),
                None => Some(*r),
            })
    }
}

/// Rotate a vector by `angle_degrees` (clockwise on screen).
#[inline]
pub fn rotate_vector(v: Point, angle_degrees: f64) -> Point {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Express a workspace vector in the rotated axes of a layer.
///
/// This is the inverse of [`rotate_vector`]:
/// `(dx cosθ + dy sinθ, −dx sinθ + dy cosθ)`.
#[inline]
pub fn project_onto_axes(v: Point, angle_degrees: f64) -> Point {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    Point::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_angle(angle_degrees: f64) -> f64 {
    if !angle_degrees.is_finite() {
        return 0.0;
    }
    let a = angle_degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Angle in degrees of `pointer` as seen from `center` (`atan2(dy, dx)`).
#[inline]
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    let d = pointer.delta_from(center);
    d.y.atan2(d.x).to_degrees()
}

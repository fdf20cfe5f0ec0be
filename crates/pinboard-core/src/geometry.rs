#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are board-local pixels with the origin at the top-left
//! corner of the board's content area. Values are `f64` because rendered
//! heights and zoomed pointer positions are fractional.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The board origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);
}

/// A relative displacement between two pointer samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub dx: f64,
    pub dy: f64,
}

impl Delta {
    /// Create a new delta.
    #[inline]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Whether the delta moves nothing on either axis.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

impl Sub for Point {
    type Output = Delta;

    fn sub(self, rhs: Point) -> Delta {
        Delta::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Delta> for Point {
    type Output = Point;

    fn add(self, rhs: Delta) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

/// Width and height of an item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// An axis-aligned rectangle used for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle from a top-left corner and a size.
    #[inline]
    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.w, size.h)
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Horizontal center.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    /// Check if a point is inside the rectangle. All four edges are inclusive.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.right()
            && point.y <= self.bottom()
    }

    /// Whether two rectangles share any interior area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The geometry of one widget instance as seen by the layout solvers.
///
/// Widget content (note text, todo items, timers) never reaches this type;
/// only placement does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Stable for the lifetime of the widget instance.
    pub id: String,
    /// Top-left corner.
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub locked: bool,
}

impl LayoutItem {
    /// Create an unlocked item.
    pub fn new(id: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id: id.into(),
            position,
            size,
            locked: false,
        }
    }

    /// Builder-style lock flag.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Bounding box of the item.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }
}

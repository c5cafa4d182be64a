use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Terrain vertex. Surface coordinates, y measured up from the bottom edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Edge awaiting subdivision or drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub left: Point,
    pub right: Point,
}

impl Segment {
    pub const fn new(left: Point, right: Point) -> Self {
        Self { left, right }
    }

    pub fn midpoint(&self) -> Point {
        self.left.midpoint(self.right)
    }

    pub fn length(&self) -> f64 {
        (self.right.x - self.left.x).hypot(self.right.y - self.left.y)
    }
}

/// Ordered skyline. x-coordinates strictly increase left to right.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Profile {
    points: Vec<Point>,
}

impl Profile {
    /// Wrap a point list, checking the strictly increasing x invariant.
    pub fn from_points(points: Vec<Point>) -> Result<Self, GenerateError> {
        if points.len() < 2 {
            return Err(GenerateError::InvalidInput(format!(
                "a profile needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(i) = points.windows(2).position(|w| !(w[0].x < w[1].x)) {
            return Err(GenerateError::InvalidInput(format!(
                "x does not strictly increase between points {} and {}",
                i,
                i + 1
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// (min_y, max_y) over all points.
    pub fn y_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            })
    }

    /// Skyline height at `x`, linearly interpolated. None outside [first.x, last.x].
    pub fn height_at(&self, x: f64) -> Option<f64> {
        if x < self.first().x || x > self.last().x {
            return None;
        }
        // Index of the first point strictly right of x.
        let i = self.points.partition_point(|p| p.x <= x);
        if i == self.points.len() {
            return Some(self.last().y);
        }
        let (a, b) = (self.points[i - 1], self.points[i]);
        let t = (x - a.x) / (b.x - a.x);
        Some(a.y + (b.y - a.y) * t)
    }
}

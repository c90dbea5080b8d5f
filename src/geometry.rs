// SPDX-License-Identifier: GPL-3.0-only

//! Quadrilateral geometry
//!
//! Detection engines report quadrilaterals in normalized coordinates
//! (0.0 to 1.0 on both axes, origin at the top-left of the oriented image).
//! The detector picks the largest one and maps it into pixel space with an
//! [`AffineTransform`].

use serde::{Deserialize, Serialize};

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map this point through an affine transform
    pub fn applying(self, transform: AffineTransform) -> Self {
        Self {
            x: transform.a * self.x + transform.c * self.y + transform.tx,
            y: transform.b * self.x + transform.d * self.y + transform.ty,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 2D affine transform in row-vector convention
///
/// ```text
/// x' = a * x + c * y + tx
/// y' = b * x + d * y + ty
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Append a scale to this transform
    pub fn scaled_by(self, sx: f64, sy: f64) -> Self {
        Self {
            a: self.a * sx,
            b: self.b * sx,
            c: self.c * sy,
            d: self.d * sy,
            ..self
        }
    }
}

/// Four-corner polygon approximating a detected document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quadrilateral {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Axis-aligned rectangle from its top-left corner and size
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        )
    }

    /// Corners in drawing order (clockwise on screen)
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Polygon area (shoelace formula)
    ///
    /// Always non-negative regardless of winding. Returns NaN if any corner
    /// is not finite.
    pub fn area(&self) -> f64 {
        let corners = self.corners();
        if !corners.iter().all(Point::is_finite) {
            return f64::NAN;
        }

        let twice_signed: f64 = (0..4)
            .map(|i| {
                let p = corners[i];
                let q = corners[(i + 1) % 4];
                p.x * q.y - q.x * p.y
            })
            .sum();

        twice_signed.abs() / 2.0
    }

    /// Map every corner through an affine transform
    pub fn applying(&self, transform: AffineTransform) -> Self {
        Self {
            top_left: self.top_left.applying(transform),
            top_right: self.top_right.applying(transform),
            bottom_right: self.bottom_right.applying(transform),
            bottom_left: self.bottom_left.applying(transform),
        }
    }

    /// Scale normalized coordinates into a `width` x `height` pixel space
    pub fn scaled_to(&self, width: f64, height: f64) -> Self {
        self.applying(AffineTransform::identity().scaled_by(width, height))
    }
}

/// Selection of the largest quadrilateral in a collection
pub trait Biggest {
    /// The quadrilateral with the greatest area
    ///
    /// Ties keep the first maximum encountered. A candidate with a NaN area
    /// never wins over a finite one. Returns `None` for an empty collection.
    fn biggest(self) -> Option<Quadrilateral>;
}

impl<I> Biggest for I
where
    I: IntoIterator<Item = Quadrilateral>,
{
    fn biggest(self) -> Option<Quadrilateral> {
        let mut best: Option<(Quadrilateral, f64)> = None;

        for quad in self {
            let area = quad.area();
            match best {
                None => best = Some((quad, area)),
                // Strictly greater, so the first of equal maxima stays
                Some((_, best_area))
                    if area > best_area || (best_area.is_nan() && !area.is_nan()) =>
                {
                    best = Some((quad, area));
                }
                Some(_) => {}
            }
        }

        best.map(|(quad, _)| quad)
    }
}

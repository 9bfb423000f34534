//! Narrow-phase overlap tests
//!
//! `test(a, b)` returns the signed penetration needed to push `a` out of `b`:
//! positive components mean `a` must move in the positive direction. Results
//! are antisymmetric in the arguments, `test(a, b) == test(b, a).flipped()`,
//! which keeps resolution order independent of which body comes first.

use glam::Vec2;

use super::body::{Body, Shape};
use super::geom::Rect;

/// Below this centre distance circles are treated as coincident
const COINCIDENT_EPSILON: f32 = 1e-6;

/// How the resolver should consume an overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Box-like contact: `x` and `y` are independent per-axis depths,
    /// resolved in two passes
    Axis,
    /// Circle contact: `(x, y)` is a single penetration vector along the
    /// contact normal
    Normal,
}

/// Result of an overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Whether the shapes penetrate
    pub overlapping: bool,
    /// Signed penetration on x (positive: `a` moves right)
    pub x: f32,
    /// Signed penetration on y (positive: `a` moves down)
    pub y: f32,
    pub kind: ContactKind,
}

impl Overlap {
    pub fn none() -> Self {
        Self {
            overlapping: false,
            x: 0.0,
            y: 0.0,
            kind: ContactKind::Axis,
        }
    }

    /// Same contact seen from the other body
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            ..self
        }
    }

    #[inline]
    pub fn vector(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Penetration depth: vector length for normal contacts, the shallower
    /// axis for axis contacts
    pub fn depth(&self) -> f32 {
        match self.kind {
            ContactKind::Normal => self.vector().length(),
            ContactKind::Axis => self.x.abs().min(self.y.abs()),
        }
    }

    /// Unit direction `a` is pushed in (zero when not overlapping)
    pub fn normal(&self) -> Vec2 {
        match self.kind {
            ContactKind::Normal => self.vector().normalize_or_zero(),
            ContactKind::Axis => {
                if self.x.abs() <= self.y.abs() {
                    Vec2::new(self.x.signum(), 0.0)
                } else {
                    Vec2::new(0.0, self.y.signum())
                }
            }
        }
    }
}

/// Overlap between two bodies
pub fn test(a: &Body, b: &Body) -> Overlap {
    let tie = tie_break(a, b);
    match (a.shape(), b.shape()) {
        (Shape::Box, Shape::Box) => aabb_vs_aabb(&a.bounds(), &b.bounds(), tie),
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_vs_circle(a.center(), ra, b.center(), rb, tie)
        }
        (Shape::Circle { radius }, Shape::Box) => {
            circle_vs_aabb(a.center(), radius, &b.bounds(), tie)
        }
        (Shape::Box, Shape::Circle { radius }) => {
            circle_vs_aabb(b.center(), radius, &a.bounds(), -tie).flipped()
        }
    }
}

/// Cheap boolean form of `test`
#[inline]
pub fn intersects(a: &Body, b: &Body) -> bool {
    test(a, b).overlapping
}

/// Direction `a` takes when the geometry gives no preference: the body
/// registered first goes negative
#[inline]
fn tie_break(a: &Body, b: &Body) -> f32 {
    if a.registration() <= b.registration() {
        -1.0
    } else {
        1.0
    }
}

#[inline]
fn direction(delta: f32, tie: f32) -> f32 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        tie
    }
}

/// Box vs box: per-axis interval overlap, signed by centre order
pub fn aabb_vs_aabb(a: &Rect, b: &Rect, tie: f32) -> Overlap {
    let ox = a.right().min(b.right()) - a.left().max(b.left());
    let oy = a.bottom().min(b.bottom()) - a.top().max(b.top());

    if !(ox > 0.0 && oy > 0.0) {
        return Overlap::none();
    }

    let ca = a.center();
    let cb = b.center();
    Overlap {
        overlapping: true,
        x: ox * direction(ca.x - cb.x, tie),
        y: oy * direction(ca.y - cb.y, tie),
        kind: ContactKind::Axis,
    }
}

/// Circle vs circle: penetration along the centre-to-centre line
pub fn circle_vs_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32, tie: f32) -> Overlap {
    let d = ca - cb;
    let dist = d.length();
    let reach = ra + rb;

    if dist >= reach {
        return Overlap::none();
    }

    // Coincident centres: fixed X axis instead of dividing by zero
    let n = if dist > COINCIDENT_EPSILON {
        d / dist
    } else {
        Vec2::new(tie, 0.0)
    };
    let depth = reach - dist;

    Overlap {
        overlapping: true,
        x: n.x * depth,
        y: n.y * depth,
        kind: ContactKind::Normal,
    }
}

/// Circle vs box via the closest point on the box
///
/// A centre inside the box has no meaningful closest-point normal, so the
/// circle's own AABB is separated from the box instead.
pub fn circle_vs_aabb(center: Vec2, radius: f32, rect: &Rect, tie: f32) -> Overlap {
    let closest = rect.clamp_point(center);
    let d = center - closest;
    let dist_sq = d.length_squared();

    if dist_sq == 0.0 {
        let circle_box = Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        return aabb_vs_aabb(&circle_box, rect, tie);
    }

    if dist_sq >= radius * radius {
        return Overlap::none();
    }

    let dist = dist_sq.sqrt();
    let n = d / dist;
    let depth = radius - dist;

    Overlap {
        overlapping: true,
        x: n.x * depth,
        y: n.y * depth,
        kind: ContactKind::Normal,
    }
}

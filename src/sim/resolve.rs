//! Collision response: separation, velocity exchange and contact flags
//!
//! Box contacts are separated one axis at a time (two passes, re-testing in
//! between). An axis only counts as the collision axis when the penetration
//! on it can be explained by this step's motion plus `overlap_bias`; this
//! keeps a body landing on a wide floor from being shoved sideways. Circle
//! contacts are pushed apart along their normal in a single pass.

use glam::Vec2;

use super::body::Body;
use super::geom::{Axis, Rect, Sides};
use super::overlap::{self, ContactKind, Overlap};
use crate::config::{SeparationOrder, WorldConfig};
use crate::consts::REST_SPEED;

/// Tunables consumed by the resolver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveParams {
    pub overlap_bias: f32,
    pub separation_slop: f32,
    /// Axis order for box contacts
    pub order: [Axis; 2],
}

impl ResolveParams {
    /// Derive from the world config and current gravity
    pub fn from_config(config: &WorldConfig) -> Self {
        let order = match config.separation_order {
            SeparationOrder::XThenY => [Axis::X, Axis::Y],
            SeparationOrder::YThenX => [Axis::Y, Axis::X],
            SeparationOrder::GravityDominant => {
                if config.gravity.y.abs() >= config.gravity.x.abs() {
                    [Axis::Y, Axis::X]
                } else {
                    [Axis::X, Axis::Y]
                }
            }
        };
        Self {
            overlap_bias: config.overlap_bias,
            separation_slop: config.separation_slop,
            order,
        }
    }
}

impl Default for ResolveParams {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

/// Outcome of resolving one pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution {
    /// Shapes penetrated when tested
    pub overlapping: bool,
    /// At least one axis (or the normal) was treated as a collision
    pub collided: bool,
    /// Signed overlap resolved for `a` (x, y)
    pub overlap: Vec2,
    /// A correction was skipped because it fell within the slop
    pub bias_applied: bool,
}

/// Test and, unless `overlap_only`, separate `a` from `b`
pub fn separate(a: &mut Body, b: &mut Body, params: &ResolveParams, overlap_only: bool) -> Resolution {
    let contact = overlap::test(a, b);
    if !contact.overlapping {
        return Resolution::default();
    }

    let relative = a.velocity - b.velocity;
    let at_rest = relative.x.abs() < REST_SPEED && relative.y.abs() < REST_SPEED;

    let mut resolution = if overlap_only {
        mark_overlap(a, b, &contact);
        Resolution {
            overlap: contact.vector(),
            ..Resolution::default()
        }
    } else {
        match contact.kind {
            ContactKind::Axis => separate_axes(a, b, contact, params),
            ContactKind::Normal => separate_normal(a, b, contact, params),
        }
    };
    resolution.overlapping = true;

    // Left overlapping with nothing pulling them apart
    if at_rest && !resolution.collided {
        a.resting_now = true;
        b.resting_now = true;
    }
    resolution
}

/// Two-pass axis separation.
///
/// A pass that resolves its axis leaves the pair apart on that axis up to
/// the slop, so the second pass only runs when the first one did not apply.
/// A pair already held within the slop on one axis (a resting contact) is
/// only resolved on that axis.
fn separate_axes(a: &mut Body, b: &mut Body, first: Overlap, params: &ResolveParams) -> Resolution {
    let mut resolution = Resolution::default();
    let mut contact = first;

    let passes = match resting_axis(&contact, params.separation_slop) {
        Some(axis) => [Some(axis), None],
        None => params.order.map(Some),
    };

    for (pass, axis) in passes.into_iter().flatten().enumerate() {
        if pass > 0 {
            contact = overlap::test(a, b);
            if !contact.overlapping {
                break;
            }
        }
        let signed = axis.of(contact.vector());
        if let Some(outcome) = resolve_axis(a, b, axis, signed, params) {
            resolution.collided = true;
            resolution.bias_applied |= outcome.skipped_by_slop;
            *axis.component_mut(&mut resolution.overlap) = signed;
            break;
        }
    }
    resolution
}

/// The shallower axis when its penetration is within the slop
fn resting_axis(contact: &Overlap, slop: f32) -> Option<Axis> {
    let depth = contact.vector().abs();
    let (axis, shallow) = if depth.x <= depth.y {
        (Axis::X, depth.x)
    } else {
        (Axis::Y, depth.y)
    };
    (shallow <= slop).then_some(axis)
}

struct AxisOutcome {
    skipped_by_slop: bool,
}

/// Resolve `a` against `b` on one axis; `None` when the axis is not a
/// collision axis for this pair
fn resolve_axis(
    a: &mut Body,
    b: &mut Body,
    axis: Axis,
    signed: f32,
    params: &ResolveParams,
) -> Option<AxisOutcome> {
    let depth = signed.abs();
    if depth <= 0.0 {
        return None;
    }
    // `a` is pushed toward `dir`, so `b` sits on a's `-dir` side
    let dir = signed.signum();

    let max_overlap = axis.of(a.delta).abs() + axis.of(b.delta).abs() + params.overlap_bias;
    if depth > max_overlap {
        return None;
    }
    if !a.check_collision.get(axis, -dir) || !b.check_collision.get(axis, dir) {
        return None;
    }

    set_contact_flags(a, b, axis, dir);
    *axis.component_mut(&mut a.overlap) = signed;
    *axis.component_mut(&mut b.overlap) = -signed;

    if a.immovable && b.immovable {
        return Some(AxisOutcome {
            skipped_by_slop: false,
        });
    }

    let correction = depth - params.separation_slop;
    let skipped_by_slop = correction <= 0.0;
    if !skipped_by_slop {
        let (share_a, share_b) = shares(a, b);
        let push = axis.unit() * dir * correction;
        a.position += push * share_a;
        b.position -= push * share_b;
    }

    respond_axis(a, b, axis, dir);

    if b.immovable {
        carry(a, b, axis);
    } else if a.immovable {
        carry(b, a, axis);
    }

    Some(AxisOutcome { skipped_by_slop })
}

/// Touching on both, blocked on the movable one when the other is immovable
fn set_contact_flags(a: &mut Body, b: &mut Body, axis: Axis, dir: f32) {
    a.touching.set(axis, -dir);
    b.touching.set(axis, dir);
    if b.immovable && !a.immovable {
        a.blocked.set(axis, -dir);
    }
    if a.immovable && !b.immovable {
        b.blocked.set(axis, dir);
    }
}

/// Fraction of the correction each body takes (inverse mass split)
fn shares(a: &Body, b: &Body) -> (f32, f32) {
    match (a.immovable, b.immovable) {
        (true, true) => (0.0, 0.0),
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        (false, false) => {
            let total = a.mass + b.mass;
            (b.mass / total, a.mass / total)
        }
    }
}

/// Approach velocity exchange along `axis`; `a` is pushed toward `dir`
fn respond_axis(a: &mut Body, b: &mut Body, axis: Axis, dir: f32) {
    let va = axis.of(a.velocity);
    let vb = axis.of(b.velocity);
    if (va - vb) * dir >= 0.0 {
        // Already separating
        return;
    }

    let (na, nb) = exchange(
        Impact::of(a, va, axis.of(a.bounce)),
        Impact::of(b, vb, axis.of(b.bounce)),
    );
    *axis.component_mut(&mut a.velocity) = na;
    *axis.component_mut(&mut b.velocity) = nb;
}

/// One body's side of a 1D velocity exchange
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub velocity: f32,
    pub bounce: f32,
    pub mass: f32,
    pub immovable: bool,
}

impl Impact {
    /// A fixed, non-bouncing boundary at rest
    pub const WALL: Impact = Impact {
        velocity: 0.0,
        bounce: 0.0,
        mass: 1.0,
        immovable: true,
    };

    /// `body` moving at `velocity` along the contact axis
    pub fn of(body: &Body, velocity: f32, bounce: f32) -> Self {
        Self {
            velocity,
            bounce,
            mass: body.mass,
            immovable: body.immovable,
        }
    }
}

/// 1D restitution in the pair's momentum frame.
///
/// Against an immovable partner the frame is the partner itself, so
/// `bounce = 0` stops the approach and `bounce = 1` mirrors it. Two movable
/// bodies with `bounce = 0` do not stop: both leave at the momentum-frame
/// velocity (a perfectly inelastic hit). That is zero only for symmetric
/// pairs.
pub fn exchange(a: Impact, b: Impact) -> (f32, f32) {
    let (va, vb) = (a.velocity, b.velocity);
    match (a.immovable, b.immovable) {
        (true, true) => (va, vb),
        (false, true) => (vb - (va - vb) * a.bounce, vb),
        (true, false) => (va, va - (vb - va) * b.bounce),
        (false, false) => {
            let v_cm = (a.mass * va + b.mass * vb) / (a.mass + b.mass);
            (
                v_cm - (va - v_cm) * a.bounce,
                v_cm - (vb - v_cm) * b.bounce,
            )
        }
    }
}

/// Move `rider` along the other axis by the immovable `platform`'s own
/// displacement, scaled by the platform's friction
fn carry(rider: &mut Body, platform: &Body, resolved: Axis) {
    let along = resolved.other();
    let moved = along.of(platform.delta) * along.of(platform.friction);
    if moved != 0.0 {
        *along.component_mut(&mut rider.position) += moved;
    }
}

/// Single-pass separation along a circle contact normal
fn separate_normal(a: &mut Body, b: &mut Body, contact: Overlap, params: &ResolveParams) -> Resolution {
    let n = contact.normal();
    let depth = contact.depth();
    if depth <= 0.0 || n == Vec2::ZERO {
        return Resolution::default();
    }

    // Flags follow the dominant axis of the normal
    let (axis, dir) = dominant(n);
    if !a.check_collision.get(axis, -dir) || !b.check_collision.get(axis, dir) {
        return Resolution::default();
    }
    set_contact_flags(a, b, axis, dir);
    a.overlap = contact.vector();
    b.overlap = -contact.vector();

    let mut resolution = Resolution {
        overlapping: true,
        collided: true,
        overlap: contact.vector(),
        bias_applied: false,
    };
    if a.immovable && b.immovable {
        return resolution;
    }

    let correction = depth - params.separation_slop;
    if correction > 0.0 {
        let (share_a, share_b) = shares(a, b);
        a.position += n * correction * share_a;
        b.position -= n * correction * share_b;
    } else {
        resolution.bias_applied = true;
    }

    let va = a.velocity.dot(n);
    let vb = b.velocity.dot(n);
    if va - vb < 0.0 {
        let (na, nb) = exchange(
            Impact::of(a, va, projected_bounce(a.bounce, n)),
            Impact::of(b, vb, projected_bounce(b.bounce, n)),
        );
        a.velocity += (na - va) * n;
        b.velocity += (nb - vb) * n;
    }

    resolution
}

/// Per-axis bounce weighted by the normal's direction
#[inline]
fn projected_bounce(bounce: Vec2, n: Vec2) -> f32 {
    bounce.x * n.x * n.x + bounce.y * n.y * n.y
}

#[inline]
fn dominant(n: Vec2) -> (Axis, f32) {
    if n.x.abs() >= n.y.abs() {
        (Axis::X, n.x.signum())
    } else {
        (Axis::Y, n.y.signum())
    }
}

/// Overlap-only pairs still report which sides touch
fn mark_overlap(a: &mut Body, b: &mut Body, contact: &Overlap) {
    let n = contact.normal();
    if n == Vec2::ZERO {
        return;
    }
    let (axis, dir) = dominant(n);
    a.touching.set(axis, -dir);
    b.touching.set(axis, dir);
    a.overlap = contact.vector();
    b.overlap = -contact.vector();
}

/// Keep `body` inside `bounds`, treating each enabled side as an immovable
/// wall. Returns the sides that were hit.
pub fn collide_world_bounds(body: &mut Body, bounds: &Rect, check: Sides) -> Sides {
    let mut hit = Sides::NONE;
    let bounce = body.world_bounce.unwrap_or(body.bounce);

    // x: left wall pushes +x, right wall pushes -x
    if body.left() < bounds.left() && check.left {
        hit_wall(body, Axis::X, 1.0, bounds.left() - body.left(), bounce.x);
        hit.left = true;
    } else if body.right() > bounds.right() && check.right {
        hit_wall(body, Axis::X, -1.0, body.right() - bounds.right(), bounce.x);
        hit.right = true;
    }

    if body.top() < bounds.top() && check.up {
        hit_wall(body, Axis::Y, 1.0, bounds.top() - body.top(), bounce.y);
        hit.up = true;
    } else if body.bottom() > bounds.bottom() && check.down {
        hit_wall(body, Axis::Y, -1.0, body.bottom() - bounds.bottom(), bounce.y);
        hit.down = true;
    }

    if hit.left {
        body.blocked.left = true;
    }
    if hit.right {
        body.blocked.right = true;
    }
    if hit.up {
        body.blocked.up = true;
    }
    if hit.down {
        body.blocked.down = true;
    }
    hit
}

/// Exact correction (no bias) plus the immovable-partner velocity response
fn hit_wall(body: &mut Body, axis: Axis, dir: f32, depth: f32, bounce: f32) {
    *axis.component_mut(&mut body.position) += dir * depth;
    let v = axis.of(body.velocity);
    if v * dir < 0.0 {
        let (nv, _) = exchange(Impact::of(body, v, bounce), Impact::WALL);
        *axis.component_mut(&mut body.velocity) = nv;
    }
}

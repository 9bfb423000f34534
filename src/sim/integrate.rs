//! Per-body motion integration
//!
//! Semi-implicit Euler: velocity is updated first (acceleration, gravity,
//! drag, clamps) and the new velocity moves the position.

use glam::Vec2;

use super::body::Body;
use super::geom::Facing;
use crate::consts::{DAMPING_EPSILON, DRAG_EPSILON};
use crate::{fuzzy_equal, fuzzy_greater_than, fuzzy_less_than};

/// Advance `body` by `dt` seconds under `world_gravity`
pub fn integrate(body: &mut Body, world_gravity: Vec2, dt: f32) {
    body.prev = body.position;

    if body.immovable {
        // Externally driven; report what the owner moved it by since last step
        body.delta = body.position - body.settled;
        body.facing = Facing::from_delta(body.delta, body.facing);
        return;
    }

    if dt <= 0.0 || !dt.is_finite() {
        body.delta = Vec2::ZERO;
        return;
    }
    if !body.is_finite() {
        // Left as is for the world to quarantine
        return;
    }

    compute_velocity(body, world_gravity, dt);

    body.position += body.velocity * dt;
    body.delta = body.position - body.prev;
    body.facing = Facing::from_delta(body.delta, body.facing);
}

/// Velocity update: gravity + acceleration, drag, per-axis and speed clamps
pub fn compute_velocity(body: &mut Body, world_gravity: Vec2, dt: f32) {
    let mut velocity = body.velocity;

    if body.allow_gravity {
        velocity += (world_gravity + body.gravity) * body.gravity_scale * dt;
    }

    let drag_active = body.allow_drag;
    velocity.x = axis_velocity(
        velocity.x,
        body.acceleration.x,
        if drag_active { body.drag.x } else { 0.0 },
        body.use_damping,
        dt,
    );
    velocity.y = axis_velocity(
        velocity.y,
        body.acceleration.y,
        if drag_active { body.drag.y } else { 0.0 },
        body.use_damping,
        dt,
    );

    if body.use_damping && fuzzy_equal(velocity.length(), 0.0, DAMPING_EPSILON) {
        velocity = Vec2::ZERO;
    }

    // Clamping would turn NaN into a finite limit and hide the fault
    if velocity.is_finite() {
        velocity = clamp_velocity(velocity, body.max_velocity, body.max_speed);
    }

    body.velocity = velocity;
    body.speed = velocity.length();
}

/// One axis: acceleration wins over drag
fn axis_velocity(velocity: f32, acceleration: f32, drag: f32, use_damping: bool, dt: f32) -> f32 {
    if acceleration != 0.0 {
        return velocity + acceleration * dt;
    }
    if drag == 0.0 {
        return velocity;
    }

    if use_damping {
        // drag is the fraction of velocity kept per second
        return velocity * drag.clamp(0.0, 1.0).powf(dt);
    }

    let step = drag * dt;
    if fuzzy_greater_than(velocity - step, 0.0, DRAG_EPSILON) {
        velocity - step
    } else if fuzzy_less_than(velocity + step, 0.0, DRAG_EPSILON) {
        velocity + step
    } else {
        0.0
    }
}

/// Per-axis clamp to `[-max, max]`, then optional length clamp
pub fn clamp_velocity(velocity: Vec2, max_velocity: Vec2, max_speed: Option<f32>) -> Vec2 {
    let max = max_velocity.abs();
    let mut v = velocity.clamp(-max, max);

    if let Some(limit) = max_speed {
        let len = v.length();
        if len > limit && len > 0.0 {
            v *= limit / len;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::{Drag, Velocity};

    fn body() -> Body {
        Body::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn test_semi_implicit_euler() {
        let mut b = body();
        integrate(&mut b, Vec2::new(0.0, 100.0), 0.1);
        // v = 10 first, then x += v * dt
        assert!((b.velocity.y - 10.0).abs() < 1e-5);
        assert!((b.position.y - 1.0).abs() < 1e-5);
        assert_eq!(b.prev, Vec2::ZERO);
        assert!((b.delta.y - 1.0).abs() < 1e-5);
        assert_eq!(b.facing, Facing::Down);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut b = body();
        b.set_velocity(50.0, 0.0);
        integrate(&mut b, Vec2::new(0.0, 100.0), 0.0);
        assert_eq!(b.position, Vec2::ZERO);
        assert_eq!(b.velocity, Vec2::new(50.0, 0.0));

        integrate(&mut b, Vec2::new(0.0, 100.0), -1.0);
        assert_eq!(b.position, Vec2::ZERO);
    }

    #[test]
    fn test_immovable_skips_motion() {
        let mut b = body();
        b.immovable = true;
        b.set_velocity(50.0, 50.0);
        integrate(&mut b, Vec2::new(0.0, 100.0), 0.1);
        assert_eq!(b.position, Vec2::ZERO);
        assert_eq!(b.velocity, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_immovable_reports_external_delta() {
        let mut b = body();
        b.immovable = true;
        b.position.x += 3.0;
        integrate(&mut b, Vec2::ZERO, 0.1);
        assert_eq!(b.delta, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_gravity_scale_and_allow() {
        let mut b = body();
        b.gravity = Vec2::new(0.0, 50.0);
        b.gravity_scale = 0.5;
        compute_velocity(&mut b, Vec2::new(0.0, 100.0), 1.0);
        assert!((b.velocity.y - 75.0).abs() < 1e-4);

        let mut b = body();
        b.allow_gravity = false;
        compute_velocity(&mut b, Vec2::new(0.0, 100.0), 1.0);
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_linear_drag_does_not_overshoot() {
        let mut b = body();
        b.set_velocity(10.0, -10.0).set_drag(100.0, 100.0);
        compute_velocity(&mut b, Vec2::ZERO, 0.5);
        assert_eq!(b.velocity, Vec2::ZERO);

        let mut b = body();
        b.set_velocity(100.0, 0.0).set_drag(50.0, 0.0);
        compute_velocity(&mut b, Vec2::ZERO, 0.1);
        assert!((b.velocity.x - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_drag_ignored_while_accelerating() {
        let mut b = body();
        b.set_velocity(100.0, 0.0).set_drag(50.0, 0.0);
        b.acceleration = Vec2::new(10.0, 0.0);
        compute_velocity(&mut b, Vec2::ZERO, 1.0);
        assert!((b.velocity.x - 110.0).abs() < 1e-4);
    }

    #[test]
    fn test_damping_drag() {
        let mut b = body();
        b.set_velocity(100.0, 0.0).set_drag(0.5, 0.5).set_damping(true);
        compute_velocity(&mut b, Vec2::ZERO, 1.0);
        assert!((b.velocity.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_nan_is_not_clamped_away() {
        let mut b = body();
        b.acceleration = Vec2::new(f32::NAN, 0.0);
        integrate(&mut b, Vec2::ZERO, 0.1);
        assert!(!b.is_finite());

        let mut b = body();
        b.velocity.y = f32::NAN;
        integrate(&mut b, Vec2::ZERO, 0.1);
        assert_eq!(b.position, Vec2::ZERO);
    }

    #[test]
    fn test_velocity_clamp() {
        let mut b = body();
        b.set_max_velocity(100.0, 50.0).set_velocity(500.0, -500.0);
        compute_velocity(&mut b, Vec2::ZERO, 0.016);
        assert_eq!(b.velocity, Vec2::new(100.0, -50.0));
    }

    #[test]
    fn test_max_speed_clamps_length() {
        let v = clamp_velocity(Vec2::new(300.0, 400.0), Vec2::splat(1000.0), Some(50.0));
        assert!((v.length() - 50.0).abs() < 1e-3);
        assert!((v.x / v.y - 0.75).abs() < 1e-4);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::sim::components::Velocity;
    use proptest::prelude::*;

    proptest! {
        /// |v| per axis never exceeds max_velocity after integration
        #[test]
        fn velocity_stays_clamped(
            vx in -5000.0f32..5000.0,
            vy in -5000.0f32..5000.0,
            ax in -5000.0f32..5000.0,
            gy in -2000.0f32..2000.0,
            mx in 0.1f32..800.0,
            my in 0.1f32..800.0,
            dt in (1.0f32 / 240.0)..(1.0f32 / 15.0),
        ) {
            let mut b = Body::new(0.0, 0.0, 8.0, 8.0).unwrap();
            b.set_velocity(vx, vy).set_max_velocity(mx, my);
            b.acceleration = Vec2::new(ax, 0.0);
            integrate(&mut b, Vec2::new(0.0, gy), dt);
            prop_assert!(b.velocity.x.abs() <= mx);
            prop_assert!(b.velocity.y.abs() <= my);
            prop_assert!(b.position.is_finite());
        }
    }
}

//! End-to-end stepping scenarios

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use arcade_physics::prelude::*;
use arcade_physics::SeparationOrder;
use arcade_physics::sim::{Collider, CollideMode};

const DT: f32 = 1.0 / 60.0;

fn world_with_gravity(gy: f32) -> World {
    World::new(WorldConfig::with_gravity(0.0, gy)).unwrap()
}

#[test]
fn box_stops_at_immovable_wall() {
    let mut world = world_with_gravity(0.0);
    let a = world.create_body(0.0, 0.0, 32.0, 32.0).unwrap();
    let b = world.create_static_body(40.0, 0.0, 32.0, 32.0).unwrap();
    world.body_mut(a).unwrap().set_velocity(100.0, 0.0);

    for _ in 0..20 {
        world.step(0.1);
        let body = world.body(a).unwrap();
        assert!(body.position.x <= 8.0 + world.config().overlap_bias);
        assert!(body.right() <= 40.0 + world.config().separation_slop + 1e-4);
    }

    let body = world.body(a).unwrap();
    assert_eq!(body.velocity.x, 0.0);
    assert!(body.touching().right);
    assert_eq!(world.body(b).unwrap().position, Vec2::new(40.0, 0.0));
}

#[test]
fn coincident_circles_separate_along_x() {
    let mut world = world_with_gravity(0.0);
    let a = world.create_circle(100.0, 100.0, 16.0).unwrap();
    let b = world.create_circle(100.0, 100.0, 16.0).unwrap();

    let report = world.step(DT);
    assert!(report.is_clean());
    assert_eq!(report.collisions, 1);

    let ca = world.body(a).unwrap().center();
    let cb = world.body(b).unwrap().center();
    assert!(ca.is_finite() && cb.is_finite());
    // Later registration goes +X
    assert!(cb.x > ca.x);
    assert_eq!(ca.y, 100.0);
    assert_eq!(cb.y, 100.0);
    assert!(cb.x - ca.x >= 32.0 - world.config().separation_slop - 1e-4);
}

#[test]
fn body_falls_to_rest_on_bounds_floor() {
    let mut world = world_with_gravity(500.0);
    let h = world.create_body(100.0, 0.0, 32.0, 32.0).unwrap();
    world.body_mut(h).unwrap().collide_world_bounds = true;

    for _ in 0..300 {
        world.step(DT);
    }

    let body = world.body(h).unwrap();
    assert!((body.bottom() - 600.0).abs() < 1e-3);
    assert_eq!(body.velocity.y, 0.0);
    assert!(body.on_floor());
}

#[test]
fn movable_boxes_do_not_pass_through() {
    let mut world = world_with_gravity(0.0);
    let a = world.create_body(100.0, 100.0, 32.0, 32.0).unwrap();
    let b = world.create_body(300.0, 100.0, 32.0, 32.0).unwrap();
    world.body_mut(a).unwrap().set_velocity(200.0, 0.0);
    world.body_mut(b).unwrap().set_velocity(-200.0, 0.0);

    for _ in 0..120 {
        world.step(DT);
        let (ba, bb) = (world.body(a).unwrap(), world.body(b).unwrap());
        assert!(ba.center().x < bb.center().x);
        assert!(ba.right() - bb.left() <= world.config().separation_slop + 1e-3);
    }

    let (ba, bb) = (world.body(a).unwrap(), world.body(b).unwrap());
    assert_eq!(ba.velocity.x, 0.0);
    assert_eq!(bb.velocity.x, 0.0);
    // Equal masses meet in the middle
    assert!(((ba.right() + bb.left()) * 0.5 - 216.0).abs() < 1e-2);
}

#[test]
fn immovable_body_never_moves() {
    let mut world = world_with_gravity(300.0);
    let anchor = world.create_static_body(368.0, 268.0, 64.0, 64.0).unwrap();
    let mut rng = Pcg32::seed_from_u64(7);
    for _ in 0..40 {
        let h = world
            .create_body(rng.random_range(200.0..560.0), rng.random_range(100.0..500.0), 12.0, 12.0)
            .unwrap();
        let body = world.body_mut(h).unwrap();
        body.collide_world_bounds = true;
        body.set_velocity(rng.random_range(-300.0..300.0), rng.random_range(-300.0..300.0))
            .set_bounce(0.8, 0.8);
    }

    for _ in 0..240 {
        world.step(DT);
        let body = world.body(anchor).unwrap();
        assert_eq!(body.position, Vec2::new(368.0, 268.0));
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}

#[test]
fn full_bounce_returns_near_drop_height() {
    let mut world = world_with_gravity(500.0);
    let ball = world.create_body(392.0, 100.0, 16.0, 16.0).unwrap();
    world.create_static_body(0.0, 500.0, 800.0, 20.0).unwrap();
    world.body_mut(ball).unwrap().set_bounce(0.0, 1.0);

    let drop = 500.0 - 16.0 - 100.0;
    let tolerance = drop * 0.05;
    let mut apexes = Vec::new();
    let mut prev_vy = 0.0;
    for _ in 0..(60 * 8) {
        world.step(DT);
        let body = world.body(ball).unwrap();
        if prev_vy < 0.0 && body.velocity.y >= 0.0 {
            apexes.push(body.position.y);
        }
        prev_vy = body.velocity.y;
    }

    assert!(apexes.len() >= 2, "ball should bounce repeatedly: {apexes:?}");
    assert!((apexes[0] - 100.0).abs() < tolerance, "first apex {}", apexes[0]);
    for pair in apexes.windows(2) {
        assert!((pair[1] - pair[0]).abs() < tolerance, "apexes drifted: {apexes:?}");
    }
}

#[test]
fn callback_error_does_not_abort_step() {
    let mut world = world_with_gravity(0.0);
    let a = world.create_body(0.0, 0.0, 32.0, 32.0).unwrap();
    let wall = world.create_static_body(40.0, 0.0, 32.0, 32.0).unwrap();
    let c = world.create_body(0.0, 200.0, 32.0, 32.0).unwrap();
    let wall2 = world.create_static_body(40.0, 200.0, 32.0, 32.0).unwrap();
    world.body_mut(a).unwrap().set_velocity(100.0, 0.0);
    world.body_mut(c).unwrap().set_velocity(100.0, 0.0);

    world.on_collide(a, wall, |_, _, _| Err("scripted failure".into()));
    let fired = Rc::new(Cell::new(false));
    let flag = fired.clone();
    world.on_collide(c, wall2, move |_, _, _| {
        flag.set(true);
        Ok(())
    });

    let report = world.step(0.1);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], PhysicsError::Callback { .. }));
    assert_eq!(report.collisions, 2);
    assert!(fired.get());
    assert!(world.body(a).unwrap().right() <= 40.0 + 0.02);
    assert!(world.body(c).unwrap().right() <= 40.0 + 0.02);
}

#[test]
fn callback_can_destroy_bodies_mid_step() {
    let mut world = world_with_gravity(0.0);
    let player = world.create_body(100.0, 100.0, 32.0, 32.0).unwrap();
    let coins: Vec<BodyHandle> = (0..3)
        .map(|i| world.create_body(105.0 + i as f32 * 6.0, 105.0, 8.0, 8.0).unwrap())
        .collect();

    let collected = Rc::new(RefCell::new(Vec::new()));
    let sink = collected.clone();
    world.on_overlap(player, coins.clone(), move |bodies, _, coin| {
        bodies.remove(coin);
        sink.borrow_mut().push(coin);
        Ok(())
    });

    let report = world.step(DT);
    assert!(report.is_clean());
    assert_eq!(*collected.borrow(), coins);
    for coin in &coins {
        assert!(world.body(*coin).is_none());
    }
    // Sensor overlaps never move the player
    assert_eq!(world.body(player).unwrap().position, Vec2::new(100.0, 100.0));
    assert_eq!(world.body_count(), 1);
}

#[test]
fn process_filter_makes_one_way_platform() {
    let mut world = world_with_gravity(0.0);
    let platform = world.create_static_body(0.0, 100.0, 200.0, 16.0).unwrap();
    let player = world.create_body(50.0, 140.0, 16.0, 16.0).unwrap();
    world.body_mut(player).unwrap().set_velocity(0.0, -600.0);

    // Only collide while falling
    world.add_collider(
        Collider::new(CollideMode::Collide, player, platform)
            .with_process(|bodies, p, _| bodies.get(p).is_some_and(|b| b.velocity.y > 0.0)),
    );

    for _ in 0..10 {
        world.step(DT);
    }
    assert!(world.body(player).unwrap().bottom() < 100.0);

    world.set_gravity(0.0, 900.0);
    for _ in 0..120 {
        world.step(DT);
    }
    let body = world.body(player).unwrap();
    assert!((body.bottom() - 100.0).abs() < 0.05);
    assert!(body.on_floor());
}

#[test]
fn disabled_side_lets_bodies_through() {
    let mut world = world_with_gravity(0.0);
    let platform = world.create_static_body(0.0, 100.0, 200.0, 16.0).unwrap();
    world.body_mut(platform).unwrap().check_collision = Sides::new(false, false, true, false);
    let player = world.create_body(50.0, 140.0, 16.0, 16.0).unwrap();
    world.body_mut(player).unwrap().set_velocity(0.0, -600.0);

    for _ in 0..10 {
        world.step(DT);
    }
    assert!(world.body(player).unwrap().bottom() < 100.0);
}

#[test]
fn moving_platform_carries_rider() {
    let mut world = world_with_gravity(500.0);
    let platform = world.create_static_body(100.0, 300.0, 200.0, 16.0).unwrap();
    let rider = world.create_body(180.0, 260.0, 16.0, 16.0).unwrap();

    // Let the rider land
    for _ in 0..60 {
        world.step(DT);
    }
    assert!(world.body(rider).unwrap().on_floor());
    let start = world.body(rider).unwrap().position.x;

    for _ in 0..10 {
        world.body_mut(platform).unwrap().position.x += 2.0;
        world.step(DT);
    }
    let moved = world.body(rider).unwrap().position.x - start;
    assert!((moved - 20.0).abs() < 0.5, "rider moved {moved}");
}

#[test]
fn category_mask_filters_pairs() {
    let mut world = world_with_gravity(0.0);
    let ghost = world.create_body(0.0, 0.0, 32.0, 32.0).unwrap();
    let wall = world.create_static_body(40.0, 0.0, 32.0, 32.0).unwrap();
    {
        let body = world.body_mut(ghost).unwrap();
        body.category = 0b10;
        body.mask = 0b10;
        body.set_velocity(100.0, 0.0);
    }

    for _ in 0..10 {
        world.step(0.1);
    }
    assert!(world.body(ghost).unwrap().position.x > 72.0);
    assert!(!world.overlaps(ghost, wall).unwrap());
}

#[test]
fn events_for_opted_in_bodies() {
    let mut world = world_with_gravity(500.0);
    let faller = world.create_body(100.0, 560.0, 32.0, 32.0).unwrap();
    {
        let body = world.body_mut(faller).unwrap();
        body.collide_world_bounds = true;
        body.on_world_bounds = true;
        body.set_velocity(0.0, 600.0);
    }
    let a = world.create_body(300.0, 0.0, 32.0, 32.0).unwrap();
    let b = world.create_static_body(336.0, 0.0, 32.0, 32.0).unwrap();
    {
        let body = world.body_mut(a).unwrap();
        body.on_collide = true;
        body.set_velocity(600.0, 0.0).set_allow_gravity(false);
    }

    world.step(DT);
    let events: Vec<PhysicsEvent> = world.drain_events().collect();
    assert!(events.iter().any(|e| matches!(
        e,
        PhysicsEvent::WorldBounds { body, sides } if *body == faller && sides.down
    )));
    assert!(events.contains(&PhysicsEvent::Collide { a, b }));
    assert_eq!(world.drain_events().count(), 0);
}

#[test]
fn bounds_switches_and_custom_bounds() {
    let mut world = world_with_gravity(500.0);
    let floor_rider = world.create_body(100.0, 500.0, 16.0, 16.0).unwrap();
    let caged = world.create_body(300.0, 0.0, 16.0, 16.0).unwrap();
    world.body_mut(floor_rider).unwrap().collide_world_bounds = true;
    {
        let body = world.body_mut(caged).unwrap();
        body.collide_world_bounds = true;
        body.custom_bounds = Some(Rect::new(250.0, 0.0, 100.0, 200.0));
    }

    for _ in 0..120 {
        world.step(DT);
    }
    assert!((world.body(caged).unwrap().bottom() - 200.0).abs() < 1e-3);
    assert!((world.body(floor_rider).unwrap().bottom() - 600.0).abs() < 1e-3);

    // Open the floor
    world.set_bounds_collision(true, true, true, false);
    for _ in 0..120 {
        world.step(DT);
    }
    assert!(world.body(floor_rider).unwrap().top() > 600.0);
}

/// A 16x16 box settled on a row of 32 px tiles, then pushed right
fn slide_over_tiles(order: SeparationOrder) -> Body {
    let mut config = WorldConfig::with_gravity(0.0, 500.0);
    config.separation_order = order;
    let mut world = World::new(config).unwrap();
    for i in 0..20 {
        world
            .create_static_body(i as f32 * 32.0, 200.0, 32.0, 32.0)
            .unwrap();
    }
    let h = world.create_body(8.0, 184.0, 16.0, 16.0).unwrap();

    for _ in 0..10 {
        world.step(DT);
    }
    assert!(world.body(h).unwrap().on_floor());

    world.body_mut(h).unwrap().set_velocity(150.0, 0.0);
    for _ in 0..60 {
        world.step(DT);
    }
    world.body(h).unwrap().clone()
}

#[test]
fn box_slides_across_tile_seams() {
    for order in [SeparationOrder::GravityDominant, SeparationOrder::YThenX] {
        let body = slide_over_tiles(order);
        assert!(body.position.x > 150.0, "{order:?} stopped at x={}", body.position.x);
        assert!(body.velocity.x >= 149.0, "{order:?} vx={}", body.velocity.x);
        assert!(!body.blocked().right);
        assert!(body.bottom() <= 200.0 + 0.15);
    }
}

#[test]
fn deep_resting_overlap_becomes_embedded() {
    let mut world = world_with_gravity(0.0);
    let a = world.create_body(0.0, 0.0, 32.0, 32.0).unwrap();
    let b = world.create_body(8.0, 8.0, 32.0, 32.0).unwrap();

    world.step(DT);
    assert!(!world.body(a).unwrap().embedded());
    world.step(DT);
    assert!(world.body(a).unwrap().embedded());
    assert!(world.body(b).unwrap().embedded());
}

#[test]
fn identical_worlds_step_identically() {
    fn build(seed: u64) -> World {
        let mut world = World::new(WorldConfig::with_gravity(0.0, 400.0)).unwrap();
        world.create_static_body(0.0, 560.0, 800.0, 40.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(seed);
        for _ in 0..60 {
            let x = rng.random_range(20.0..760.0);
            let y = rng.random_range(20.0..300.0);
            let h = if rng.random_bool(0.5) {
                world.create_circle(x, y, rng.random_range(5.0..15.0)).unwrap()
            } else {
                world.create_body(x, y, 20.0, 20.0).unwrap()
            };
            let body = world.body_mut(h).unwrap();
            body.collide_world_bounds = true;
            body.set_velocity(rng.random_range(-200.0..200.0), 0.0)
                .set_bounce(0.5, 0.5);
        }
        world
    }

    let mut first = build(42);
    let mut second = build(42);
    for _ in 0..180 {
        first.update(DT);
        second.update(DT);
    }

    let snapshot = |w: &World| -> Vec<(u32, u32, u32, u32)> {
        w.bodies()
            .iter()
            .map(|(_, b)| {
                (
                    b.position.x.to_bits(),
                    b.position.y.to_bits(),
                    b.velocity.x.to_bits(),
                    b.velocity.y.to_bits(),
                )
            })
            .collect()
    };
    assert_eq!(snapshot(&first), snapshot(&second));
}

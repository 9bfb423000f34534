//! Headless runner
//!
//! Drops a seeded scatter of boxes and circles into a walled world and steps
//! it, logging collision statistics.
//!
//! Usage: `arcade-physics [config.json] [seed]`

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use arcade_physics::platform::init_logging;
use arcade_physics::prelude::*;

const BODY_COUNT: usize = 120;
const FRAMES: u32 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_SEED: u64 = 0x5eed;

fn main() {
    init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match WorldConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => WorldConfig::with_gravity(0.0, 500.0),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    if let Err(e) = run(config, seed) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: WorldConfig, seed: u64) -> Result<(), PhysicsError> {
    let mut world = World::new(config)?;
    let bounds = world.bounds();
    log::info!(
        "Arcade physics runner: {} bodies, seed {seed}, bounds {}x{}",
        BODY_COUNT,
        bounds.width,
        bounds.height
    );

    // A ledge across the middle
    let ledge = world.create_static_body(
        bounds.x + bounds.width * 0.25,
        bounds.y + bounds.height * 0.6,
        bounds.width * 0.5,
        16.0,
    )?;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(BODY_COUNT);
    for _ in 0..BODY_COUNT {
        let x = rng.random_range(bounds.left() + 20.0..bounds.right() - 20.0);
        let y = rng.random_range(bounds.top() + 20.0..bounds.top() + bounds.height * 0.5);
        let handle = if rng.random_bool(0.4) {
            world.create_circle(x, y, rng.random_range(4.0..12.0))?
        } else {
            world.create_body(x, y, rng.random_range(6.0..24.0), rng.random_range(6.0..24.0))?
        };

        if let Some(body) = world.body_mut(handle) {
            body.collide_world_bounds = true;
            body.on_world_bounds = true;
            body.set_velocity(rng.random_range(-150.0..150.0), rng.random_range(-50.0..50.0))
                .set_bounce(rng.random_range(0.0..0.6), rng.random_range(0.0..0.6))
                .set_mass(rng.random_range(0.5..3.0))
                .set_drag(20.0, 0.0);
        }
        bodies.push(handle);
    }

    let landed = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let counter = landed.clone();
    world.on_collide(bodies.clone(), ledge, move |_, _, _| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    let mut totals = StepReport::default();
    let mut bounds_hits = 0usize;
    for frame in 1..=FRAMES {
        let report = world.update(FRAME_DT);
        for err in &report.errors {
            log::warn!("{err}");
        }
        bounds_hits += world
            .drain_events()
            .filter(|e| matches!(e, PhysicsEvent::WorldBounds { .. }))
            .count();

        totals.steps += report.steps;
        totals.pairs_tested += report.pairs_tested;
        totals.collisions += report.collisions;
        totals.errors.extend(report.errors);

        if frame % 60 == 0 {
            let resting = world
                .bodies()
                .iter()
                .filter(|(_, b)| b.on_floor())
                .count();
            log::info!(
                "t={:>4.1}s  pairs={:>5}  collisions={:>4}  resting={:>3}/{}",
                frame as f32 * FRAME_DT,
                report.pairs_tested,
                report.collisions,
                resting,
                BODY_COUNT
            );
        }
    }

    log::info!(
        "Done: {} steps, {} pairs tested, {} collisions, {} ledge hits, {} bounds hits, {} errors",
        totals.steps,
        totals.pairs_tested,
        totals.collisions,
        landed.get(),
        bounds_hits,
        totals.errors.len()
    );
    Ok(())
}

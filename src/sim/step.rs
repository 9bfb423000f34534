//! World stepping
//!
//! One step runs these phases in order, each over bodies in registration
//! order:
//! 1. Integrate enabled bodies and keep them inside their bounds
//! 2. Rebuild the grid from the new positions
//! 3. Broad phase: candidate pairs `(i, j)` with `i < j`, ascending
//! 4. Narrow phase + resolve, then callbacks and events for each pair
//! 5. Numeric check and contact bookkeeping
//!
//! Callbacks see and may change the live body set. A body a callback
//! destroys or disables is skipped by every later pair of the same step;
//! earlier pairs are not revisited.

use super::body::BodyHandle;
use super::collider::CollideMode;
use super::grid::SpatialGrid;
use super::integrate::integrate;
use super::resolve::{self, ResolveParams};
use super::world::{BodySet, Contact, PhysicsEvent, StepReport, World};
use crate::error::PhysicsError;

impl World {
    /// Advance the simulation by `dt` seconds.
    ///
    /// Events left over from the previous `step`/`update` call are dropped.
    pub fn step(&mut self, dt: f32) -> StepReport {
        if self.paused {
            log::trace!("World paused, skipping step");
            return StepReport::default();
        }
        self.events.clear();
        self.step_once(dt)
    }

    fn step_once(&mut self, dt: f32) -> StepReport {
        let mut report = StepReport {
            steps: 1,
            ..StepReport::default()
        };

        let params = ResolveParams::from_config(&self.config);
        let handles: Vec<BodyHandle> = self.bodies.handles().to_vec();

        self.integrate_all(&handles, dt, &mut report);

        rebuild_grid(&mut self.grid, &self.bodies, &handles);
        let pairs = broad_phase(&self.grid, &self.bodies, &handles);

        for (i, j) in pairs {
            self.process_pair(handles[i], handles[j], &params, &mut report);
        }

        self.finish(&handles, &mut report);

        log::trace!(
            "Step dt={dt:.4}: {} bodies, {} pairs, {} collisions, {} overlaps",
            handles.len(),
            report.pairs_tested,
            report.collisions,
            report.overlaps
        );
        report
    }

    /// Advance by a frame's worth of real time.
    ///
    /// With `fixed_step` the scaled frame time is consumed in `1/fps` steps,
    /// at most `max_substeps` per call; leftover time carries over. Without
    /// it, one step of the scaled frame time is taken. Events from every
    /// substep stay queued until the next call.
    pub fn update(&mut self, frame_dt: f32) -> StepReport {
        if self.paused || !frame_dt.is_finite() || frame_dt <= 0.0 {
            return StepReport::default();
        }
        let scaled = frame_dt * self.config.time_scale;
        if !self.config.fixed_step {
            return self.step(scaled);
        }

        let fixed = self.config.fixed_delta();
        self.accumulator += scaled;
        self.events.clear();

        let mut report = StepReport::default();
        let mut taken = 0;
        while self.accumulator >= fixed && taken < self.config.max_substeps {
            report.merge(self.step_once(fixed));
            self.accumulator -= fixed;
            taken += 1;
        }

        if self.accumulator >= fixed {
            log::debug!(
                "Dropping {:.4}s of simulation time after {} substeps",
                self.accumulator,
                taken
            );
            self.accumulator %= fixed;
        }
        report
    }

    fn integrate_all(&mut self, handles: &[BodyHandle], dt: f32, report: &mut StepReport) {
        let gravity = self.config.gravity;
        for &handle in handles {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if !body.enabled {
                continue;
            }
            body.reset_flags(false);
            integrate(body, gravity, dt);

            if body.collide_world_bounds && !body.immovable && body.is_finite() {
                let bounds = body.custom_bounds.unwrap_or(self.config.bounds);
                let hit = resolve::collide_world_bounds(body, &bounds, self.config.bounds_collision);
                if hit.any() && body.on_world_bounds {
                    self.events.push(PhysicsEvent::WorldBounds {
                        body: handle,
                        sides: hit,
                    });
                }
            }

            if !body.is_finite() {
                body.quarantine();
                log::warn!("Body {:?} went non-finite during integration, disabled", handle);
                report.errors.push(PhysicsError::NumericInstability {
                    body: handle,
                    stage: "integrate",
                });
            }
        }
    }

    fn process_pair(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        params: &ResolveParams,
        report: &mut StepReport,
    ) {
        // Fresh lookups: earlier callbacks may have removed or disabled either
        let (Some(body_a), Some(body_b)) = (self.bodies.get(a), self.bodies.get(b)) else {
            return;
        };
        if !body_a.enabled || !body_b.enabled || !body_a.can_collide(body_b) {
            return;
        }
        if !body_a.bounds().intersects(&body_b.bounds()) {
            return;
        }

        let Some(plan) = self
            .colliders
            .plan(&self.bodies, a, b, self.config.collide_all)
        else {
            return;
        };

        let Some((body_a, body_b)) = self.bodies.pair_mut(a, b) else {
            return;
        };
        report.pairs_tested += 1;

        let resolution = resolve::separate(body_a, body_b, params, plan.overlap_only);
        if !resolution.overlapping {
            return;
        }

        let mode = if plan.overlap_only {
            CollideMode::Overlap
        } else {
            CollideMode::Collide
        };
        report.contacts.push(Contact {
            a,
            b,
            mode,
            overlap: resolution.overlap,
            bias_applied: resolution.bias_applied,
        });

        if resolution.collided {
            report.collisions += 1;
            if body_a.on_collide || body_b.on_collide {
                self.events.push(PhysicsEvent::Collide { a, b });
            }
        } else if plan.overlap_only {
            report.overlaps += 1;
            if body_a.on_overlap || body_b.on_overlap {
                self.events.push(PhysicsEvent::Overlap { a, b });
            }
        }

        self.colliders
            .dispatch(&plan, &mut self.bodies, a, b, &resolution, &mut report.errors);
    }

    fn finish(&mut self, handles: &[BodyHandle], report: &mut StepReport) {
        let embedded_steps = self.config.embedded_steps;
        for &handle in handles {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.enabled && !body.is_finite() {
                body.quarantine();
                log::warn!("Body {:?} went non-finite during resolution, disabled", handle);
                report.errors.push(PhysicsError::NumericInstability {
                    body: handle,
                    stage: "resolve",
                });
            }
            if body.enabled {
                body.settle(embedded_steps);
            }
        }
    }
}

/// Bucket every enabled body under its index in `handles`
fn rebuild_grid(grid: &mut SpatialGrid, bodies: &BodySet, handles: &[BodyHandle]) {
    grid.rebuild(handles.iter().enumerate().filter_map(|(index, handle)| {
        bodies
            .get(*handle)
            .filter(|body| body.enabled)
            .map(|body| (index, body.bounds()))
    }));
}

/// Candidate pairs `(i, j)`, `i < j`, sorted ascending
fn broad_phase(grid: &SpatialGrid, bodies: &BodySet, handles: &[BodyHandle]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut candidates = Vec::new();

    for (i, handle) in handles.iter().enumerate() {
        let Some(body) = bodies.get(*handle).filter(|body| body.enabled) else {
            continue;
        };
        grid.query_into(&body.bounds(), &mut candidates);
        pairs.extend(candidates.iter().filter(|&&j| j > i).map(|&j| (i, j)));
    }
    pairs
}

//! Collider registrations
//!
//! A collider pairs two targets (a body or a group of bodies) and decides what
//! happens when they meet: full separation (`Collide`) or detection only
//! (`Overlap`). An optional process filter can veto a pair before anything is
//! resolved; the callback runs after resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::body::BodyHandle;
use super::resolve::Resolution;
use super::world::BodySet;
use crate::error::{CallbackError, PhysicsError};

/// Return type of collision callbacks
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Runs after a pair was resolved (or found overlapping)
pub type CollideCallback = Box<dyn FnMut(&mut BodySet, BodyHandle, BodyHandle) -> CallbackResult>;

/// Runs before resolution; `false` skips the pair for this collider
pub type ProcessFilter = Box<dyn FnMut(&BodySet, BodyHandle, BodyHandle) -> bool>;

/// Identifies a registered collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u64);

/// What a collider does with a matching pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollideMode {
    /// Separate and exchange velocity
    Collide,
    /// Detect only
    Overlap,
}

/// One side of a collider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColliderTarget {
    Body(BodyHandle),
    Group(Vec<BodyHandle>),
}

impl ColliderTarget {
    pub fn contains(&self, handle: BodyHandle) -> bool {
        match self {
            ColliderTarget::Body(h) => *h == handle,
            ColliderTarget::Group(group) => group.contains(&handle),
        }
    }
}

impl From<BodyHandle> for ColliderTarget {
    fn from(handle: BodyHandle) -> Self {
        ColliderTarget::Body(handle)
    }
}

impl From<Vec<BodyHandle>> for ColliderTarget {
    fn from(group: Vec<BodyHandle>) -> Self {
        ColliderTarget::Group(group)
    }
}

impl From<&[BodyHandle]> for ColliderTarget {
    fn from(group: &[BodyHandle]) -> Self {
        ColliderTarget::Group(group.to_vec())
    }
}

/// A registered collide/overlap relationship
pub struct Collider {
    pub mode: CollideMode,
    pub a: ColliderTarget,
    pub b: ColliderTarget,
    /// Inactive colliders are ignored but stay registered
    pub active: bool,
    callback: Option<CollideCallback>,
    process: Option<ProcessFilter>,
}

impl Collider {
    pub fn new(mode: CollideMode, a: impl Into<ColliderTarget>, b: impl Into<ColliderTarget>) -> Self {
        Self {
            mode,
            a: a.into(),
            b: b.into(),
            active: true,
            callback: None,
            process: None,
        }
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut BodySet, BodyHandle, BodyHandle) -> CallbackResult + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn with_process<F>(mut self, process: F) -> Self
    where
        F: FnMut(&BodySet, BodyHandle, BodyHandle) -> bool + 'static,
    {
        self.process = Some(Box::new(process));
        self
    }

    /// `Some(swapped)` if the pair `(x, y)` matches this collider; `swapped`
    /// means `x` belongs to target `b`
    pub fn matches(&self, x: BodyHandle, y: BodyHandle) -> Option<bool> {
        if !self.active {
            return None;
        }
        if self.a.contains(x) && self.b.contains(y) {
            Some(false)
        } else if self.a.contains(y) && self.b.contains(x) {
            Some(true)
        } else {
            None
        }
    }
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("mode", &self.mode)
            .field("a", &self.a)
            .field("b", &self.b)
            .field("active", &self.active)
            .field("callback", &self.callback.is_some())
            .field("process", &self.process.is_some())
            .finish()
    }
}

/// How a pair will be handled this step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairPlan {
    /// Detect only, do not separate
    pub overlap_only: bool,
    /// Accepted colliders: (slot, swapped)
    accepted: Vec<(usize, bool)>,
}

/// Colliders in registration order
#[derive(Debug, Default)]
pub struct Colliders {
    entries: Vec<(ColliderId, Collider)>,
    next_id: u64,
}

impl Colliders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, collider: Collider) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        log::debug!("Registered {:?} collider {:?}", collider.mode, id);
        self.entries.push((id, collider));
        id
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        let index = self.entries.iter().position(|(i, _)| *i == id)?;
        log::debug!("Removed collider {:?}", id);
        Some(self.entries.remove(index).1)
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        self.entries
            .iter_mut()
            .find(|(i, _)| *i == id)
            .map(|(_, c)| c)
    }

    /// Decide how to treat `(a, b)`.
    ///
    /// Pairs claimed by at least one collider are handled by those colliders
    /// only; a pair whose colliders all veto it is skipped. Unclaimed pairs
    /// are separated when `collide_all` is set.
    pub fn plan(
        &mut self,
        bodies: &BodySet,
        a: BodyHandle,
        b: BodyHandle,
        collide_all: bool,
    ) -> Option<PairPlan> {
        let mut claimed = false;
        let mut accepted = Vec::new();

        for (slot, (_, collider)) in self.entries.iter_mut().enumerate() {
            let Some(swapped) = collider.matches(a, b) else {
                continue;
            };
            claimed = true;
            let (x, y) = if swapped { (b, a) } else { (a, b) };
            if let Some(process) = collider.process.as_mut() {
                if !process(bodies, x, y) {
                    continue;
                }
            }
            accepted.push((slot, swapped));
        }

        if !claimed {
            return collide_all.then(PairPlan::default);
        }
        if accepted.is_empty() {
            return None;
        }

        let overlap_only = accepted
            .iter()
            .all(|(slot, _)| self.entries[*slot].1.mode == CollideMode::Overlap);
        Some(PairPlan {
            overlap_only,
            accepted,
        })
    }

    /// Run the callbacks of the colliders that accepted the pair. Collide
    /// colliders fire on a collision, overlap colliders on any overlap.
    pub fn dispatch(
        &mut self,
        plan: &PairPlan,
        bodies: &mut BodySet,
        a: BodyHandle,
        b: BodyHandle,
        resolution: &Resolution,
        errors: &mut Vec<PhysicsError>,
    ) {
        for &(slot, swapped) in &plan.accepted {
            let Some((_, collider)) = self.entries.get_mut(slot) else {
                continue;
            };
            let fires = match collider.mode {
                CollideMode::Collide => resolution.collided,
                CollideMode::Overlap => resolution.overlapping,
            };
            if !fires {
                continue;
            }
            let Some(callback) = collider.callback.as_mut() else {
                continue;
            };
            let (x, y) = if swapped { (b, a) } else { (a, b) };
            if let Err(source) = callback(bodies, x, y) {
                log::warn!("Collision callback failed for {:?} vs {:?}: {}", x, y, source);
                errors.push(PhysicsError::Callback { a: x, b: y, source });
            }
        }
    }
}

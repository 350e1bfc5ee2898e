//! Mock ground sensors for testing.
//!
//! Provides sensors that answer every ray the same way, replay a script of
//! answers, or count how often they were queried.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use nalgebra::Vector3;
use strider_core::sensor::{GroundContact, GroundRay, GroundSensor};

/// Contact at `point` on a level surface.
pub fn contact_at(point: Vector3<f32>) -> GroundContact {
    GroundContact {
        point,
        normal: Vector3::y(),
        distance: 0.0,
    }
}

// ---------------------------------------------------------------------------
// FixedSensor
// ---------------------------------------------------------------------------

/// A sensor that gives the same answer for every ray.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSensor {
    contact: Option<GroundContact>,
}

impl FixedSensor {
    /// Always report a level contact at `point`.
    pub fn at(point: Vector3<f32>) -> Self {
        Self {
            contact: Some(contact_at(point)),
        }
    }

    /// Always report `contact`.
    pub const fn contact(contact: GroundContact) -> Self {
        Self {
            contact: Some(contact),
        }
    }

    /// Never report contact.
    pub const fn miss() -> Self {
        Self { contact: None }
    }
}

impl GroundSensor for FixedSensor {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        self.contact.map(|c| GroundContact {
            distance: (c.point - ray.origin).norm(),
            ..c
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedSensor
// ---------------------------------------------------------------------------

/// A sensor that replays a queue of answers, one per query, then misses.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: RefCell<VecDeque<Option<GroundContact>>>,
}

impl ScriptedSensor {
    /// Create a sensor that answers with `script` in order.
    pub fn new(script: impl IntoIterator<Item = Option<GroundContact>>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
        }
    }

    /// Append an answer.
    pub fn push(&self, answer: Option<GroundContact>) {
        self.script.borrow_mut().push_back(answer);
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl GroundSensor for ScriptedSensor {
    fn probe(&self, _ray: &GroundRay) -> Option<GroundContact> {
        self.script.borrow_mut().pop_front().flatten()
    }
}

// ---------------------------------------------------------------------------
// CountingSensor
// ---------------------------------------------------------------------------

/// Wraps a sensor and counts queries.
#[derive(Debug, Default)]
pub struct CountingSensor<S> {
    inner: S,
    calls: Cell<usize>,
}

impl<S: GroundSensor> CountingSensor<S> {
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    /// Number of `probe` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn reset(&self) {
        self.calls.set(0);
    }
}

impl<S: GroundSensor> GroundSensor for CountingSensor<S> {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        self.calls.set(self.calls.get() + 1);
        self.inner.probe(ray)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

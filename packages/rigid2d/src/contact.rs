//! Contact constraints.

use crate::body::BodyKey;
use vek::*;


/// One detected overlap between two fixtures, with the response data the solver needs.
///
/// Constraints live for one step plus the following step's begin phase: the set detected during a
/// step is retained so hooks can scan "what is touching this body" before the next detection
/// pass replaces it.
#[derive(Debug, Clone)]
pub struct ContactConstraint {
    pub body_a: BodyKey,
    pub body_b: BodyKey,
    /// Index of the fixture within body a.
    pub fixture_a: usize,
    /// Index of the fixture within body b.
    pub fixture_b: usize,
    /// Contact normal pointing from body a toward body b.
    pub normal: Vec2<f32>,
    /// Penetration depth along the normal.
    pub depth: f32,
    /// Representative contact point, world space.
    pub point: Vec2<f32>,
    /// True if either fixture is a sensor; sensor contacts are never solved.
    pub sensor: bool,
    /// Cleared by a hook to suppress collision response for this step.
    pub enabled: bool,
}

impl ContactConstraint {
    /// Whether the given body is one side of this constraint.
    pub fn touches(&self, body: BodyKey) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The opposing body, if `body` is one side of this constraint.
    pub fn other(&self, body: BodyKey) -> Option<BodyKey> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}

//! Simulation bodies.

use crate::fixture::Fixture;
use crate::shape::Shape;
use serde::{Serialize, Deserialize};
use vek::*;


/// Key of a body within a `World`. Stable for the lifetime of the body.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BodyKey(pub(crate) usize);

/// How a body's mass is derived from its fixtures.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum MassKind {
    /// Mass and rotational inertia computed from fixture densities.
    #[default]
    Normal,
    /// Infinite mass and inertia: a static body.
    Infinite,
    /// Finite mass, infinite rotational inertia: never rotates from collisions.
    FixedAngular,
    /// Infinite mass, finite rotational inertia: never translates from collisions.
    FixedLinear,
}

/// One rigid body: transform, velocities, accumulators, mass data, and fixtures.
///
/// A `Body` is a plain value until added to a `World`; construction, fixture attachment, and
/// initial state all happen before insertion.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) position: Vec2<f32>,
    pub(crate) angle: f32,
    pub(crate) linear_velocity: Vec2<f32>,
    pub(crate) angular_velocity: f32,
    pub(crate) force: Vec2<f32>,
    pub(crate) torque: f32,
    pub(crate) gravity_scale: f32,
    pub(crate) mass_kind: MassKind,
    pub(crate) inv_mass: f32,
    pub(crate) inv_inertia: f32,
    pub(crate) mass: f32,
    pub(crate) fixtures: Vec<Fixture>,
    pub(crate) enabled: bool,
    pub(crate) kinematic: bool,
    pub(crate) bullet: bool,
    pub(crate) at_rest: bool,
    pub(crate) at_rest_time: f32,
}

impl Default for Body {
    fn default() -> Self {
        Body::new()
    }
}

impl Body {
    pub fn new() -> Self {
        Body {
            position: Vec2::zero(),
            angle: 0.0,
            linear_velocity: Vec2::zero(),
            angular_velocity: 0.0,
            force: Vec2::zero(),
            torque: 0.0,
            gravity_scale: 1.0,
            mass_kind: MassKind::Infinite,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            mass: 0.0,
            fixtures: Vec::new(),
            enabled: true,
            kinematic: false,
            bullet: false,
            at_rest: false,
            at_rest_time: 0.0,
        }
    }

    pub fn add_fixture(&mut self, fixture: Fixture) {
        self.fixtures.push(fixture);
        self.recompute_mass();
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn position(&self) -> Vec2<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2<f32>) {
        self.position = position;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    pub fn linear_velocity(&self) -> Vec2<f32> {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2<f32>) {
        self.linear_velocity = velocity;
        self.wake();
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
        self.wake();
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn mass_kind(&self) -> MassKind {
        self.mass_kind
    }

    /// Set the mass kind and recompute mass data from the fixtures.
    pub fn set_mass_kind(&mut self, kind: MassKind) {
        self.mass_kind = kind;
        self.recompute_mass();
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    /// Kinematic bodies keep their user-set velocities: no forces, no collision response.
    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    pub fn is_bullet(&self) -> bool {
        self.bullet
    }

    pub fn set_bullet(&mut self, bullet: bool) {
        self.bullet = bullet;
    }

    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Force the at-rest state. Entering at-rest zeroes the velocities.
    pub fn set_at_rest(&mut self, at_rest: bool) {
        self.at_rest = at_rest;
        self.at_rest_time = 0.0;
        if at_rest {
            self.linear_velocity = Vec2::zero();
            self.angular_velocity = 0.0;
        }
    }

    /// Clear the at-rest state and timer so the body integrates again.
    pub fn wake(&mut self) {
        self.at_rest = false;
        self.at_rest_time = 0.0;
    }

    pub fn apply_force(&mut self, force: Vec2<f32>) {
        self.force += force;
        self.wake();
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
        self.wake();
    }

    pub fn apply_impulse(&mut self, impulse: Vec2<f32>) {
        self.linear_velocity += impulse * self.inv_mass;
        self.wake();
    }

    /// Zero force, accumulated torque, and both velocities in one call.
    ///
    /// Used when repositioning a body so it does not carry stale momentum to the new location.
    pub fn clear_forces(&mut self) {
        self.force = Vec2::zero();
        self.torque = 0.0;
        self.linear_velocity = Vec2::zero();
        self.angular_velocity = 0.0;
    }

    /// World-space bounding box over all fixtures.
    pub fn aabb(&self) -> Aabr<f32> {
        let mut min = Vec2::broadcast(f32::INFINITY);
        let mut max = Vec2::broadcast(f32::NEG_INFINITY);
        for fixture in &self.fixtures {
            // circles keep their exact bounds under rotation
            if let Shape::Circle { radius } = fixture.shape {
                min = Vec2::partial_min(min, self.position - Vec2::broadcast(radius));
                max = Vec2::partial_max(max, self.position + Vec2::broadcast(radius));
                continue;
            }
            for p in fixture.shape.polygonized() {
                let world = self.to_world(p);
                min = Vec2::partial_min(min, world);
                max = Vec2::partial_max(max, world);
            }
        }
        if min.x > max.x {
            // no fixtures: a point at the body position
            Aabr { min: self.position, max: self.position }
        } else {
            Aabr { min, max }
        }
    }

    /// Transform a body-local point to world space.
    pub fn to_world(&self, local: Vec2<f32>) -> Vec2<f32> {
        self.position + local.rotated_z(self.angle)
    }

    pub(crate) fn recompute_mass(&mut self) {
        let mut mass = 0.0;
        let mut inertia = 0.0;
        for fixture in &self.fixtures {
            let m = fixture.density * fixture.shape.area();
            let c = fixture.shape.centroid();
            mass += m;
            // parallel axis: fixture inertia about the body origin
            inertia += m * (fixture.shape.unit_inertia() + c.magnitude_squared());
        }
        self.mass = mass;
        let (inv_mass, inv_inertia) = match self.mass_kind {
            MassKind::Normal => (checked_inv(mass), checked_inv(inertia)),
            MassKind::Infinite => (0.0, 0.0),
            MassKind::FixedAngular => (checked_inv(mass), 0.0),
            MassKind::FixedLinear => (0.0, checked_inv(inertia)),
        };
        self.inv_mass = inv_mass;
        self.inv_inertia = inv_inertia;
    }

    pub(crate) fn is_static(&self) -> bool {
        !self.kinematic && self.inv_mass == 0.0 && self.inv_inertia == 0.0
    }
}

fn checked_inv(v: f32) -> f32 {
    if v > 1e-9 { 1.0 / v } else { 0.0 }
}


#[test]
fn test_clear_forces_zeroes_everything() {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Shape::circle(1.0).unwrap()));
    body.set_mass_kind(MassKind::Normal);
    body.apply_force(Vec2::new(3.0, 4.0));
    body.apply_torque(2.0);
    body.set_linear_velocity(Vec2::new(1.0, 1.0));
    body.set_angular_velocity(5.0);
    body.clear_forces();
    assert_eq!(body.force, Vec2::zero());
    assert_eq!(body.torque, 0.0);
    assert_eq!(body.linear_velocity(), Vec2::zero());
    assert_eq!(body.angular_velocity(), 0.0);
}

#[test]
fn test_mass_kinds() {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Shape::circle(1.0).unwrap()).density(2.0));
    body.set_mass_kind(MassKind::Normal);
    assert!(body.inv_mass > 0.0);
    assert!(body.inv_inertia > 0.0);
    body.set_mass_kind(MassKind::FixedAngular);
    assert!(body.inv_mass > 0.0);
    assert_eq!(body.inv_inertia, 0.0);
    body.set_mass_kind(MassKind::Infinite);
    assert_eq!(body.inv_mass, 0.0);
    assert_eq!(body.inv_inertia, 0.0);
}

#[test]
fn test_aabb_follows_transform() {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Shape::rect(1.0, 0.5).unwrap()));
    body.set_position(Vec2::new(10.0, 5.0));
    let aabb = body.aabb();
    assert!((aabb.min.x - 9.0).abs() < 1e-5);
    assert!((aabb.max.y - 5.5).abs() < 1e-5);
}

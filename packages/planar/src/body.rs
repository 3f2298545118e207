//! Body definitions and handles.
//!
//! A `PhysicsBody` is a recipe: the game describes what kind of body it wants, where it starts,
//! and what shape it has, then hands the recipe to `PhysicsSpace::add`, which turns it into
//! simulation state and returns a `BodyHandle`. After that the handle is the only way the game
//! refers to the body.

use crate::{
    character::{OneWayPolicy, SurfaceClassifier},
    renderable::RenderableRef,
};
use rigid2d::{Body, Fixture, MassKind};
use vek::*;


/// Handle to a body that has been added to a `PhysicsSpace`. Stable for the lifetime of the
/// body within its space; meaningless in any other space.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BodyHandle(pub(crate) usize);

/// Attaching a renderable can fail if either side of the pairing is already taken.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("renderable is already attached to body {0:?}")]
    AlreadyAttached(BodyHandle),
    #[error("body already drives a different renderable")]
    BodyAlreadyDriving,
    #[error("no such body")]
    NoSuchBody,
}

/// Drive parameters and wheel geometry for a vehicle.
///
/// The two wheels are full bodies in their own right, positioned in world space where they
/// should hang off the chassis. Each wheel gets a motorized joint anchored at the wheel's
/// starting position, and the whole assembly is added to the space atomically.
pub struct VehicleDef {
    pub rear_wheel: Body,
    pub front_wheel: Body,
    /// Suspension axis in chassis-local space.
    pub axis: Vec2<f32>,
    /// Cap on the motor's angular speed target, in radians per second.
    pub max_speed: f32,
    /// Motor target change per `forward` call.
    pub acceleration: f32,
    /// Motor target change per `reverse` call when moving forward.
    pub deceleration: f32,
    /// Torque cap forwarded to both wheel joints.
    pub max_motor_torque: f32,
}

impl VehicleDef {
    pub fn new(rear_wheel: Body, front_wheel: Body) -> Self {
        VehicleDef {
            rear_wheel,
            front_wheel,
            axis: Vec2::unit_y(),
            max_speed: 30.0,
            acceleration: 1.0,
            deceleration: 2.0,
            max_motor_torque: rigid2d::DEFAULT_MAX_MOTOR_TORQUE,
        }
    }

    pub fn max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn deceleration(mut self, deceleration: f32) -> Self {
        self.deceleration = deceleration;
        self
    }

    pub fn max_motor_torque(mut self, torque: f32) -> Self {
        self.max_motor_torque = torque;
        self
    }
}

/// What kind of body a definition produces, with any kind-specific configuration.
pub(crate) enum KindDef {
    Rigid,
    Kinematic,
    Character {
        one_way: Option<OneWayPolicy>,
        classifier: Option<Box<dyn SurfaceClassifier>>,
    },
    Vehicle(VehicleDef),
}

/// Builder for a body to be added to a `PhysicsSpace`.
pub struct PhysicsBody {
    pub(crate) kind: KindDef,
    pub(crate) body: Body,
    pub(crate) renderable: Option<RenderableRef>,
}

impl PhysicsBody {
    fn with_kind(kind: KindDef, mass_kind: MassKind) -> Self {
        let mut body = Body::new();
        body.set_mass_kind(mass_kind);
        PhysicsBody { kind, body, renderable: None }
    }

    /// A fully simulated dynamic body.
    pub fn rigid() -> Self {
        Self::with_kind(KindDef::Rigid, MassKind::Normal)
    }

    /// A body moved only by user-set velocities, ignoring forces and collision response.
    pub fn kinematic() -> Self {
        let mut def = Self::with_kind(KindDef::Kinematic, MassKind::Normal);
        def.body.set_kinematic(true);
        def.body.set_gravity_scale(0.0);
        def
    }

    /// A player or NPC body: dynamic, never rotated by collisions, with per-step surface
    /// classification.
    pub fn character() -> Self {
        Self::with_kind(
            KindDef::Character { one_way: None, classifier: None },
            MassKind::FixedAngular,
        )
    }

    /// A chassis with two motorized wheels, added to the space as one unit.
    pub fn vehicle(def: VehicleDef) -> Self {
        Self::with_kind(KindDef::Vehicle(def), MassKind::Normal)
    }

    pub fn position(mut self, position: Vec2<f32>) -> Self {
        self.body.set_position(position);
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.body.set_angle(angle);
        self
    }

    pub fn fixture(mut self, fixture: Fixture) -> Self {
        self.body.add_fixture(fixture);
        self
    }

    pub fn mass_kind(mut self, kind: MassKind) -> Self {
        self.body.set_mass_kind(kind);
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.body.set_gravity_scale(scale);
        self
    }

    pub fn linear_velocity(mut self, velocity: Vec2<f32>) -> Self {
        self.body.set_linear_velocity(velocity);
        self
    }

    /// Mark for continuous collision handling. Currently only recorded; the solver treats
    /// bullets like any other body.
    pub fn bullet(mut self, bullet: bool) -> Self {
        self.body.set_bullet(bullet);
        self
    }

    /// Scene-graph entity this body should drive. Attachment is checked for exclusivity when
    /// the body is added.
    pub fn renderable(mut self, renderable: RenderableRef) -> Self {
        self.renderable = Some(renderable);
        self
    }

    /// Restrict which bodies a character may drop through or pass through one-way. Only
    /// meaningful on a character definition; ignored for other kinds.
    pub fn one_way(mut self, policy: OneWayPolicy) -> Self {
        if let KindDef::Character { one_way, .. } = &mut self.kind {
            *one_way = Some(policy);
        }
        self
    }

    /// Replace the default edge-based surface classifier. Only meaningful on a character
    /// definition; ignored for other kinds.
    pub fn classifier(mut self, classifier: Box<dyn SurfaceClassifier>) -> Self {
        if let KindDef::Character { classifier: slot, .. } = &mut self.kind {
            *slot = Some(classifier);
        }
        self
    }
}


#[cfg(test)]
use rigid2d::Shape;

#[test]
fn test_kinematic_definition_ignores_gravity() {
    let def = PhysicsBody::kinematic().fixture(Fixture::new(Shape::rect(1.0, 1.0).unwrap()));
    assert!(def.body.is_kinematic());
    assert_eq!(def.body.gravity_scale(), 0.0);
}

#[test]
fn test_character_definition_never_rotates() {
    let def = PhysicsBody::character().fixture(Fixture::new(Shape::capsule(0.5, 1.0).unwrap()));
    assert_eq!(def.body.mass_kind(), MassKind::FixedAngular);
}

#[test]
fn test_one_way_ignored_on_non_character() {
    // builder accepts the call but a rigid body has nowhere to store the policy
    let def = PhysicsBody::rigid().one_way(Box::new(|_, _| true));
    assert!(matches!(def.kind, KindDef::Rigid));
}

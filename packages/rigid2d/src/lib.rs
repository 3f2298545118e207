//! Minimal 2D rigid body world.
//!
//! This package is the simulation half of the workspace: bodies made of fixtures, wheel joints
//! with motors, contact constraints, and a stepping function with hook points. The gist is:
//!
//! - A `Body` is simulation state only (transform, velocities, accumulators, mass data) plus the
//!   fixtures that give it shape. Bodies are plain values until added to a `World`.
//! - `World::update` advances the simulation by a time step. A `StepHooks` implementation gets
//!   called at the start of the step and once per detected contact constraint, and may disable
//!   individual constraints before they are solved. That hook surface is what the `planar`
//!   package builds its character semantics on.
//! - Contact constraints detected in a step are retained until the next step, so a hook can ask
//!   "what was touching this body" before new detection runs.
//!
//! This is deliberately not a full-featured solver. Integration is semi-implicit Euler, contact
//! response is a few iterations of impulses plus positional correction, and the broadphase is a
//! plain AABB sweep. It is enough to carry a platformer.

#[macro_use]
extern crate tracing;

pub mod shape;
pub mod fixture;
pub mod body;
pub mod joint;
pub mod contact;
pub mod collide;
pub mod world;

pub use shape::{Shape, ShapeError};
pub use fixture::Fixture;
pub use body::{Body, BodyKey, MassKind};
pub use joint::{WheelJoint, JointKey, DEFAULT_MAX_MOTOR_TORQUE};
pub use contact::ContactConstraint;
pub use world::{World, WorldView, Settings, StepHooks, NoHooks};


/// Default simulation step period, in seconds.
pub const DEFAULT_STEP_FREQUENCY: f32 = 1.0 / 60.0;

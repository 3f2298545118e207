//! 2D physics layer for a 3D-rendered game.
//!
//! This package wraps the `rigid2d` simulation with everything a planar game hangs off a
//! physics body:
//!
//! - `PhysicsSpace` owns the simulation world and a control record per body. Bodies come in
//!   four kinds (rigid, kinematic, character, vehicle) built through the `PhysicsBody`
//!   definition type; the kind decides what the per-frame control pass and the in-step hooks
//!   do for that body.
//! - Characters get ground/ceiling/wall flags recomputed from contact geometry every step,
//!   plus one-way platform pass-through and a drop-down gesture.
//! - Vehicles are a chassis with two motorized wheels added and removed as one unit.
//! - `PhysicsStepper` drives the space against the host frame clock, either synchronously in
//!   the render callback or from a dedicated fixed-rate thread, and services the optional
//!   debug session.
//! - Renderables are scene-graph entities behind `Arc<Mutex<dyn Renderable>>`; the sync pass
//!   writes X/Y translation and Z rotation, preserving the render depth in Z.
//! - `snapshot` round-trips the whole space through serde with defaulted fields.

#[macro_use]
extern crate tracing;

pub mod body;
pub mod character;
pub mod vehicle;
pub mod renderable;
pub mod space;
pub mod stepper;
pub mod camera;
pub mod input;
pub mod debug;
pub mod snapshot;

pub use body::{AttachError, BodyHandle, PhysicsBody, VehicleDef};
pub use character::{DownState, EdgeClassifier, OneWayPolicy, SurfaceClassifier, CLASSIFY_EPSILON};
pub use vehicle::VehicleState;
pub use renderable::{DetachedTransform, Renderable, RenderableRef};
pub use space::PhysicsSpace;
pub use stepper::{PhysicsStepper, ThreadingMode};
pub use camera::{Camera3d, FlatCamera};
pub use input::{ActionHandler, ActionMap};
pub use debug::{DebugKey, DebugSession, DebugShape};
pub use snapshot::{BodySnapshot, SpaceSnapshot};

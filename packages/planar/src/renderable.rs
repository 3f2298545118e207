//! The renderable-entity seam.

use crate::body::BodyHandle;
use parking_lot::Mutex;
use std::sync::Arc;
use vek::*;


/// An object in the host scene graph that a physics body can drive.
///
/// Only the X and Y components of the translation are ever written by the sync pass; the Z
/// component is the render depth layer and is preserved. Rotation is a single scalar angle about
/// the Z axis.
pub trait Renderable: Send {
    fn local_translation(&self) -> Vec3<f32>;

    fn set_local_translation(&mut self, translation: Vec3<f32>);

    fn local_rotation_z(&self) -> f32;

    fn set_local_rotation_z(&mut self, angle: f32);

    /// Back-reference to the body driving this entity, for debug and tooling lookups. Not
    /// required for simulation correctness; the default implementation ignores it.
    fn set_driver(&mut self, _driver: Option<BodyHandle>) {}
}

/// Shared handle to a renderable entity. The game keeps its own clone; the physics space locks
/// it briefly during the per-frame sync pass.
pub type RenderableRef = Arc<Mutex<dyn Renderable>>;

/// Whether two renderable handles refer to the same entity.
pub fn same_renderable(a: &RenderableRef, b: &RenderableRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// A free-floating transform, usable as a renderable when there is no scene graph around.
///
/// Handy in tests and headless tools.
#[derive(Debug, Clone, Default)]
pub struct DetachedTransform {
    pub translation: Vec3<f32>,
    pub rotation_z: f32,
    pub driver: Option<BodyHandle>,
}

impl DetachedTransform {
    pub fn at(translation: Vec3<f32>) -> RenderableRef {
        Arc::new(Mutex::new(DetachedTransform {
            translation,
            rotation_z: 0.0,
            driver: None,
        }))
    }
}

impl Renderable for DetachedTransform {
    fn local_translation(&self) -> Vec3<f32> {
        self.translation
    }

    fn set_local_translation(&mut self, translation: Vec3<f32>) {
        self.translation = translation;
    }

    fn local_rotation_z(&self) -> f32 {
        self.rotation_z
    }

    fn set_local_rotation_z(&mut self, angle: f32) {
        self.rotation_z = angle;
    }

    fn set_driver(&mut self, driver: Option<BodyHandle>) {
        self.driver = driver;
    }
}

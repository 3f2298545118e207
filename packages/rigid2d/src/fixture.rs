//! Fixtures: a shape plus material and filtering properties.

use crate::shape::Shape;
use serde::{Serialize, Deserialize};


/// A shape attached to a body, with material properties. One body may carry several fixtures to
/// form a compound shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub shape: Shape,
    /// Mass per unit area.
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
    /// Sensor fixtures detect contacts but never get a collision response.
    #[serde(default)]
    pub sensor: bool,
}

fn default_density() -> f32 {
    1.0
}

fn default_friction() -> f32 {
    0.2
}

impl Fixture {
    pub fn new(shape: Shape) -> Self {
        Fixture {
            shape,
            density: default_density(),
            friction: default_friction(),
            restitution: 0.0,
            sensor: false,
        }
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }
}

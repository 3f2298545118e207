//! Wheel joints.

use crate::body::BodyKey;
use vek::*;


/// Key of a joint within a `World`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct JointKey(pub(crate) usize);

/// Default cap on the torque a wheel motor may apply, in torque units.
pub const DEFAULT_MAX_MOTOR_TORQUE: f32 = 1000.0;

/// A motorized wheel joint: pins body b (the wheel) to an anchor on body a (the frame) and
/// drives the wheel's angular velocity toward a target, limited by a motor torque cap.
///
/// The anchor is stored in each body's local space at construction time; the constraint keeps
/// the two world-space anchor points coincident.
#[derive(Debug, Clone)]
pub struct WheelJoint {
    pub(crate) body_a: BodyKey,
    pub(crate) body_b: BodyKey,
    pub(crate) local_anchor_a: Vec2<f32>,
    pub(crate) local_anchor_b: Vec2<f32>,
    /// Drive axis in body a's local space. Reserved for suspension; the pin solve currently
    /// treats the anchor as rigid.
    pub(crate) axis: Vec2<f32>,
    pub(crate) motor_enabled: bool,
    pub(crate) motor_speed: f32,
    pub(crate) max_motor_torque: f32,
}

impl WheelJoint {
    /// Construct from a world-space anchor and drive axis, resolving local anchors against the
    /// given current body transforms.
    pub fn new(
        body_a: (BodyKey, Vec2<f32>, f32),
        body_b: (BodyKey, Vec2<f32>, f32),
        world_anchor: Vec2<f32>,
        axis: Vec2<f32>,
    ) -> Self {
        let (key_a, pos_a, angle_a) = body_a;
        let (key_b, pos_b, angle_b) = body_b;
        WheelJoint {
            body_a: key_a,
            body_b: key_b,
            local_anchor_a: (world_anchor - pos_a).rotated_z(-angle_a),
            local_anchor_b: (world_anchor - pos_b).rotated_z(-angle_b),
            axis: axis.try_normalized().unwrap_or(Vec2::unit_y()),
            motor_enabled: true,
            motor_speed: 0.0,
            max_motor_torque: DEFAULT_MAX_MOTOR_TORQUE,
        }
    }

    pub fn body_a(&self) -> BodyKey {
        self.body_a
    }

    pub fn body_b(&self) -> BodyKey {
        self.body_b
    }

    pub fn axis(&self) -> Vec2<f32> {
        self.axis
    }

    pub fn motor_speed(&self) -> f32 {
        self.motor_speed
    }

    /// Target angular velocity for the wheel, in radians per second. Positive spins the wheel
    /// counterclockwise, so a wheel rolling toward +x along the ground needs a negative target.
    pub fn set_motor_speed(&mut self, speed: f32) {
        self.motor_speed = speed;
    }

    pub fn is_motor_enabled(&self) -> bool {
        self.motor_enabled
    }

    pub fn set_motor_enabled(&mut self, enabled: bool) {
        self.motor_enabled = enabled;
    }

    pub fn max_motor_torque(&self) -> f32 {
        self.max_motor_torque
    }

    pub fn set_max_motor_torque(&mut self, torque: f32) {
        self.max_motor_torque = torque;
    }
}

//! Vehicle speed control.

use rigid2d::{BodyKey, JointKey};


/// Runtime state of a vehicle: the two wheel bodies and motorized joints that were added to the
/// space alongside the chassis, plus the drive parameters.
///
/// The scalar `speed` is a motor target, not an actual velocity: every physics step it is
/// written to both wheel joints, and the world's torque-limited motor solve does the rest.
pub struct VehicleState {
    pub(crate) wheels: [BodyKey; 2],
    pub(crate) joints: [JointKey; 2],
    pub(crate) speed: f32,
    pub(crate) max_speed: f32,
    pub(crate) acceleration: f32,
    pub(crate) deceleration: f32,
}

impl VehicleState {
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Accelerate. Recovery from reverse applies double acceleration.
    pub fn forward(&mut self) {
        if self.speed < 0.0 {
            self.speed += 2.0 * self.acceleration;
        } else {
            self.speed += self.acceleration;
        }
        self.speed = self.speed.min(self.max_speed);
    }

    /// Accelerate backward. Recovery from forward motion applies double deceleration.
    pub fn reverse(&mut self) {
        if self.speed > 0.0 {
            self.speed -= 2.0 * self.deceleration;
        } else {
            self.speed -= self.acceleration;
        }
        self.speed = self.speed.max(-self.max_speed);
    }

    /// Ease the motor target toward zero without overshooting. At exactly zero this is a no-op.
    pub fn brake(&mut self) {
        if self.speed > 0.0 {
            self.reverse();
            if self.speed < 0.0 {
                self.speed = 0.0;
            }
        } else if self.speed < 0.0 {
            self.forward();
            if self.speed > 0.0 {
                self.speed = 0.0;
            }
        }
    }
}


#[cfg(test)]
fn test_vehicle() -> VehicleState {
    use rigid2d::{Body, WheelJoint, World};
    use vek::Vec2;

    let mut world = World::new();
    let rear = world.add_body(Body::new());
    let front = world.add_body(Body::new());
    let joint = |a, b| {
        WheelJoint::new((a, Vec2::zero(), 0.0), (b, Vec2::zero(), 0.0), Vec2::zero(), Vec2::unit_y())
    };
    let rear_joint = world.add_joint(joint(rear, front));
    let front_joint = world.add_joint(joint(rear, front));
    VehicleState {
        wheels: [rear, front],
        joints: [rear_joint, front_joint],
        speed: 0.0,
        max_speed: 10.0,
        acceleration: 1.5,
        deceleration: 2.0,
    }
}

#[test]
fn test_forward_clamps_to_max_speed() {
    let mut v = test_vehicle();
    for _ in 0..100 {
        v.forward();
    }
    assert_eq!(v.speed(), 10.0);
}

#[test]
fn test_reverse_clamps_to_negative_max_speed() {
    let mut v = test_vehicle();
    for _ in 0..100 {
        v.reverse();
    }
    assert_eq!(v.speed(), -10.0);
}

#[test]
fn test_forward_recovers_faster_from_reverse() {
    let mut v = test_vehicle();
    v.speed = -6.0;
    v.forward();
    assert_eq!(v.speed(), -3.0);
    v.speed = 1.0;
    v.forward();
    assert_eq!(v.speed(), 2.5);
}

#[test]
fn test_brake_converges_to_exactly_zero() {
    let mut v = test_vehicle();
    v.speed = 7.3;
    for _ in 0..20 {
        v.brake();
    }
    assert_eq!(v.speed(), 0.0);
    v.brake();
    assert_eq!(v.speed(), 0.0);

    v.speed = -4.1;
    for _ in 0..20 {
        v.brake();
    }
    assert_eq!(v.speed(), 0.0);
}

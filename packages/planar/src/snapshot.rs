//! Snapshot serialization of space contents.
//!
//! Every stateful physics attribute round-trips through named, defaulted fields: a snapshot
//! written by an older build that lacks a field deserializes with that field's default. The
//! wire encoding is bincode, but the structures themselves are plain serde and work with any
//! format.
//!
//! Renderable attachments and custom character policies/classifiers are runtime objects, not
//! data; they are not captured. Restored characters get the default classifier and one-way
//! policy, and restored bodies come back with no renderable attached.

use crate::{
    body::{BodyHandle, PhysicsBody, VehicleDef},
    space::{Kind, PhysicsSpace},
};
use rigid2d::{Body, Fixture, MassKind};
use serde::{Deserialize, Serialize};
use vek::*;


/// Which body kind a snapshot restores to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum KindTag {
    #[default]
    Rigid,
    Kinematic,
    Character,
    Vehicle,
}

/// Serialized state of one wheel body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSnapshot {
    pub position: Vec2<f32>,
    pub angle: f32,
    pub linear_velocity: Vec2<f32>,
    pub angular_velocity: f32,
    pub mass_kind: MassKind,
    pub fixtures: Vec<Fixture>,
}

impl Default for WheelSnapshot {
    fn default() -> Self {
        WheelSnapshot {
            position: Vec2::zero(),
            angle: 0.0,
            linear_velocity: Vec2::zero(),
            angular_velocity: 0.0,
            mass_kind: MassKind::Normal,
            fixtures: Vec::new(),
        }
    }
}

/// Serialized drive parameters and wheels of a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSnapshot {
    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub max_motor_torque: f32,
    pub axis: Vec2<f32>,
    pub rear_wheel: WheelSnapshot,
    pub front_wheel: WheelSnapshot,
}

impl Default for VehicleSnapshot {
    fn default() -> Self {
        VehicleSnapshot {
            speed: 0.0,
            max_speed: 30.0,
            acceleration: 1.0,
            deceleration: 2.0,
            max_motor_torque: rigid2d::DEFAULT_MAX_MOTOR_TORQUE,
            axis: Vec2::unit_y(),
            rear_wheel: WheelSnapshot::default(),
            front_wheel: WheelSnapshot::default(),
        }
    }
}

/// Serialized state of one body in a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySnapshot {
    pub kind: KindTag,
    pub position: Vec2<f32>,
    pub angle: f32,
    pub linear_velocity: Vec2<f32>,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub mass_kind: MassKind,
    pub bullet: bool,
    pub enabled: bool,
    pub fixtures: Vec<Fixture>,
    pub vehicle: Option<VehicleSnapshot>,
}

impl Default for BodySnapshot {
    fn default() -> Self {
        BodySnapshot {
            kind: KindTag::Rigid,
            position: Vec2::zero(),
            angle: 0.0,
            linear_velocity: Vec2::zero(),
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            mass_kind: MassKind::Normal,
            bullet: false,
            enabled: true,
            fixtures: Vec::new(),
            vehicle: None,
        }
    }
}

/// Serialized state of a whole space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceSnapshot {
    pub gravity: Vec2<f32>,
    pub speed: f32,
    pub bodies: Vec<BodySnapshot>,
}

impl Default for SpaceSnapshot {
    fn default() -> Self {
        SpaceSnapshot {
            gravity: Vec2::new(0.0, -9.8),
            speed: 1.0,
            bodies: Vec::new(),
        }
    }
}

pub fn to_bytes(snapshot: &SpaceSnapshot) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(snapshot)
}

pub fn from_bytes(bytes: &[u8]) -> Result<SpaceSnapshot, bincode::Error> {
    bincode::deserialize(bytes)
}

fn snapshot_wheel(body: &Body) -> WheelSnapshot {
    WheelSnapshot {
        position: body.position(),
        angle: body.angle(),
        linear_velocity: body.linear_velocity(),
        angular_velocity: body.angular_velocity(),
        mass_kind: body.mass_kind(),
        fixtures: body.fixtures().to_vec(),
    }
}

fn restore_wheel(snapshot: &WheelSnapshot) -> Body {
    let mut body = Body::new();
    for fixture in &snapshot.fixtures {
        body.add_fixture(fixture.clone());
    }
    body.set_mass_kind(snapshot.mass_kind);
    body.set_position(snapshot.position);
    body.set_angle(snapshot.angle);
    body.set_linear_velocity(snapshot.linear_velocity);
    body.set_angular_velocity(snapshot.angular_velocity);
    body
}

impl PhysicsSpace {
    /// Capture every body in the space.
    pub fn export_snapshot(&self) -> SpaceSnapshot {
        let mut bodies = Vec::with_capacity(self.controls.len());
        for (_, control) in self.controls.iter() {
            let body = match self.world.body(control.body) {
                Some(b) => b,
                None => continue,
            };
            let (kind, vehicle) = match &control.kind {
                Kind::Rigid => (KindTag::Rigid, None),
                Kind::Kinematic => (KindTag::Kinematic, None),
                Kind::Character(_) => (KindTag::Character, None),
                Kind::Vehicle(state) => {
                    let rear = self.world.body(state.wheels[0]);
                    let front = self.world.body(state.wheels[1]);
                    let joint = self.world.joint(state.joints[0]);
                    let (rear, front, joint) = match (rear, front, joint) {
                        (Some(r), Some(f), Some(j)) => (r, f, j),
                        _ => continue,
                    };
                    let vehicle = VehicleSnapshot {
                        speed: state.speed(),
                        max_speed: state.max_speed(),
                        acceleration: state.acceleration,
                        deceleration: state.deceleration,
                        max_motor_torque: joint.max_motor_torque(),
                        axis: joint.axis(),
                        rear_wheel: snapshot_wheel(rear),
                        front_wheel: snapshot_wheel(front),
                    };
                    (KindTag::Vehicle, Some(vehicle))
                }
            };
            bodies.push(BodySnapshot {
                kind,
                position: body.position(),
                angle: body.angle(),
                linear_velocity: body.linear_velocity(),
                angular_velocity: body.angular_velocity(),
                gravity_scale: body.gravity_scale(),
                mass_kind: body.mass_kind(),
                bullet: body.is_bullet(),
                enabled: body.is_enabled(),
                fixtures: body.fixtures().to_vec(),
                vehicle,
            });
        }
        SpaceSnapshot {
            gravity: self.gravity(),
            speed: self.speed(),
            bodies,
        }
    }

    /// Add every body from a snapshot to this space, returning the new handles in snapshot
    /// order. Gravity and speed are overwritten from the snapshot.
    pub fn import_snapshot(&mut self, snapshot: &SpaceSnapshot) -> Vec<BodyHandle> {
        self.set_gravity(snapshot.gravity);
        self.set_speed(snapshot.speed);
        let mut handles = Vec::with_capacity(snapshot.bodies.len());
        for entry in &snapshot.bodies {
            let mut def = match entry.kind {
                KindTag::Rigid => PhysicsBody::rigid(),
                KindTag::Kinematic => PhysicsBody::kinematic(),
                KindTag::Character => PhysicsBody::character(),
                KindTag::Vehicle => {
                    let vehicle = entry.vehicle.clone().unwrap_or_default();
                    PhysicsBody::vehicle(
                        VehicleDef {
                            rear_wheel: restore_wheel(&vehicle.rear_wheel),
                            front_wheel: restore_wheel(&vehicle.front_wheel),
                            axis: vehicle.axis,
                            max_speed: vehicle.max_speed,
                            acceleration: vehicle.acceleration,
                            deceleration: vehicle.deceleration,
                            max_motor_torque: vehicle.max_motor_torque,
                        },
                    )
                }
            };
            for fixture in &entry.fixtures {
                def = def.fixture(fixture.clone());
            }
            def = def
                .mass_kind(entry.mass_kind)
                .position(entry.position)
                .angle(entry.angle)
                .gravity_scale(entry.gravity_scale)
                .linear_velocity(entry.linear_velocity)
                .bullet(entry.bullet);
            // a snapshot import never carries renderables, so adding cannot fail
            let handle = match self.add(def) {
                Ok(handle) => handle,
                Err(e) => {
                    error!(%e, "snapshot body failed to restore, skipping");
                    continue;
                }
            };
            if let Some(body) = self.body_mut(handle) {
                body.set_angular_velocity(entry.angular_velocity);
                body.set_enabled(entry.enabled);
            }
            if let KindTag::Vehicle = entry.kind {
                if let Some(vehicle) = &entry.vehicle {
                    self.set_vehicle_speed_scalar(handle, vehicle.speed);
                }
            }
            handles.push(handle);
        }
        handles
    }

    pub(crate) fn set_vehicle_speed_scalar(&mut self, handle: BodyHandle, speed: f32) {
        if let Some(Kind::Vehicle(state)) =
            self.controls.get_mut(handle.0).map(|c| &mut c.kind)
        {
            state.speed = speed;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rigid2d::Shape;

    fn populated_space() -> PhysicsSpace {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, -9.8));
        space.set_speed(1.5);
        space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(1.0, 2.0))
                    .angle(0.3)
                    .fixture(Fixture::new(Shape::circle(0.5).unwrap()).friction(0.7)),
            )
            .unwrap();
        space
            .add(
                PhysicsBody::character()
                    .position(Vec2::new(-4.0, 0.0))
                    .fixture(Fixture::new(Shape::capsule(0.5, 0.4).unwrap())),
            )
            .unwrap();
        let mut rear = Body::new();
        rear.add_fixture(Fixture::new(Shape::circle(0.4).unwrap()));
        rear.set_mass_kind(MassKind::Normal);
        rear.set_position(Vec2::new(-1.0, -0.5));
        let mut front = rear.clone();
        front.set_position(Vec2::new(1.0, -0.5));
        let car = space
            .add(
                PhysicsBody::vehicle(
                    VehicleDef::new(rear, front).max_speed(25.0).acceleration(2.0),
                )
                .fixture(Fixture::new(Shape::rect(1.5, 0.3).unwrap())),
            )
            .unwrap();
        space.vehicle_forward(car);
        space
    }

    #[test]
    fn test_snapshot_round_trips_through_bincode() {
        let space = populated_space();
        let snapshot = space.export_snapshot();
        let bytes = to_bytes(&snapshot).unwrap();
        let restored = from_bytes(&bytes).unwrap();
        assert_eq!(restored.speed, 1.5);
        assert_eq!(restored.bodies.len(), 3);

        let mut fresh = PhysicsSpace::new(Vec2::zero());
        let handles = fresh.import_snapshot(&restored);
        assert_eq!(handles.len(), 3);
        assert_eq!(fresh.gravity(), Vec2::new(0.0, -9.8));
        assert_eq!(fresh.speed(), 1.5);
        assert_eq!(fresh.position(handles[0]).unwrap(), Vec2::new(1.0, 2.0));
        assert_eq!(fresh.body(handles[0]).unwrap().angle(), 0.3);
        // the vehicle came back whole: chassis, wheels, joints, drive state
        assert_eq!(fresh.world().body_count(), 5);
        assert_eq!(fresh.world().joint_count(), 2);
        assert_eq!(fresh.vehicle_speed(handles[2]).unwrap(), 2.0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        // an empty body entry deserializes entirely from defaults
        let entry = BodySnapshot::default();
        assert_eq!(entry.gravity_scale, 1.0);
        assert!(entry.enabled);
        assert_eq!(entry.kind, KindTag::Rigid);

        let mut space = PhysicsSpace::new(Vec2::zero());
        let snapshot = SpaceSnapshot { bodies: vec![entry], ..SpaceSnapshot::default() };
        let handles = space.import_snapshot(&snapshot);
        assert_eq!(handles.len(), 1);
        assert_eq!(space.position(handles[0]).unwrap(), Vec2::zero());
    }
}

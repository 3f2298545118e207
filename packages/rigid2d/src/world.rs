//! The simulation world and its stepping function.

use crate::{
    body::{Body, BodyKey},
    collide::collide_bodies,
    contact::ContactConstraint,
    joint::{WheelJoint, JointKey},
    DEFAULT_STEP_FREQUENCY,
};
use slab::Slab;
use std::panic::{catch_unwind, AssertUnwindSafe};
use vek::*;


/// Penetration allowed before positional correction kicks in.
const PENETRATION_SLOP: f32 = 0.005;

/// Fraction of remaining penetration corrected per step.
const CORRECTION_FACTOR: f32 = 0.2;

/// Relative normal speed into a contact above which a resting body is woken.
const WAKE_SPEED: f32 = 0.1;

/// Tunable stepping parameters.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Time a body must stay below the velocity tolerances before entering the at-rest state.
    pub min_at_rest_time: f32,
    pub at_rest_linear_tolerance: f32,
    pub at_rest_angular_tolerance: f32,
    pub velocity_iterations: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            min_at_rest_time: DEFAULT_STEP_FREQUENCY,
            at_rest_linear_tolerance: 0.05,
            at_rest_angular_tolerance: 0.05,
            velocity_iterations: 8,
        }
    }
}

/// Hooks invoked synchronously inside `World::update`, on whichever thread is stepping.
///
/// A panic inside a hook is caught and logged so the step always completes.
pub trait StepHooks {
    /// Called once at the start of the step, before contact detection, with the contacts
    /// retained from the previous step.
    fn step_begin(&mut self, _view: &WorldView) {}

    /// Called once per newly detected contact constraint. Clearing `contact.enabled` suppresses
    /// collision response for this step.
    fn on_contact(&mut self, _contact: &mut ContactConstraint, _view: &WorldView) {}
}

/// Hook implementation that does nothing.
pub struct NoHooks;

impl StepHooks for NoHooks {}

/// Read access to bodies and retained contacts, as seen by hooks.
pub struct WorldView<'a> {
    bodies: &'a Slab<Body>,
    contacts: &'a [ContactConstraint],
}

impl<'a> WorldView<'a> {
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key.0)
    }

    /// World AABB of a body, or an empty box for an unknown key.
    pub fn aabb(&self, key: BodyKey) -> Aabr<f32> {
        self.bodies
            .get(key.0)
            .map(|b| b.aabb())
            .unwrap_or(Aabr { min: Vec2::zero(), max: Vec2::zero() })
    }

    pub fn contacts(&self) -> &[ContactConstraint] {
        self.contacts
    }

    /// Retained contacts that touch the given body.
    pub fn contacts_touching(
        &self,
        key: BodyKey,
    ) -> impl Iterator<Item = &ContactConstraint> + '_ {
        self.contacts.iter().filter(move |c| c.touches(key))
    }
}

/// A collection of bodies and joints advanced together by `update`.
pub struct World {
    bodies: Slab<Body>,
    joints: Slab<WheelJoint>,
    gravity: Vec2<f32>,
    bounds: Option<Aabr<f32>>,
    settings: Settings,
    contacts: Vec<ContactConstraint>,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> Self {
        World::with_capacity(16, 4)
    }

    /// Construct with initial body and joint capacity hints.
    pub fn with_capacity(bodies: usize, joints: usize) -> Self {
        World {
            bodies: Slab::with_capacity(bodies),
            joints: Slab::with_capacity(joints),
            gravity: Vec2::new(0.0, -9.8),
            bounds: None,
            settings: Settings::default(),
            contacts: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec2<f32> {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2<f32>) {
        self.gravity = gravity;
    }

    /// Fixed world boundary. Bodies whose AABB leaves it entirely are disabled.
    pub fn set_bounds(&mut self, bounds: Option<Aabr<f32>>) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> Option<Aabr<f32>> {
        self.bounds
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn add_body(&mut self, body: Body) -> BodyKey {
        BodyKey(self.bodies.insert(body))
    }

    /// Remove a body. Returns false if the key is not present.
    ///
    /// Joints and retained contacts referencing the body are dropped with it. When `notify` is
    /// set, bodies that were in contact with the removed one are woken so they re-settle.
    pub fn remove_body(&mut self, key: BodyKey, notify: bool) -> bool {
        if !self.bodies.contains(key.0) {
            return false;
        }
        self.bodies.remove(key.0);
        self.joints.retain(|_, j| j.body_a != key && j.body_b != key);

        let mut touching = Vec::new();
        self.contacts.retain(|c| {
            if let Some(other) = c.other(key) {
                touching.push(other);
                false
            } else {
                true
            }
        });
        if notify {
            for other in touching {
                if let Some(body) = self.bodies.get_mut(other.0) {
                    body.wake();
                }
            }
        }
        true
    }

    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key.0)
    }

    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key.0)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> + '_ {
        self.bodies.iter().map(|(k, b)| (BodyKey(k), b))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn add_joint(&mut self, joint: WheelJoint) -> JointKey {
        JointKey(self.joints.insert(joint))
    }

    /// Remove a joint. Returns false if the key is not present.
    pub fn remove_joint(&mut self, key: JointKey) -> bool {
        if self.joints.contains(key.0) {
            self.joints.remove(key.0);
            true
        } else {
            false
        }
    }

    pub fn joint(&self, key: JointKey) -> Option<&WheelJoint> {
        self.joints.get(key.0)
    }

    pub fn joint_mut(&mut self, key: JointKey) -> Option<&mut WheelJoint> {
        self.joints.get_mut(key.0)
    }

    pub fn joints(&self) -> impl Iterator<Item = (JointKey, &WheelJoint)> + '_ {
        self.joints.iter().map(|(k, j)| (JointKey(k), j))
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Contacts retained from the most recent step that touch the given body.
    pub fn contacts_touching(
        &self,
        key: BodyKey,
    ) -> impl Iterator<Item = &ContactConstraint> + '_ {
        self.contacts.iter().filter(move |c| c.touches(key))
    }

    pub fn contacts(&self) -> &[ContactConstraint] {
        &self.contacts
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt` of zero performs a settle pass: hooks and contact detection still run, velocities
    /// are still solved, but nothing integrates and at-rest timers do not advance.
    pub fn update(&mut self, dt: f32, hooks: &mut dyn StepHooks) {
        // begin-step hooks see the previous step's contacts
        {
            let view = WorldView { bodies: &self.bodies, contacts: &self.contacts };
            if catch_unwind(AssertUnwindSafe(|| hooks.step_begin(&view))).is_err() {
                error!("step_begin hook panicked, continuing step");
            }
        }

        if dt > 0.0 {
            self.integrate_velocities(dt);
        }

        let mut contacts = self.detect_contacts();
        {
            let view = WorldView { bodies: &self.bodies, contacts: &self.contacts };
            for contact in &mut contacts {
                if catch_unwind(AssertUnwindSafe(|| hooks.on_contact(contact, &view))).is_err() {
                    error!("contact hook panicked, continuing step");
                }
            }
        }

        self.wake_on_impact(&contacts);
        if dt > 0.0 {
            self.solve_joints(dt);
        }
        self.solve_contacts(&contacts);

        if dt > 0.0 {
            self.integrate_positions(dt);
            self.update_at_rest(dt);
        }
        self.correct_positions(&contacts);
        self.enforce_bounds();

        for (_, body) in self.bodies.iter_mut() {
            body.force = Vec2::zero();
            body.torque = 0.0;
        }
        self.contacts = contacts;
    }

    fn integrate_velocities(&mut self, dt: f32) {
        for (_, body) in self.bodies.iter_mut() {
            if !body.enabled || body.at_rest || body.kinematic || body.is_static() {
                continue;
            }
            let accel = self.gravity * body.gravity_scale + body.force * body.inv_mass;
            body.linear_velocity += accel * dt;
            body.angular_velocity += body.torque * body.inv_inertia * dt;
        }
    }

    fn detect_contacts(&self) -> Vec<ContactConstraint> {
        let entries = self.bodies
            .iter()
            .filter(|(_, b)| b.enabled)
            .map(|(k, b)| (BodyKey(k), b, b.aabb()))
            .collect::<Vec<_>>();

        let mut contacts = Vec::new();
        for (i, &(key_a, body_a, aabb_a)) in entries.iter().enumerate() {
            for &(key_b, body_b, aabb_b) in &entries[i + 1..] {
                if body_a.is_static() && body_b.is_static() {
                    continue;
                }
                if !aabb_a.collides_with_aabr(aabb_b) {
                    continue;
                }
                collide_bodies(key_a, body_a, key_b, body_b, &mut contacts);
            }
        }
        contacts
    }

    /// Wake resting bodies that something ran into.
    fn wake_on_impact(&mut self, contacts: &[ContactConstraint]) {
        for c in contacts {
            if !c.enabled || c.sensor {
                continue;
            }
            let (a, b) = match (self.bodies.get(c.body_a.0), self.bodies.get(c.body_b.0)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            if a.at_rest == b.at_rest {
                continue;
            }
            let closing = (b.linear_velocity - a.linear_velocity).dot(c.normal);
            if closing < -WAKE_SPEED {
                let resting = if a.at_rest { c.body_a } else { c.body_b };
                if let Some(body) = self.bodies.get_mut(resting.0) {
                    body.wake();
                }
            }
        }
    }

    fn solve_joints(&mut self, dt: f32) {
        let joint_keys = self.joints.iter().map(|(k, _)| k).collect::<Vec<_>>();
        for k in joint_keys {
            let joint = self.joints[k].clone();
            self.solve_motor(&joint, dt);
            self.solve_pin(&joint);
        }
    }

    /// Drive the wheel's angular velocity toward the motor target, limited by the torque cap.
    fn solve_motor(&mut self, joint: &WheelJoint, dt: f32) {
        if !joint.motor_enabled {
            return;
        }
        let (frame_inv_inertia, wheel) = {
            let frame = match self.bodies.get(joint.body_a.0) {
                Some(b) => b,
                None => return,
            };
            let wheel = match self.bodies.get(joint.body_b.0) {
                Some(b) => b,
                None => return,
            };
            if !frame.enabled || !wheel.enabled {
                return;
            }
            (frame.inv_inertia, wheel)
        };
        if wheel.inv_inertia == 0.0 {
            return;
        }
        let wanted = joint.motor_speed - wheel.angular_velocity;
        let max_change = joint.max_motor_torque * wheel.inv_inertia * dt;
        let change = wanted.clamp(-max_change, max_change);
        if change == 0.0 {
            return;
        }
        let torque = change / (wheel.inv_inertia * dt);
        {
            let wheel = &mut self.bodies[joint.body_b.0];
            wheel.angular_velocity += change;
            wheel.wake();
        }
        if frame_inv_inertia > 0.0 {
            let frame = &mut self.bodies[joint.body_a.0];
            frame.angular_velocity -= torque * frame_inv_inertia * dt;
            frame.wake();
        }
    }

    /// Keep the two anchor points coincident: impulse at velocity level, then a positional bias.
    fn solve_pin(&mut self, joint: &WheelJoint) {
        let (a, b) = match (self.bodies.get(joint.body_a.0), self.bodies.get(joint.body_b.0)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        if !a.enabled || !b.enabled {
            return;
        }
        let ra = joint.local_anchor_a.rotated_z(a.angle);
        let rb = joint.local_anchor_b.rotated_z(b.angle);
        let vel_a = a.linear_velocity + cross_scalar(a.angular_velocity, ra);
        let vel_b = b.linear_velocity + cross_scalar(b.angular_velocity, rb);
        let rel = vel_b - vel_a;

        // K matrix for the point constraint
        let im = a.inv_mass + b.inv_mass;
        let k11 = im + a.inv_inertia * ra.y * ra.y + b.inv_inertia * rb.y * rb.y;
        let k12 = -a.inv_inertia * ra.x * ra.y - b.inv_inertia * rb.x * rb.y;
        let k22 = im + a.inv_inertia * ra.x * ra.x + b.inv_inertia * rb.x * rb.x;
        let det = k11 * k22 - k12 * k12;
        if det.abs() < 1e-9 {
            return;
        }
        let inv_det = 1.0 / det;
        let impulse = Vec2::new(
            -(k22 * rel.x - k12 * rel.y) * inv_det,
            -(k11 * rel.y - k12 * rel.x) * inv_det,
        );

        // positional bias pulls drifted anchors back together
        let separation = (b.position + rb) - (a.position + ra);
        let bias = separation * CORRECTION_FACTOR;

        let (ima, iia) = (a.inv_mass, a.inv_inertia);
        let (imb, iib) = (b.inv_mass, b.inv_inertia);
        {
            let body = &mut self.bodies[joint.body_a.0];
            body.linear_velocity -= impulse * ima;
            body.angular_velocity -= iia * cross2(ra, impulse);
            if !body.is_static() && !body.kinematic {
                body.position += bias * ima / im.max(1e-9);
            }
        }
        {
            let body = &mut self.bodies[joint.body_b.0];
            body.linear_velocity += impulse * imb;
            body.angular_velocity += iib * cross2(rb, impulse);
            if !body.is_static() && !body.kinematic {
                body.position -= bias * imb / im.max(1e-9);
            }
        }
    }

    fn solve_contacts(&mut self, contacts: &[ContactConstraint]) {
        for _ in 0..self.settings.velocity_iterations {
            for c in contacts {
                if !c.enabled || c.sensor {
                    continue;
                }
                self.solve_contact(c);
            }
        }
    }

    fn solve_contact(&mut self, c: &ContactConstraint) {
        let (a, b) = match (self.bodies.get(c.body_a.0), self.bodies.get(c.body_b.0)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        if a.at_rest && b.at_rest {
            return;
        }
        if (a.is_static() || a.kinematic || a.at_rest)
            && (b.is_static() || b.kinematic || b.at_rest)
        {
            return;
        }
        let fix_a = match a.fixtures.get(c.fixture_a) {
            Some(f) => f,
            None => return,
        };
        let fix_b = match b.fixtures.get(c.fixture_b) {
            Some(f) => f,
            None => return,
        };
        let friction = (fix_a.friction * fix_b.friction).sqrt();
        let restitution = fix_a.restitution.max(fix_b.restitution);

        let n = c.normal;
        let ra = c.point - a.position;
        let rb = c.point - b.position;
        let rel = (b.linear_velocity + cross_scalar(b.angular_velocity, rb))
            - (a.linear_velocity + cross_scalar(a.angular_velocity, ra));
        let vn = rel.dot(n);
        if vn >= 0.0 {
            return;
        }

        let ra_n = cross2(ra, n);
        let rb_n = cross2(rb, n);
        let k_normal = a.inv_mass + b.inv_mass
            + a.inv_inertia * ra_n * ra_n
            + b.inv_inertia * rb_n * rb_n;
        if k_normal < 1e-9 {
            return;
        }
        let jn = -(1.0 + restitution) * vn / k_normal;

        // friction along the tangent, clamped to the Coulomb cone
        let tangent = Vec2::new(-n.y, n.x);
        let vt = rel.dot(tangent);
        let ra_t = cross2(ra, tangent);
        let rb_t = cross2(rb, tangent);
        let k_tangent = a.inv_mass + b.inv_mass
            + a.inv_inertia * ra_t * ra_t
            + b.inv_inertia * rb_t * rb_t;
        let jt = if k_tangent > 1e-9 {
            (-vt / k_tangent).clamp(-friction * jn, friction * jn)
        } else {
            0.0
        };

        let impulse = n * jn + tangent * jt;
        let (ima, iia) = (a.inv_mass, a.inv_inertia);
        let (imb, iib) = (b.inv_mass, b.inv_inertia);
        let skip_a = a.at_rest || a.kinematic;
        let skip_b = b.at_rest || b.kinematic;
        if !skip_a {
            let body = &mut self.bodies[c.body_a.0];
            body.linear_velocity -= impulse * ima;
            body.angular_velocity -= iia * cross2(ra, impulse);
        }
        if !skip_b {
            let body = &mut self.bodies[c.body_b.0];
            body.linear_velocity += impulse * imb;
            body.angular_velocity += iib * cross2(rb, impulse);
        }
    }

    fn correct_positions(&mut self, contacts: &[ContactConstraint]) {
        for c in contacts {
            if !c.enabled || c.sensor {
                continue;
            }
            let (a, b) = match (self.bodies.get(c.body_a.0), self.bodies.get(c.body_b.0)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let correction = (c.depth - PENETRATION_SLOP).max(0.0) * CORRECTION_FACTOR;
            if correction <= 0.0 {
                continue;
            }
            let im = a.inv_mass + b.inv_mass;
            if im < 1e-9 {
                continue;
            }
            let shift = c.normal * (correction / im);
            let (ima, imb) = (a.inv_mass, b.inv_mass);
            let move_a = !(a.at_rest || a.kinematic || a.is_static());
            let move_b = !(b.at_rest || b.kinematic || b.is_static());
            if move_a {
                self.bodies[c.body_a.0].position -= shift * ima;
            }
            if move_b {
                self.bodies[c.body_b.0].position += shift * imb;
            }
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        for (_, body) in self.bodies.iter_mut() {
            if !body.enabled || body.at_rest || body.is_static() {
                continue;
            }
            body.position += body.linear_velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
    }

    fn update_at_rest(&mut self, dt: f32) {
        let settings = self.settings.clone();
        for (_, body) in self.bodies.iter_mut() {
            if !body.enabled || body.kinematic || body.is_static() || body.at_rest {
                continue;
            }
            let slow = body.linear_velocity.magnitude_squared()
                <= settings.at_rest_linear_tolerance * settings.at_rest_linear_tolerance
                && body.angular_velocity.abs() <= settings.at_rest_angular_tolerance;
            if slow {
                body.at_rest_time += dt;
                if body.at_rest_time >= settings.min_at_rest_time {
                    body.set_at_rest(true);
                }
            } else {
                body.at_rest_time = 0.0;
            }
        }
    }

    fn enforce_bounds(&mut self) {
        let bounds = match self.bounds {
            Some(b) => b,
            None => return,
        };
        for (key, body) in self.bodies.iter_mut() {
            if !body.enabled {
                continue;
            }
            if !body.aabb().collides_with_aabr(bounds) {
                trace!(body = key, "body left world bounds, disabling");
                body.enabled = false;
            }
        }
    }
}

fn cross2(a: Vec2<f32>, b: Vec2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar angular velocity with a vector: w x r.
fn cross_scalar(w: f32, r: Vec2<f32>) -> Vec2<f32> {
    Vec2::new(-w * r.y, w * r.x)
}


#[cfg(test)]
use crate::{fixture::Fixture, shape::Shape, body::MassKind};

#[cfg(test)]
fn dynamic_circle(x: f32, y: f32, radius: f32) -> Body {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Shape::circle(radius).unwrap()));
    body.set_mass_kind(MassKind::Normal);
    body.set_position(Vec2::new(x, y));
    body
}

#[test]
fn test_free_fall_integrates_gravity() {
    let mut world = World::new();
    let key = world.add_body(dynamic_circle(0.0, 10.0, 1.0));
    for _ in 0..60 {
        world.update(1.0 / 60.0, &mut NoHooks);
    }
    let body = world.body(key).unwrap();
    // about half a second squared of free fall, semi-implicit so a bit more than g/2
    assert!(body.position().y < 5.5, "y = {}", body.position().y);
    assert_eq!(body.position().x, 0.0);
}

#[test]
fn test_zero_dt_is_a_settle_pass() {
    let mut world = World::new();
    let key = world.add_body(dynamic_circle(0.0, 10.0, 1.0));
    world.update(0.0, &mut NoHooks);
    let body = world.body(key).unwrap();
    assert_eq!(body.position().y, 10.0);
    assert_eq!(body.linear_velocity(), Vec2::zero());
}

#[test]
fn test_double_remove_returns_false() {
    let mut world = World::new();
    let key = world.add_body(dynamic_circle(0.0, 0.0, 1.0));
    assert!(world.remove_body(key, true));
    assert!(!world.remove_body(key, true));
}

#[test]
fn test_resting_body_falls_asleep_on_platform() {
    let mut world = World::new();
    let mut platform = Body::new();
    platform.add_fixture(Fixture::new(Shape::rect(10.0, 0.5).unwrap()));
    platform.set_position(Vec2::new(0.0, -0.5));
    world.add_body(platform);
    let key = world.add_body(dynamic_circle(0.0, 1.01, 1.0));
    for _ in 0..240 {
        world.update(1.0 / 60.0, &mut NoHooks);
    }
    let body = world.body(key).unwrap();
    assert!(body.is_at_rest(), "vel = {:?}", body.linear_velocity());
    assert!(body.position().y > 0.0);
}

#[test]
fn test_contacts_retained_for_next_step() {
    let mut world = World::new();
    let mut platform = Body::new();
    platform.add_fixture(Fixture::new(Shape::rect(10.0, 0.5).unwrap()));
    world.add_body(platform);
    let key = world.add_body(dynamic_circle(0.0, 1.4, 1.0));
    for _ in 0..30 {
        world.update(1.0 / 60.0, &mut NoHooks);
    }
    assert!(world.contacts_touching(key).next().is_some());
}

#[test]
fn test_panicking_hook_does_not_abort_step() {
    struct Panicky;
    impl StepHooks for Panicky {
        fn step_begin(&mut self, _: &WorldView) {
            panic!("boom");
        }
    }
    let mut world = World::new();
    let key = world.add_body(dynamic_circle(0.0, 10.0, 1.0));
    world.update(1.0 / 60.0, &mut Panicky);
    // the step still integrated
    assert!(world.body(key).unwrap().position().y < 10.0);
}

#[test]
fn test_motor_spins_wheel_up_to_target() {
    let mut world = World::new();
    let mut frame = Body::new();
    frame.add_fixture(Fixture::new(Shape::rect(1.0, 0.25).unwrap()));
    let frame_key = world.add_body(frame);
    let wheel = dynamic_circle(0.0, -0.5, 0.5);
    let wheel_pos = wheel.position();
    let wheel_angle = wheel.angle();
    let wheel_key = world.add_body(wheel);
    let mut joint = WheelJoint::new(
        (frame_key, Vec2::zero(), 0.0),
        (wheel_key, wheel_pos, wheel_angle),
        wheel_pos,
        Vec2::unit_y(),
    );
    joint.set_motor_speed(10.0);
    world.add_joint(joint);
    for _ in 0..120 {
        world.update(1.0 / 60.0, &mut NoHooks);
    }
    let w = world.body(wheel_key).unwrap().angular_velocity();
    assert!((w - 10.0).abs() < 0.5, "angular velocity {}", w);
}

#[test]
fn test_joints_skip_disabled_bodies() {
    let mut world = World::new();
    let mut frame = Body::new();
    frame.add_fixture(Fixture::new(Shape::rect(1.0, 0.25).unwrap()));
    let frame_key = world.add_body(frame);
    let wheel = dynamic_circle(0.0, -0.5, 0.5);
    let wheel_pos = wheel.position();
    let wheel_angle = wheel.angle();
    let wheel_key = world.add_body(wheel);
    let mut joint = WheelJoint::new(
        (frame_key, Vec2::zero(), 0.0),
        (wheel_key, wheel_pos, wheel_angle),
        wheel_pos,
        Vec2::unit_y(),
    );
    joint.set_motor_speed(10.0);
    world.add_joint(joint);
    world.body_mut(wheel_key).unwrap().set_enabled(false);
    for _ in 0..60 {
        world.update(1.0 / 60.0, &mut NoHooks);
    }
    // neither the motor nor the pin touched the disabled wheel
    let wheel = world.body(wheel_key).unwrap();
    assert_eq!(wheel.angular_velocity(), 0.0);
    assert_eq!(wheel.position(), wheel_pos);
}

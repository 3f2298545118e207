//! The physics space: the simulation world plus everything the game layers on top of it.
//!
//! A `PhysicsSpace` owns a `rigid2d::World` and a control record per added body. The control
//! records carry the gameplay-level kind (rigid, kinematic, character, vehicle) and the optional
//! renderable the body drives. All character and vehicle semantics live here, implemented
//! through the world's step hooks; the world itself stays a plain rigid body simulation.
//!
//! The per-frame protocol, driven by the stepping orchestrator, is: `update` (control pass,
//! kind-specific upkeep), some number of `update_fixed` calls (actual simulation steps), then
//! `render_sync` (write transforms out to the renderables).

use crate::{
    body::{AttachError, BodyHandle, KindDef, PhysicsBody},
    character::{rising_relative_to, CharacterState, DownState},
    renderable::{same_renderable, RenderableRef},
    vehicle::VehicleState,
};
use rigid2d::{
    Body, BodyKey, ContactConstraint, StepHooks, WheelJoint, World, WorldView,
    DEFAULT_STEP_FREQUENCY,
};
use slab::Slab;
use std::collections::{HashMap, HashSet};
use vek::*;


/// Gameplay-level record for one added body.
pub(crate) struct Control {
    pub(crate) body: BodyKey,
    pub(crate) kind: Kind,
    pub(crate) renderable: Option<RenderableRef>,
}

pub(crate) enum Kind {
    Rigid,
    Kinematic,
    Character(CharacterState),
    Vehicle(VehicleState),
}

/// The simulation world wrapped with body kinds, renderable sync, and a speed multiplier.
pub struct PhysicsSpace {
    pub(crate) world: World,
    pub(crate) controls: Slab<Control>,
    /// Reverse lookup from simulation key to handle. Vehicle wheels map to the vehicle's handle.
    pub(crate) by_body: HashMap<BodyKey, BodyHandle>,
    pub(crate) speed: f32,
}

impl PhysicsSpace {
    pub fn new(gravity: Vec2<f32>) -> Self {
        Self::with_capacity(gravity, 16, 4)
    }

    /// Construct with initial body and joint capacity hints.
    pub fn with_capacity(gravity: Vec2<f32>, bodies: usize, joints: usize) -> Self {
        let mut world = World::with_capacity(bodies, joints);
        world.set_gravity(gravity);
        PhysicsSpace {
            world,
            controls: Slab::with_capacity(bodies),
            by_body: HashMap::with_capacity(bodies),
            speed: 1.0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn gravity(&self) -> Vec2<f32> {
        self.world.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2<f32>) {
        self.world.set_gravity(gravity);
    }

    pub fn set_bounds(&mut self, bounds: Option<Aabr<f32>>) {
        self.world.set_bounds(bounds);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Simulation speed multiplier. The orchestrator scales step time by it, and the at-rest
    /// timing threshold scales with it here so slow motion does not put bodies to sleep early
    /// in wall-clock terms.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
        self.world.settings_mut().min_at_rest_time = DEFAULT_STEP_FREQUENCY * self.speed;
    }

    pub fn body_count(&self) -> usize {
        self.controls.len()
    }

    /// Add a body to the space. A vehicle definition adds the chassis, both wheels, and both
    /// motorized joints in one call.
    ///
    /// Fails without modifying the space if the definition carries a renderable that is already
    /// attached to another body.
    pub fn add(&mut self, def: PhysicsBody) -> Result<BodyHandle, AttachError> {
        if let Some(renderable) = &def.renderable {
            self.check_unattached(renderable, None)?;
        }
        let PhysicsBody { kind, body, renderable } = def;
        let chassis_pos = body.position();
        let chassis_angle = body.angle();
        let key = self.world.add_body(body);

        let (kind, wheels) = match kind {
            KindDef::Rigid => (Kind::Rigid, None),
            KindDef::Kinematic => (Kind::Kinematic, None),
            KindDef::Character { one_way, classifier } => {
                (Kind::Character(CharacterState::new(one_way, classifier)), None)
            }
            KindDef::Vehicle(vd) => {
                let mut add_wheel = |wheel: Body| {
                    let pos = wheel.position();
                    let angle = wheel.angle();
                    let wheel_key = self.world.add_body(wheel);
                    let mut joint = WheelJoint::new(
                        (key, chassis_pos, chassis_angle),
                        (wheel_key, pos, angle),
                        pos,
                        vd.axis,
                    );
                    joint.set_max_motor_torque(vd.max_motor_torque);
                    (wheel_key, self.world.add_joint(joint))
                };
                let (rear, rear_joint) = add_wheel(vd.rear_wheel);
                let (front, front_joint) = add_wheel(vd.front_wheel);
                let state = VehicleState {
                    wheels: [rear, front],
                    joints: [rear_joint, front_joint],
                    speed: 0.0,
                    max_speed: vd.max_speed,
                    acceleration: vd.acceleration,
                    deceleration: vd.deceleration,
                };
                (Kind::Vehicle(state), Some([rear, front]))
            }
        };

        let handle = BodyHandle(self.controls.insert(Control {
            body: key,
            kind,
            renderable: renderable.clone(),
        }));
        self.by_body.insert(key, handle);
        if let Some(wheels) = wheels {
            for wheel in wheels {
                self.by_body.insert(wheel, handle);
            }
        }
        if let Some(renderable) = renderable {
            renderable.lock().set_driver(Some(handle));
        }
        debug!(?handle, "added body");
        Ok(handle)
    }

    /// Remove a body and everything that hangs off it: wheels and joints for a vehicle, the
    /// renderable attachment, and the reverse lookup entries. Returns false for a stale handle.
    ///
    /// When `notify` is set, bodies in contact with the removed one are woken so they re-settle.
    pub fn remove(&mut self, handle: BodyHandle, notify: bool) -> bool {
        if !self.controls.contains(handle.0) {
            return false;
        }
        let control = self.controls.remove(handle.0);
        self.world.remove_body(control.body, notify);
        self.by_body.remove(&control.body);
        if let Kind::Vehicle(state) = &control.kind {
            for wheel in state.wheels {
                self.world.remove_body(wheel, notify);
                self.by_body.remove(&wheel);
            }
            // joints referencing the wheels are already dropped by remove_body
        }
        if let Some(renderable) = &control.renderable {
            renderable.lock().set_driver(None);
        }
        debug!(?handle, "removed body");
        true
    }

    /// Per-frame control pass, run once per render frame before stepping. Disabled bodies are
    /// skipped entirely. Kind dispatch: kinematic bodies are forced gravity-free and at rest
    /// (they move only when game code repositions them), vehicles write their speed scalar
    /// into both wheel motors, rigid and character bodies need nothing.
    pub fn update(&mut self, _dt: f32) {
        for (_, control) in self.controls.iter() {
            match self.world.body(control.body) {
                Some(body) if body.is_enabled() => {}
                _ => continue,
            }
            match &control.kind {
                Kind::Kinematic => {
                    if let Some(body) = self.world.body_mut(control.body) {
                        body.set_gravity_scale(0.0);
                        body.set_at_rest(true);
                    }
                }
                Kind::Vehicle(state) => {
                    for joint_key in state.joints {
                        if let Some(joint) = self.world.joint_mut(joint_key) {
                            // rolling in +x means clockwise wheel spin
                            joint.set_motor_speed(-state.speed);
                        }
                    }
                }
                Kind::Rigid | Kind::Character(_) => {}
            }
        }
    }

    /// Advance the simulation by one step of `dt` seconds. Character flags and one-way
    /// suppression are computed inside the step through the world's hooks. A `dt` of zero is a
    /// settle pass.
    pub fn update_fixed(&mut self, dt: f32) {
        let character_keys = self
            .controls
            .iter()
            .filter(|(_, c)| matches!(c.kind, Kind::Character(_)))
            .map(|(_, c)| c.body)
            .collect::<HashSet<_>>();
        let mut hooks = SpaceHooks {
            controls: &mut self.controls,
            by_body: &self.by_body,
            character_keys,
        };
        self.world.update(dt, &mut hooks);
    }

    /// Copy body transforms out to the attached renderables: X and Y translation and the Z
    /// rotation angle. The renderable's Z translation is its render depth and is preserved.
    /// Disabled bodies are fully inert, transform sync included.
    pub fn render_sync(&self) {
        for (_, control) in self.controls.iter() {
            let renderable = match &control.renderable {
                Some(r) => r,
                None => continue,
            };
            let body = match self.world.body(control.body) {
                Some(b) if b.is_enabled() => b,
                _ => continue,
            };
            let mut guard = renderable.lock();
            let z = guard.local_translation().z;
            guard.set_local_translation(Vec3::new(body.position().x, body.position().y, z));
            guard.set_local_rotation_z(body.angle());
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        let control = self.controls.get(handle.0)?;
        self.world.body(control.body)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let control = self.controls.get(handle.0)?;
        self.world.body_mut(control.body)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.controls.iter().filter_map(|(k, control)| {
            self.world.body(control.body).map(|b| (BodyHandle(k), b))
        })
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2<f32>> {
        self.body(handle).map(|b| b.position())
    }

    /// Teleport a body. Momentum and accumulated forces are cleared so the body does not carry
    /// them to the new location.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2<f32>) {
        if let Some(body) = self.body_mut(handle) {
            body.set_position(position);
            body.clear_forces();
        }
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2<f32>) {
        if let Some(body) = self.body_mut(handle) {
            body.set_linear_velocity(velocity);
        }
    }

    /// Gate a body's participation in simulation and transform sync. A vehicle's wheels are
    /// gated together with the chassis, and its wheel motors are parked on disable; the drive
    /// scalar is kept, so re-enabling restores the motors on the next control pass.
    pub fn set_physics_enabled(&mut self, handle: BodyHandle, enabled: bool) {
        let control = match self.controls.get(handle.0) {
            Some(c) => c,
            None => return,
        };
        if let Some(body) = self.world.body_mut(control.body) {
            body.set_enabled(enabled);
        }
        if let Kind::Vehicle(state) = &control.kind {
            for wheel in state.wheels {
                if let Some(body) = self.world.body_mut(wheel) {
                    body.set_enabled(enabled);
                }
            }
            if !enabled {
                for joint_key in state.joints {
                    if let Some(joint) = self.world.joint_mut(joint_key) {
                        joint.set_motor_speed(0.0);
                    }
                }
            }
        }
    }

    pub fn clear_forces(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle) {
            body.clear_forces();
        }
    }

    pub fn joints(&self) -> impl Iterator<Item = (rigid2d::JointKey, &WheelJoint)> + '_ {
        self.world.joints()
    }

    /// Pass-through joint insertion, for assemblies built outside the vehicle path.
    pub fn add_joint(&mut self, joint: WheelJoint) -> rigid2d::JointKey {
        self.world.add_joint(joint)
    }

    /// Remove a joint. Returns false if it was not present.
    pub fn remove_joint(&mut self, key: rigid2d::JointKey) -> bool {
        self.world.remove_joint(key)
    }

    /// Attach a renderable to a body, or detach with `None`. The pairing is exclusive on both
    /// sides: attaching a renderable that another body drives fails, and so does attaching to a
    /// body that already drives a different renderable, without changing anything. Re-attaching
    /// the body's current renderable is a no-op success; detach first to swap.
    pub fn set_renderable(
        &mut self,
        handle: BodyHandle,
        renderable: Option<RenderableRef>,
    ) -> Result<(), AttachError> {
        if !self.controls.contains(handle.0) {
            return Err(AttachError::NoSuchBody);
        }
        if let Some(renderable) = &renderable {
            self.check_unattached(renderable, Some(handle))?;
        }
        let control = &mut self.controls[handle.0];
        if let (Some(existing), Some(new)) = (&control.renderable, &renderable) {
            if !same_renderable(existing, new) {
                return Err(AttachError::BodyAlreadyDriving);
            }
        }
        if let Some(old) = control.renderable.take() {
            old.lock().set_driver(None);
        }
        if let Some(renderable) = renderable {
            renderable.lock().set_driver(Some(handle));
            control.renderable = Some(renderable);
        }
        Ok(())
    }

    pub fn renderable(&self, handle: BodyHandle) -> Option<RenderableRef> {
        self.controls.get(handle.0)?.renderable.clone()
    }

    fn check_unattached(
        &self,
        renderable: &RenderableRef,
        exclude: Option<BodyHandle>,
    ) -> Result<(), AttachError> {
        for (k, control) in self.controls.iter() {
            if exclude == Some(BodyHandle(k)) {
                continue;
            }
            if let Some(existing) = &control.renderable {
                if same_renderable(existing, renderable) {
                    return Err(AttachError::AlreadyAttached(BodyHandle(k)));
                }
            }
        }
        Ok(())
    }

    // character operations

    pub fn is_on_ground(&self, handle: BodyHandle) -> bool {
        self.character(handle).map(|s| s.on_ground).unwrap_or(false)
    }

    pub fn is_on_ceiling(&self, handle: BodyHandle) -> bool {
        self.character(handle).map(|s| s.on_ceiling).unwrap_or(false)
    }

    pub fn is_on_wall(&self, handle: BodyHandle) -> bool {
        self.character(handle).map(|s| s.on_wall).unwrap_or(false)
    }

    /// Request a drop through the platform currently underfoot. At most one platform is
    /// selected per request; the request stays armed until a supporting contact consumes it.
    pub fn apply_down(&mut self, handle: BodyHandle) {
        let control = match self.controls.get_mut(handle.0) {
            Some(c) => c,
            None => return,
        };
        if let Kind::Character(state) = &mut control.kind {
            state.down = DownState::Requested;
            // a resting character must integrate again to actually fall
            if let Some(body) = self.world.body_mut(control.body) {
                body.wake();
            }
        }
    }

    fn character(&self, handle: BodyHandle) -> Option<&CharacterState> {
        match &self.controls.get(handle.0)?.kind {
            Kind::Character(state) => Some(state),
            _ => None,
        }
    }

    // vehicle operations

    pub fn vehicle_forward(&mut self, handle: BodyHandle) {
        if let Some(state) = self.vehicle_mut(handle) {
            state.forward();
        }
    }

    pub fn vehicle_reverse(&mut self, handle: BodyHandle) {
        if let Some(state) = self.vehicle_mut(handle) {
            state.reverse();
        }
    }

    pub fn vehicle_brake(&mut self, handle: BodyHandle) {
        if let Some(state) = self.vehicle_mut(handle) {
            state.brake();
        }
    }

    pub fn vehicle_speed(&self, handle: BodyHandle) -> Option<f32> {
        match &self.controls.get(handle.0)?.kind {
            Kind::Vehicle(state) => Some(state.speed()),
            _ => None,
        }
    }

    fn vehicle_mut(&mut self, handle: BodyHandle) -> Option<&mut VehicleState> {
        match &mut self.controls.get_mut(handle.0)?.kind {
            Kind::Vehicle(state) => Some(state),
            _ => None,
        }
    }
}

/// Hook implementation bridging the world's step into the space's character semantics.
struct SpaceHooks<'a> {
    controls: &'a mut Slab<Control>,
    by_body: &'a HashMap<BodyKey, BodyHandle>,
    /// Simulation keys of character bodies, frozen for the step. Character-character contacts
    /// get neither one-way handling nor classification.
    character_keys: HashSet<BodyKey>,
}

impl<'a> SpaceHooks<'a> {
    /// Run one-way suppression and surface classification for one side of a contact, if that
    /// side is a character against a non-character.
    fn character_contact(
        &mut self,
        char_key: BodyKey,
        other_key: BodyKey,
        contact: &mut ContactConstraint,
        view: &WorldView,
    ) {
        if !self.character_keys.contains(&char_key) || self.character_keys.contains(&other_key) {
            return;
        }
        let handle = match self.by_body.get(&char_key) {
            Some(h) => *h,
            None => return,
        };
        let state = match self.controls.get_mut(handle.0).map(|c| &mut c.kind) {
            Some(Kind::Character(state)) => state,
            _ => return,
        };
        let (char_body, other_body) = match (view.body(char_key), view.body(other_key)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        let char_aabb = view.aabb(char_key);
        let other_aabb = view.aabb(other_key);
        let diff = other_body.position() - char_body.position();

        if state.deactivatable(other_key, other_body) {
            // pass or support is decided the first step the pair touches and then carried by
            // the retained contact for as long as the overlap lasts, so a landing whose
            // first-step penetration is deep does not flip into a pass-through
            let prior = view
                .contacts_touching(char_key)
                .find(|c| !c.sensor && c.other(char_key) == Some(other_key))
                .map(|c| c.enabled);
            let supported = match prior {
                Some(enabled) => enabled,
                None => !rising_relative_to(char_body, other_body),
            };
            if !supported {
                // jumping up through a one-way platform
                contact.enabled = false;
            }
            if state.down == DownState::Requested
                && supported
                && state.classifier.on_ground(char_aabb, other_aabb, diff)
            {
                // dropping down through the platform underfoot
                contact.enabled = false;
                state.down = DownState::Dropping(other_key);
            } else if state.down == DownState::Dropping(other_key) {
                // mid-drop, still overlapping the chosen platform
                contact.enabled = false;
            }
        }
        if !contact.enabled {
            return;
        }

        state.on_ground = state.classifier.on_ground(char_aabb, other_aabb, diff);
        state.on_ceiling = state.classifier.on_ceiling(char_aabb, other_aabb, diff);
        state.on_wall = state.classifier.on_wall(char_aabb, other_aabb, diff);
    }
}

impl<'a> StepHooks for SpaceHooks<'a> {
    fn step_begin(&mut self, view: &WorldView) {
        for (_, control) in self.controls.iter_mut() {
            let state = match &mut control.kind {
                Kind::Character(state) => state,
                _ => continue,
            };
            // flags decay the moment no qualifying contact remains; while one does, they
            // persist and this step's classification overwrites them
            let supported = view.contacts_touching(control.body).any(|c| {
                c.enabled
                    && !c.sensor
                    && c.other(control.body)
                        .map(|o| !self.character_keys.contains(&o))
                        .unwrap_or(false)
            });
            if !supported {
                state.clear_flags();
            }
            if let DownState::Dropping(platform) = state.down {
                // the drop ends once the pair separates; the next touch gets a fresh
                // decision. a vanished platform also ends the drop
                let ended = view.body(platform).is_none()
                    || !view.aabb(control.body).collides_with_aabr(view.aabb(platform));
                if ended {
                    state.down = DownState::Idle;
                }
            }
        }
    }

    fn on_contact(&mut self, contact: &mut ContactConstraint, view: &WorldView) {
        if contact.sensor {
            return;
        }
        let (a, b) = (contact.body_a, contact.body_b);
        self.character_contact(a, b, contact, view);
        self.character_contact(b, a, contact, view);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::VehicleDef;
    use crate::renderable::DetachedTransform;
    use rigid2d::{Fixture, MassKind, Shape};

    fn space() -> PhysicsSpace {
        PhysicsSpace::new(Vec2::new(0.0, -9.8))
    }

    fn platform(space: &mut PhysicsSpace, y: f32, half_height: f32) -> BodyHandle {
        space
            .add(
                PhysicsBody::rigid()
                    .mass_kind(MassKind::Infinite)
                    .position(Vec2::new(0.0, y))
                    .fixture(Fixture::new(Shape::rect(10.0, half_height).unwrap())),
            )
            .unwrap()
    }

    fn character_above(space: &mut PhysicsSpace, y: f32) -> BodyHandle {
        space
            .add(
                PhysicsBody::character()
                    .position(Vec2::new(0.0, y))
                    .fixture(Fixture::new(Shape::rect(0.4, 0.9).unwrap())),
            )
            .unwrap()
    }

    /// Drive the space the way the orchestrator does: control pass, step, sync.
    fn frame(space: &mut PhysicsSpace, dt: f32) {
        space.update(dt);
        space.update_fixed(dt);
        space.render_sync();
    }

    fn frames(space: &mut PhysicsSpace, steps: u32) {
        for _ in 0..steps {
            frame(space, 1.0 / 60.0);
        }
    }

    #[test]
    fn test_render_sync_preserves_depth() {
        let mut space = space();
        let renderable = DetachedTransform::at(Vec3::new(0.0, 0.0, 7.5));
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(3.0, 10.0))
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap();
        frames(&mut space, 10);
        let t = renderable.lock().local_translation();
        assert_eq!(t.x, 3.0);
        assert!(t.y < 10.0);
        assert_eq!(t.z, 7.5);
        assert_eq!(
            renderable.lock().local_rotation_z(),
            space.body(handle).unwrap().angle(),
        );
    }

    #[test]
    fn test_disabled_body_is_inert() {
        let mut space = space();
        let renderable = DetachedTransform::at(Vec3::new(0.0, 10.0, 2.0));
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(0.0, 10.0))
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap();
        space.set_physics_enabled(handle, false);
        frames(&mut space, 30);
        let t = renderable.lock().local_translation();
        assert_eq!(t, Vec3::new(0.0, 10.0, 2.0));
    }

    #[test]
    fn test_attachment_is_exclusive() {
        let mut space = space();
        let renderable = DetachedTransform::at(Vec3::zero());
        let first = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap();
        let err = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap_err();
        assert!(matches!(err, AttachError::AlreadyAttached(h) if h == first));
        // the failed add left nothing behind
        assert_eq!(space.body_count(), 1);
    }

    #[test]
    fn test_attachment_is_exclusive_body_side() {
        let mut space = space();
        let first = DetachedTransform::at(Vec3::zero());
        let second = DetachedTransform::at(Vec3::zero());
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(first.clone()),
            )
            .unwrap();
        let err = space.set_renderable(handle, Some(second.clone())).unwrap_err();
        assert!(matches!(err, AttachError::BodyAlreadyDriving));
        // the original attachment is untouched
        assert!(same_renderable(&space.renderable(handle).unwrap(), &first));
        // detaching first makes the swap legal
        space.set_renderable(handle, None).unwrap();
        space.set_renderable(handle, Some(second.clone())).unwrap();
        assert!(same_renderable(&space.renderable(handle).unwrap(), &second));
    }

    #[test]
    fn test_reattach_after_detach() {
        let mut space = space();
        let renderable = DetachedTransform::at(Vec3::zero());
        let first = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap();
        let second = space
            .add(PhysicsBody::rigid().fixture(Fixture::new(Shape::circle(1.0).unwrap())))
            .unwrap();
        // re-attaching the current renderable is fine
        space.set_renderable(first, Some(renderable.clone())).unwrap();
        space.set_renderable(first, None).unwrap();
        space.set_renderable(second, Some(renderable.clone())).unwrap();
        assert!(space.renderable(first).is_none());
        assert!(space.renderable(second).is_some());
    }

    #[test]
    fn test_remove_detaches_renderable() {
        let mut space = space();
        let renderable = DetachedTransform::at(Vec3::zero());
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable.clone()),
            )
            .unwrap();
        assert!(space.remove(handle, true));
        assert!(!space.remove(handle, true));
        // freed for another body
        let other = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap()))
                    .renderable(renderable),
            )
            .unwrap();
        assert!(space.renderable(other).is_some());
    }

    #[test]
    fn test_character_lands_and_reports_ground() {
        let mut space = space();
        platform(&mut space, -0.5, 0.5);
        let who = character_above(&mut space, 1.5);
        frames(&mut space, 120);
        assert!(space.is_on_ground(who));
        assert!(!space.is_on_ceiling(who));
        // came to rest on top, not inside or below
        assert!(space.position(who).unwrap().y > 0.8, "y = {}", space.position(who).unwrap().y);
    }

    #[test]
    fn test_fast_landing_does_not_tunnel() {
        // first-step penetration well past the classification epsilon
        let mut space = space();
        platform(&mut space, -0.5, 0.5);
        let who = space
            .add(
                PhysicsBody::character()
                    .position(Vec2::new(0.0, 3.0))
                    .fixture(Fixture::new(Shape::rect(0.4, 0.9).unwrap()))
                    .linear_velocity(Vec2::new(0.0, -12.0)),
            )
            .unwrap();
        frames(&mut space, 120);
        assert!(space.is_on_ground(who));
        assert!(space.position(who).unwrap().y > 0.8, "y = {}", space.position(who).unwrap().y);
    }

    #[test]
    fn test_ground_flag_decays_after_leaving_ground() {
        let mut space = space();
        platform(&mut space, -0.5, 0.5);
        let who = character_above(&mut space, 1.5);
        frames(&mut space, 120);
        assert!(space.is_on_ground(who));
        space.set_position(who, Vec2::new(0.0, 50.0));
        // one step to retire the stale retained contacts, one for the begin-phase clear
        frames(&mut space, 2);
        assert!(!space.is_on_ground(who));
    }

    #[test]
    fn test_apply_down_drops_through_platform() {
        let mut space = space();
        platform(&mut space, -0.5, 0.5);
        let who = character_above(&mut space, 1.5);
        frames(&mut space, 120);
        assert!(space.is_on_ground(who));
        space.apply_down(who);
        frames(&mut space, 90);
        // the character fell through and kept falling
        assert!(space.position(who).unwrap().y < -2.0);
    }

    #[test]
    fn test_drop_through_does_not_carry_to_next_platform() {
        let mut space = space();
        platform(&mut space, 3.0, 0.1);
        platform(&mut space, -0.5, 0.5);
        let who = character_above(&mut space, 4.2);
        frames(&mut space, 120);
        assert!(space.is_on_ground(who));
        assert!(space.position(who).unwrap().y > 3.0);
        space.apply_down(who);
        frames(&mut space, 180);
        // fell through the upper platform only; the consumed gesture does not
        // suppress the floor below
        let y = space.position(who).unwrap().y;
        assert!(y < 2.0, "y = {}", y);
        assert!(y > 0.0, "y = {}", y);
        assert!(space.is_on_ground(who));
    }

    #[test]
    fn test_one_way_platform_passable_from_below() {
        let mut space = space();
        platform(&mut space, 3.0, 0.1);
        let who = space
            .add(
                PhysicsBody::character()
                    .position(Vec2::new(0.0, 0.0))
                    .fixture(Fixture::new(Shape::rect(0.4, 0.9).unwrap()))
                    .linear_velocity(Vec2::new(0.0, 14.0)),
            )
            .unwrap();
        let mut peak = 0.0f32;
        for _ in 0..50 {
            frame(&mut space, 1.0 / 60.0);
            peak = peak.max(space.position(who).unwrap().y);
        }
        // rose past the platform instead of bouncing off its underside
        assert!(peak > 3.2, "peak = {}", peak);
    }

    #[test]
    fn test_one_way_policy_blocks_drop() {
        let mut space = space();
        let floor = platform(&mut space, -0.5, 0.5);
        let floor_key = space.controls[floor.0].body;
        let who = space
            .add(
                PhysicsBody::character()
                    .position(Vec2::new(0.0, 1.5))
                    .fixture(Fixture::new(Shape::rect(0.4, 0.9).unwrap()))
                    .one_way(Box::new(move |key, _| key != floor_key)),
            )
            .unwrap();
        frames(&mut space, 120);
        space.apply_down(who);
        frames(&mut space, 60);
        // the policy exempts the floor, so the character stays on it
        assert!(space.position(who).unwrap().y > 0.0);
    }

    #[test]
    fn test_kinematic_invariant_holds_every_frame() {
        let mut space = space();
        let who = space
            .add(
                PhysicsBody::kinematic()
                    .position(Vec2::new(0.0, 5.0))
                    .fixture(Fixture::new(Shape::rect(0.5, 0.5).unwrap())),
            )
            .unwrap();
        // even if game code pokes at the body, the control pass restores the invariant
        space.body_mut(who).unwrap().set_gravity_scale(1.0);
        space.body_mut(who).unwrap().wake();
        frame(&mut space, 1.0 / 60.0);
        let body = space.body(who).unwrap();
        assert_eq!(body.gravity_scale(), 0.0);
        assert!(body.is_at_rest());
        assert_eq!(body.position(), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_kinematic_moves_only_by_repositioning() {
        let mut space = space();
        platform(&mut space, -0.5, 0.5);
        let who = space
            .add(
                PhysicsBody::kinematic()
                    .position(Vec2::new(0.0, 5.0))
                    .fixture(Fixture::new(Shape::rect(0.5, 0.5).unwrap())),
            )
            .unwrap();
        frames(&mut space, 60);
        assert_eq!(space.position(who).unwrap(), Vec2::new(0.0, 5.0));
        space.set_position(who, Vec2::new(2.0, 4.0));
        frames(&mut space, 10);
        assert_eq!(space.position(who).unwrap(), Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_vehicle_assembly_and_removal() {
        let mut space = space();
        let mut rear = Body::new();
        rear.add_fixture(Fixture::new(Shape::circle(0.5).unwrap()));
        rear.set_mass_kind(MassKind::Normal);
        rear.set_position(Vec2::new(-1.0, -0.5));
        let mut front = rear.clone();
        front.set_position(Vec2::new(1.0, -0.5));
        let handle = space
            .add(
                PhysicsBody::vehicle(VehicleDef::new(rear, front))
                    .fixture(Fixture::new(Shape::rect(1.5, 0.3).unwrap())),
            )
            .unwrap();
        assert_eq!(space.world.body_count(), 3);
        assert_eq!(space.world.joint_count(), 2);
        assert!(space.remove(handle, true));
        assert_eq!(space.world.body_count(), 0);
        assert_eq!(space.world.joint_count(), 0);
    }

    #[test]
    fn test_vehicle_speed_drives_wheel_motors() {
        let mut space = space();
        platform(&mut space, -1.0, 0.5);
        let mut rear = Body::new();
        rear.add_fixture(Fixture::new(Shape::circle(0.4).unwrap()));
        rear.set_mass_kind(MassKind::Normal);
        rear.set_position(Vec2::new(-1.0, 0.0));
        let mut front = rear.clone();
        front.set_position(Vec2::new(1.0, 0.0));
        let handle = space
            .add(
                PhysicsBody::vehicle(VehicleDef::new(rear, front).max_speed(20.0))
                    .position(Vec2::new(0.0, 0.5))
                    .fixture(Fixture::new(Shape::rect(1.5, 0.2).unwrap())),
            )
            .unwrap();
        for _ in 0..10 {
            space.vehicle_forward(handle);
        }
        let target = space.vehicle_speed(handle).unwrap();
        assert!(target > 0.0);
        frame(&mut space, 1.0 / 60.0);
        let state = match &space.controls[handle.0].kind {
            Kind::Vehicle(state) => state,
            _ => unreachable!(),
        };
        for joint_key in state.joints {
            assert_eq!(space.world.joint(joint_key).unwrap().motor_speed(), -target);
        }
    }

    #[test]
    fn test_disabled_vehicle_is_fully_inert() {
        let mut space = space();
        platform(&mut space, -1.0, 0.5);
        let mut rear = Body::new();
        rear.add_fixture(Fixture::new(Shape::circle(0.4).unwrap()));
        rear.set_mass_kind(MassKind::Normal);
        rear.set_position(Vec2::new(-1.0, 0.0));
        let mut front = rear.clone();
        front.set_position(Vec2::new(1.0, 0.0));
        let handle = space
            .add(
                PhysicsBody::vehicle(VehicleDef::new(rear, front))
                    .position(Vec2::new(0.0, 0.5))
                    .fixture(Fixture::new(Shape::rect(1.5, 0.2).unwrap())),
            )
            .unwrap();
        for _ in 0..10 {
            space.vehicle_forward(handle);
        }
        frame(&mut space, 1.0 / 60.0);
        space.set_physics_enabled(handle, false);
        space.update(1.0 / 60.0);
        let (wheels, joints) = match &space.controls[handle.0].kind {
            Kind::Vehicle(state) => (state.wheels, state.joints),
            _ => unreachable!(),
        };
        for joint_key in joints {
            // motors parked on disable and the control pass no longer drives them
            assert_eq!(space.world.joint(joint_key).unwrap().motor_speed(), 0.0);
        }
        for wheel in wheels {
            assert!(!space.world.body(wheel).unwrap().is_enabled());
        }
        let chassis = space.position(handle).unwrap();
        let wheel_pos = space.world.body(wheels[0]).unwrap().position();
        frames(&mut space, 30);
        assert_eq!(space.position(handle).unwrap(), chassis);
        assert_eq!(space.world.body(wheels[0]).unwrap().position(), wheel_pos);
    }

    #[test]
    fn test_set_speed_scales_at_rest_threshold() {
        let mut space = space();
        space.set_speed(0.5);
        assert_eq!(space.speed(), 0.5);
        assert_eq!(
            space.world.settings().min_at_rest_time,
            DEFAULT_STEP_FREQUENCY * 0.5,
        );
    }

    #[test]
    fn test_teleport_clears_momentum() {
        let mut space = space();
        let who = space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(0.0, 10.0))
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap())),
            )
            .unwrap();
        frames(&mut space, 30);
        space.set_position(who, Vec2::new(5.0, 5.0));
        let body = space.body(who).unwrap();
        assert_eq!(body.position(), Vec2::new(5.0, 5.0));
        assert_eq!(body.linear_velocity(), Vec2::zero());
    }
}

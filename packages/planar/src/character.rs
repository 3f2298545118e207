//! Character surface classification.
//!
//! A dynamics world reports only generic, symmetric contact constraints. "Am I standing on
//! something" is an asymmetric, gameplay-level fact that has to be reconstructed from raw
//! geometry every step, because a resting contact carries no semantic tag of its own. The space
//! runs the logic here from its step hooks; this module owns the per-character state and the
//! pluggable classification rules.

use rigid2d::{Body, BodyKey};
use vek::*;


/// Epsilon for the edge-alignment tests, in simulation units.
pub const CLASSIFY_EPSILON: f32 = 0.01;

/// Decides whether a contact against a platform represents standing on it, bumping one's head
/// on it, or brushing its side. All three checks are independent and run per qualifying contact.
///
/// `character` and `platform` are world AABBs; `diff` is the platform position minus the
/// character position.
pub trait SurfaceClassifier: Send {
    fn on_ground(&self, character: Aabr<f32>, platform: Aabr<f32>, diff: Vec2<f32>) -> bool;

    fn on_ceiling(&self, character: Aabr<f32>, platform: Aabr<f32>, diff: Vec2<f32>) -> bool;

    fn on_wall(&self, character: Aabr<f32>, platform: Aabr<f32>, diff: Vec2<f32>) -> bool;
}

/// Default classifier: compares bounding-box edges with a small epsilon.
pub struct EdgeClassifier;

impl EdgeClassifier {
    fn ground_edges_touch(character: Aabr<f32>, platform: Aabr<f32>) -> bool {
        (character.min.y - platform.max.y).abs() <= CLASSIFY_EPSILON
    }

    fn ceiling_edges_touch(character: Aabr<f32>, platform: Aabr<f32>) -> bool {
        (platform.min.y - character.max.y).abs() <= CLASSIFY_EPSILON
    }
}

impl SurfaceClassifier for EdgeClassifier {
    /// The platform lies below the character and the character's feet sit on its top edge.
    fn on_ground(&self, character: Aabr<f32>, platform: Aabr<f32>, diff: Vec2<f32>) -> bool {
        diff.y < 0.0 && Self::ground_edges_touch(character, platform)
    }

    /// The platform lies at or above the character and its underside meets the character's head.
    fn on_ceiling(&self, character: Aabr<f32>, platform: Aabr<f32>, diff: Vec2<f32>) -> bool {
        diff.y >= 0.0 && Self::ceiling_edges_touch(character, platform)
    }

    /// Anything that is not a clean top or bottom edge overlap counts as a side contact.
    fn on_wall(&self, character: Aabr<f32>, platform: Aabr<f32>, _diff: Vec2<f32>) -> bool {
        !Self::ground_edges_touch(character, platform)
            && !Self::ceiling_edges_touch(character, platform)
    }
}

/// Policy deciding which bodies a character may pass through one-way. The default treats every
/// non-character body as a one-way candidate.
pub type OneWayPolicy = Box<dyn Fn(BodyKey, &Body) -> bool + Send>;

/// The drop-through gesture latch. Consumed by at most one platform per `apply_down` activation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DownState {
    #[default]
    Idle,
    /// `apply_down` was called and no contact has consumed it yet.
    Requested,
    /// The gesture picked this platform; its contacts stay suppressed until the pair
    /// separates. Other platforms are unaffected until a fresh `apply_down`.
    Dropping(BodyKey),
}

/// Per-character runtime state owned by the space.
pub struct CharacterState {
    pub(crate) on_ground: bool,
    pub(crate) on_ceiling: bool,
    pub(crate) on_wall: bool,
    pub(crate) down: DownState,
    pub(crate) one_way: Option<OneWayPolicy>,
    pub(crate) classifier: Box<dyn SurfaceClassifier>,
}

impl CharacterState {
    pub(crate) fn new(
        one_way: Option<OneWayPolicy>,
        classifier: Option<Box<dyn SurfaceClassifier>>,
    ) -> Self {
        CharacterState {
            on_ground: false,
            on_ceiling: false,
            on_wall: false,
            down: DownState::Idle,
            one_way,
            classifier: classifier.unwrap_or_else(|| Box::new(EdgeClassifier)),
        }
    }

    pub(crate) fn clear_flags(&mut self) {
        self.on_ground = false;
        self.on_ceiling = false;
        self.on_wall = false;
    }

    pub(crate) fn deactivatable(&self, key: BodyKey, body: &Body) -> bool {
        match &self.one_way {
            Some(policy) => policy(key, body),
            None => true,
        }
    }
}

/// Whether the character is moving upward relative to the platform, the one-way pass-through
/// condition evaluated on the first step a contact pair touches. The decision is then carried
/// by the retained contact while the overlap lasts, so it cannot flip mid-pass: a landing stays
/// a landing however deep the first-step penetration, and a jump from below stays a pass even
/// as the character slows inside the platform.
///
/// Compares vertical velocities only, which assumes axis-aligned platforms; rotated one-way
/// platforms would need a projection along the contact normal instead.
pub fn rising_relative_to(character: &Body, platform: &Body) -> bool {
    character.linear_velocity().y - platform.linear_velocity().y > 0.0
}


#[test]
fn test_default_classifier_ground() {
    let character = Aabr { min: Vec2::new(-0.5, 1.0), max: Vec2::new(0.5, 2.0) };
    let platform = Aabr { min: Vec2::new(-5.0, 0.0), max: Vec2::new(5.0, 1.005) };
    let diff = Vec2::new(0.0, -1.0);
    let c = EdgeClassifier;
    assert!(c.on_ground(character, platform, diff));
    assert!(!c.on_ceiling(character, platform, diff));
    assert!(!c.on_wall(character, platform, diff));
}

#[test]
fn test_default_classifier_ceiling() {
    let character = Aabr { min: Vec2::new(-0.5, 0.0), max: Vec2::new(0.5, 1.0) };
    let platform = Aabr { min: Vec2::new(-5.0, 1.004), max: Vec2::new(5.0, 2.0) };
    let diff = Vec2::new(0.0, 1.5);
    let c = EdgeClassifier;
    assert!(c.on_ceiling(character, platform, diff));
    assert!(!c.on_ground(character, platform, diff));
    assert!(!c.on_wall(character, platform, diff));
}

#[test]
fn test_default_classifier_wall() {
    // side contact: vertical edges meet, horizontal edges are far apart
    let character = Aabr { min: Vec2::new(-0.5, 0.0), max: Vec2::new(0.5, 1.0) };
    let platform = Aabr { min: Vec2::new(0.49, -3.0), max: Vec2::new(4.0, 4.0) };
    let diff = Vec2::new(2.0, 0.0);
    let c = EdgeClassifier;
    assert!(c.on_wall(character, platform, diff));
    assert!(!c.on_ground(character, platform, diff));
}

#[test]
fn test_one_way_pass_needs_upward_relative_motion() {
    let mut character = Body::new();
    let platform = Body::new();
    // jumping up through: pass
    character.set_linear_velocity(Vec2::new(0.0, 5.0));
    assert!(rising_relative_to(&character, &platform));
    // falling onto it: supported
    character.set_linear_velocity(Vec2::new(0.0, -5.0));
    assert!(!rising_relative_to(&character, &platform));
    // resting: supported
    character.set_linear_velocity(Vec2::zero());
    assert!(!rising_relative_to(&character, &platform));
}

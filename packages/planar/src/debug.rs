//! Debug visualization surface.
//!
//! A `DebugSession` snapshots renderable outlines of every body in a space so a debug renderer
//! can draw them without holding the space lock. Entries are addressed by generational keys:
//! a key minted for a body stops resolving once that body is gone, even if its slot is later
//! reused, so a renderer can cache keys across frames without drawing ghosts.

use crate::{body::BodyHandle, space::PhysicsSpace};
use std::collections::HashMap;
use vek::*;


/// Generational key into a `DebugSession`. Stale keys resolve to nothing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DebugKey {
    index: usize,
    generation: u64,
}

/// Drawable snapshot of one body.
#[derive(Debug, Clone)]
pub struct DebugShape {
    pub handle: BodyHandle,
    pub position: Vec2<f32>,
    pub angle: f32,
    /// World-space outline loops, one per drawable fixture.
    pub outlines: Vec<Vec<Vec2<f32>>>,
    pub at_rest: bool,
    pub enabled: bool,
}

struct Slot {
    generation: u64,
    entry: Option<DebugShape>,
}

/// Arena of debug shapes, refreshed once per frame from a space.
#[derive(Default)]
pub struct DebugSession {
    slots: Vec<Slot>,
    by_handle: HashMap<BodyHandle, usize>,
}

impl Default for Slot {
    fn default() -> Self {
        Slot { generation: 0, entry: None }
    }
}

impl DebugSession {
    pub fn new() -> Self {
        DebugSession::default()
    }

    /// Rebuild the arena from the space's current bodies. Slots keep their key as long as
    /// their body stays present; a slot whose body vanished frees up and later gets a new
    /// generation for whichever body reuses it.
    pub fn refresh(&mut self, space: &PhysicsSpace) {
        let mut seen = Vec::new();
        for (handle, body) in space.bodies() {
            seen.push(handle);
            let mut outlines = Vec::new();
            for fixture in body.fixtures() {
                let points = fixture
                    .shape
                    .polygonized()
                    .into_iter()
                    .map(|p| body.to_world(p))
                    .collect::<Vec<_>>();
                if points.len() < 3 || points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite())
                {
                    warn!(?handle, "skipping degenerate debug outline");
                    continue;
                }
                outlines.push(points);
            }
            let shape = DebugShape {
                handle,
                position: body.position(),
                angle: body.angle(),
                outlines,
                at_rest: body.is_at_rest(),
                enabled: body.is_enabled(),
            };
            match self.by_handle.get(&handle) {
                Some(&index) => self.slots[index].entry = Some(shape),
                None => {
                    let index = self.allocate();
                    self.slots[index].entry = Some(shape);
                    self.by_handle.insert(handle, index);
                }
            }
        }
        let gone = self
            .by_handle
            .iter()
            .filter(|(handle, _)| !seen.contains(handle))
            .map(|(&handle, &index)| (handle, index))
            .collect::<Vec<_>>();
        for (handle, index) in gone {
            self.slots[index].entry = None;
            self.by_handle.remove(&handle);
        }
    }

    fn allocate(&mut self) -> usize {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_none() {
                // invalidate keys minted for the slot's previous occupant
                slot.generation += 1;
                return index;
            }
        }
        self.slots.push(Slot::default());
        self.slots.len() - 1
    }

    pub fn key_of(&self, handle: BodyHandle) -> Option<DebugKey> {
        let &index = self.by_handle.get(&handle)?;
        Some(DebugKey { index, generation: self.slots[index].generation })
    }

    pub fn get(&self, key: DebugKey) -> Option<&DebugShape> {
        let slot = self.slots.get(key.index)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DebugKey, &DebugShape)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|shape| (DebugKey { index, generation: slot.generation }, shape))
        })
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PhysicsBody;
    use rigid2d::{Fixture, Shape};

    fn one_body_space() -> (PhysicsSpace, BodyHandle) {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, -9.8));
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(1.0, 2.0))
                    .fixture(Fixture::new(Shape::rect(0.5, 0.5).unwrap())),
            )
            .unwrap();
        (space, handle)
    }

    #[test]
    fn test_refresh_extracts_world_space_outline() {
        let (space, handle) = one_body_space();
        let mut session = DebugSession::new();
        session.refresh(&space);
        let key = session.key_of(handle).unwrap();
        let shape = session.get(key).unwrap();
        assert_eq!(shape.position, Vec2::new(1.0, 2.0));
        assert_eq!(shape.outlines.len(), 1);
        assert!(shape.outlines[0].iter().any(|p| (p.x - 1.5).abs() < 1e-5));
    }

    #[test]
    fn test_stale_key_stops_resolving() {
        let (mut space, handle) = one_body_space();
        let mut session = DebugSession::new();
        session.refresh(&space);
        let key = session.key_of(handle).unwrap();
        space.remove(handle, true);
        session.refresh(&space);
        assert!(session.get(key).is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_reused_slot_gets_fresh_generation() {
        let (mut space, handle) = one_body_space();
        let mut session = DebugSession::new();
        session.refresh(&space);
        let old_key = session.key_of(handle).unwrap();
        space.remove(handle, true);
        session.refresh(&space);
        let replacement = space
            .add(
                PhysicsBody::rigid()
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap())),
            )
            .unwrap();
        session.refresh(&space);
        let new_key = session.key_of(replacement).unwrap();
        assert_ne!(old_key, new_key);
        assert!(session.get(old_key).is_none());
        assert!(session.get(new_key).is_some());
    }
}

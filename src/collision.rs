//! Physics query and contact types.
//!
//! Backends fill [`CollisionData`] from their ray casts and translate their
//! native collision callbacks into [`ContactEvent`]s. The controller only ever
//! sees these two shapes of physics output.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Whether this hit landed on `entity`.
    pub fn hits(&self, entity: Entity) -> bool {
        self.entity == Some(entity)
    }
}

/// Whether a contact began or ended.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Enter,
    Exit,
}

/// Contact notification between an actor and a surface.
///
/// Sent by the physics backend (or by tests) and consumed by
/// [`handle_contacts`](crate::systems::handle_contacts).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// The controller entity.
    pub actor: Entity,
    /// The other collider.
    pub surface: Entity,
    pub kind: ContactKind,
}

impl ContactEvent {
    /// Contact between `actor` and `surface` started.
    pub fn enter(actor: Entity, surface: Entity) -> Self {
        Self {
            actor,
            surface,
            kind: ContactKind::Enter,
        }
    }

    /// Contact between `actor` and `surface` ended.
    pub fn exit(actor: Entity, surface: Entity) -> Self {
        Self {
            actor,
            surface,
            kind: ContactKind::Exit,
        }
    }
}

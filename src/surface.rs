//! Surface classification.
//!
//! Buildings and walls carry a [`ClimbableSurface`]. Every tick their
//! [`SurfaceTag`] is recomputed from the height of the tracked actors: below
//! `max_y * height_percent` the surface is something to climb, at or above it
//! the roof is something to walk on. Plain ground just carries a fixed
//! `SurfaceTag::Walkable`.
//!
//! There is no hysteresis. An actor sitting exactly on the threshold flips the
//! tag whenever its height crosses it, tick by tick.

use bevy::prelude::*;

use crate::controller::SwingController;

/// How the controller treats contact with a surface.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum SurfaceTag {
    /// Landing on this surface grounds the actor.
    #[default]
    Walkable,
    /// Touching this surface starts a climb.
    Climbable,
}

/// A surface whose tag depends on how high the actor is.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ClimbableSurface {
    /// Fraction of `max_y` at which the surface becomes walkable (0.0-1.0).
    pub height_percent: f32,
    /// World-space top of the surface geometry.
    ///
    /// The Rapier backend keeps this in sync with cuboid colliders; other
    /// backends must set it when spawning.
    pub max_y: f32,
}

impl Default for ClimbableSurface {
    fn default() -> Self {
        Self {
            height_percent: 0.9,
            max_y: 0.0,
        }
    }
}

impl ClimbableSurface {
    /// Create a surface whose geometry tops out at `max_y`.
    pub fn new(max_y: f32) -> Self {
        Self { max_y, ..default() }
    }

    /// Builder: set the walkable height fraction.
    pub fn with_height_percent(mut self, height_percent: f32) -> Self {
        self.height_percent = height_percent;
        self
    }

    /// Height above which an actor counts as standing on top.
    #[inline]
    pub fn walkable_height(&self) -> f32 {
        self.max_y * self.height_percent
    }

    /// Classify this surface for an actor at `actor_height`.
    pub fn classify(&self, actor_height: f32) -> SurfaceTag {
        classify(actor_height, self.max_y, self.height_percent)
    }
}

/// Classify a surface for an actor at `actor_height`.
pub fn classify(actor_height: f32, surface_max_y: f32, height_percent: f32) -> SurfaceTag {
    if actor_height >= surface_max_y * height_percent {
        SurfaceTag::Walkable
    } else {
        SurfaceTag::Climbable
    }
}

/// Recompute the tag of every climbable surface.
///
/// Each surface is evaluated against every controller in query order and the
/// last evaluation wins. Without any controller the surface stays climbable.
/// Surfaces spawned without a tag get one inserted.
pub fn classify_surfaces(
    mut commands: Commands,
    q_actors: Query<&Transform, With<SwingController>>,
    mut q_surfaces: Query<(Entity, &ClimbableSurface, Option<&mut SurfaceTag>)>,
) {
    for (entity, surface, tag) in &mut q_surfaces {
        let mut next = SurfaceTag::Climbable;
        for transform in &q_actors {
            next = surface.classify(transform.translation.y);
        }

        match tag {
            Some(mut tag) => {
                tag.set_if_neq(next);
            }
            None => {
                commands.entity(entity).insert(next);
            }
        }
    }
}

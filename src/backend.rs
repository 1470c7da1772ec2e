//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the swing controller. The controller itself never talks to a
//! physics engine: it asks the backend to read and write velocities, apply
//! forces and manage the web spring, and it reads probe hits that the
//! backend's sensor systems wrote into [`SwingController`](crate::controller::SwingController).

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::controller::{ClimbTarget, Environment};
use crate::state::SwingAnchor;
use crate::surface::{ClimbableSurface, SurfaceTag};

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the swing
/// controller. The backend plugin is expected to add systems that fill the
/// `ground`, `wall` and `aim` probes in
/// [`SwingControllerSet::Sensors`](crate::SwingControllerSet::Sensors) and
/// to send [`ContactEvent`](crate::collision::ContactEvent)s for contacts
/// between actors and surfaces.
///
/// # Example
///
/// For an example implementation, see the `rapier` module's `Rapier3dBackend`.
///
/// ```rust
/// use bevy::prelude::*;
/// use swing_character_controller::prelude::*;
///
/// fn speed<B: CharacterPhysicsBackend>(world: &World, actor: Entity) -> f32 {
///     B::get_velocity(world, actor).length()
/// }
/// ```
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Apply a force to an entity.
    ///
    /// Force is applied over the physics timestep.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Connect `entity` to a fixed point with a spring.
    ///
    /// Replaces any spring the entity already has.
    fn attach_spring(world: &mut World, entity: Entity, anchor: &SwingAnchor);

    /// Remove the spring of `entity`, if any.
    fn detach_spring(world: &mut World, entity: Entity);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        fixed_timestep(world)
    }
}

/// Fixed timestep delta, with a fallback for schedules run by hand.
pub fn fixed_timestep(world: &World) -> f32 {
    world
        .get_resource::<Time<Fixed>>()
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0)
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// [`Environment`] of one actor backed by the ECS world and a physics backend.
pub struct WorldEnv<'w, B: CharacterPhysicsBackend> {
    world: &'w mut World,
    entity: Entity,
    _backend: PhantomData<B>,
}

impl<'w, B: CharacterPhysicsBackend> WorldEnv<'w, B> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self {
            world,
            entity,
            _backend: PhantomData,
        }
    }
}

impl<B: CharacterPhysicsBackend> Environment for WorldEnv<'_, B> {
    fn velocity(&self) -> Vec3 {
        B::get_velocity(self.world, self.entity)
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        B::set_velocity(self.world, self.entity, velocity);
    }

    fn apply_force(&mut self, force: Vec3) {
        B::apply_force(self.world, self.entity, force);
    }

    fn attach_spring(&mut self, anchor: &SwingAnchor) {
        B::attach_spring(self.world, self.entity, anchor);
    }

    fn detach_spring(&mut self) {
        B::detach_spring(self.world, self.entity);
    }

    fn surface_tag(&self, surface: Entity) -> Option<SurfaceTag> {
        self.world.get::<SurfaceTag>(surface).copied()
    }

    fn climb_target(&self, target: Entity) -> Option<ClimbTarget> {
        let surface = *self.world.get::<ClimbableSurface>(target)?;
        let position = self.world.get::<Transform>(target)?.translation;
        Some(ClimbTarget { position, surface })
    }
}

//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Controller forces are written to [`ExternalForce`] at the end of each fixed
//! tick and withdrawn at the start of the next, so Rapier should step in the
//! fixed schedule as well:
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier3d::prelude::*;
//! use swing_character_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
//!     .add_plugins(SwingControllerPlugin::<Rapier3dBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::{CollisionData, ContactEvent};
use crate::config::SwingConfig;
use crate::controller::SwingController;
use crate::intent::SwingInput;
use crate::state::SwingAnchor;
use crate::surface::ClimbableSurface;
use crate::SwingControllerSet;

/// Rapier3D physics backend for the swing controller.
///
/// Velocity goes through [`Velocity`], forces through [`ExternalForce`] and
/// the web through a spring [`ImpulseJoint`] to a fixed anchor body. Probes
/// and contact translation run as Rapier systems in
/// [`SwingControllerSet::Sensors`].
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        // Accumulated here and handed to ExternalForce by apply_controller_forces.
        let Ok(mut actor) = world.get_entity_mut(entity) else {
            return;
        };
        if let Some(mut forces) = actor.get_mut::<ControllerForces>() {
            forces.accumulated += force;
        } else if actor.contains::<ExternalForce>() {
            actor.insert(ControllerForces {
                accumulated: force,
                applied: Vec3::ZERO,
            });
        }
    }

    fn attach_spring(world: &mut World, entity: Entity, anchor: &SwingAnchor) {
        Self::detach_spring(world, entity);

        let body = world
            .spawn((
                Name::new("Web anchor"),
                RigidBody::Fixed,
                Transform::from_translation(anchor.point),
            ))
            .id();
        let joint = SpringJointBuilder::new(anchor.max_distance, anchor.spring, anchor.damper)
            .contacts_enabled(false)
            .build();

        if let Ok(mut actor) = world.get_entity_mut(entity) {
            actor.insert((ImpulseJoint::new(body, joint), WebAnchorBody(body)));
        } else {
            world.despawn(body);
        }
    }

    fn detach_spring(world: &mut World, entity: Entity) {
        let Ok(mut actor) = world.get_entity_mut(entity) else {
            return;
        };
        let anchor = actor.take::<WebAnchorBody>();
        actor.remove::<ImpulseJoint>();
        if let Some(WebAnchorBody(body)) = anchor {
            world.despawn(body);
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the swing controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ControllerForces>();

        // Withdraw last tick's forces before anything accumulates new ones
        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(SwingControllerSet::Preparation),
        );

        app.add_systems(
            FixedUpdate,
            (
                sync_climbable_tops,
                rapier_probes,
                translate_collision_events,
            )
                .chain()
                .in_set(SwingControllerSet::Sensors),
        );

        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(SwingControllerSet::FinalApplication),
        );

        // With `in_fixed_schedule()` the step must see this tick's velocities and forces
        app.configure_sets(
            FixedUpdate,
            SwingControllerSet::FinalApplication.before(PhysicsSet::SyncBackend),
        );
    }
}

/// Forces the controller added this tick and forces it handed to Rapier last tick.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ControllerForces {
    pub accumulated: Vec3,
    pub applied: Vec3,
}

/// The fixed body the web spring of an actor is attached to.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebAnchorBody(pub Entity);

/// Highest world-space y of a collider, for shapes with known extents.
pub fn collider_top(collider: &Collider, global: &GlobalTransform) -> Option<f32> {
    if let Some(cuboid) = collider.as_cuboid() {
        let h = cuboid.half_extents();
        let mut top = f32::NEG_INFINITY;
        for x in [-h.x, h.x] {
            for y in [-h.y, h.y] {
                for z in [-h.z, h.z] {
                    top = top.max(global.transform_point(Vec3::new(x, y, z)).y);
                }
            }
        }
        Some(top)
    } else if let Some(ball) = collider.as_ball() {
        Some(global.translation().y + ball.radius())
    } else {
        None
    }
}

/// Keep the top of climbable surfaces in sync with their colliders.
pub fn sync_climbable_tops(
    mut q_surfaces: Query<(&mut ClimbableSurface, &Collider, &GlobalTransform)>,
) {
    for (mut surface, collider, global) in &mut q_surfaces {
        let Some(top) = collider_top(collider, global) else {
            continue;
        };
        if surface.max_y != top {
            surface.max_y = top;
        }
    }
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    exclude_entity: Entity,
) -> Option<CollisionData> {
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors();

    context
        .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
        .map(|(hit_entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
        })
}

/// Fill the ground, wall and aim probes of every actor.
///
/// - ground: straight down from the actor's origin
/// - wall: along the actor's facing
/// - aim: along the input's aim ray, limited to the web range
pub fn rapier_probes(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &SwingConfig,
        &SwingInput,
        &mut SwingController,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, global, config, input, mut controller) in &mut q_controllers {
        let position = global.translation();

        controller.ground = rapier_raycast(
            &context,
            position,
            Vec3::NEG_Y,
            config.ground_probe_distance,
            entity,
        );
        controller.wall = rapier_raycast(
            &context,
            position,
            global.forward().as_vec3(),
            config.wall_probe_distance,
            entity,
        );
        controller.aim = input.aim.and_then(|ray| {
            rapier_raycast(
                &context,
                ray.origin,
                ray.direction.as_vec3(),
                config.web_range,
                entity,
            )
        });
    }
}

/// Turn Rapier collision events between actors and surfaces into [`ContactEvent`]s.
///
/// Colliders need [`ActiveEvents::COLLISION_EVENTS`] on the actor or the
/// surface for Rapier to report them.
pub fn translate_collision_events(
    mut collisions: EventReader<CollisionEvent>,
    q_actors: Query<(), With<SwingController>>,
    mut contacts: EventWriter<ContactEvent>,
) {
    for collision in collisions.read() {
        let (a, b, started) = match *collision {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };

        let (actor, surface) = if q_actors.contains(a) {
            (a, b)
        } else if q_actors.contains(b) {
            (b, a)
        } else {
            continue;
        };

        contacts.write(if started {
            ContactEvent::enter(actor, surface)
        } else {
            ContactEvent::exit(actor, surface)
        });
    }
}

/// Clear controller forces at the start of each tick.
///
/// Subtracts what was applied last tick from [`ExternalForce`], so forces
/// from other sources are preserved.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force -= forces.applied;
        forces.applied = Vec3::ZERO;
        forces.accumulated = Vec3::ZERO;
    }
}

/// Hand the forces accumulated this tick to [`ExternalForce`].
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        let force = std::mem::take(&mut forces.accumulated);
        ext_force.force += force;
        forces.applied = force;
    }
}

/// Bundle for creating a swinging character with Rapier3D physics.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use swing_character_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 1.0, 0.0),
///         SwingController::new(),
///         SwingConfig::default(),
///         PlayerControlled,
///         Rapier3dCharacterBundle::new(),
///         Collider::capsule_y(0.5, 0.4),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the controller turns the actor itself
/// - `damping`: Linear 0.0, Angular 1.0
/// - `active_events`: [`ActiveEvents::COLLISION_EVENTS`], needed for landing and climbing
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Current velocity. The controller overwrites the linear part every tick.
    pub velocity: Velocity,
    pub external_force: ExternalForce,
    pub controller_forces: ControllerForces,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
    pub active_events: ActiveEvents,
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a character bundle with rotation locked.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            controller_forces: ControllerForces::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            active_events: ActiveEvents::COLLISION_EVENTS,
            mass_properties: ReadMassProperties::default(),
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}

//! Shared harness for the integration tests.
//!
//! [`ScriptedBackend`] records what the controller asks of the physics engine
//! instead of simulating it, and has no sensors: tests write ray hits into
//! the controller and send contacts themselves.

#![allow(dead_code)]

use bevy::prelude::*;
use swing_character_controller::prelude::*;

/// Physics state of an actor under [`ScriptedBackend`].
#[derive(Component, Debug, Clone, Default)]
pub struct ScriptedBody {
    pub velocity: Vec3,
    pub forces: Vec<Vec3>,
    pub spring: Option<SwingAnchor>,
    pub detaches: u32,
}

pub struct ScriptedBackend;

impl CharacterPhysicsBackend for ScriptedBackend {
    type VelocityComponent = ScriptedBody;

    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<ScriptedBody>(entity)
            .map(|body| body.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<ScriptedBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut body) = world.get_mut::<ScriptedBody>(entity) {
            body.forces.push(force);
        }
    }

    fn attach_spring(world: &mut World, entity: Entity, anchor: &SwingAnchor) {
        if let Some(mut body) = world.get_mut::<ScriptedBody>(entity) {
            body.spring = Some(*anchor);
        }
    }

    fn detach_spring(world: &mut World, entity: Entity) {
        if let Some(mut body) = world.get_mut::<ScriptedBody>(entity) {
            body.spring = None;
            body.detaches += 1;
        }
    }
}

/// App with the controller plugin driven by [`ScriptedBackend`].
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SwingControllerPlugin::<ScriptedBackend>::default().with_sound_seed(7));

    app.finish();
    app.cleanup();
    app
}

/// Run `ticks` fixed ticks of 1/60 s.
pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

pub fn spawn_actor(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            SwingController::new(),
            SwingConfig::default(),
            ScriptedBody::default(),
        ))
        .id()
}

pub fn spawn_ground(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((Transform::default(), SurfaceTag::Walkable))
        .id()
}

pub fn spawn_wall(app: &mut App, position: Vec3, max_y: f32) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            ClimbableSurface::new(max_y),
            SurfaceTag::Climbable,
        ))
        .id()
}

pub fn controller(app: &App, actor: Entity) -> &SwingController {
    app.world().get::<SwingController>(actor).unwrap()
}

pub fn mode(app: &App, actor: Entity) -> Mode {
    controller(app, actor).mode()
}

pub fn body(app: &App, actor: Entity) -> &ScriptedBody {
    app.world().get::<ScriptedBody>(actor).unwrap()
}

pub fn input_mut(app: &mut App, actor: Entity) -> Mut<'_, SwingInput> {
    app.world_mut().get_mut::<SwingInput>(actor).unwrap()
}

pub fn controller_mut(app: &mut App, actor: Entity) -> Mut<'_, SwingController> {
    app.world_mut().get_mut::<SwingController>(actor).unwrap()
}

pub fn send_contact(app: &mut App, contact: ContactEvent) {
    app.world_mut().send_event(contact);
}

/// Every event of type `E` sent so far.
///
/// Event buffers only rotate in `First`, which the tests never run.
pub fn sent<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

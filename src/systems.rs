//! Core controller systems.
//!
//! The systems that run the controller are exclusive: each actor's
//! components are copied out of the world, advanced through a
//! [`TickContext`] whose environment calls back into the world through the
//! physics backend, and written back. They are generic over the backend so
//! that different physics engines can be used.

use bevy::ecs::event::EventCursor;
use bevy::prelude::*;

use crate::audio::{SoundBoard, SoundCue};
use crate::backend::{CharacterPhysicsBackend, WorldEnv};
use crate::collision::ContactEvent;
use crate::config::SwingConfig;
use crate::controller::{SwingController, TickContext};
use crate::intent::SwingInput;
use crate::locomotion;
use crate::state::{AnimationChanged, LevelReloadRequested, ModeChanged, SpawnPoint, WebRope};

/// Run `f` on one actor with a context built from the world.
///
/// Returns `None` if the actor is gone or misses one of its components.
fn with_actor<B, R>(
    world: &mut World,
    sounds: &mut SoundBoard,
    entity: Entity,
    dt: f32,
    f: impl FnOnce(&mut SwingController, &mut TickContext<'_, WorldEnv<'_, B>>) -> R,
) -> Option<R>
where
    B: CharacterPhysicsBackend,
{
    let (mut controller, config, input, mut transform) = {
        let actor = world.get_entity(entity).ok()?;
        (
            actor.get::<SwingController>()?.clone(),
            *actor.get::<SwingConfig>()?,
            actor.get::<SwingInput>()?.clone(),
            *actor.get::<Transform>()?,
        )
    };

    let result = {
        let mut env = WorldEnv::<B>::new(world, entity);
        let mut ctx = TickContext {
            dt,
            config: &config,
            input: &input,
            transform: &mut transform,
            sounds,
            env: &mut env,
        };
        f(&mut controller, &mut ctx)
    };

    if let Some(mut stored) = world.get_mut::<SwingController>(entity) {
        *stored = controller;
    }
    if let Some(mut stored) = world.get_mut::<Transform>(entity) {
        stored.set_if_neq(transform);
    }
    Some(result)
}

fn controller_entities(world: &mut World) -> Vec<Entity> {
    world
        .query_filtered::<Entity, With<SwingController>>()
        .iter(world)
        .collect()
}

/// Remember where each new actor spawned, for level reloads.
pub fn capture_spawn_points(
    mut commands: Commands,
    q_new: Query<(Entity, &Transform), (Added<SwingController>, Without<SpawnPoint>)>,
) {
    for (entity, transform) in &q_new {
        commands
            .entity(entity)
            .insert(SpawnPoint::from_transform(transform));
    }
}

/// Log configurations that cannot drive a controller.
pub fn report_invalid_configs(q_configs: Query<(Entity, &SwingConfig), Added<SwingConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            error!("invalid swing config on {entity}: {err}");
        }
    }
}

/// Advance web release and landing recovery timers.
pub fn run_deferred_tasks<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let entities = controller_entities(world);

    world.try_resource_scope(|world, mut sounds: Mut<SoundBoard>| {
        for entity in entities {
            with_actor::<B, _>(world, &mut sounds, entity, dt, |controller, ctx| {
                controller.run_deferred(ctx)
            });
        }
    });
}

/// Apply contact notifications sent since the last run.
pub fn handle_contacts<B: CharacterPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<ContactEvent>>,
) {
    let contacts: Vec<ContactEvent> = match world.get_resource::<Events<ContactEvent>>() {
        Some(events) => cursor.read(events).copied().collect(),
        None => return,
    };
    if contacts.is_empty() {
        return;
    }

    let dt = B::get_fixed_timestep(world);
    world.try_resource_scope(|world, mut sounds: Mut<SoundBoard>| {
        for contact in &contacts {
            with_actor::<B, _>(world, &mut sounds, contact.actor, dt, |controller, ctx| {
                controller.handle_contact(contact, ctx)
            });
        }
    });
}

/// Run one locomotion tick for every actor and latch its input edges.
pub fn update_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let entities = controller_entities(world);

    world.try_resource_scope(|world, mut sounds: Mut<SoundBoard>| {
        for entity in entities {
            with_actor::<B, _>(world, &mut sounds, entity, dt, |controller, ctx| {
                locomotion::tick(controller, ctx)
            });
            if let Some(mut input) = world.get_mut::<SwingInput>(entity) {
                input.end_tick();
            }
        }
    });
}

/// Turn recorded mode, animation and sound changes into events.
pub fn flush_presentation(world: &mut World) {
    let mut modes = Vec::new();
    let mut animations = Vec::new();
    let mut reloads = Vec::new();

    let mut q_controllers = world.query::<(Entity, &mut SwingController)>();
    for (entity, mut controller) in q_controllers.iter_mut(world) {
        let notifications = controller.take_notifications();
        for (from, to) in notifications.modes {
            debug!("{entity}: {from:?} -> {to:?}");
            modes.push(ModeChanged { entity, from, to });
        }
        animations.extend(
            notifications
                .animations
                .into_iter()
                .map(|state| AnimationChanged { entity, state }),
        );
        if notifications.reload_requested {
            info!("{entity} fell out of the level, requesting reload");
            reloads.push(LevelReloadRequested { entity });
        }
    }

    let cues: Vec<SoundCue> = world
        .get_resource_mut::<SoundBoard>()
        .map(|mut sounds| sounds.drain_cues())
        .unwrap_or_default();

    world.send_event_batch(modes);
    world.send_event_batch(animations);
    world.send_event_batch(reloads);
    world.send_event_batch(cues);
}

/// Put every actor back on its spawn point when a reload is requested.
pub fn reload_level<B: CharacterPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<LevelReloadRequested>>,
) {
    let requested = match world.get_resource::<Events<LevelReloadRequested>>() {
        Some(events) => cursor.read(events).count() > 0,
        None => return,
    };
    if !requested {
        return;
    }

    let actors: Vec<(Entity, SpawnPoint, bool)> = world
        .query::<(Entity, &SwingController, &SpawnPoint)>()
        .iter(world)
        .map(|(entity, controller, spawn)| (entity, *spawn, controller.mode().is_swinging()))
        .collect();
    info!("reloading level, resetting {} actor(s)", actors.len());

    for (entity, spawn, swinging) in actors {
        if swinging {
            B::detach_spring(world, entity);
        }
        B::set_velocity(world, entity, Vec3::ZERO);

        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = spawn.translation;
            transform.rotation = spawn.rotation;
        }
        if let Some(mut controller) = world.get_mut::<SwingController>(entity) {
            controller.reset();
        }
        if let Some(mut input) = world.get_mut::<SwingInput>(entity) {
            input.clear();
        }
    }

    if let Some(mut sounds) = world.get_resource_mut::<SoundBoard>() {
        sounds.stop_all();
    }
}

/// Refresh web rope endpoints from the hand to the anchor.
///
/// Runs after transform propagation so the hand position is current.
pub fn update_web_rope(
    mut q_actors: Query<(&SwingController, &SwingConfig, &GlobalTransform, &mut WebRope)>,
) {
    for (controller, config, global, mut rope) in &mut q_actors {
        let endpoints = controller.mode().swing_anchor().map(|anchor| {
            let hand = global.transform_point(config.hand_offset);
            (hand + Vec3::Y * config.rope_hand_raise, anchor.point)
        });
        rope.set_if_neq(WebRope { endpoints });
    }
}

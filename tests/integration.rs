//! Integration tests for the swing controller.
//!
//! These tests run the controller's fixed schedule in an app and check the
//! complete system behavior through the scripted backend's recorded
//! velocities, forces and springs, and through the emitted events.

mod common;

use bevy::prelude::*;
use swing_character_controller::prelude::*;

use common::*;

// ==================== Running and Jumping ====================

#[test]
fn running_follows_the_view_basis() {
    let mut app = create_test_app();
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    {
        let mut input = input_mut(&mut app, actor);
        input.set_view(Vec3::X, Vec3::Z);
        input.set_movement(Vec2::new(0.0, 1.0));
    }
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Run));
    assert_eq!(controller(&app, actor).animation(), AnimationState::Run);
    assert!((body(&app, actor).velocity - Vec3::X * 5.0).length() < 1e-4);

    input_mut(&mut app, actor).set_sprint(true);
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Sprint));
    assert!((body(&app, actor).velocity - Vec3::X * 10.0).length() < 1e-4);

    let cues = sent::<SoundCue>(&app);
    assert!(cues.contains(&SoundCue::Pitch {
        channel: SoundChannel::Running,
        pitch: 1.5,
    }));
}

#[test]
fn jump_then_land_on_walkable() {
    let mut app = create_test_app();
    let ground = spawn_ground(&mut app);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    input_mut(&mut app, actor).set_jump_pressed(true);
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Jumping));
    assert_eq!(controller(&app, actor).animation(), AnimationState::Jump);
    assert_eq!(body(&app, actor).forces.first(), Some(&(Vec3::Y * 800.0)));

    // Holding the key does not jump again.
    run_ticks(&mut app, 5);
    let upward = body(&app, actor)
        .forces
        .iter()
        .filter(|force| force.y > 0.0)
        .count();
    assert_eq!(upward, 1);

    send_contact(&mut app, ContactEvent::enter(actor, ground));
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Idle));
    assert_eq!(controller(&app, actor).in_air_timer, 0.0);

    let changes = sent::<ModeChanged>(&app);
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].to, Mode::Airborne(AirborneMode::Jumping));
    assert_eq!(changes[1].to, Mode::Grounded(GroundedMode::Idle));
}

#[test]
fn long_fall_ends_in_hard_landing_and_recovers() {
    let mut app = create_test_app();
    let ground = spawn_ground(&mut app);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 25.0, 0.0));

    controller_mut(&mut app, actor).ground = Some(CollisionData::new(
        25.0,
        Vec3::Y,
        Vec3::ZERO,
        Some(ground),
    ));
    input_mut(&mut app, actor).set_jump_pressed(true);
    run_ticks(&mut app, 70);

    assert_eq!(controller(&app, actor).animation(), AnimationState::Falling);
    assert!(controller(&app, actor).in_air_timer > 2.5);

    send_contact(&mut app, ContactEvent::enter(actor, ground));
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::HardLanding));
    assert_eq!(controller(&app, actor).animation(), AnimationState::HardLanding);
    assert!(sent::<SoundCue>(&app)
        .iter()
        .any(|cue| matches!(cue, SoundCue::Play { channel: SoundChannel::Foot, .. })));

    run_ticks(&mut app, 32);
    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Idle));
}

#[test]
fn short_hop_lands_softly() {
    let mut app = create_test_app();
    let ground = spawn_ground(&mut app);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    input_mut(&mut app, actor).set_jump_pressed(true);
    run_ticks(&mut app, 20);
    send_contact(&mut app, ContactEvent::enter(actor, ground));
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Idle));
    assert_ne!(controller(&app, actor).animation(), AnimationState::HardLanding);
}

// ==================== Climbing ====================

#[test]
fn climb_press_and_detach() {
    let mut app = create_test_app();
    let wall = spawn_wall(&mut app, Vec3::new(0.0, 0.0, -2.0), 10.0);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    send_contact(&mut app, ContactEvent::enter(actor, wall));
    run_ticks(&mut app, 1);
    assert_eq!(mode(&app, actor).climb_target(), Some(wall));
    assert_eq!(controller(&app, actor).animation(), AnimationState::ClimbingIdle);

    // Close to the wall: climbing up presses into it.
    controller_mut(&mut app, actor).wall = Some(CollisionData::new(
        0.3,
        Vec3::Z,
        Vec3::new(0.0, 0.5, -1.7),
        Some(wall),
    ));
    input_mut(&mut app, actor).set_movement(Vec2::new(0.0, 1.0));
    run_ticks(&mut app, 1);

    assert_eq!(
        mode(&app, actor),
        Mode::Climbing(Climb {
            phase: ClimbPhase::Moving,
            target: wall,
        })
    );
    let velocity = body(&app, actor).velocity;
    assert!((velocity - Vec3::new(0.0, 0.4, -0.2)).length() < 1e-4);

    // Lost the wall: push off.
    controller_mut(&mut app, actor).wall = Some(CollisionData::new(
        3.0,
        Vec3::Z,
        Vec3::new(0.0, 0.5, -3.0),
        Some(wall),
    ));
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Falling));
    assert_eq!(controller(&app, actor).animation(), AnimationState::ClimbJump);
    assert!(body(&app, actor)
        .forces
        .iter()
        .any(|force| (*force - Vec3::Z * 1000.0).length() < 1e-3));

    let modes: Vec<Mode> = sent::<ModeChanged>(&app).iter().map(|c| c.to).collect();
    assert!(modes.contains(&Mode::Climbing(Climb {
        phase: ClimbPhase::Detaching,
        target: wall,
    })));
}

#[test]
fn climbing_past_the_top_mantles() {
    let mut app = create_test_app();
    let wall = spawn_wall(&mut app, Vec3::new(0.0, 0.0, -2.0), 10.0);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    send_contact(&mut app, ContactEvent::enter(actor, wall));
    run_ticks(&mut app, 1);
    assert!(mode(&app, actor).is_climbing());

    app.world_mut()
        .get_mut::<Transform>(actor)
        .unwrap()
        .translation
        .y = 9.5;
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Jumping));
    let translation = app.world().get::<Transform>(actor).unwrap().translation;
    assert!((translation.y - 11.75).abs() < 1e-4);
    assert_eq!(controller(&app, actor).animation(), AnimationState::HardLanding);
}

#[test]
fn despawned_climb_target_ends_the_climb() {
    let mut app = create_test_app();
    let wall = spawn_wall(&mut app, Vec3::new(0.0, 0.0, -2.0), 10.0);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    send_contact(&mut app, ContactEvent::enter(actor, wall));
    run_ticks(&mut app, 1);
    app.world_mut().despawn(wall);
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Jumping));
}

#[test]
fn walkable_top_is_not_climbed() {
    let mut app = create_test_app();
    let wall = spawn_wall(&mut app, Vec3::new(0.0, 0.0, -2.0), 10.0);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 9.5, 0.0));

    // Classification runs before contacts in the same tick.
    input_mut(&mut app, actor).set_jump_pressed(true);
    run_ticks(&mut app, 1);
    send_contact(&mut app, ContactEvent::enter(actor, wall));
    run_ticks(&mut app, 1);

    assert_eq!(
        app.world().get::<SurfaceTag>(wall),
        Some(&SurfaceTag::Walkable)
    );
    assert!(mode(&app, actor).is_grounded());
}

// ==================== Swinging ====================

fn start_swing(app: &mut App, actor: Entity) {
    let building = app.world_mut().spawn(Transform::default()).id();
    controller_mut(app, actor).aim = Some(CollisionData::new(
        20.0,
        Vec3::Z,
        Vec3::new(0.0, 15.0, -12.0),
        Some(building),
    ));
    input_mut(app, actor).set_primary_held(true);
    run_ticks(app, 1);
    controller_mut(app, actor).aim = None;
}

#[test]
fn web_attaches_and_auto_releases() {
    let mut app = create_test_app();
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    start_swing(&mut app, actor);

    assert!(mode(&app, actor).is_swinging());
    let spring = body(&app, actor).spring.unwrap();
    assert!((spring.point - Vec3::new(0.0, 16.5, -12.0)).length() < 1e-4);
    assert!(sent::<SoundCue>(&app)
        .iter()
        .any(|cue| matches!(cue, SoundCue::Play { channel: SoundChannel::Web, .. })));

    // Still holding the button after the release timer.
    run_ticks(&mut app, 125);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Jumping));
    assert!(body(&app, actor).spring.is_none());
    assert_eq!(body(&app, actor).detaches, 1);
    assert_ne!(controller(&app, actor).animation(), AnimationState::Falling);

    // Letting go afterwards changes nothing.
    input_mut(&mut app, actor).set_primary_held(false);
    run_ticks(&mut app, 1);
    assert_eq!(body(&app, actor).detaches, 1);
}

#[test]
fn releasing_primary_drops_the_web() {
    let mut app = create_test_app();
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    start_swing(&mut app, actor);
    run_ticks(&mut app, 10);
    assert!(mode(&app, actor).is_swinging());

    input_mut(&mut app, actor).set_primary_held(false);
    run_ticks(&mut app, 1);

    assert_eq!(mode(&app, actor), Mode::Airborne(AirborneMode::Jumping));
    assert_eq!(controller(&app, actor).animation(), AnimationState::Falling);
    assert!(body(&app, actor).spring.is_none());
    assert!(!controller(&app, actor)
        .tasks()
        .is_pending(DeferredTask::WebRelease));
}

#[test]
fn web_rope_runs_from_hand_to_anchor() {
    let mut app = create_test_app();
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    app.world_mut().run_schedule(PostUpdate);
    assert!(!app.world().get::<WebRope>(actor).unwrap().is_visible());

    start_swing(&mut app, actor);
    app.world_mut().run_schedule(PostUpdate);

    // GlobalTransform is never propagated here, so the hand sits at the origin offset.
    let (hand, anchor) = app.world().get::<WebRope>(actor).unwrap().endpoints.unwrap();
    assert!((hand - Vec3::new(0.35, 1.35, 0.0)).length() < 1e-4);
    assert!((anchor - Vec3::new(0.0, 16.5, -12.0)).length() < 1e-4);

    input_mut(&mut app, actor).set_primary_held(false);
    run_ticks(&mut app, 1);
    app.world_mut().run_schedule(PostUpdate);

    assert!(!mode(&app, actor).is_swinging());
    assert!(!app.world().get::<WebRope>(actor).unwrap().is_visible());
}

// ==================== Level Reload ====================

#[test]
fn falling_out_reloads_once_and_respawns() {
    let mut app = create_test_app();
    let actor = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, -2.1, 0.0),
            SpawnPoint {
                translation: Vec3::new(0.0, 5.0, 0.0),
                rotation: Quat::IDENTITY,
            },
            SwingController::new(),
            ScriptedBody {
                velocity: Vec3::new(0.0, -20.0, 0.0),
                ..default()
            },
        ))
        .id();

    run_ticks(&mut app, 1);

    assert_eq!(sent::<LevelReloadRequested>(&app).len(), 1);
    assert_eq!(
        app.world().get::<Transform>(actor).unwrap().translation,
        Vec3::new(0.0, 5.0, 0.0)
    );
    assert_eq!(mode(&app, actor), Mode::Grounded(GroundedMode::Idle));
    assert_eq!(body(&app, actor).velocity, Vec3::ZERO);

    run_ticks(&mut app, 3);
    assert_eq!(sent::<LevelReloadRequested>(&app).len(), 1);
}

#[test]
fn spawn_point_is_captured_on_spawn() {
    let mut app = create_test_app();
    let actor = spawn_actor(&mut app, Vec3::new(3.0, 4.0, 5.0));

    run_ticks(&mut app, 1);

    assert_eq!(
        app.world().get::<SpawnPoint>(actor).unwrap().translation,
        Vec3::new(3.0, 4.0, 5.0)
    );
}

// ==================== Events ====================

#[test]
fn every_mode_change_is_reported_once() {
    let mut app = create_test_app();
    let ground = spawn_ground(&mut app);
    let actor = spawn_actor(&mut app, Vec3::new(0.0, 0.5, 0.0));

    input_mut(&mut app, actor).set_jump_pressed(true);
    run_ticks(&mut app, 1);
    // A second landing contact while grounded is ignored.
    send_contact(&mut app, ContactEvent::enter(actor, ground));
    send_contact(&mut app, ContactEvent::enter(actor, ground));
    run_ticks(&mut app, 1);

    let changes = sent::<ModeChanged>(&app);
    assert_eq!(changes.len(), 2);
    for pair in changes.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
    assert!(changes.iter().all(|change| change.entity == actor));
}

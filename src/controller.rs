//! The controller component and its mode transitions.
//!
//! [`SwingController`] owns the [`Mode`] of one actor. Everything that changes
//! the mode goes through the transition methods in this module, which keep the
//! physics side (spring attached, forces applied) and the presentation side
//! (animation, sound cues) in step with the mode.
//!
//! Transitions never touch the ECS directly. They act on a [`TickContext`],
//! which carries the actor's configuration, input and transform together with
//! an [`Environment`] for the physics calls. The systems build the context
//! from the world; the unit tests build it from plain values.

use std::time::Duration;

use bevy::prelude::*;

use crate::audio::{SoundBoard, SoundChannel};
use crate::collision::{CollisionData, ContactEvent, ContactKind};
use crate::config::SwingConfig;
use crate::intent::SwingInput;
use crate::state::{
    AirborneMode, AnimationState, Climb, ClimbPhase, GroundedMode, Mode, Swing, SwingAnchor,
    SwingGrip, WebRope,
};
use crate::surface::{ClimbableSurface, SurfaceTag};
use crate::timers::{DeferredTask, DeferredTasks};

/// A climbable surface as seen by the controller.
#[derive(Debug, Clone, Copy)]
pub struct ClimbTarget {
    /// World position of the surface (its pivot, not its top).
    pub position: Vec3,
    pub surface: ClimbableSurface,
}

/// Physics and scene access for one actor during a tick.
pub trait Environment {
    /// Current linear velocity of the actor.
    fn velocity(&self) -> Vec3;

    /// Overwrite the actor's linear velocity.
    fn set_velocity(&mut self, velocity: Vec3);

    /// Apply a force over the coming physics step.
    fn apply_force(&mut self, force: Vec3);

    /// Attach the web spring between the actor and `anchor`.
    fn attach_spring(&mut self, anchor: &SwingAnchor);

    /// Remove the web spring, if any.
    fn detach_spring(&mut self);

    /// Tag of a surface entity. `None` if the entity has no tag or is gone.
    fn surface_tag(&self, surface: Entity) -> Option<SurfaceTag>;

    /// Resolve a climb target. `None` if the entity is gone or not climbable.
    fn climb_target(&self, target: Entity) -> Option<ClimbTarget>;
}

/// Everything a transition needs besides the controller itself.
pub struct TickContext<'a, E: Environment> {
    /// Seconds covered by this tick.
    pub dt: f32,
    pub config: &'a SwingConfig,
    pub input: &'a SwingInput,
    pub transform: &'a mut Transform,
    pub sounds: &'a mut SoundBoard,
    pub env: &'a mut E,
}

/// Changes recorded during a tick, turned into events by the systems.
#[derive(Debug, Clone, Default)]
pub(crate) struct Notifications {
    pub modes: Vec<(Mode, Mode)>,
    pub animations: Vec<AnimationState>,
    pub reload_requested: bool,
}

/// Swing/climb/run controller state of an actor.
///
/// Probe hits (`ground`, `wall`, `aim`) are written by the physics backend's
/// sensor systems before the controller runs.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
#[require(SwingConfig, SwingInput, WebRope, Transform)]
pub struct SwingController {
    mode: Mode,
    /// Scaled seconds spent airborne since the last landing.
    pub in_air_timer: f32,
    animation: AnimationState,
    /// Movement input was active on the previous tick.
    pub(crate) was_moving: bool,

    // === Sensor Results ===
    /// Hit of the downward probe.
    pub ground: Option<CollisionData>,
    /// Hit of the forward probe.
    pub wall: Option<CollisionData>,
    /// Hit of the aim probe along [`SwingInput::aim`].
    pub aim: Option<CollisionData>,

    #[reflect(ignore)]
    pub(crate) tasks: DeferredTasks,
    #[reflect(ignore)]
    notifications: Notifications,
}

impl SwingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Currently requested animation.
    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Pending deferred tasks.
    pub fn tasks(&self) -> &DeferredTasks {
        &self.tasks
    }

    /// Whether movement input was active on the last tick.
    pub fn was_moving(&self) -> bool {
        self.was_moving
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.notifications.modes.push((self.mode, mode));
            self.mode = mode;
        }
    }

    pub(crate) fn set_animation(&mut self, animation: AnimationState) {
        if self.animation != animation {
            self.notifications.animations.push(animation);
            self.animation = animation;
        }
    }

    pub(crate) fn take_notifications(&mut self) -> Notifications {
        std::mem::take(&mut self.notifications)
    }

    /// Put the controller back into its spawn state, keeping probe hits.
    pub(crate) fn reset(&mut self) {
        self.set_mode(Mode::default());
        self.set_animation(AnimationState::Idle);
        self.in_air_timer = 0.0;
        self.was_moving = false;
        self.tasks.clear();
    }

    /// Detach the web if swinging. The caller picks the next mode.
    fn drop_web<E: Environment>(&mut self, env: &mut E) {
        if self.mode.is_swinging() {
            env.detach_spring();
            self.tasks.cancel(DeferredTask::WebRelease);
        }
    }

    /// Touch down on a walkable surface.
    ///
    /// A long fall that already shows the falling animation ends in a hard
    /// landing, which only grounds the actor once the recovery timer fires.
    pub fn land<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        self.drop_web(ctx.env);

        if self.in_air_timer > ctx.config.hard_landing_air_time
            && self.animation == AnimationState::Falling
        {
            ctx.sounds.play(SoundChannel::Foot);
            self.set_animation(AnimationState::HardLanding);
            self.set_mode(Mode::Airborne(AirborneMode::HardLanding));
            self.tasks
                .schedule(DeferredTask::LandingRecovery, ctx.config.hard_landing_recovery);
        } else {
            self.set_mode(Mode::Grounded(GroundedMode::Idle));
        }

        self.in_air_timer = 0.0;
    }

    /// Become airborne without a jump (walked off an edge or out of bounds).
    pub fn leave_ground(&mut self) {
        if self.mode.is_grounded() {
            self.set_mode(Mode::Airborne(AirborneMode::Jumping));
        }
    }

    /// Start climbing `target`. An ongoing climb keeps its original target.
    pub fn start_climbing<E: Environment>(&mut self, target: Entity, ctx: &mut TickContext<E>) {
        let climb = match self.mode {
            Mode::Climbing(climb) => climb,
            _ => Climb {
                phase: ClimbPhase::default(),
                target,
            },
        };

        self.drop_web(ctx.env);
        self.set_mode(Mode::Climbing(climb));

        if !ctx.sounds.is_playing(SoundChannel::Climbing) {
            ctx.sounds
                .randomize_pitch(SoundChannel::Climbing, ctx.config.climb_pitch_range);
            ctx.sounds.play(SoundChannel::Climbing);
        }
    }

    /// Push off the wall. Does nothing when not climbing.
    pub fn stop_climbing<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        let Mode::Climbing(climb) = self.mode else {
            return;
        };

        self.set_mode(Mode::Climbing(Climb {
            phase: ClimbPhase::Detaching,
            ..climb
        }));
        ctx.sounds.stop(SoundChannel::Climbing);
        let back = -ctx.transform.forward().as_vec3();
        ctx.env.apply_force(back * ctx.config.detach_force);
        self.set_animation(AnimationState::ClimbJump);
        self.set_mode(Mode::Airborne(AirborneMode::Falling));
    }

    /// Climb over the top of the current surface.
    pub(crate) fn mantle<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        ctx.sounds.stop(SoundChannel::Climbing);
        let forward = ctx.transform.forward().as_vec3();
        ctx.transform.translation +=
            Vec3::Y * ctx.config.mantle_lift + forward * ctx.config.mantle_forward;
        ctx.sounds.play(SoundChannel::Foot);
        self.set_animation(AnimationState::HardLanding);
        self.set_mode(Mode::Airborne(AirborneMode::Jumping));
    }

    /// Jump off the ground, or push off the wall when climbing.
    pub fn jump<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        match self.mode {
            Mode::Grounded(_) => {
                ctx.env.apply_force(Vec3::Y * ctx.config.jump_force);
                self.set_animation(if self.was_moving {
                    AnimationState::RunningJump
                } else {
                    AnimationState::Jump
                });
                self.set_mode(Mode::Airborne(AirborneMode::Jumping));
            }
            Mode::Climbing(_) => self.stop_climbing(ctx),
            _ => {}
        }
    }

    /// Attach the web to `hit_point` and start swinging.
    pub fn start_swinging<E: Environment>(&mut self, hit_point: Vec3, ctx: &mut TickContext<E>) {
        let anchor = SwingAnchor::from_cast(ctx.transform.translation, hit_point, ctx.config);

        self.drop_web(ctx.env);
        self.set_animation(AnimationState::Swinging);
        face_horizontally(ctx.transform, anchor.point);

        ctx.env.attach_spring(&anchor);
        self.set_mode(Mode::Swinging(Swing {
            grip: SwingGrip::OneArm,
            anchor,
        }));

        ctx.sounds
            .randomize_pitch(SoundChannel::Web, ctx.config.web_pitch_range);
        ctx.sounds.play(SoundChannel::Web);
        self.tasks
            .schedule(DeferredTask::WebRelease, ctx.config.web_release_after);
    }

    /// Let go of the web. Does nothing when not swinging.
    pub fn release_web<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        if !self.mode.is_swinging() {
            return;
        }

        if !ctx.input.primary_held {
            self.set_animation(AnimationState::Falling);
        }
        self.drop_web(ctx.env);
        self.set_mode(Mode::Airborne(AirborneMode::Jumping));
    }

    /// Fell out of the level. Requests a level reload exactly once.
    pub fn kill<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        if self.mode.is_dead() {
            return;
        }

        self.drop_web(ctx.env);
        self.tasks.clear();
        self.set_mode(Mode::Dead);
        self.set_animation(AnimationState::Death);
        self.notifications.reload_requested = true;
    }

    /// Advance the deferred tasks by `ctx.dt` and run the ones that fired.
    pub fn run_deferred<E: Environment>(&mut self, ctx: &mut TickContext<E>) {
        if self.mode.is_dead() {
            return;
        }

        for task in self.tasks.tick(Duration::from_secs_f32(ctx.dt)) {
            match task {
                DeferredTask::WebRelease => self.release_web(ctx),
                DeferredTask::LandingRecovery => {
                    if self.mode == Mode::Airborne(AirborneMode::HardLanding) {
                        self.set_mode(Mode::Grounded(GroundedMode::Idle));
                    }
                }
            }
        }
    }

    /// React to the start or end of a contact with a surface.
    pub fn handle_contact<E: Environment>(&mut self, contact: &ContactEvent, ctx: &mut TickContext<E>) {
        if self.mode.is_dead() {
            return;
        }
        let Some(tag) = ctx.env.surface_tag(contact.surface) else {
            return;
        };

        match (contact.kind, tag) {
            (ContactKind::Enter, SurfaceTag::Climbable) if !self.mode.is_falling() => {
                self.start_climbing(contact.surface, ctx);
            }
            (ContactKind::Enter, SurfaceTag::Walkable) if !self.mode.is_grounded() => {
                self.land(ctx);
            }
            (ContactKind::Exit, SurfaceTag::Walkable)
                if self.mode.is_grounded()
                    && ctx.transform.translation.y > ctx.config.ground_exit_min_height =>
            {
                self.set_mode(Mode::Airborne(AirborneMode::Jumping));
            }
            _ => {}
        }
    }
}

/// Turn `transform` about the vertical axis to face `point`.
pub(crate) fn face_horizontally(transform: &mut Transform, point: Vec3) {
    let target = Vec3::new(point.x, transform.translation.y, point.z);
    if target.distance_squared(transform.translation) > f32::EPSILON {
        transform.look_at(target, Vec3::Y);
    }
}

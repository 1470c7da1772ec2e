//! Per-tick locomotion.
//!
//! [`tick`] runs the branches of one controller update in a fixed order:
//! boundary checks, airborne physics, movement, rotation, web casting and web
//! release. Each branch reads the mode left by the previous one, so a jump
//! decided during movement is already visible to rotation on the same tick.

use bevy::prelude::*;

use crate::audio::SoundChannel;
use crate::controller::{face_horizontally, Environment, SwingController, TickContext};
use crate::state::{
    AirborneMode, AnimationState, Climb, ClimbPhase, GroundedMode, Mode, Swing, SwingGrip,
};
use crate::surface::SurfaceTag;

/// Run one controller update.
pub fn tick<E: Environment>(controller: &mut SwingController, ctx: &mut TickContext<E>) {
    if controller.mode().is_dead() {
        return;
    }

    check_boundaries(controller, ctx);
    if controller.mode().is_dead() {
        return;
    }

    apply_airborne(controller, ctx);
    apply_movement(controller, ctx);
    apply_rotation(controller, ctx);
    update_web(controller, ctx);
    handle_web_release(controller, ctx);
}

/// Kill the actor below the kill height; unground it outside the level bounds.
pub(crate) fn check_boundaries<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    let position = ctx.transform.translation;
    if position.y < ctx.config.kill_height {
        controller.kill(ctx);
        return;
    }

    if let Some(bounds) = ctx.config.level_bounds {
        if controller.mode().is_grounded() && !bounds.contains(position) {
            controller.leave_ground();
        }
    }
}

/// Extra gravity and the falling animation while airborne.
pub(crate) fn apply_airborne<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    let Mode::Airborne(airborne) = controller.mode() else {
        return;
    };
    let config = ctx.config;

    controller.in_air_timer += ctx.dt * config.air_time_scale;
    ctx.env
        .apply_force(Vec3::NEG_Y * config.fall_force * controller.in_air_timer);

    let delay = if airborne == AirborneMode::Falling {
        config.detached_fall_animation_delay
    } else {
        config.fall_animation_delay
    };

    // No hit below means no falling animation; short hops never trigger it.
    let Some(hit) = controller.ground else {
        return;
    };
    let walkable = hit
        .entity
        .and_then(|surface| ctx.env.surface_tag(surface))
        == Some(SurfaceTag::Walkable);

    if controller.in_air_timer > delay && hit.distance > config.fall_animation_min_height && walkable
    {
        controller.set_animation(AnimationState::Falling);
    }
}

/// Velocity, animation and audio for the current mode.
pub(crate) fn apply_movement<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    let config = ctx.config;

    if !controller.was_moving || !controller.mode().is_grounded() {
        ctx.sounds.stop(SoundChannel::Running);
    }
    if !controller.mode().is_climbing() {
        ctx.sounds.stop(SoundChannel::Climbing);
    }

    if controller.mode().is_falling() {
        ctx.env.set_velocity(Vec3::ZERO);
        return;
    }

    if let Some(anchor) = controller.mode().swing_anchor() {
        let position = ctx.transform.translation;
        let lift = if anchor.point.y > position.y + config.swing_lift_height {
            config.swing_lift
        } else {
            0.0
        };
        let push = ctx.transform.forward().as_vec3() + ctx.transform.up().as_vec3() * lift;
        let velocity = ctx.env.velocity() + push * config.swing_acceleration * ctx.dt;
        ctx.env.set_velocity(velocity);
        return;
    }

    if let Mode::Climbing(climb) = controller.mode() {
        match ctx.env.climb_target(climb.target) {
            Some(target) if ctx.transform.translation.y > target.surface.walkable_height() => {
                controller.mantle(ctx);
            }
            Some(_) => {}
            None => {
                debug!("climb target {} is gone", climb.target);
                controller.set_mode(Mode::Airborne(AirborneMode::Jumping));
            }
        }
    }

    let mut direction = if controller.mode().is_climbing() {
        let up = ctx.transform.up().as_vec3();
        let right = ctx.transform.right().as_vec3();
        ctx.input.climb_direction(up, right) * config.climb_direction_scale
    } else {
        ctx.input.view_direction()
    };

    if ctx.input.jump_just_pressed() {
        controller.jump(ctx);
    }

    let moving = direction != Vec3::ZERO;
    controller.was_moving = moving;

    let grounded = controller.mode().is_grounded();
    let climbing = controller.mode().is_climbing();

    let sprinting = moving && ctx.input.sprint && !climbing;
    if moving {
        if grounded {
            let (animation, gait) = if sprinting {
                (AnimationState::Sprint, GroundedMode::Sprint)
            } else {
                (AnimationState::Run, GroundedMode::Run)
            };
            controller.set_animation(animation);
            controller.set_mode(Mode::Grounded(gait));
        }
        direction *= config.movement_speed(sprinting);
    } else if grounded {
        controller.set_animation(AnimationState::Idle);
        controller.set_mode(Mode::Grounded(GroundedMode::Idle));
    }

    if grounded && moving {
        let pitch = if sprinting { config.sprint_pitch } else { 1.0 };
        ctx.sounds.set_pitch(SoundChannel::Running, pitch);
        ctx.sounds.play_if_idle(SoundChannel::Running);
    }

    if climbing {
        direction = climb_motion(controller, ctx, direction, moving);
    }

    ctx.env.set_velocity(direction);
}

/// Wall probe and climb sub-state. Returns the adjusted motion.
fn climb_motion<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
    mut direction: Vec3,
    moving: bool,
) -> Vec3 {
    let config = ctx.config;

    if let (Some(target), Some(wall)) = (controller.mode().climb_target(), controller.wall) {
        if wall.hits(target) && wall.distance <= config.wall_press_distance {
            direction += ctx.transform.forward().as_vec3();
        } else if wall.distance > config.wall_loss_distance {
            controller.stop_climbing(ctx);
        }
    }

    let Mode::Climbing(climb) = controller.mode() else {
        return direction;
    };

    let phase = if moving {
        if !ctx.sounds.is_playing(SoundChannel::Climbing) {
            ctx.sounds
                .randomize_pitch(SoundChannel::Climbing, config.climb_pitch_range);
            ctx.sounds.play(SoundChannel::Climbing);
        }
        direction /= config.climb_motion_divisor;
        controller.set_animation(AnimationState::Climbing);
        ClimbPhase::Moving
    } else {
        ctx.sounds.stop(SoundChannel::Climbing);
        controller.set_animation(AnimationState::ClimbingIdle);
        ClimbPhase::Idle
    };
    controller.set_mode(Mode::Climbing(Climb { phase, ..climb }));

    direction
}

/// Turn toward the movement direction, or toward the wall while climbing.
pub(crate) fn apply_rotation<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    match controller.mode() {
        Mode::Climbing(climb) => {
            if let Some(target) = ctx.env.climb_target(climb.target) {
                face_horizontally(ctx.transform, target.position);
            }
            return;
        }
        Mode::Airborne(AirborneMode::Falling) | Mode::Dead => return,
        _ => {}
    }

    let mut target_direction = ctx.input.view_direction();
    if target_direction == Vec3::ZERO {
        target_direction = ctx.transform.forward().as_vec3();
    }

    let target_rotation = Transform::IDENTITY
        .looking_to(target_direction, Vec3::Y)
        .rotation;
    let t = (ctx.config.rotation_speed * ctx.dt).min(1.0);
    ctx.transform.rotation = ctx.transform.rotation.slerp(target_rotation, t);
}

/// Swing grip while swinging; otherwise try to cast a web along the aim probe.
pub(crate) fn update_web<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    match controller.mode() {
        Mode::Climbing(_) | Mode::Dead => {}
        Mode::Swinging(swing) => {
            let position = ctx.transform.translation;
            let anchor = swing.anchor.point;
            let (grip, animation) = if position.y < anchor.y && position.x < anchor.x {
                (SwingGrip::TwoArm, AnimationState::SwingingBothArms)
            } else {
                (SwingGrip::OneArm, AnimationState::Swinging)
            };
            controller.set_animation(animation);
            controller.set_mode(Mode::Swinging(Swing { grip, ..swing }));
        }
        _ => {
            if !ctx.input.primary_held {
                return;
            }
            let Some(hit) = controller.aim else {
                return;
            };
            let config = ctx.config;
            if hit.distance <= config.web_range
                && hit.point.y > config.web_min_anchor_height
                && hit.point.y > ctx.transform.translation.y
            {
                controller.start_swinging(hit.point, ctx);
            }
        }
    }
}

/// Let go of the web when the primary action is released.
pub(crate) fn handle_web_release<E: Environment>(
    controller: &mut SwingController,
    ctx: &mut TickContext<E>,
) {
    if ctx.input.primary_just_released() {
        controller.release_web(ctx);
    }
}

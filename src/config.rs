//! Controller configuration components.
//!
//! [`SwingConfig`] carries every tuning value of the controller. The defaults
//! are tuned for a human-sized actor in a city block level; the `with_*`
//! builders adjust the values most often tuned per character.

use bevy::prelude::*;
use thiserror::Error;

/// Horizontal rectangle (on the XZ plane) outside of which a grounded actor
/// is considered to have walked off the level.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct LevelBounds {
    /// Minimum corner (`x`, `z`).
    pub min: Vec2,
    /// Maximum corner (`x`, `z`).
    pub max: Vec2,
}

impl LevelBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Whether a world position is inside the bounds (inclusive).
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.z >= self.min.y
            && position.z <= self.max.y
    }
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self {
            min: Vec2::new(-18.0, -24.6),
            max: Vec2::new(107.0, 126.0),
        }
    }
}

/// Configuration parameters for a swing controller.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct SwingConfig {
    // === Movement Settings ===
    /// Movement speed while running (units/second).
    pub run_speed: f32,
    /// Movement speed while sprinting (units/second).
    pub sprint_speed: f32,
    /// Turn rate used as the slerp factor per second.
    pub rotation_speed: f32,
    /// Upward force applied on jump.
    pub jump_force: f32,

    // === Air Settings ===
    /// Rate at which the in-air timer grows, per second of real time.
    pub air_time_scale: f32,
    /// Downward force per unit of in-air time.
    pub fall_force: f32,
    /// In-air time after which the falling animation may play.
    pub fall_animation_delay: f32,
    /// Same as `fall_animation_delay` after pushing off a wall.
    pub detached_fall_animation_delay: f32,
    /// Minimum ground distance below for the falling animation.
    pub fall_animation_min_height: f32,
    /// Maximum length of the downward probe.
    pub ground_probe_distance: f32,
    /// Minimum height to count as leaving the ground when contact ends.
    pub ground_exit_min_height: f32,
    /// Grounded actors outside these bounds become airborne. `None` disables the check.
    pub level_bounds: Option<LevelBounds>,
    /// Height below which the actor is dead and the level reloads.
    pub kill_height: f32,

    // === Landing Settings ===
    /// In-air time above which a landing from the falling animation is hard.
    pub hard_landing_air_time: f32,
    /// Seconds a hard landing keeps the actor from being grounded.
    pub hard_landing_recovery: f32,

    // === Climbing Settings ===
    /// Multiplier of the normalized climb direction.
    pub climb_direction_scale: f32,
    /// Divisor applied to climb motion while moving.
    pub climb_motion_divisor: f32,
    /// Wall probe distance within which the actor is pressed into the wall.
    pub wall_press_distance: f32,
    /// Wall probe distance beyond which the climb is lost.
    pub wall_loss_distance: f32,
    /// Backward force applied when pushing off a wall.
    pub detach_force: f32,
    /// Upward nudge when mantling over the top.
    pub mantle_lift: f32,
    /// Forward nudge when mantling over the top.
    pub mantle_forward: f32,
    /// Maximum length of the forward wall probe.
    pub wall_probe_distance: f32,

    // === Web Settings ===
    /// Maximum web cast distance.
    pub web_range: f32,
    /// Web anchors must be above this world height.
    pub web_min_anchor_height: f32,
    /// Anchor is raised this far above the hit point.
    pub web_anchor_raise: f32,
    /// Maximum constraint distance as a fraction of the cast distance.
    pub web_max_distance_ratio: f32,
    /// Minimum constraint distance as a fraction of the cast distance.
    pub web_min_distance_ratio: f32,
    /// Spring stiffness of the web constraint.
    pub web_spring: f32,
    /// Damping of the web constraint.
    pub web_damper: f32,
    /// Seconds after which the web lets go on its own.
    pub web_release_after: f32,
    /// Velocity gained per second while swinging.
    pub swing_acceleration: f32,
    /// Extra upward factor on long upward swings.
    pub swing_lift: f32,
    /// Anchor height above the actor from which `swing_lift` applies.
    pub swing_lift_height: f32,
    /// Hand position relative to the actor, in actor space.
    pub hand_offset: Vec3,
    /// Rope start is raised this far above the hand.
    pub rope_hand_raise: f32,

    // === Audio Settings ===
    /// Running loop pitch while sprinting.
    pub sprint_pitch: f32,
    /// Pitch range of the climbing loop.
    pub climb_pitch_range: (f32, f32),
    /// Pitch range of the web shot.
    pub web_pitch_range: (f32, f32),
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            // Movement settings
            run_speed: 5.0,
            sprint_speed: 10.0,
            rotation_speed: 15.0,
            jump_force: 800.0,

            // Air settings
            air_time_scale: 2.5,
            fall_force: 125.0,
            fall_animation_delay: 1.5,
            detached_fall_animation_delay: 3.0,
            fall_animation_min_height: 5.0,
            ground_probe_distance: 1000.0,
            ground_exit_min_height: 1.0,
            level_bounds: Some(LevelBounds::default()),
            kill_height: -2.0,

            // Landing settings
            hard_landing_air_time: 2.5,
            hard_landing_recovery: 0.5,

            // Climbing settings
            climb_direction_scale: 2.0,
            climb_motion_divisor: 5.0,
            wall_press_distance: 0.5,
            wall_loss_distance: 2.0,
            detach_force: 1000.0,
            mantle_lift: 2.25,
            mantle_forward: 1.0 / 1.5,
            wall_probe_distance: 1000.0,

            // Web settings
            web_range: 75.0,
            web_min_anchor_height: 3.0,
            web_anchor_raise: 1.5,
            web_max_distance_ratio: 0.7,
            web_min_distance_ratio: 0.1,
            web_spring: 35.0,
            web_damper: 20.0,
            web_release_after: 2.0,
            swing_acceleration: 10.0,
            swing_lift: 1.75,
            swing_lift_height: 5.0,
            hand_offset: Vec3::new(0.35, 1.2, 0.0),
            rope_hand_raise: 0.15,

            // Audio settings
            sprint_pitch: 1.5,
            climb_pitch_range: (0.95, 1.05),
            web_pitch_range: (0.85, 1.15),
        }
    }
}

/// Reasons a [`SwingConfig`] cannot drive a controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("web distance ratios must satisfy 0 < min ({min}) < max ({max}) <= 1")]
    WebRatios { min: f32, max: f32 },
    #[error("{name} pitch range is empty: ({min}, {max})")]
    PitchRange { name: &'static str, min: f32, max: f32 },
    #[error("wall press distance {press} must not exceed wall loss distance {loss}")]
    WallDistances { press: f32, loss: f32 },
    #[error("level bounds are inverted: min {min} max {max}")]
    LevelBounds { min: Vec2, max: Vec2 },
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn pitch_range(name: &'static str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if min > 0.0 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::PitchRange { name, min, max })
    }
}

impl SwingConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("run_speed", self.run_speed)?;
        positive("sprint_speed", self.sprint_speed)?;
        positive("rotation_speed", self.rotation_speed)?;
        positive("air_time_scale", self.air_time_scale)?;
        positive("climb_motion_divisor", self.climb_motion_divisor)?;
        positive("web_range", self.web_range)?;
        positive("web_release_after", self.web_release_after)?;
        positive("hard_landing_recovery", self.hard_landing_recovery)?;
        positive("ground_probe_distance", self.ground_probe_distance)?;
        positive("wall_probe_distance", self.wall_probe_distance)?;

        let (min, max) = (self.web_min_distance_ratio, self.web_max_distance_ratio);
        if !(min > 0.0 && min < max && max <= 1.0) {
            return Err(ConfigError::WebRatios { min, max });
        }

        if self.wall_press_distance > self.wall_loss_distance {
            return Err(ConfigError::WallDistances {
                press: self.wall_press_distance,
                loss: self.wall_loss_distance,
            });
        }

        if let Some(bounds) = self.level_bounds {
            if bounds.min.x > bounds.max.x || bounds.min.y > bounds.max.y {
                return Err(ConfigError::LevelBounds {
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }

        pitch_range("climb", self.climb_pitch_range)?;
        pitch_range("web", self.web_pitch_range)?;
        Ok(())
    }

    /// Speed for the current sprint state.
    #[inline]
    pub fn movement_speed(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint_speed
        } else {
            self.run_speed
        }
    }

    /// Create a config for a heavier, slower character.
    pub fn heavy() -> Self {
        Self {
            run_speed: 3.5,
            sprint_speed: 7.0,
            rotation_speed: 8.0,
            swing_acceleration: 7.0,
            ..default()
        }
    }

    /// Builder: set run and sprint speed.
    pub fn with_speeds(mut self, run: f32, sprint: f32) -> Self {
        self.run_speed = run;
        self.sprint_speed = sprint;
        self
    }

    /// Builder: set rotation speed.
    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    /// Builder: set jump force.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set or clear the level bounds.
    pub fn with_level_bounds(mut self, bounds: Option<LevelBounds>) -> Self {
        self.level_bounds = bounds;
        self
    }

    /// Builder: set the kill height.
    pub fn with_kill_height(mut self, height: f32) -> Self {
        self.kill_height = height;
        self
    }

    /// Builder: set the web range and auto-release delay.
    pub fn with_web(mut self, range: f32, release_after: f32) -> Self {
        self.web_range = range;
        self.web_release_after = release_after;
        self
    }

    /// Builder: set the web spring parameters.
    pub fn with_web_spring(mut self, spring: f32, damper: f32) -> Self {
        self.web_spring = spring;
        self.web_damper = damper;
        self
    }

    /// Builder: set the hand offset used for the rope.
    pub fn with_hand_offset(mut self, offset: Vec3) -> Self {
        self.hand_offset = offset;
        self
    }
}

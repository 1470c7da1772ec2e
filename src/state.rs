//! Controller modes, animation states and outbound notifications.
//!
//! [`Mode`] is a single tagged union: the climb target lives inside
//! [`Mode::Climbing`] and the web anchor inside [`Mode::Swinging`], so an actor
//! can never be climbing and swinging at once, or climbing without something
//! to climb.

use bevy::prelude::*;

use crate::config::SwingConfig;

/// Grounded sub-mode, picked from input every tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundedMode {
    #[default]
    Idle,
    Run,
    Sprint,
}

/// Airborne sub-mode.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AirborneMode {
    /// In the air under normal control: after a jump, a web release, a
    /// mantle or walking off an edge.
    #[default]
    Jumping,
    /// Pushed off a wall. Horizontal control is suppressed until landing.
    Falling,
    /// Touched down hard and waiting for the recovery timer to ground.
    HardLanding,
}

/// Climbing sub-mode.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClimbPhase {
    Moving,
    #[default]
    Idle,
    /// Pushing off the wall; resolves to [`AirborneMode::Falling`] within the
    /// same tick.
    Detaching,
}

/// An active climb.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Climb {
    pub phase: ClimbPhase,
    /// The surface being climbed. Not owned; it may be despawned at any time.
    pub target: Entity,
}

/// Which arms the swing animation uses.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwingGrip {
    #[default]
    OneArm,
    TwoArm,
}

/// An active swing.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct Swing {
    pub grip: SwingGrip,
    pub anchor: SwingAnchor,
}

/// Locomotion mode of an actor. Exactly one is active at any time.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Grounded(GroundedMode),
    Airborne(AirborneMode),
    Climbing(Climb),
    Swinging(Swing),
    Dead,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Grounded(GroundedMode::Idle)
    }
}

impl Mode {
    pub fn is_grounded(&self) -> bool {
        matches!(self, Mode::Grounded(_))
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self, Mode::Airborne(_))
    }

    /// Pushed off a wall (not just in the air).
    pub fn is_falling(&self) -> bool {
        matches!(self, Mode::Airborne(AirborneMode::Falling))
    }

    pub fn is_climbing(&self) -> bool {
        matches!(self, Mode::Climbing(_))
    }

    pub fn is_swinging(&self) -> bool {
        matches!(self, Mode::Swinging(_))
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Mode::Dead)
    }

    /// The surface being climbed, if climbing.
    pub fn climb_target(&self) -> Option<Entity> {
        match self {
            Mode::Climbing(climb) => Some(climb.target),
            _ => None,
        }
    }

    /// The web anchor, if swinging.
    pub fn swing_anchor(&self) -> Option<&SwingAnchor> {
        match self {
            Mode::Swinging(swing) => Some(&swing.anchor),
            _ => None,
        }
    }
}

/// Web anchor point and the spring constraint attached to it.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SwingAnchor {
    /// World-space anchor, raised above the hit point.
    pub point: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub spring: f32,
    pub damper: f32,
}

impl SwingAnchor {
    /// Build the anchor for a web cast from `actor_position` that hit `hit_point`.
    ///
    /// Distance bounds are proportional to the distance to the raw hit point;
    /// the anchor itself is raised by `config.web_anchor_raise`.
    pub fn from_cast(actor_position: Vec3, hit_point: Vec3, config: &SwingConfig) -> Self {
        let distance = actor_position.distance(hit_point);
        Self {
            point: hit_point + Vec3::Y * config.web_anchor_raise,
            min_distance: distance * config.web_min_distance_ratio,
            max_distance: distance * config.web_max_distance_ratio,
            spring: config.web_spring,
            damper: config.web_damper,
        }
    }
}

/// Animation state requested from the presentation layer.
///
/// Discriminants match the animator's integer `State` parameter.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum AnimationState {
    #[default]
    Idle = 0,
    Run = 1,
    Sprint = 2,
    Jump = 3,
    RunningJump = 4,
    Climbing = 5,
    ClimbingIdle = 6,
    ClimbJump = 7,
    HardLanding = 8,
    Falling = 9,
    Swinging = 10,
    SwingingBothArms = 11,
    Death = 12,
}

impl AnimationState {
    /// The animator parameter value.
    pub fn as_index(self) -> i32 {
        self as i32
    }
}

/// Sent whenever an actor changes [`Mode`].
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ModeChanged {
    pub entity: Entity,
    pub from: Mode,
    pub to: Mode,
}

/// Sent whenever an actor's requested [`AnimationState`] changes.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationChanged {
    pub entity: Entity,
    pub state: AnimationState,
}

/// Sent once when an actor falls out of the level.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelReloadRequested {
    pub entity: Entity,
}

/// Endpoints of the web rope, refreshed after transform propagation.
///
/// `None` means the rope should not be drawn.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct WebRope {
    pub endpoints: Option<(Vec3, Vec3)>,
}

impl WebRope {
    pub fn is_visible(&self) -> bool {
        self.endpoints.is_some()
    }
}

/// Where an actor is put back on a level reload.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct SpawnPoint {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl SpawnPoint {
    /// Capture the spawn point from an initial transform.
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            translation: transform.translation,
            rotation: transform.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_grounded_idle() {
        let mode = Mode::default();
        assert_eq!(mode, Mode::Grounded(GroundedMode::Idle));
        assert!(mode.is_grounded());
        assert!(mode.climb_target().is_none());
        assert!(mode.swing_anchor().is_none());
    }

    #[test]
    fn falling_is_a_kind_of_airborne() {
        let falling = Mode::Airborne(AirborneMode::Falling);
        assert!(falling.is_airborne());
        assert!(falling.is_falling());
        assert!(!Mode::Airborne(AirborneMode::Jumping).is_falling());
    }

    #[test]
    fn climbing_carries_its_target() {
        let mut world = World::new();
        let wall = world.spawn_empty().id();
        let mode = Mode::Climbing(Climb {
            phase: ClimbPhase::Moving,
            target: wall,
        });
        assert!(mode.is_climbing());
        assert_eq!(mode.climb_target(), Some(wall));
    }

    #[test]
    fn anchor_bounds_follow_cast_distance() {
        let config = SwingConfig::default();
        let anchor = SwingAnchor::from_cast(Vec3::ZERO, Vec3::new(0.0, 20.0, 0.0), &config);

        assert!((anchor.min_distance - 2.0).abs() < 1e-4);
        assert!((anchor.max_distance - 14.0).abs() < 1e-4);
        assert!(anchor.min_distance < anchor.max_distance);
        assert_eq!(anchor.point, Vec3::new(0.0, 21.5, 0.0));
        assert_eq!(anchor.spring, 35.0);
        assert_eq!(anchor.damper, 20.0);
    }

    #[test]
    fn animation_indices_match_animator() {
        assert_eq!(AnimationState::Idle.as_index(), 0);
        assert_eq!(AnimationState::HardLanding.as_index(), 8);
        assert_eq!(AnimationState::Falling.as_index(), 9);
        assert_eq!(AnimationState::Death.as_index(), 12);
    }

    #[test]
    fn spawn_point_from_transform() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0);
        let spawn = SpawnPoint::from_transform(&transform);
        assert_eq!(spawn.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(spawn.rotation, Quat::IDENTITY);
    }
}

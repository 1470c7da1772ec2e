//! # `swing_character_controller`
//!
//! A third-person swing, climb and run character controller for Bevy with
//! physics backend abstraction.
//!
//! This crate provides a state-machine driven character controller that:
//! - Runs and sprints relative to a follow camera's view
//! - Climbs tagged surfaces and mantles over their top
//! - Swings from a web attached with a spring joint
//! - Tracks air time for falling animations and hard landings
//! - Emits animation, sound and rope intents for the presentation layer
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Every fixed tick runs in ordered phases ([`SwingControllerSet`]):
//! 1. Deferred tasks (web auto-release, hard landing recovery) fire
//! 2. The backend's sensors fill the ground, wall and aim probes
//! 3. Climbable surfaces are re-tagged from the actor height
//! 4. Contact notifications drive landing and climb entry
//! 5. The locomotion tick moves the actor for its current [`Mode`](state::Mode)
//! 6. Recorded changes become events and forces reach the physics engine
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use swing_character_controller::prelude::*;
//!
//! // Controller components for a player character
//! let controller = SwingController::new();
//! let config = SwingConfig::default();
//! let input = SwingInput::default();
//!
//! // These can be spawned together with the backend's physics bundle
//! ```

use std::marker::PhantomData;

use bevy::prelude::*;
use bevy::transform::TransformSystem;

pub mod audio;
pub mod backend;
pub mod camera;
pub mod collision;
pub mod config;
pub mod controller;
pub mod input;
pub mod intent;
pub mod locomotion;
pub mod state;
pub mod surface;
pub mod systems;
pub mod timers;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::audio::{SoundBoard, SoundChannel, SoundCue};
    pub use crate::backend::{CharacterPhysicsBackend, NoOpBackendPlugin};
    pub use crate::camera::FollowCamera;
    pub use crate::collision::{CollisionData, ContactEvent, ContactKind};
    pub use crate::config::{ConfigError, LevelBounds, SwingConfig};
    pub use crate::controller::SwingController;
    pub use crate::input::{PlayerControlled, SwingInputPlugin};
    pub use crate::intent::SwingInput;
    pub use crate::state::{
        AirborneMode, AnimationChanged, AnimationState, Climb, ClimbPhase, GroundedMode,
        LevelReloadRequested, Mode, ModeChanged, SpawnPoint, Swing, SwingAnchor, SwingGrip,
        WebRope,
    };
    pub use crate::surface::{ClimbableSurface, SurfaceTag};
    pub use crate::timers::DeferredTask;
    pub use crate::{SwingControllerPlugin, SwingControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets for the controller's fixed tick, run in this order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwingControllerSet {
    /// Clear last tick's forces and fire deferred tasks.
    Preparation,
    /// Backend probes and contact translation.
    Sensors,
    /// Surface tags from actor heights.
    Classification,
    /// Contact-driven transitions.
    Contacts,
    /// The per-tick locomotion update.
    Locomotion,
    /// Events out, forces into the physics engine.
    FinalApplication,
}

/// Main plugin for the swing controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity, forces, springs, probes).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use swing_character_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(SwingControllerPlugin::<Rapier3dBackend>::default())
///     .add_plugins(SwingInputPlugin)
///     .run();
/// ```
pub struct SwingControllerPlugin<B: backend::CharacterPhysicsBackend> {
    sound_seed: Option<u64>,
    _marker: PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for SwingControllerPlugin<B> {
    fn default() -> Self {
        Self {
            sound_seed: None,
            _marker: PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> SwingControllerPlugin<B> {
    /// Seed the pitch variation of the sound board.
    pub fn with_sound_seed(mut self, seed: u64) -> Self {
        self.sound_seed = Some(seed);
        self
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for SwingControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::SwingController>();
        app.register_type::<config::SwingConfig>();
        app.register_type::<intent::SwingInput>();
        app.register_type::<state::WebRope>();
        app.register_type::<state::SpawnPoint>();
        app.register_type::<surface::SurfaceTag>();
        app.register_type::<surface::ClimbableSurface>();
        app.register_type::<camera::FollowCamera>();

        app.add_event::<collision::ContactEvent>();
        app.add_event::<state::ModeChanged>();
        app.add_event::<state::AnimationChanged>();
        app.add_event::<state::LevelReloadRequested>();
        app.add_event::<audio::SoundCue>();

        if !app.world().contains_resource::<audio::SoundBoard>() {
            let sounds = match self.sound_seed {
                Some(seed) => audio::SoundBoard::seeded(seed),
                None => audio::SoundBoard::default(),
            };
            app.insert_resource(sounds);
        }

        app.configure_sets(
            FixedUpdate,
            (
                SwingControllerSet::Preparation,
                SwingControllerSet::Sensors,
                SwingControllerSet::Classification,
                SwingControllerSet::Contacts,
                SwingControllerSet::Locomotion,
                SwingControllerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::capture_spawn_points,
                systems::report_invalid_configs,
                systems::run_deferred_tasks::<B>,
            )
                .chain()
                .in_set(SwingControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            surface::classify_surfaces.in_set(SwingControllerSet::Classification),
        );
        app.add_systems(
            FixedUpdate,
            systems::handle_contacts::<B>.in_set(SwingControllerSet::Contacts),
        );
        app.add_systems(
            FixedUpdate,
            systems::update_controllers::<B>.in_set(SwingControllerSet::Locomotion),
        );
        app.add_systems(
            FixedUpdate,
            (systems::flush_presentation, systems::reload_level::<B>)
                .chain()
                .in_set(SwingControllerSet::FinalApplication),
        );

        app.add_systems(Update, camera::follow_camera);
        app.add_systems(
            PostUpdate,
            systems::update_web_rope.after(TransformSystem::TransformPropagate),
        );
    }
}

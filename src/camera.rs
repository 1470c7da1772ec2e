//! Follow camera.
//!
//! The camera rides above the actor at the height it was spawned at, turns
//! with the look input and publishes its forward/right axes as the actor's
//! view basis, which is what movement input is relative to.

use bevy::prelude::*;

use crate::controller::SwingController;
use crate::intent::SwingInput;

/// A camera that follows an actor.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct FollowCamera {
    /// Actor to follow. `None` picks any actor.
    pub target: Option<Entity>,
    /// Scale of look and zoom input.
    pub sensitivity: f32,
    /// Pitch limits in degrees (`x` = down, `y` = up).
    pub pitch_limits: Vec2,
    /// Whether scrolling changes the field of view.
    pub can_zoom: bool,
    /// Cleared when there is no actor to follow.
    pub enabled: bool,
    yaw: f32,
    pitch: f32,
    height_offset: Option<f32>,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            target: None,
            sensitivity: 5.0,
            pitch_limits: Vec2::new(-45.0, 40.0),
            can_zoom: true,
            enabled: true,
            yaw: 0.0,
            pitch: 0.0,
            height_offset: None,
        }
    }
}

impl FollowCamera {
    /// Follow a specific actor.
    pub fn following(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..default()
        }
    }

    /// Accumulated yaw in degrees; positive turns right.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Accumulated pitch in degrees; positive looks up.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Add a look delta, clamping the pitch.
    pub fn turn(&mut self, look: Vec2) {
        self.yaw += look.x * self.sensitivity;
        self.pitch = (self.pitch + look.y * self.sensitivity)
            .clamp(self.pitch_limits.x, self.pitch_limits.y);
    }

    /// Camera orientation for the accumulated yaw and pitch.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            (-self.yaw).to_radians(),
            self.pitch.to_radians(),
            0.0,
        )
    }
}

/// Move each follow camera with its actor and feed back the view basis.
pub fn follow_camera(
    mut q_cameras: Query<
        (&mut FollowCamera, &mut Transform, Option<&mut Projection>),
        Without<SwingController>,
    >,
    mut q_actors: Query<(Entity, &Transform, &mut SwingInput), With<SwingController>>,
) {
    for (mut camera, mut transform, projection) in &mut q_cameras {
        if !camera.enabled {
            continue;
        }

        let target = camera
            .target
            .or_else(|| q_actors.iter().next().map(|(entity, _, _)| entity));
        let tracked = match target {
            Some(target) => q_actors.get_mut(target).ok(),
            None => None,
        };
        let Some((_, actor, mut input)) = tracked else {
            error!("follow camera has no actor to track, disabling it");
            camera.enabled = false;
            continue;
        };

        let height = *camera.height_offset.get_or_insert(transform.translation.y);
        transform.translation = actor.translation + Vec3::Y * height;

        if camera.can_zoom && input.scroll != 0.0 {
            if let Some(mut projection) = projection {
                if let Projection::Perspective(perspective) = &mut *projection {
                    let zoom = (input.scroll * camera.sensitivity * 2.0).to_radians();
                    perspective.fov = (perspective.fov - zoom).clamp(0.01, 3.1);
                }
            }
        }

        camera.turn(input.look);
        transform.rotation = camera.rotation();

        let forward = transform.forward().as_vec3();
        let right = transform.right().as_vec3();
        input.set_view(forward, right);
    }
}

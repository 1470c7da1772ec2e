//! Keyboard and mouse input.
//!
//! [`SwingInputPlugin`] fills the [`SwingInput`] of every actor marked
//! [`PlayerControlled`] once per frame:
//!
//! | Input | Action |
//! |---|---|
//! | W/A/S/D, arrow keys | movement |
//! | Left Shift | sprint |
//! | Space | jump |
//! | Left mouse button | shoot / hold web |
//! | Mouse motion | look |
//! | Mouse wheel | zoom |
//!
//! The aim ray goes from the [`FollowCamera`] through the cursor.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::camera::{follow_camera, FollowCamera};
use crate::intent::SwingInput;

/// Marks the actor driven by the keyboard and mouse.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct PlayerControlled;

/// Scaling of raw mouse input.
#[derive(Resource, Debug, Clone, Copy)]
pub struct PlayerInputSettings {
    /// Look units per pixel of mouse motion.
    pub look_scale: f32,
    /// Scroll units per wheel line.
    pub scroll_scale: f32,
    /// Pixels per wheel line for pixel-based scrolling devices.
    pub pixels_per_line: f32,
}

impl Default for PlayerInputSettings {
    fn default() -> Self {
        Self {
            look_scale: 0.1,
            scroll_scale: 0.1,
            pixels_per_line: 100.0,
        }
    }
}

/// Plugin mapping keyboard and mouse to [`SwingInput`].
///
/// Requires Bevy's input and window plugins (part of `DefaultPlugins`).
pub struct SwingInputPlugin;

impl Plugin for SwingInputPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlayerControlled>();
        app.init_resource::<PlayerInputSettings>();
        app.add_systems(Update, read_player_input.before(follow_camera));
    }
}

fn axis(keyboard: &ButtonInput<KeyCode>, positive: [KeyCode; 2], negative: [KeyCode; 2]) -> f32 {
    let mut value = 0.0;
    if keyboard.any_pressed(positive) {
        value += 1.0;
    }
    if keyboard.any_pressed(negative) {
        value -= 1.0;
    }
    value
}

/// Read keyboard and mouse into the player's [`SwingInput`].
#[allow(clippy::too_many_arguments)]
pub fn read_player_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    settings: Res<PlayerInputSettings>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    q_window: Query<&Window, With<PrimaryWindow>>,
    q_camera: Query<(&Camera, &GlobalTransform), With<FollowCamera>>,
    mut q_inputs: Query<&mut SwingInput, With<PlayerControlled>>,
) {
    let movement = Vec2::new(
        axis(
            &keyboard,
            [KeyCode::KeyD, KeyCode::ArrowRight],
            [KeyCode::KeyA, KeyCode::ArrowLeft],
        ),
        axis(
            &keyboard,
            [KeyCode::KeyW, KeyCode::ArrowUp],
            [KeyCode::KeyS, KeyCode::ArrowDown],
        ),
    );

    // Screen y grows downward; look y is positive upward.
    let look = motion
        .read()
        .fold(Vec2::ZERO, |acc, event| acc + Vec2::new(event.delta.x, -event.delta.y))
        * settings.look_scale;

    let scroll = wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / settings.pixels_per_line,
        })
        .sum::<f32>()
        * settings.scroll_scale;

    let aim = q_window
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .and_then(|cursor| {
            let (camera, global) = q_camera.iter().next()?;
            camera.viewport_to_world(global, cursor).ok()
        });

    for mut input in &mut q_inputs {
        input.set_movement(movement);
        input.set_sprint(keyboard.pressed(KeyCode::ShiftLeft));
        input.set_jump_pressed(keyboard.pressed(KeyCode::Space));
        input.set_primary_held(mouse.pressed(MouseButton::Left));
        input.look = look;
        input.scroll = scroll;
        input.set_aim(aim);
    }
}

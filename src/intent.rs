//! Player input component.
//!
//! [`SwingInput`] is the only way the controller learns what the player wants.
//! Fill it from keyboard/mouse (see [`SwingInputPlugin`](crate::input::SwingInputPlugin)),
//! a gamepad, an AI or a test. Button edges are detected by the controller:
//! just pass the current held state every frame.

use bevy::prelude::*;

/// Desired movement and actions of an actor.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use swing_character_controller::prelude::*;
///
/// let mut input = SwingInput::default();
/// input.set_movement(Vec2::new(0.0, 1.0));
/// input.set_sprint(true);
/// assert!(input.is_moving());
///
/// // Forward on a level camera is the actor's forward.
/// assert_eq!(input.view_direction(), Vec3::NEG_Z);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct SwingInput {
    /// Raw movement axes: `x` = right (+) / left (-), `y` = forward (+) / back (-).
    pub movement: Vec2,
    /// Sprint modifier held.
    pub sprint: bool,
    /// Primary action (web) held.
    pub primary_held: bool,
    pub(crate) primary_held_prev: bool,
    /// Jump button held. Only the rising edge matters.
    pub jump_pressed: bool,
    pub(crate) jump_pressed_prev: bool,
    /// Look delta accumulated this frame.
    pub look: Vec2,
    /// Scroll delta accumulated this frame.
    pub scroll: f32,
    /// Ray from the view through the aim point, used for web casts.
    #[reflect(ignore)]
    pub aim: Option<Ray3d>,
    /// Forward of the view the movement axes are relative to.
    pub view_forward: Vec3,
    /// Right of the view the movement axes are relative to.
    pub view_right: Vec3,
}

impl Default for SwingInput {
    fn default() -> Self {
        Self {
            movement: Vec2::ZERO,
            sprint: false,
            primary_held: false,
            primary_held_prev: false,
            jump_pressed: false,
            jump_pressed_prev: false,
            look: Vec2::ZERO,
            scroll: 0.0,
            aim: None,
            view_forward: Vec3::NEG_Z,
            view_right: Vec3::X,
        }
    }
}

impl SwingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axes. Each axis is clamped to -1.0..=1.0.
    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    pub fn set_sprint(&mut self, sprint: bool) {
        self.sprint = sprint;
    }

    pub fn set_primary_held(&mut self, held: bool) {
        self.primary_held = held;
    }

    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    pub fn set_aim(&mut self, aim: Option<Ray3d>) {
        self.aim = aim;
    }

    /// Set the view basis movement is relative to.
    pub fn set_view(&mut self, forward: Vec3, right: Vec3) {
        self.view_forward = forward;
        self.view_right = right;
    }

    /// Clear axes and buttons, keeping the view basis.
    pub fn clear(&mut self) {
        let (view_forward, view_right) = (self.view_forward, self.view_right);
        *self = Self {
            view_forward,
            view_right,
            ..default()
        };
    }

    /// Whether any movement axis is active.
    pub fn is_moving(&self) -> bool {
        self.movement != Vec2::ZERO
    }

    /// Jump went from released to pressed since the last controller tick.
    pub fn jump_just_pressed(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }

    /// Primary action went from held to released since the last controller tick.
    pub fn primary_just_released(&self) -> bool {
        !self.primary_held && self.primary_held_prev
    }

    /// Horizontal movement direction relative to the view.
    ///
    /// The view-relative direction is normalized first and its vertical
    /// component dropped afterwards, so a pitched view yields a shorter vector.
    pub fn view_direction(&self) -> Vec3 {
        let mut direction = (self.view_forward * self.movement.y
            + self.view_right * self.movement.x)
            .normalize_or_zero();
        direction.y = 0.0;
        direction
    }

    /// Movement direction on a wall, relative to the actor's own axes.
    pub fn climb_direction(&self, up: Vec3, right: Vec3) -> Vec3 {
        (up * self.movement.y + right * self.movement.x).normalize_or_zero()
    }

    /// Latch the button states for edge detection. Called once per controller tick.
    pub(crate) fn end_tick(&mut self) {
        self.jump_pressed_prev = self.jump_pressed;
        self.primary_held_prev = self.primary_held;
    }
}

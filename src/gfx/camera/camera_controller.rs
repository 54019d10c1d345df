use cgmath::{Vector3, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;
use crate::config::CameraConfig;

/// Orbit controls: left drag rotates, right drag or shift+left drag pans,
/// the wheel zooms.
///
/// With damping enabled, rotation and pan input accumulate and each
/// [`CameraController::update`] applies `factor` of the pending amount, then
/// shrinks what remains by `1 - factor`. Zoom is applied immediately.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_scale: f32,
    pub pan_speed: f32,
    pub damping: Option<f32>,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: Vector3<f32>,
    is_shift_held: bool,
    is_left_pressed: bool,
    is_right_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_scale: f32) -> Self {
        Self {
            rotate_speed,
            zoom_scale,
            pan_speed: 0.002,
            damping: None,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: Vector3::zero(),
            is_shift_held: false,
            is_left_pressed: false,
            is_right_pressed: false,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut controller = Self::new(config.rotate_speed, config.zoom_scale);
        controller.pan_speed = config.pan_speed;
        if config.damping {
            controller = controller.with_damping(config.damping_factor);
        }
        controller
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.damping = Some(factor);
        self
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.is_left_pressed = pressed,
            MouseButton::Right => self.is_right_pressed = pressed,
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight) = event.physical_key {
            self.is_shift_held = event.state == ElementState::Pressed;
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        match event {
            DeviceEvent::MouseWheel { delta } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 100.0,
                };
                self.zoom(notches, camera);
            }
            DeviceEvent::MouseMotion { delta } => {
                let (dx, dy) = (delta.0 as f32, delta.1 as f32);
                if self.is_panning() {
                    self.pan(dx, dy, camera);
                } else if self.is_rotating() {
                    self.rotate(dx, dy);
                }
            }
            _ => (),
        }
    }

    /// Queues a rotation for a mouse motion of `(dx, dy)` pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * self.rotate_speed;
        self.pending_pitch += dy * self.rotate_speed;
    }

    /// Queues a pan of the focus point in the camera's screen plane
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &OrbitCamera) {
        let (right, up) = camera.screen_axes();
        let scale = self.pan_speed * camera.distance;
        self.pending_pan += (-right * dx + up * dy) * scale;
    }

    /// Positive notches zoom in
    pub fn zoom(&mut self, notches: f32, camera: &mut OrbitCamera) {
        if notches != 0.0 {
            camera.scale_distance(self.zoom_scale.powf(notches));
        }
    }

    /// Applies pending input to the camera, easing it out when damped
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        let factor = self.damping.unwrap_or(1.0);

        if self.pending_yaw != 0.0 {
            camera.add_yaw(self.pending_yaw * factor);
        }
        if self.pending_pitch != 0.0 {
            camera.add_pitch(self.pending_pitch * factor);
        }
        if !self.pending_pan.is_zero() {
            camera.translate_target(self.pending_pan * factor);
        }

        let keep = 1.0 - factor;
        self.pending_yaw *= keep;
        self.pending_pitch *= keep;
        self.pending_pan *= keep;
    }

    pub fn is_panning(&self) -> bool {
        self.is_right_pressed || (self.is_left_pressed && self.is_shift_held)
    }

    pub fn is_rotating(&self) -> bool {
        self.is_left_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_position(Vector3::new(4.0, 2.0, 5.0), Vector3::zero(), 1.5)
    }

    #[test]
    fn damped_update_applies_a_fraction() {
        let mut camera = camera();
        let start_yaw = camera.yaw;
        let mut controller = CameraController::new(0.01, 0.95).with_damping(0.05);

        controller.rotate(-10.0, 0.0);
        controller.update(&mut camera);

        assert_relative_eq!(camera.yaw - start_yaw, 0.1 * 0.05, epsilon = 1e-6);
        assert_relative_eq!(controller.pending_yaw, 0.1 * 0.95, epsilon = 1e-6);
    }

    #[test]
    fn damping_converges_to_the_full_delta() {
        let mut camera = camera();
        let start_yaw = camera.yaw;
        let mut controller = CameraController::new(0.01, 0.95).with_damping(0.05);

        controller.rotate(-10.0, 0.0);
        for _ in 0..500 {
            controller.update(&mut camera);
        }

        assert_relative_eq!(camera.yaw - start_yaw, 0.1, epsilon = 1e-4);
        assert!(controller.pending_yaw.abs() < 1e-6);
    }

    #[test]
    fn undamped_update_applies_everything_at_once() {
        let mut camera = camera();
        let start_pitch = camera.pitch;
        let mut controller = CameraController::new(0.01, 0.95);

        controller.rotate(0.0, 10.0);
        controller.update(&mut camera);
        assert_relative_eq!(camera.pitch - start_pitch, 0.1, epsilon = 1e-6);

        controller.update(&mut camera);
        assert_relative_eq!(camera.pitch - start_pitch, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn zoom_is_immediate_and_multiplicative() {
        let mut camera = camera();
        let start = camera.distance;
        let mut controller = CameraController::new(0.01, 0.95).with_damping(0.05);

        controller.zoom(2.0, &mut camera);
        assert_relative_eq!(camera.distance, start * 0.95 * 0.95, epsilon = 1e-5);

        controller.zoom(-2.0, &mut camera);
        assert_relative_eq!(camera.distance, start, epsilon = 1e-4);
    }

    #[test]
    fn pan_moves_target_in_the_screen_plane() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(0.0, 0.0, 5.0), Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.01, 0.95);
        controller.pan_speed = 0.1;

        // Dragging left moves the focus to the right
        controller.pan(-2.0, 0.0, &camera);
        controller.update(&mut camera);

        assert_relative_eq!(camera.target.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.target.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn buttons_select_the_drag_mode() {
        let mut controller = CameraController::new(0.01, 0.95);
        assert!(!controller.is_rotating() && !controller.is_panning());

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_rotating());

        controller.process_mouse_button(MouseButton::Left, ElementState::Released);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(controller.is_panning());
        assert!(!controller.is_rotating());
    }

    #[test]
    fn config_enables_damping() {
        let controller = CameraController::from_config(&CameraConfig::default());
        assert_eq!(controller.damping, Some(0.05));

        let config = CameraConfig {
            damping: false,
            ..CameraConfig::default()
        };
        assert_eq!(CameraController::from_config(&config).damping, None);
    }
}

pub mod camera_controller;
pub mod camera_utils;
pub mod orbit_camera;
pub mod viewport;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{Camera, CameraManager, CameraUniform};
pub use orbit_camera::OrbitCamera;
pub use viewport::Viewport;

//! # Graphics Module
//!
//! Everything between the scene description and pixels on screen.
//!
//! - **Camera** ([`camera`]) - orbit camera, damped controller, viewport
//! - **Geometry** ([`geometry`]) - box, plane, sphere and cone generators
//! - **Resources** ([`resources`]) - textures, materials, global uniforms
//! - **Scene** ([`scene`]) - objects, groups, lights and fog
//! - **Rendering** ([`rendering`]) - shadow maps, pipelines, the frame loop
//! - **UI** ([`ui`]) - ImGui overlay
//!
//! ```no_run
//! use haunted_house::{config::CameraConfig, gfx::{camera::CameraManager, scene::Scene}};
//!
//! let camera_manager = CameraManager::from_config(&CameraConfig::default(), 16.0 / 9.0);
//! let scene = Scene::new(camera_manager);
//! // let engine = RenderEngine::new(window, width, height, true).await?;
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod ui;

// Re-export commonly used types
pub use camera::OrbitCamera;
pub use rendering::RenderEngine;

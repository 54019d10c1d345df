//! # Scene Management Module
//!
//! Objects, groups, lights and fog for a single static scene.
//!
//! ## Key Components
//!
//! - [`Scene`] - The scene container: objects, groups, materials, lights, camera
//! - [`Object`] - A mesh with a transform, an optional group and a material
//! - [`Transform`] - Translation, XYZ Euler rotation and scale
//! - [`PointLight`], [`DirectionalLight`], [`AmbientLight`], [`Fog`]
//! - [`Vertex3D`] - Vertex layout shared by every pipeline
//!
//! ## Usage
//!
//! ```no_run
//! use haunted_house::config::CameraConfig;
//! use haunted_house::gfx::camera::CameraManager;
//! use haunted_house::gfx::geometry::generate_box;
//! use haunted_house::gfx::scene::{Object, Scene, Transform};
//!
//! let mut scene = Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5));
//! let house = scene.add_group("house", Transform::default());
//! scene.add_object(Object::from_geometry("walls", &generate_box(4.0, 2.5, 4.0)).in_group(house));
//! ```

pub mod light;
pub mod object;
pub mod scene;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use light::{AmbientLight, DirectionalLight, Fog, PointLight, ShadowSettings};
pub use object::{DrawObject, Mesh, Object, ObjectBindings};
pub use scene::{Group, GroupId, Scene, SceneStatistics};
pub use transform::Transform;
pub use vertex::Vertex3D;

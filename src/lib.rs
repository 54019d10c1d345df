//! Haunted house renderer
//!
//! A foggy night scene drawn with wgpu and winit: a textured house, a ring
//! of randomly placed graves and three ghost lights circling them, seen
//! through a damped orbit camera.

pub mod app;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod gfx;
pub mod haunted;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::HauntedApp;
pub use config::SceneConfig;
pub use error::{HauntedError, Result};

//! GPU resource management
//!
//! Handles textures, materials, and the global uniform bind group.

pub mod global_bindings;
pub mod material;
pub mod texture_loader;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{
    GlobalBindings, GlobalUBO, GlobalUniform, MAX_POINT_LIGHTS, POINT_SHADOW_LAYERS,
};
pub use material::{MapSlot, Material, MaterialBindings, MaterialManager};
pub use texture_loader::{
    ColorSpace, Placeholder, TextureImage, TextureLoader, TextureSampling, WrapMode,
};
pub use texture_resource::TextureResource;

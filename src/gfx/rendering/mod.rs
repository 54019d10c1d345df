//! Frame rendering
//!
//! Pipelines, shadow maps, the upscaling target and the engine that records
//! each frame.

pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow_maps;
pub mod upscale;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::{RenderEngine, SurfaceRecovery};
pub use shadow_maps::{ShadowMaps, ShadowTarget};
pub use upscale::Upscaler;

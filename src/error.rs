//! Error types for the haunted house renderer

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while configuring, building or rendering the scene
#[derive(Debug, Error)]
pub enum HauntedError {
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid colour '{0}', expected #rrggbb")]
    Color(String),

    #[error("texture not found: {0}")]
    TextureMissing(PathBuf),

    #[error("failed to decode texture {path}: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create render pipelines: {0}")]
    Pipeline(String),

    #[error("surface has no supported formats")]
    NoSurfaceFormat,

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("event loop has already been consumed")]
    EventLoopConsumed,
}

pub type Result<T> = std::result::Result<T, HauntedError>;

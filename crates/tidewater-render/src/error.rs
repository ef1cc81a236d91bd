//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface reports no configuration compatible with the adapter.
    #[error("surface configuration failed")]
    SurfaceConfigurationFailed,

    /// Shader or pipeline creation was rejected by the device.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// Texture creation or upload failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// Reading a rendered frame back from the GPU failed.
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),

    /// The output file extension names no supported image format.
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Encoding or writing a captured image failed.
    #[error("failed to save image: {0}")]
    ImageSave(#[from] image::ImageError),
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::Outdated => RenderError::SurfaceOutdated,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            #[allow(unreachable_patterns)]
            _ => RenderError::SurfaceLost,
        }
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for tidewater_core::TidewaterError {
    fn from(err: RenderError) -> Self {
        tidewater_core::TidewaterError::RenderError(err.to_string())
    }
}

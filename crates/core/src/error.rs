//! Error types for render targets and the depth pass.

use thiserror::Error;

/// Errors produced by render-target allocation, readback and the depth pass.
///
/// Every variant except [`RenderError::Gpu`] signals caller misuse or a bad
/// configuration. None of them are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A raw value did not name any depth texture mode.
    #[error("undefined depth texture mode: {0}")]
    UndefinedDepthTextureMode(u32),

    /// A raw value did not name any render texture format.
    #[error("unknown render texture format: {0}")]
    UnknownTextureFormat(u32),

    /// A raw value did not name any depth-stencil format.
    #[error("unknown depth-stencil format: {0}")]
    UnknownDepthStencilFormat(u32),

    /// The depth-stencil format cannot back the requested texture format.
    #[error("depth-stencil format {depth_stencil} is not supported for {format} render textures")]
    UnsupportedDepthFormat {
        format: String,
        depth_stencil: String,
    },

    /// Near or far clip plane is zero, which would make the linearization divide by zero.
    #[error("invalid clip planes: near {near}, far {far}")]
    InvalidClipPlanes { near: f32, far: f32 },

    /// Width or height was zero.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// Synchronous readback was requested on a context that only allows async readback.
    #[error("synchronous pixel readback is unsupported in async-only readback mode")]
    SyncReadbackUnsupported,

    /// The caller's readback buffer cannot hold the requested region.
    #[error("readback buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    /// A render target was bound while another one was still active.
    #[error("render target {requested} bound while {active} is still active")]
    PassAlreadyActive { active: usize, requested: usize },

    /// A render target was ended while it was not the active one.
    #[error("render target {0} ended while it is not the active target")]
    PassNotActive(usize),

    /// `render` was called for a mode whose target was never acquired.
    #[error("no render target acquired for {0} mode")]
    TargetNotAcquired(String),

    /// The id does not refer to a live render texture in this pool.
    #[error("unknown or disposed render texture: {0}")]
    UnknownRenderTexture(usize),

    /// The graphics device failed to create an object.
    #[error("gpu error: {0}")]
    Gpu(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Config(e.to_string())
    }
}

#![deny(unsafe_code)]
//! Depth and shadow auxiliary textures for a WebGL-class renderer.
//!
//! Provides pooled off-screen render textures (`RenderTexturePool`,
//! `RenderTexture`), the `GraphicsDevice` seam with a glow-backed
//! `GpuContext`, and the per-camera `DepthPass` that renders depth or
//! depth-normals textures and publishes them into camera shader data.

pub mod camera;
pub mod config;
pub mod depth_pass;
pub mod error;
pub mod format;
pub mod render;
pub mod shader_data;

#[cfg(test)]
mod testing;

pub use camera::{DepthCamera, Viewport};
pub use config::RenderConfig;
pub use depth_pass::{z_buffer_params, DepthPass, DepthTextureMode, OpaqueQueue, PassPhase};
pub use error::RenderError;
pub use format::{DepthStencilFormat, RenderTextureFormat};
pub use render::{GpuContext, GraphicsDevice, RenderContext, RenderTexture, RenderTextureId, RenderTexturePool};
pub use shader_data::{ShaderData, ShaderValue};

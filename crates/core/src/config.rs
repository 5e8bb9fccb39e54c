//! JSON-configurable render settings.
//!
//! Every field has a default, so `{}` is a valid configuration.

use crate::error::RenderError;
use crate::render::context::GpuContext;
use crate::render::device::{ApiGeneration, GraphicsDevice, ReadbackMode};
use crate::render::pool::RenderTexturePool;
use crate::render::state::{RenderContext, FORWARD_PIPELINE};
use crate::render::texture::TextureSettings;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Settings for the render texture pool and per-frame render state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Readback mode requested for the GPU context.
    pub readback_mode: ReadbackMode,
    /// Pipeline tag restored after each auxiliary pass.
    pub config_pipeline_mode: String,
    /// Sampling applied to every pooled render texture.
    pub texture: TextureSettings,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            readback_mode: ReadbackMode::default(),
            config_pipeline_mode: FORWARD_PIPELINE.to_string(),
            texture: TextureSettings::default(),
        }
    }
}

impl RenderConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Config` for malformed JSON, unknown enum names, or an
    /// anisotropy level of zero.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let config: Self = serde_json::from_str(json)?;
        if config.texture.aniso_level == 0 {
            return Err(RenderError::Config(
                "texture.aniso_level must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Wraps `gl` in a [`GpuContext`] using the configured readback mode.
    ///
    /// # Errors
    ///
    /// Propagates capability errors from [`GpuContext::new`].
    pub fn gpu_context(
        &self,
        gl: glow::Context,
        generation: ApiGeneration,
    ) -> Result<GpuContext, RenderError> {
        Ok(GpuContext::new(gl, generation)?.with_readback_mode(self.readback_mode))
    }

    /// A fresh render context starting on the configured pipeline tag.
    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(self.config_pipeline_mode.as_str())
    }

    /// An empty pool on `device` using the configured texture settings.
    pub fn pool<D: GraphicsDevice>(&self, device: Rc<D>) -> RenderTexturePool<D> {
        RenderTexturePool::with_settings(device, self.texture)
    }
}

//! Per-frame render state threaded through every pass.
//!
//! Holds what would otherwise be process-wide globals: the currently bound
//! render texture, the vertical-flip flag, whether shader values are
//! resolved per draw, and the active pipeline tag.

use super::target::RenderTextureId;

/// Pipeline tag used while rendering into a depth texture.
pub const SHADOW_CASTER_PIPELINE: &str = "ShadowCaster";

/// Pipeline tag used while rendering into a depth-normals texture.
pub const DEPTH_NORMAL_PIPELINE: &str = "DepthNormal";

/// Pipeline tag restored after auxiliary passes when nothing else is configured.
pub const FORWARD_PIPELINE: &str = "Forward";

/// Mutable render state for one frame, owned by the frame's renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// Tag selecting which shader pass draws use.
    pub pipeline_mode: String,
    config_pipeline_mode: String,
    invert_y: bool,
    current_active: Option<RenderTextureId>,
    runtime_value_mode: bool,
}

impl RenderContext {
    /// Creates a context whose pipeline tag starts at, and is restored to,
    /// `config_pipeline_mode`.
    pub fn new(config_pipeline_mode: impl Into<String>) -> Self {
        let config_pipeline_mode = config_pipeline_mode.into();
        Self {
            pipeline_mode: config_pipeline_mode.clone(),
            config_pipeline_mode,
            invert_y: false,
            current_active: None,
            runtime_value_mode: true,
        }
    }

    /// The configured pipeline tag passes restore when they finish.
    pub fn config_pipeline_mode(&self) -> &str {
        &self.config_pipeline_mode
    }

    /// Restores the pipeline tag to the configured one.
    pub fn restore_pipeline_mode(&mut self) {
        self.pipeline_mode.clone_from(&self.config_pipeline_mode);
    }

    /// True while a camera render texture is bound; off-screen targets and
    /// the backbuffer have opposite Y conventions.
    pub fn invert_y(&self) -> bool {
        self.invert_y
    }

    /// The render texture currently bound as the draw destination.
    pub fn current_active(&self) -> Option<RenderTextureId> {
        self.current_active
    }

    /// False while a pass uses only precomputed shader values.
    pub fn runtime_value_mode(&self) -> bool {
        self.runtime_value_mode
    }

    pub fn set_runtime_value_mode(&mut self, enabled: bool) {
        self.runtime_value_mode = enabled;
    }

    pub(crate) fn set_active(&mut self, id: Option<RenderTextureId>, invert_y: bool) {
        self.current_active = id;
        self.invert_y = invert_y;
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(FORWARD_PIPELINE)
    }
}

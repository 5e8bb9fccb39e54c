//! Per-camera depth and depth-normals pass.
//!
//! A [`DepthPass`] acquires pooled render textures sized to a camera's
//! viewport, renders the scene's opaque queue into them with the
//! `ShadowCaster` or `DepthNormal` pipeline, and publishes the resulting
//! textures and depth linearization parameters into the camera's shader
//! data. Each frame runs `update`, `render` and `clean_up`; skipping
//! `clean_up` before the next `update` keeps the old targets checked out
//! of the pool forever.

use crate::camera::{DepthCamera, Viewport};
use crate::error::RenderError;
use crate::format::{DepthStencilFormat, RenderTextureFormat};
use crate::render::device::GraphicsDevice;
use crate::render::pool::RenderTexturePool;
use crate::render::state::{RenderContext, DEPTH_NORMAL_PIPELINE, SHADOW_CASTER_PIPELINE};
use crate::render::target::RenderTextureId;
use crate::shader_data::{
    ShaderData, DEPTHNORMALSTEXTURE, DEPTHTEXTURE, DEPTHZBUFFERPARAMS, SHADOW_BIAS,
};
use glam::Vec4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Shadow bias published with the depth texture. Nothing feeds a real bias yet.
pub const DEFAULT_SHADOW_BIAS: Vec4 = Vec4::ZERO;

/// Clear color for depth-normals targets: pixels no geometry touched read
/// as maximum depth with a neutral normal.
pub const DEPTH_NORMALS_CLEAR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Which auxiliary texture a camera asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthTextureMode {
    Depth,
    DepthNormals,
    /// Reserved; every operation is a no-op for this mode.
    MotionVectors,
}

impl DepthTextureMode {
    /// Raw flag value used by serialized camera settings.
    pub fn raw(self) -> u32 {
        match self {
            Self::Depth => 1,
            Self::DepthNormals => 2,
            Self::MotionVectors => 4,
        }
    }
}

impl TryFrom<u32> for DepthTextureMode {
    type Error = RenderError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Depth),
            2 => Ok(Self::DepthNormals),
            4 => Ok(Self::MotionVectors),
            other => Err(RenderError::UndefinedDepthTextureMode(other)),
        }
    }
}

impl fmt::Display for DepthTextureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Depth => "Depth",
            Self::DepthNormals => "DepthNormals",
            Self::MotionVectors => "MotionVectors",
        };
        f.write_str(name)
    }
}

/// Where a [`DepthPass`] is in its per-frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    Acquired,
    Rendering,
    Published,
}

/// The scene's opaque draw queue.
///
/// Draws every opaque object with whatever pipeline tag is active on the
/// context, into the bound framebuffer, without changing the framebuffer,
/// viewport or scissor.
pub trait OpaqueQueue<D: GraphicsDevice> {
    /// Scene-wide uniforms the queue's draws read, such as the shadow bias
    /// left behind by the shadow-map pass.
    fn shader_values_mut(&mut self) -> &mut ShaderData<D::Texture>;

    fn render(&mut self, device: &D, context: &RenderContext) -> Result<(), RenderError>;
}

/// Values that turn a hardware depth sample into linear depth.
///
/// `x = 1 - far/near`, `y = far/near`, `z = (near - far) / (near * far)`,
/// `w = 1 / near`.
///
/// # Errors
///
/// Returns `InvalidClipPlanes` when either plane is zero.
pub fn z_buffer_params(near: f32, far: f32) -> Result<Vec4, RenderError> {
    if near == 0.0 || far == 0.0 {
        return Err(RenderError::InvalidClipPlanes { near, far });
    }
    let ratio = far / near;
    Ok(Vec4::new(
        1.0 - ratio,
        ratio,
        (near - far) / (near * far),
        1.0 / near,
    ))
}

/// Depth pass state for one camera.
#[derive(Debug)]
pub struct DepthPass {
    depth_texture: Option<RenderTextureId>,
    depth_normals_texture: Option<RenderTextureId>,
    viewport: Viewport,
    z_buffer_params: Vec4,
    phase: PassPhase,
}

impl DepthPass {
    pub fn new() -> Self {
        Self {
            depth_texture: None,
            depth_normals_texture: None,
            viewport: Viewport::default(),
            z_buffer_params: Vec4::ZERO,
            phase: PassPhase::Idle,
        }
    }

    pub fn phase(&self) -> PassPhase {
        self.phase
    }

    /// Viewport captured by the last `update`.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Linearization parameters published by the last depth render.
    pub fn z_buffer_params(&self) -> Vec4 {
        self.z_buffer_params
    }

    pub fn depth_texture(&self) -> Option<RenderTextureId> {
        self.depth_texture
    }

    pub fn depth_normals_texture(&self) -> Option<RenderTextureId> {
        self.depth_normals_texture
    }

    /// Captures the camera viewport and acquires the target `mode` needs.
    ///
    /// The new target's texture is stored in the camera's matching slot. A
    /// target still held from an earlier `update` is replaced without being
    /// returned to the pool.
    ///
    /// # Errors
    ///
    /// Propagates render texture allocation errors.
    pub fn update<D, C>(
        &mut self,
        pool: &mut RenderTexturePool<D>,
        camera: &mut C,
        mode: DepthTextureMode,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice,
        C: DepthCamera<D::Texture> + ?Sized,
    {
        self.viewport = camera.viewport();
        let Viewport { width, height, .. } = self.viewport;

        match mode {
            DepthTextureMode::Depth => {
                warn_if_leaked(self.depth_texture, mode);
                let id = pool.create_from_pool(
                    width,
                    height,
                    RenderTextureFormat::Depth,
                    DepthStencilFormat::Depth16,
                )?;
                camera.set_depth_texture(pool.get(id).and_then(|t| t.texture()));
                self.depth_texture = Some(id);
            }
            DepthTextureMode::DepthNormals => {
                warn_if_leaked(self.depth_normals_texture, mode);
                let id = pool.create_from_pool(
                    width,
                    height,
                    RenderTextureFormat::Rgba8,
                    DepthStencilFormat::Depth16,
                )?;
                camera.set_depth_normal_texture(pool.get(id).and_then(|t| t.texture()));
                self.depth_normals_texture = Some(id);
            }
            DepthTextureMode::MotionVectors => return Ok(()),
        }

        self.phase = PassPhase::Acquired;
        Ok(())
    }

    /// Renders the opaque queue into the target acquired for `mode` and
    /// publishes the result to the camera.
    ///
    /// In `Depth` mode the scene's `SHADOW_BIAS` is zeroed before the queue
    /// draws, so the shadow caster pipeline ignores the shadow-map bias.
    ///
    /// The target is unbound, runtime shader values re-enabled and the
    /// configured pipeline tag restored even when drawing or publishing
    /// fails; the pass then stays `Acquired`.
    ///
    /// # Errors
    ///
    /// Returns `TargetNotAcquired` if `update` did not run for `mode`,
    /// `InvalidClipPlanes` for a zero clip plane (before anything is bound),
    /// and any error from the opaque queue.
    pub fn render<D, Q, C>(
        &mut self,
        pool: &mut RenderTexturePool<D>,
        context: &mut RenderContext,
        queue: &mut Q,
        camera: &mut C,
        mode: DepthTextureMode,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice,
        Q: OpaqueQueue<D> + ?Sized,
        C: DepthCamera<D::Texture> + ?Sized,
    {
        let (target, pipeline, clear_mask, clear_color) = match mode {
            DepthTextureMode::Depth => (
                self.depth_texture,
                SHADOW_CASTER_PIPELINE,
                glow::DEPTH_BUFFER_BIT,
                None,
            ),
            DepthTextureMode::DepthNormals => (
                self.depth_normals_texture,
                DEPTH_NORMAL_PIPELINE,
                glow::DEPTH_BUFFER_BIT | glow::COLOR_BUFFER_BIT,
                Some(DEPTH_NORMALS_CLEAR),
            ),
            DepthTextureMode::MotionVectors => return Ok(()),
        };
        let id = target.ok_or_else(|| RenderError::TargetNotAcquired(mode.to_string()))?;
        if mode == DepthTextureMode::Depth {
            z_buffer_params(camera.near_plane(), camera.far_plane())?;
        }

        let device = Rc::clone(pool.device());
        let device: &D = &device;
        let texture = pool.texture_mut(id)?;
        let viewport = self.viewport;

        self.phase = PassPhase::Rendering;
        context.pipeline_mode = pipeline.to_string();
        context.set_runtime_value_mode(false);

        let drawn = texture.with_bound(device, context, |ctx| {
            let Viewport {
                x,
                y,
                width,
                height,
            } = viewport;
            if mode == DepthTextureMode::Depth {
                queue
                    .shader_values_mut()
                    .set_vector(SHADOW_BIAS, DEFAULT_SHADOW_BIAS);
            }
            device.enable_scissor_test();
            device.viewport(x, y, width as i32, height as i32);
            device.scissor(x, y, width as i32, height as i32);
            if let Some([r, g, b, a]) = clear_color {
                device.clear_color(r, g, b, a);
            }
            device.clear(clear_mask);
            queue.render(device, ctx)
        });
        context.set_runtime_value_mode(true);

        let published = drawn.and_then(|()| self.setup_depth_mode_shader_value(pool, camera, mode));
        context.restore_pipeline_mode();
        if let Err(e) = published {
            self.phase = PassPhase::Acquired;
            return Err(e);
        }

        self.phase = PassPhase::Published;
        Ok(())
    }

    /// Writes the textures and parameters produced for `mode` into the
    /// camera's shader data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClipPlanes` for a zero clip plane and
    /// `TargetNotAcquired` if no live target is held for `mode`.
    pub fn setup_depth_mode_shader_value<D, C>(
        &mut self,
        pool: &RenderTexturePool<D>,
        camera: &mut C,
        mode: DepthTextureMode,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice,
        C: DepthCamera<D::Texture> + ?Sized,
    {
        match mode {
            DepthTextureMode::Depth => {
                let params = z_buffer_params(camera.near_plane(), camera.far_plane())?;
                let texture = sampled_texture(pool, self.depth_texture, mode)?;
                self.z_buffer_params = params;

                let values = camera.shader_values_mut();
                values.set_vector(SHADOW_BIAS, DEFAULT_SHADOW_BIAS);
                values.set_texture(DEPTHTEXTURE, texture);
                values.set_vector(DEPTHZBUFFERPARAMS, params);
            }
            DepthTextureMode::DepthNormals => {
                let texture = sampled_texture(pool, self.depth_normals_texture, mode)?;
                camera
                    .shader_values_mut()
                    .set_texture(DEPTHNORMALSTEXTURE, texture);
            }
            DepthTextureMode::MotionVectors => {}
        }
        Ok(())
    }

    /// Returns held targets to the pool. Safe to call repeatedly.
    pub fn clean_up<D: GraphicsDevice>(&mut self, pool: &mut RenderTexturePool<D>) {
        if let Some(id) = self.depth_texture.take() {
            pool.recover_to_pool(id);
        }
        if let Some(id) = self.depth_normals_texture.take() {
            pool.recover_to_pool(id);
        }
        self.phase = PassPhase::Idle;
    }
}

impl Default for DepthPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DepthPass {
    fn drop(&mut self) {
        if self.depth_texture.is_some() || self.depth_normals_texture.is_some() {
            log::warn!("depth pass dropped while holding render textures; call clean_up first");
        }
    }
}

fn warn_if_leaked(held: Option<RenderTextureId>, mode: DepthTextureMode) {
    if let Some(id) = held {
        log::warn!(
            "{mode} target {} replaced without clean_up; it stays checked out of the pool",
            id.index()
        );
    }
}

fn sampled_texture<D: GraphicsDevice>(
    pool: &RenderTexturePool<D>,
    id: Option<RenderTextureId>,
    mode: DepthTextureMode,
) -> Result<D::Texture, RenderError> {
    id.and_then(|id| pool.get(id))
        .and_then(|texture| texture.texture())
        .ok_or_else(|| RenderError::TargetNotAcquired(mode.to_string()))
}

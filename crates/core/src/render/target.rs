//! Render texture (FBO + attachments) for off-screen rendering.
//!
//! A `RenderTexture` pairs a framebuffer object with either a color texture
//! (plus an optional depth-stencil renderbuffer) or a sampled depth texture.
//! Instances live in a [`RenderTexturePool`](super::pool::RenderTexturePool)
//! and are addressed by [`RenderTextureId`].

use super::device::GraphicsDevice;
use super::state::RenderContext;
use super::texture::{
    apply_settings, color_allocation, depth_texture_allocation, renderbuffer_storage,
    TextureSettings,
};
use crate::error::RenderError;
use crate::format::{DepthStencilFormat, RenderTextureFormat};

/// Handle to a render texture owned by a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTextureId(pub(crate) usize);

impl RenderTextureId {
    /// Slot index inside the owning pool.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The immutable shape of a render texture. Pool reuse requires an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: RenderTextureFormat,
    pub depth_stencil_format: DepthStencilFormat,
}

impl RenderTextureDescriptor {
    pub fn new(
        width: u32,
        height: u32,
        format: RenderTextureFormat,
        depth_stencil_format: DepthStencilFormat,
    ) -> Self {
        Self {
            width,
            height,
            format,
            depth_stencil_format,
        }
    }

    /// Bytes reported to memory accounting.
    ///
    /// Always four bytes per pixel whatever the format, so sub-32-bit
    /// formats are overcounted.
    pub fn gpu_memory(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4
    }
}

/// An off-screen render destination and the texture that samples it.
pub struct RenderTexture<D: GraphicsDevice> {
    id: RenderTextureId,
    descriptor: RenderTextureDescriptor,
    framebuffer: Option<D::Framebuffer>,
    texture: Option<D::Texture>,
    depth_stencil_buffer: Option<D::Renderbuffer>,
    in_pool: bool,
    is_camera_target: bool,
    ready: bool,
    gpu_memory: u64,
}

impl<D: GraphicsDevice> RenderTexture<D> {
    /// Allocates the framebuffer and its attachments.
    ///
    /// Color formats get a color texture on `COLOR_ATTACHMENT0` and, unless
    /// the depth-stencil format is `None`, a renderbuffer. `Depth` and
    /// `ShadowMap` get a sampled depth texture instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for a zero width or height,
    /// `UnsupportedDepthFormat` for a depth texture without depth bits, and
    /// `Gpu` if the device cannot create an object. No GPU objects survive
    /// a failed construction.
    pub(crate) fn new(
        device: &D,
        id: RenderTextureId,
        descriptor: RenderTextureDescriptor,
        settings: &TextureSettings,
    ) -> Result<Self, RenderError> {
        let RenderTextureDescriptor {
            width,
            height,
            format,
            depth_stencil_format,
        } = descriptor;

        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions);
        }
        if format == RenderTextureFormat::Rgba16F && !device.supports_half_float() {
            return Err(RenderError::Gpu(
                "half-float color render textures are not supported".to_string(),
            ));
        }

        let generation = device.generation();
        let depth_allocation = if format.is_depth() {
            Some(depth_texture_allocation(
                format,
                depth_stencil_format,
                generation,
            )?)
        } else {
            None
        };

        let framebuffer = device.create_framebuffer().map_err(RenderError::Gpu)?;
        let texture = match device.create_texture() {
            Ok(texture) => texture,
            Err(e) => {
                device.delete_framebuffer(framebuffer);
                return Err(RenderError::Gpu(e));
            }
        };

        device.bind_framebuffer(Some(framebuffer));
        device.bind_texture(Some(texture));

        let mut depth_stencil_buffer = None;
        match depth_allocation {
            Some((allocation, attachment)) => {
                allocation.allocate(device, width, height);
                device.framebuffer_texture_2d(attachment, Some(texture));
                if format == RenderTextureFormat::ShadowMap && device.supports_compare_mode() {
                    device.tex_parameter_i32(
                        glow::TEXTURE_COMPARE_MODE,
                        glow::COMPARE_REF_TO_TEXTURE as i32,
                    );
                }
                device.bind_texture(None);
            }
            None => {
                if let Some(allocation) = color_allocation(format, generation) {
                    allocation.allocate(device, width, height);
                    device.framebuffer_texture_2d(glow::COLOR_ATTACHMENT0, Some(texture));
                }
                device.bind_texture(None);

                if let Some((internal_format, attachment)) =
                    renderbuffer_storage(depth_stencil_format, generation)
                {
                    let renderbuffer = match device.create_renderbuffer() {
                        Ok(renderbuffer) => renderbuffer,
                        Err(e) => {
                            device.bind_framebuffer(None);
                            device.delete_texture(texture);
                            device.delete_framebuffer(framebuffer);
                            return Err(RenderError::Gpu(e));
                        }
                    };
                    device.bind_renderbuffer(Some(renderbuffer));
                    device.renderbuffer_storage(internal_format, width as i32, height as i32);
                    device.framebuffer_renderbuffer(attachment, Some(renderbuffer));
                    device.bind_renderbuffer(None);
                    depth_stencil_buffer = Some(renderbuffer);
                }
            }
        }

        device.bind_framebuffer(None);
        apply_settings(device, texture, settings, width, height);

        log::debug!(
            "allocated render texture {}: {width}x{height} {format}/{depth_stencil_format}",
            id.0
        );

        Ok(Self {
            id,
            descriptor,
            framebuffer: Some(framebuffer),
            texture: Some(texture),
            depth_stencil_buffer,
            in_pool: false,
            is_camera_target: false,
            ready: true,
            gpu_memory: descriptor.gpu_memory(),
        })
    }

    pub fn id(&self) -> RenderTextureId {
        self.id
    }

    pub fn descriptor(&self) -> RenderTextureDescriptor {
        self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    pub fn format(&self) -> RenderTextureFormat {
        self.descriptor.format
    }

    pub fn depth_stencil_format(&self) -> DepthStencilFormat {
        self.descriptor.depth_stencil_format
    }

    /// Framebuffer handle, `None` once disposed.
    pub fn framebuffer(&self) -> Option<D::Framebuffer> {
        self.framebuffer
    }

    /// The sampled texture: color for color formats, depth for `Depth`/`ShadowMap`.
    pub fn texture(&self) -> Option<D::Texture> {
        self.texture
    }

    pub fn depth_stencil_buffer(&self) -> Option<D::Renderbuffer> {
        self.depth_stencil_buffer
    }

    pub fn is_in_pool(&self) -> bool {
        self.in_pool
    }

    pub(crate) fn set_in_pool(&mut self, in_pool: bool) {
        self.in_pool = in_pool;
    }

    pub fn is_camera_target(&self) -> bool {
        self.is_camera_target
    }

    /// Marks this texture as a camera's output, which flips Y while bound.
    pub fn set_camera_target(&mut self, is_camera_target: bool) {
        self.is_camera_target = is_camera_target;
    }

    /// False while bound as a render destination.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn gpu_memory(&self) -> u64 {
        self.gpu_memory
    }

    pub fn is_disposed(&self) -> bool {
        self.framebuffer.is_none()
    }

    /// Binds the framebuffer as the draw destination and records it as the
    /// context's active render texture.
    ///
    /// Must be paired with [`end`](Self::end). Prefer
    /// [`with_bound`](Self::with_bound), which always unbinds.
    ///
    /// # Errors
    ///
    /// Returns `PassAlreadyActive` if another render texture is still bound
    /// and `UnknownRenderTexture` if this one has been disposed.
    pub fn start(&mut self, device: &D, ctx: &mut RenderContext) -> Result<(), RenderError> {
        if let Some(active) = ctx.current_active() {
            return Err(RenderError::PassAlreadyActive {
                active: active.0,
                requested: self.id.0,
            });
        }
        let framebuffer = self
            .framebuffer
            .ok_or(RenderError::UnknownRenderTexture(self.id.0))?;

        device.bind_framebuffer(Some(framebuffer));
        ctx.set_active(Some(self.id), self.is_camera_target);
        self.ready = false;
        Ok(())
    }

    /// Restores the default framebuffer and clears the active texture.
    ///
    /// # Errors
    ///
    /// Returns `PassNotActive` without touching any binding if this texture
    /// is not the context's active render texture.
    pub fn end(&mut self, device: &D, ctx: &mut RenderContext) -> Result<(), RenderError> {
        if ctx.current_active() != Some(self.id) {
            return Err(RenderError::PassNotActive(self.id.0));
        }
        device.bind_framebuffer(None);
        ctx.set_active(None, false);
        self.ready = true;
        Ok(())
    }

    /// Runs `f` with this texture bound, unbinding afterwards even if `f` fails.
    ///
    /// An error from `f` takes precedence over one from unbinding.
    pub fn with_bound<R>(
        &mut self,
        device: &D,
        ctx: &mut RenderContext,
        f: impl FnOnce(&mut RenderContext) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        self.start(device, ctx)?;
        let result = f(ctx);
        let ended = self.end(device, ctx);
        result.and_then(|value| ended.map(|()| value))
    }

    /// Reads back a region of the framebuffer as RGBA8 into `out`.
    ///
    /// Returns `Ok(None)` without touching `out` if the framebuffer is
    /// incomplete.
    ///
    /// # Errors
    ///
    /// Returns `SyncReadbackUnsupported` on an async-only context,
    /// `BufferTooSmall` if `out` cannot hold `width * height * 4` bytes and
    /// `UnknownRenderTexture` if this texture has been disposed.
    pub fn pixel_data<'a>(
        &self,
        device: &D,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        out: &'a mut [u8],
    ) -> Result<Option<&'a [u8]>, RenderError> {
        if device.readback_mode() == super::device::ReadbackMode::AsyncOnly {
            return Err(RenderError::SyncReadbackUnsupported);
        }
        let needed = width as usize * height as usize * 4;
        if out.len() < needed {
            return Err(RenderError::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }
        let framebuffer = self
            .framebuffer
            .ok_or(RenderError::UnknownRenderTexture(self.id.0))?;

        device.bind_framebuffer(Some(framebuffer));
        if device.check_framebuffer_status() != glow::FRAMEBUFFER_COMPLETE {
            device.bind_framebuffer(None);
            return Ok(None);
        }
        device.read_pixels(x, y, width as i32, height as i32, &mut out[..needed]);
        device.bind_framebuffer(None);

        let out: &'a [u8] = out;
        Ok(Some(&out[..needed]))
    }

    /// Reads back a region without blocking; `callback` receives the RGBA8 bytes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRenderTexture` if this texture has been disposed.
    pub fn pixel_data_async(
        &self,
        device: &D,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        callback: impl FnOnce(Vec<u8>) + 'static,
    ) -> Result<(), RenderError> {
        let framebuffer = self
            .framebuffer
            .ok_or(RenderError::UnknownRenderTexture(self.id.0))?;

        device.bind_framebuffer(Some(framebuffer));
        device.read_pixels_async(x, y, width as i32, height as i32, Box::new(callback));
        device.bind_framebuffer(None);
        Ok(())
    }

    /// Deletes the texture, framebuffer and renderbuffer. Safe to call repeatedly.
    pub fn dispose(&mut self, device: &D) {
        let Some(framebuffer) = self.framebuffer.take() else {
            return;
        };
        if let Some(texture) = self.texture.take() {
            device.delete_texture(texture);
        }
        device.delete_framebuffer(framebuffer);
        if let Some(renderbuffer) = self.depth_stencil_buffer.take() {
            device.delete_renderbuffer(renderbuffer);
        }
        self.gpu_memory = 0;
        log::debug!("disposed render texture {}", self.id.0);
    }
}

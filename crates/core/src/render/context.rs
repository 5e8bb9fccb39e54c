//! GPU context wrapper with capability detection.
//!
//! `GpuContext` wraps a `glow::Context`, records which API generation it
//! was created for and probes the extensions render targets depend on. It
//! implements [`GraphicsDevice`] by forwarding to glow.

use super::device::{ApiGeneration, GraphicsDevice, ReadbackCallback, ReadbackMode};
use crate::error::RenderError;

/// Wraps a `glow::Context` with detected GPU capabilities.
///
/// Created once at initialization, alongside the canvas or window that
/// owns the GL context.
pub struct GpuContext {
    gl: glow::Context,
    generation: ApiGeneration,
    readback_mode: ReadbackMode,
    supports_anisotropy: bool,
    supports_half_float: bool,
}

fn has_extension(gl: &glow::Context, name: &str) -> bool {
    use glow::HasContext;

    let extensions = gl.supported_extensions();
    extensions.contains(name) || extensions.contains(&format!("GL_{name}"))
}

impl GpuContext {
    /// Wraps `gl`, created for the given API generation.
    ///
    /// WebGL1 contexts need `WEBGL_depth_texture` (or the native
    /// `OES_depth_texture`) to back depth render textures.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Gpu` if a WebGL1 context lacks depth texture
    /// support.
    pub fn new(gl: glow::Context, generation: ApiGeneration) -> Result<Self, RenderError> {
        if generation == ApiGeneration::WebGl1
            && !has_extension(&gl, "WEBGL_depth_texture")
            && !has_extension(&gl, "OES_depth_texture")
        {
            return Err(RenderError::Gpu(
                "required extension WEBGL_depth_texture is not supported".to_string(),
            ));
        }

        let supports_anisotropy = has_extension(&gl, "EXT_texture_filter_anisotropic");
        let supports_half_float = match generation {
            ApiGeneration::WebGl2 => has_extension(&gl, "EXT_color_buffer_float"),
            ApiGeneration::WebGl1 => has_extension(&gl, "OES_texture_half_float"),
        };

        log::debug!(
            "gpu context: {generation:?}, anisotropy {supports_anisotropy}, half float {supports_half_float}"
        );

        Ok(Self {
            gl,
            generation,
            readback_mode: ReadbackMode::Sync,
            supports_anisotropy,
            supports_half_float,
        })
    }

    /// Sets how pixel readback may be performed on this context.
    pub fn with_readback_mode(mut self, mode: ReadbackMode) -> Self {
        self.readback_mode = mode;
        self
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying `glow::Context`.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }
}

// SAFETY (whole impl): glow wraps raw GL calls as unsafe. Every handle
// passed in was created by this context and the enum arguments are GL
// constants chosen by the render-target code.
#[allow(unsafe_code)]
impl GraphicsDevice for GpuContext {
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type Renderbuffer = glow::Renderbuffer;

    fn generation(&self) -> ApiGeneration {
        self.generation
    }

    fn supports_anisotropy(&self) -> bool {
        self.supports_anisotropy
    }

    fn supports_half_float(&self) -> bool {
        self.supports_half_float
    }

    fn readback_mode(&self) -> ReadbackMode {
        self.readback_mode
    }

    fn create_framebuffer(&self) -> Result<glow::Framebuffer, String> {
        use glow::HasContext;
        unsafe { self.gl.create_framebuffer() }
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        use glow::HasContext;
        unsafe { self.gl.create_texture() }
    }

    fn create_renderbuffer(&self) -> Result<glow::Renderbuffer, String> {
        use glow::HasContext;
        unsafe { self.gl.create_renderbuffer() }
    }

    fn delete_framebuffer(&self, framebuffer: glow::Framebuffer) {
        use glow::HasContext;
        unsafe { self.gl.delete_framebuffer(framebuffer) }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        use glow::HasContext;
        unsafe { self.gl.delete_texture(texture) }
    }

    fn delete_renderbuffer(&self, renderbuffer: glow::Renderbuffer) {
        use glow::HasContext;
        unsafe { self.gl.delete_renderbuffer(renderbuffer) }
    }

    fn bind_framebuffer(&self, framebuffer: Option<glow::Framebuffer>) {
        use glow::HasContext;
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) }
    }

    fn bind_texture(&self, texture: Option<glow::Texture>) {
        use glow::HasContext;
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn bind_renderbuffer(&self, renderbuffer: Option<glow::Renderbuffer>) {
        use glow::HasContext;
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, renderbuffer) }
    }

    fn tex_storage_2d(&self, levels: i32, internal_format: u32, width: i32, height: i32) {
        use glow::HasContext;
        unsafe {
            self.gl
                .tex_storage_2d(glow::TEXTURE_2D, levels, internal_format, width, height)
        }
    }

    fn tex_image_2d(&self, internal_format: i32, width: i32, height: i32, format: u32, ty: u32) {
        use glow::HasContext;
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format,
                width,
                height,
                0,
                format,
                ty,
                glow::PixelUnpackData::Slice(None),
            )
        }
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        use glow::HasContext;
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value) }
    }

    fn tex_parameter_f32(&self, parameter: u32, value: f32) {
        use glow::HasContext;
        unsafe { self.gl.tex_parameter_f32(glow::TEXTURE_2D, parameter, value) }
    }

    fn framebuffer_texture_2d(&self, attachment: u32, texture: Option<glow::Texture>) {
        use glow::HasContext;
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                texture,
                0,
            )
        }
    }

    fn renderbuffer_storage(&self, internal_format: u32, width: i32, height: i32) {
        use glow::HasContext;
        unsafe {
            self.gl
                .renderbuffer_storage(glow::RENDERBUFFER, internal_format, width, height)
        }
    }

    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: Option<glow::Renderbuffer>) {
        use glow::HasContext;
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment,
                glow::RENDERBUFFER,
                renderbuffer,
            )
        }
    }

    fn check_framebuffer_status(&self) -> u32 {
        use glow::HasContext;
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        use glow::HasContext;
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        use glow::HasContext;
        unsafe { self.gl.scissor(x, y, width, height) }
    }

    fn enable_scissor_test(&self) {
        use glow::HasContext;
        unsafe { self.gl.enable(glow::SCISSOR_TEST) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        use glow::HasContext;
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        use glow::HasContext;
        unsafe { self.gl.clear(mask) }
    }

    fn read_pixels(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]) {
        use glow::HasContext;
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(out)),
            )
        }
    }

    // glow has no fenced readback, so the transfer completes before the
    // callback runs. Worker-thread hosts provide their own device.
    fn read_pixels_async(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        callback: ReadbackCallback,
    ) {
        let len = width.max(0) as usize * height.max(0) as usize * 4;
        let mut data = vec![0u8; len];
        self.read_pixels(x, y, width, height, &mut data);
        callback(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // GpuContext requires a live GL context, so integration tests are ignored.

    #[test]
    fn gpu_context_struct_compiles_with_expected_api() {
        // Compile-time check that the public API exists.
        fn _assert_api(ctx: &GpuContext) {
            let _gl: &glow::Context = ctx.gl();
            let _generation: ApiGeneration = ctx.generation();
            let _mode: ReadbackMode = ctx.readback_mode();
            let _aniso: bool = ctx.supports_anisotropy();
        }
    }

    #[test]
    fn gpu_context_is_a_graphics_device() {
        fn assert_device<D: GraphicsDevice>() {}
        assert_device::<GpuContext>();
    }

    #[test]
    #[ignore = "requires GL context"]
    fn new_succeeds_with_webgl2_context() {
        // Would test: GpuContext::new(gl, ApiGeneration::WebGl2) returns Ok
        // and reports compare-mode support.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn webgl1_without_depth_texture_is_rejected() {
        // Would test: a WebGL1 context lacking WEBGL_depth_texture yields
        // RenderError::Gpu.
    }
}

//! The graphics-device seam used by render targets and the depth pass.
//!
//! [`GraphicsDevice`] is the narrow slice of an OpenGL ES / WebGL context
//! that render targets need: object creation, storage allocation,
//! attachments, pass state and readback. Enum arguments are raw GL
//! constants (`glow::*`), so the production implementation in
//! [`super::context::GpuContext`] forwards them unchanged.
//!
//! Texture, renderbuffer and framebuffer calls operate on the `TEXTURE_2D`,
//! `RENDERBUFFER` and `FRAMEBUFFER` targets respectively.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Which generation of the GL API the context exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiGeneration {
    /// WebGL1 / OpenGL ES 2.0: mutable `tex_image_2d` allocation only.
    WebGl1,
    /// WebGL2 / OpenGL ES 3.0: immutable storage and comparison sampling.
    WebGl2,
}

/// How pixel readback may be performed on a context.
///
/// Chosen when the context is created. In `AsyncOnly` mode a separate worker
/// performs transfers and the blocking path is a usage error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadbackMode {
    #[default]
    Sync,
    AsyncOnly,
}

/// Callback receiving RGBA8 bytes from an asynchronous readback.
pub type ReadbackCallback = Box<dyn FnOnce(Vec<u8>)>;

/// Primitive GPU operations consumed by the render-target pool.
///
/// Calls follow GL semantics: they act on whatever object is currently bound
/// to the relevant target.
pub trait GraphicsDevice {
    type Texture: Copy + Eq + Hash + Debug;
    type Framebuffer: Copy + Eq + Hash + Debug;
    type Renderbuffer: Copy + Eq + Hash + Debug;

    fn generation(&self) -> ApiGeneration;

    /// True when depth textures may use `TEXTURE_COMPARE_MODE`.
    fn supports_compare_mode(&self) -> bool {
        self.generation() == ApiGeneration::WebGl2
    }

    /// True when `EXT_texture_filter_anisotropic` is available.
    fn supports_anisotropy(&self) -> bool;

    /// True when half-float color textures can be allocated.
    fn supports_half_float(&self) -> bool;

    fn readback_mode(&self) -> ReadbackMode;

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;
    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn create_renderbuffer(&self) -> Result<Self::Renderbuffer, String>;

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);
    fn delete_texture(&self, texture: Self::Texture);
    fn delete_renderbuffer(&self, renderbuffer: Self::Renderbuffer);

    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);
    fn bind_texture(&self, texture: Option<Self::Texture>);
    fn bind_renderbuffer(&self, renderbuffer: Option<Self::Renderbuffer>);

    /// Immutable storage allocation (WebGL2).
    fn tex_storage_2d(&self, levels: i32, internal_format: u32, width: i32, height: i32);

    /// Mutable image allocation without initial data.
    fn tex_image_2d(
        &self,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
    );

    fn tex_parameter_i32(&self, parameter: u32, value: i32);
    fn tex_parameter_f32(&self, parameter: u32, value: f32);

    fn framebuffer_texture_2d(&self, attachment: u32, texture: Option<Self::Texture>);
    fn renderbuffer_storage(&self, internal_format: u32, width: i32, height: i32);
    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: Option<Self::Renderbuffer>);
    fn check_framebuffer_status(&self) -> u32;

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    fn enable_scissor_test(&self);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);

    /// Reads RGBA8 pixels from the bound framebuffer into `out`.
    fn read_pixels(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]);

    /// Issues an RGBA8 read of the bound framebuffer and hands the bytes to
    /// `callback` when the transfer completes.
    fn read_pixels_async(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        callback: ReadbackCallback,
    );
}

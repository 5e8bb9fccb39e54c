//! Texture allocation and sampling helpers for WebGL1 / WebGL2.
//!
//! Maps render texture formats to GL allocations for each API generation
//! and applies [`TextureSettings`] (wrap, filter, anisotropy) to a texture.
//! The mapping functions are pure so they can be checked without a GPU.

use super::device::{ApiGeneration, GraphicsDevice};
use crate::error::RenderError;
use crate::format::{DepthStencilFormat, RenderTextureFormat};
use serde::{Deserialize, Serialize};

/// `OES_texture_half_float` pixel type on WebGL1 (differs from the ES 3.0 `HALF_FLOAT`).
pub const HALF_FLOAT_OES: u32 = 0x8D61;

/// `EXT_texture_filter_anisotropic` texture parameter.
pub const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;

/// How texture coordinates outside [0, 1] are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    Repeat,
    #[default]
    Clamp,
    Mirrored,
}

impl WrapMode {
    fn gl(self) -> i32 {
        match self {
            WrapMode::Repeat => glow::REPEAT as i32,
            WrapMode::Clamp => glow::CLAMP_TO_EDGE as i32,
            WrapMode::Mirrored => glow::MIRRORED_REPEAT as i32,
        }
    }
}

/// Minification/magnification filter. Render textures have a single mip level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

impl FilterMode {
    fn gl(self) -> i32 {
        match self {
            FilterMode::Point => glow::NEAREST as i32,
            FilterMode::Bilinear => glow::LINEAR as i32,
        }
    }
}

/// Sampling configuration applied to every render texture a pool creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub filter: FilterMode,
    /// Anisotropy level; 1 disables anisotropic filtering.
    pub aniso_level: u32,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            filter: FilterMode::Bilinear,
            aniso_level: 1,
        }
    }
}

/// One way of allocating texture storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// `tex_storage_2d` with one level.
    Storage { internal_format: u32 },
    /// `tex_image_2d` with no initial data.
    Image {
        internal_format: u32,
        format: u32,
        ty: u32,
    },
}

impl Allocation {
    pub(crate) fn allocate<D: GraphicsDevice>(self, device: &D, width: u32, height: u32) {
        match self {
            Allocation::Storage { internal_format } => {
                device.tex_storage_2d(1, internal_format, width as i32, height as i32)
            }
            Allocation::Image {
                internal_format,
                format,
                ty,
            } => device.tex_image_2d(
                internal_format as i32,
                width as i32,
                height as i32,
                format,
                ty,
            ),
        }
    }
}

/// Returns the allocation for a color render texture.
///
/// Returns `None` for the depth-sampled formats, which have no color texture.
pub fn color_allocation(
    format: RenderTextureFormat,
    generation: ApiGeneration,
) -> Option<Allocation> {
    use ApiGeneration::*;
    use RenderTextureFormat::*;

    let allocation = match (format, generation) {
        (Rgb8, WebGl2) => Allocation::Storage {
            internal_format: glow::RGB8,
        },
        (Rgba8, WebGl2) => Allocation::Storage {
            internal_format: glow::RGBA8,
        },
        (Alpha8, WebGl2) => Allocation::Storage {
            internal_format: glow::R8,
        },
        (Rgba16F, WebGl2) => Allocation::Storage {
            internal_format: glow::RGBA16F,
        },
        (Rgb8, WebGl1) => Allocation::Image {
            internal_format: glow::RGB,
            format: glow::RGB,
            ty: glow::UNSIGNED_BYTE,
        },
        (Rgba8, WebGl1) => Allocation::Image {
            internal_format: glow::RGBA,
            format: glow::RGBA,
            ty: glow::UNSIGNED_BYTE,
        },
        (Alpha8, WebGl1) => Allocation::Image {
            internal_format: glow::ALPHA,
            format: glow::ALPHA,
            ty: glow::UNSIGNED_BYTE,
        },
        // WebGL1 half float keeps RGBA as the internal format.
        (Rgba16F, WebGl1) => Allocation::Image {
            internal_format: glow::RGBA,
            format: glow::RGBA,
            ty: HALF_FLOAT_OES,
        },
        (Depth | ShadowMap, _) => return None,
    };
    Some(allocation)
}

/// Returns the allocation and framebuffer attachment point for a sampled depth texture.
///
/// # Errors
///
/// Returns `RenderError::UnsupportedDepthFormat` unless the depth-stencil
/// format is `Depth16` or `Depth24Stencil8`.
pub fn depth_texture_allocation(
    format: RenderTextureFormat,
    depth_stencil: DepthStencilFormat,
    generation: ApiGeneration,
) -> Result<(Allocation, u32), RenderError> {
    match (depth_stencil, generation) {
        (DepthStencilFormat::Depth16, ApiGeneration::WebGl2) => Ok((
            Allocation::Storage {
                internal_format: glow::DEPTH_COMPONENT16,
            },
            glow::DEPTH_ATTACHMENT,
        )),
        (DepthStencilFormat::Depth16, ApiGeneration::WebGl1) => Ok((
            Allocation::Image {
                internal_format: glow::DEPTH_COMPONENT,
                format: glow::DEPTH_COMPONENT,
                ty: glow::UNSIGNED_SHORT,
            },
            glow::DEPTH_ATTACHMENT,
        )),
        (DepthStencilFormat::Depth24Stencil8, ApiGeneration::WebGl2) => Ok((
            Allocation::Storage {
                internal_format: glow::DEPTH24_STENCIL8,
            },
            glow::DEPTH_STENCIL_ATTACHMENT,
        )),
        (DepthStencilFormat::Depth24Stencil8, ApiGeneration::WebGl1) => Ok((
            Allocation::Image {
                internal_format: glow::DEPTH_STENCIL,
                format: glow::DEPTH_STENCIL,
                ty: glow::UNSIGNED_INT_24_8,
            },
            glow::DEPTH_STENCIL_ATTACHMENT,
        )),
        (DepthStencilFormat::None | DepthStencilFormat::Stencil8, _) => {
            Err(RenderError::UnsupportedDepthFormat {
                format: format.to_string(),
                depth_stencil: depth_stencil.to_string(),
            })
        }
    }
}

/// Returns the renderbuffer internal format and attachment point backing a
/// color render texture's depth-stencil, or `None` when no buffer is needed.
pub fn renderbuffer_storage(
    depth_stencil: DepthStencilFormat,
    generation: ApiGeneration,
) -> Option<(u32, u32)> {
    match depth_stencil {
        DepthStencilFormat::None => None,
        DepthStencilFormat::Depth16 => Some((glow::DEPTH_COMPONENT16, glow::DEPTH_ATTACHMENT)),
        DepthStencilFormat::Stencil8 => Some((glow::STENCIL_INDEX8, glow::STENCIL_ATTACHMENT)),
        DepthStencilFormat::Depth24Stencil8 => {
            let internal_format = match generation {
                ApiGeneration::WebGl1 => glow::DEPTH_STENCIL,
                ApiGeneration::WebGl2 => glow::DEPTH24_STENCIL8,
            };
            Some((internal_format, glow::DEPTH_STENCIL_ATTACHMENT))
        }
    }
}

/// Returns the wrap mode actually usable for a texture of the given size.
///
/// WebGL1 cannot repeat non-power-of-two textures, so they are clamped.
pub fn effective_wrap(mode: WrapMode, generation: ApiGeneration, width: u32, height: u32) -> WrapMode {
    let npot = !width.is_power_of_two() || !height.is_power_of_two();
    if generation == ApiGeneration::WebGl1 && npot && mode != WrapMode::Clamp {
        log::warn!("{width}x{height} texture is NPOT on WebGL1, clamping {mode:?} wrap");
        return WrapMode::Clamp;
    }
    mode
}

/// Applies wrap, filter and anisotropy settings to `texture`.
pub fn apply_settings<D: GraphicsDevice>(
    device: &D,
    texture: D::Texture,
    settings: &TextureSettings,
    width: u32,
    height: u32,
) {
    let generation = device.generation();
    let wrap_u = effective_wrap(settings.wrap_u, generation, width, height);
    let wrap_v = effective_wrap(settings.wrap_v, generation, width, height);

    device.bind_texture(Some(texture));
    device.tex_parameter_i32(glow::TEXTURE_WRAP_S, wrap_u.gl());
    device.tex_parameter_i32(glow::TEXTURE_WRAP_T, wrap_v.gl());
    device.tex_parameter_i32(glow::TEXTURE_MIN_FILTER, settings.filter.gl());
    device.tex_parameter_i32(glow::TEXTURE_MAG_FILTER, settings.filter.gl());
    if settings.aniso_level > 1 && device.supports_anisotropy() {
        device.tex_parameter_f32(TEXTURE_MAX_ANISOTROPY_EXT, settings.aniso_level as f32);
    }
    device.bind_texture(None);
}

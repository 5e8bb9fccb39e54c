//! The camera interface the depth pass reads from and publishes into.

use crate::shader_data::ShaderData;

/// Pixel rectangle a camera renders into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A camera that can request auxiliary depth textures.
///
/// `T` is the graphics device's texture handle type. Implementors expose
/// clip planes (positive, `near < far`), a viewport, slots for the
/// published textures and the camera's shader-visible uniform map.
pub trait DepthCamera<T> {
    fn viewport(&self) -> Viewport;
    fn near_plane(&self) -> f32;
    fn far_plane(&self) -> f32;
    fn set_depth_texture(&mut self, texture: Option<T>);
    fn set_depth_normal_texture(&mut self, texture: Option<T>);
    fn shader_values_mut(&mut self) -> &mut ShaderData<T>;
}

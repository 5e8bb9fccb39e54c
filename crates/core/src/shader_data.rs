//! Shader-visible uniform values keyed by name.
//!
//! A minimal stand-in for the engine's uniform binding system: the depth
//! pass writes vectors and texture handles here under well-known names and
//! the shading side reads them back when binding.

use glam::Vec4;
use std::collections::HashMap;

/// Shadow bias applied by shadow-caster shaders (vec4).
pub const SHADOW_BIAS: &str = "SHADOW_BIAS";
/// Linearizable depth texture (texture).
pub const DEPTHTEXTURE: &str = "DEPTHTEXTURE";
/// Depth linearization parameters derived from the clip planes (vec4).
pub const DEPTHZBUFFERPARAMS: &str = "DEPTHZBUFFERPARAMS";
/// Encoded depth + view-space normal texture (texture).
pub const DEPTHNORMALSTEXTURE: &str = "DEPTHNORMALSTEXTURE";

/// A single uniform value. `T` is the device texture handle type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderValue<T> {
    Vector(Vec4),
    Texture(T),
}

/// Named uniform values for one camera or scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderData<T> {
    values: HashMap<String, ShaderValue<T>>,
}

impl<T: Copy> ShaderData<T> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set_vector(&mut self, name: &str, value: Vec4) {
        self.values
            .insert(name.to_string(), ShaderValue::Vector(value));
    }

    pub fn set_texture(&mut self, name: &str, texture: T) {
        self.values
            .insert(name.to_string(), ShaderValue::Texture(texture));
    }

    /// The vector stored under `name`, if it is a vector.
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        match self.values.get(name) {
            Some(ShaderValue::Vector(v)) => Some(*v),
            _ => None,
        }
    }

    /// The texture stored under `name`, if it is a texture.
    pub fn texture(&self, name: &str) -> Option<T> {
        match self.values.get(name) {
            Some(ShaderValue::Texture(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ShaderValue<T>> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Copy> Default for ShaderData<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_and_textures_are_kept_apart() {
        let mut data = ShaderData::<u32>::new();
        data.set_vector(SHADOW_BIAS, Vec4::ZERO);
        data.set_texture(DEPTHTEXTURE, 9);

        assert_eq!(data.vector(SHADOW_BIAS), Some(Vec4::ZERO));
        assert_eq!(data.texture(DEPTHTEXTURE), Some(9));
        assert_eq!(data.texture(SHADOW_BIAS), None);
        assert_eq!(data.vector(DEPTHTEXTURE), None);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn setting_a_name_again_overwrites() {
        let mut data = ShaderData::<u32>::default();
        data.set_texture(DEPTHNORMALSTEXTURE, 1);
        data.set_texture(DEPTHNORMALSTEXTURE, 2);
        assert_eq!(data.texture(DEPTHNORMALSTEXTURE), Some(2));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn uniform_names_are_stable() {
        assert_eq!(SHADOW_BIAS, "SHADOW_BIAS");
        assert_eq!(DEPTHTEXTURE, "DEPTHTEXTURE");
        assert_eq!(DEPTHZBUFFERPARAMS, "DEPTHZBUFFERPARAMS");
        assert_eq!(DEPTHNORMALSTEXTURE, "DEPTHNORMALSTEXTURE");
    }
}

//! Color and depth-stencil formats for render textures.
//!
//! Raw values match the engine's serialized format ids, so scenes and
//! tooling that store formats as integers can convert with `TryFrom<u32>`.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color format of a render texture.
///
/// `Depth` and `ShadowMap` have no color attachment: the depth attachment
/// itself is the sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTextureFormat {
    Rgb8,
    Rgba8,
    Alpha8,
    Rgba16F,
    Depth,
    ShadowMap,
}

impl RenderTextureFormat {
    /// True when the depth attachment is sampled instead of a color texture.
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth | Self::ShadowMap)
    }

    /// Raw format id.
    pub fn raw(self) -> u32 {
        match self {
            Self::Rgb8 => 0,
            Self::Rgba8 => 1,
            Self::Alpha8 => 2,
            Self::Rgba16F => 14,
            Self::Depth => 15,
            Self::ShadowMap => 16,
        }
    }
}

impl TryFrom<u32> for RenderTextureFormat {
    type Error = RenderError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Rgb8),
            1 => Ok(Self::Rgba8),
            2 => Ok(Self::Alpha8),
            14 => Ok(Self::Rgba16F),
            15 => Ok(Self::Depth),
            16 => Ok(Self::ShadowMap),
            other => Err(RenderError::UnknownTextureFormat(other)),
        }
    }
}

impl fmt::Display for RenderTextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb8 => "Rgb8",
            Self::Rgba8 => "Rgba8",
            Self::Alpha8 => "Alpha8",
            Self::Rgba16F => "Rgba16F",
            Self::Depth => "Depth",
            Self::ShadowMap => "ShadowMap",
        };
        f.write_str(name)
    }
}

/// Depth-stencil format of a render texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthStencilFormat {
    None,
    Depth16,
    Stencil8,
    Depth24Stencil8,
}

impl DepthStencilFormat {
    /// Raw format id.
    pub fn raw(self) -> u32 {
        match self {
            Self::Depth16 => 0,
            Self::Stencil8 => 1,
            Self::Depth24Stencil8 => 2,
            Self::None => 3,
        }
    }
}

impl TryFrom<u32> for DepthStencilFormat {
    type Error = RenderError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Depth16),
            1 => Ok(Self::Stencil8),
            2 => Ok(Self::Depth24Stencil8),
            3 => Ok(Self::None),
            other => Err(RenderError::UnknownDepthStencilFormat(other)),
        }
    }
}

impl fmt::Display for DepthStencilFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Depth16 => "Depth16",
            Self::Stencil8 => "Stencil8",
            Self::Depth24Stencil8 => "Depth24Stencil8",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FORMATS: [RenderTextureFormat; 6] = [
        RenderTextureFormat::Rgb8,
        RenderTextureFormat::Rgba8,
        RenderTextureFormat::Alpha8,
        RenderTextureFormat::Rgba16F,
        RenderTextureFormat::Depth,
        RenderTextureFormat::ShadowMap,
    ];

    #[test]
    fn only_depth_and_shadow_map_sample_depth() {
        let depth: Vec<_> = ALL_FORMATS.iter().filter(|f| f.is_depth()).collect();
        assert_eq!(
            depth,
            vec![&RenderTextureFormat::Depth, &RenderTextureFormat::ShadowMap]
        );
    }

    #[test]
    fn raw_ids_convert_back() {
        for format in ALL_FORMATS {
            assert_eq!(RenderTextureFormat::try_from(format.raw()), Ok(format));
        }
        assert_eq!(
            DepthStencilFormat::try_from(DepthStencilFormat::None.raw()),
            Ok(DepthStencilFormat::None)
        );
    }

    #[test]
    fn unmapped_raw_format_is_an_error() {
        assert_eq!(
            RenderTextureFormat::try_from(3),
            Err(RenderError::UnknownTextureFormat(3))
        );
        assert_eq!(
            DepthStencilFormat::try_from(9),
            Err(RenderError::UnknownDepthStencilFormat(9))
        );
    }

    #[test]
    fn formats_deserialize_from_snake_case() {
        let format: RenderTextureFormat = serde_json::from_str("\"shadow_map\"").unwrap();
        assert_eq!(format, RenderTextureFormat::ShadowMap);
        let depth: DepthStencilFormat = serde_json::from_str("\"depth24_stencil8\"").unwrap();
        assert_eq!(depth, DepthStencilFormat::Depth24Stencil8);
    }
}

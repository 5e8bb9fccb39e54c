//! GPU-side render target infrastructure.
//!
//! # Module overview
//!
//! - [`device`] -- The `GraphicsDevice` seam and capability types.
//! - [`context`] -- glow-backed device with capability detection.
//! - [`texture`] -- Format tables, allocation paths and sampling settings.
//! - [`target`] -- FBO + attachment render textures.
//! - [`pool`] -- Shape-keyed reuse of render textures.
//! - [`state`] -- Per-frame render state (active target, pipeline tag).

pub mod context;
pub mod device;
pub mod pool;
pub mod state;
pub mod target;
pub mod texture;

pub use context::GpuContext;
pub use device::{ApiGeneration, GraphicsDevice, ReadbackCallback, ReadbackMode};
pub use pool::RenderTexturePool;
pub use state::{RenderContext, DEPTH_NORMAL_PIPELINE, FORWARD_PIPELINE, SHADOW_CASTER_PIPELINE};
pub use target::{RenderTexture, RenderTextureDescriptor, RenderTextureId};
pub use texture::{FilterMode, TextureSettings, WrapMode};

//! Pool of reusable render textures.
//!
//! The pool owns every render texture it creates and hands out
//! [`RenderTextureId`]s. Idle textures are kept in an unordered list and
//! matched by exact (width, height, format, depth-stencil format); a hit
//! performs no GPU work. Textures are only destroyed by explicit disposal.
//!
//! Pools hold single-digit to low-dozens of distinct shapes in practice,
//! so lookup is a linear scan.
//!
//! Disposed textures leave an empty slot behind and their ids are never
//! handed out again, so a stale id cannot alias a newer texture. Slots are
//! not reclaimed; the slot count grows with total allocations, not with
//! live textures.

use super::device::GraphicsDevice;
use super::target::{RenderTexture, RenderTextureDescriptor, RenderTextureId};
use super::texture::TextureSettings;
use crate::error::RenderError;
use crate::format::{DepthStencilFormat, RenderTextureFormat};
use std::rc::Rc;

/// Owner of all render textures created on one graphics device.
pub struct RenderTexturePool<D: GraphicsDevice> {
    device: Rc<D>,
    settings: TextureSettings,
    slots: Vec<Option<RenderTexture<D>>>,
    idle: Vec<RenderTextureId>,
    live: usize,
    gpu_memory: u64,
}

impl<D: GraphicsDevice> RenderTexturePool<D> {
    /// Creates an empty pool whose textures use default sampling settings.
    pub fn new(device: Rc<D>) -> Self {
        Self::with_settings(device, TextureSettings::default())
    }

    /// Creates an empty pool whose textures use `settings`.
    pub fn with_settings(device: Rc<D>, settings: TextureSettings) -> Self {
        Self {
            device,
            settings,
            slots: Vec::new(),
            idle: Vec::new(),
            live: 0,
            gpu_memory: 0,
        }
    }

    pub fn device(&self) -> &Rc<D> {
        &self.device
    }

    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    /// Takes an idle render texture of exactly this shape, or allocates one.
    ///
    /// # Errors
    ///
    /// Propagates allocation errors from [`RenderTexture`] construction.
    pub fn create_from_pool(
        &mut self,
        width: u32,
        height: u32,
        format: RenderTextureFormat,
        depth_stencil_format: DepthStencilFormat,
    ) -> Result<RenderTextureId, RenderError> {
        let descriptor = RenderTextureDescriptor::new(width, height, format, depth_stencil_format);

        let slots = &self.slots;
        let hit = self.idle.iter().position(|id| {
            slots[id.0]
                .as_ref()
                .is_some_and(|texture| texture.descriptor() == descriptor)
        });
        if let Some(position) = hit {
            let id = self.idle.swap_remove(position);
            if let Some(texture) = self.slots[id.0].as_mut() {
                texture.set_in_pool(false);
            }
            log::debug!("render texture {} reused for {width}x{height} {format}", id.0);
            return Ok(id);
        }

        let id = RenderTextureId(self.slots.len());
        let texture = RenderTexture::new(self.device.as_ref(), id, descriptor, &self.settings)?;
        self.gpu_memory += texture.gpu_memory();
        self.live += 1;
        self.slots.push(Some(texture));
        Ok(id)
    }

    /// Returns a render texture to the idle list. No-op if it is already
    /// idle or has been disposed.
    pub fn recover_to_pool(&mut self, id: RenderTextureId) {
        let Some(texture) = self.slots.get_mut(id.0).and_then(Option::as_mut) else {
            log::warn!("recover_to_pool: render texture {} is not live", id.0);
            return;
        };
        if texture.is_in_pool() {
            return;
        }
        texture.set_in_pool(true);
        self.idle.push(id);
    }

    pub fn get(&self, id: RenderTextureId) -> Option<&RenderTexture<D>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: RenderTextureId) -> Option<&mut RenderTexture<D>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Like [`get_mut`](Self::get_mut) but reports unknown ids as an error.
    pub fn texture_mut(&mut self, id: RenderTextureId) -> Result<&mut RenderTexture<D>, RenderError> {
        self.get_mut(id)
            .ok_or(RenderError::UnknownRenderTexture(id.0))
    }

    /// Ids currently idle in the pool, in no particular order.
    pub fn idle(&self) -> &[RenderTextureId] {
        &self.idle
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Number of live (not disposed) render textures, idle or checked out.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes reported by all live render textures.
    pub fn gpu_memory(&self) -> u64 {
        self.gpu_memory
    }

    /// Frees a render texture's GPU objects and forgets it. Idempotent.
    pub fn dispose(&mut self, id: RenderTextureId) {
        let Some(mut texture) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        self.idle.retain(|idle| *idle != id);
        self.live -= 1;
        self.gpu_memory -= texture.gpu_memory();
        texture.dispose(self.device.as_ref());
    }

    /// Disposes every idle render texture, leaving checked-out ones alone.
    pub fn dispose_idle(&mut self) {
        for id in std::mem::take(&mut self.idle) {
            self.dispose(id);
        }
    }

    /// Disposes every render texture the pool has created.
    pub fn dispose_all(&mut self) {
        for index in 0..self.slots.len() {
            self.dispose(RenderTextureId(index));
        }
    }
}

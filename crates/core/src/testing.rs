//! Test doubles: a recording in-memory `GraphicsDevice`, an opaque queue and a camera.
//!
//! The fake device keeps RGBA8 pixels for color textures so clears can be
//! read back, and records every call for assertions.

use crate::camera::{DepthCamera, Viewport};
use crate::depth_pass::OpaqueQueue;
use crate::error::RenderError;
use crate::render::device::{ApiGeneration, GraphicsDevice, ReadbackCallback, ReadbackMode};
use crate::render::state::RenderContext;
use crate::render::target::RenderTextureId;
use crate::shader_data::{ShaderData, SHADOW_BIAS};
use glam::Vec4;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateFramebuffer(u32),
    CreateTexture(u32),
    CreateRenderbuffer(u32),
    DeleteFramebuffer(u32),
    DeleteTexture(u32),
    DeleteRenderbuffer(u32),
    BindFramebuffer(Option<u32>),
    BindTexture(Option<u32>),
    BindRenderbuffer(Option<u32>),
    TexStorage {
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    },
    TexImage {
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
    },
    TexParameterI32(u32, i32),
    TexParameterF32(u32, f32),
    FramebufferTexture {
        attachment: u32,
        texture: Option<u32>,
    },
    RenderbufferStorage {
        internal_format: u32,
        width: i32,
        height: i32,
    },
    FramebufferRenderbuffer {
        attachment: u32,
        renderbuffer: Option<u32>,
    },
    Viewport(i32, i32, i32, i32),
    Scissor(i32, i32, i32, i32),
    EnableScissorTest,
    ClearColor([f32; 4]),
    Clear(u32),
    ReadPixels(i32, i32, i32, i32),
    ReadPixelsAsync(i32, i32, i32, i32),
}

#[derive(Default)]
struct FakeTexture {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    calls: Vec<Call>,
    bound_framebuffer: Option<u32>,
    bound_texture: Option<u32>,
    live: HashSet<u32>,
    color_attachments: HashMap<u32, u32>,
    textures: HashMap<u32, FakeTexture>,
    clear_color: [f32; 4],
}

/// In-memory GL stand-in.
pub struct FakeDevice {
    generation: ApiGeneration,
    readback_mode: ReadbackMode,
    anisotropy: bool,
    half_float: bool,
    incomplete: Cell<bool>,
    fail_renderbuffers: Cell<bool>,
    state: RefCell<State>,
}

impl FakeDevice {
    pub fn new(generation: ApiGeneration) -> Self {
        Self {
            generation,
            readback_mode: ReadbackMode::Sync,
            anisotropy: true,
            half_float: true,
            incomplete: Cell::new(false),
            fail_renderbuffers: Cell::new(false),
            state: RefCell::new(State::default()),
        }
    }

    pub fn with_readback_mode(mut self, mode: ReadbackMode) -> Self {
        self.readback_mode = mode;
        self
    }

    pub fn with_half_float(mut self, supported: bool) -> Self {
        self.half_float = supported;
        self
    }

    pub fn with_anisotropy(mut self, supported: bool) -> Self {
        self.anisotropy = supported;
        self
    }

    pub fn set_incomplete(&self, incomplete: bool) {
        self.incomplete.set(incomplete);
    }

    pub fn fail_renderbuffers(&self, fail: bool) {
        self.fail_renderbuffers.set(fail);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn bound_framebuffer(&self) -> Option<u32> {
        self.state.borrow().bound_framebuffer
    }

    /// Number of created objects not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, make: fn(u32) -> Call) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);
        state.calls.push(make(id));
        id
    }

    fn delete(&self, id: u32, call: Call) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&id);
        state.textures.remove(&id);
        state.color_attachments.remove(&id);
        state.calls.push(call);
    }

    fn allocate_bound_texture(&self, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.bound_texture {
            let (width, height) = (width.max(0) as usize, height.max(0) as usize);
            state.textures.insert(
                id,
                FakeTexture {
                    width,
                    height,
                    pixels: vec![0; width * height * 4],
                },
            );
        }
    }

    fn bound_color_texture(state: &State) -> Option<u32> {
        state
            .bound_framebuffer
            .and_then(|fb| state.color_attachments.get(&fb).copied())
    }

    fn read_region(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]) {
        let state = self.state.borrow();
        let Some(texture) = Self::bound_color_texture(&state).and_then(|t| state.textures.get(&t))
        else {
            return;
        };
        for row in 0..height.max(0) as usize {
            for col in 0..width.max(0) as usize {
                let (sx, sy) = (x as usize + col, y as usize + row);
                if sx >= texture.width || sy >= texture.height {
                    continue;
                }
                let src = (sy * texture.width + sx) * 4;
                let dst = (row * width as usize + col) * 4;
                out[dst..dst + 4].copy_from_slice(&texture.pixels[src..src + 4]);
            }
        }
    }
}

impl GraphicsDevice for FakeDevice {
    type Texture = u32;
    type Framebuffer = u32;
    type Renderbuffer = u32;

    fn generation(&self) -> ApiGeneration {
        self.generation
    }

    fn supports_anisotropy(&self) -> bool {
        self.anisotropy
    }

    fn supports_half_float(&self) -> bool {
        self.half_float
    }

    fn readback_mode(&self) -> ReadbackMode {
        self.readback_mode
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        Ok(self.create(Call::CreateFramebuffer))
    }

    fn create_texture(&self) -> Result<u32, String> {
        Ok(self.create(Call::CreateTexture))
    }

    fn create_renderbuffer(&self) -> Result<u32, String> {
        if self.fail_renderbuffers.get() {
            return Err("out of renderbuffers".to_string());
        }
        Ok(self.create(Call::CreateRenderbuffer))
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.delete(framebuffer, Call::DeleteFramebuffer(framebuffer));
    }

    fn delete_texture(&self, texture: u32) {
        self.delete(texture, Call::DeleteTexture(texture));
    }

    fn delete_renderbuffer(&self, renderbuffer: u32) {
        self.delete(renderbuffer, Call::DeleteRenderbuffer(renderbuffer));
    }

    fn bind_framebuffer(&self, framebuffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_framebuffer = framebuffer;
        state.calls.push(Call::BindFramebuffer(framebuffer));
    }

    fn bind_texture(&self, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_texture = texture;
        state.calls.push(Call::BindTexture(texture));
    }

    fn bind_renderbuffer(&self, renderbuffer: Option<u32>) {
        self.record(Call::BindRenderbuffer(renderbuffer));
    }

    fn tex_storage_2d(&self, levels: i32, internal_format: u32, width: i32, height: i32) {
        self.allocate_bound_texture(width, height);
        self.record(Call::TexStorage {
            levels,
            internal_format,
            width,
            height,
        });
    }

    fn tex_image_2d(&self, internal_format: i32, width: i32, height: i32, format: u32, ty: u32) {
        self.allocate_bound_texture(width, height);
        self.record(Call::TexImage {
            internal_format,
            width,
            height,
            format,
            ty,
        });
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        self.record(Call::TexParameterI32(parameter, value));
    }

    fn tex_parameter_f32(&self, parameter: u32, value: f32) {
        self.record(Call::TexParameterF32(parameter, value));
    }

    fn framebuffer_texture_2d(&self, attachment: u32, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        if let (Some(fb), Some(tex)) = (state.bound_framebuffer, texture) {
            if attachment == glow::COLOR_ATTACHMENT0 {
                state.color_attachments.insert(fb, tex);
            }
        }
        state.calls.push(Call::FramebufferTexture {
            attachment,
            texture,
        });
    }

    fn renderbuffer_storage(&self, internal_format: u32, width: i32, height: i32) {
        self.record(Call::RenderbufferStorage {
            internal_format,
            width,
            height,
        });
    }

    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: Option<u32>) {
        self.record(Call::FramebufferRenderbuffer {
            attachment,
            renderbuffer,
        });
    }

    fn check_framebuffer_status(&self) -> u32 {
        if self.incomplete.get() {
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        } else {
            glow::FRAMEBUFFER_COMPLETE
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Scissor(x, y, width, height));
    }

    fn enable_scissor_test(&self) {
        self.record(Call::EnableScissorTest);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        let mut state = self.state.borrow_mut();
        state.clear_color = [r, g, b, a];
        state.calls.push(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Clear(mask));
        if mask & glow::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let rgba = state
            .clear_color
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        if let Some(id) = Self::bound_color_texture(&state) {
            if let Some(texture) = state.textures.get_mut(&id) {
                for pixel in texture.pixels.chunks_exact_mut(4) {
                    pixel.copy_from_slice(&rgba);
                }
            }
        }
    }

    fn read_pixels(&self, x: i32, y: i32, width: i32, height: i32, out: &mut [u8]) {
        self.record(Call::ReadPixels(x, y, width, height));
        self.read_region(x, y, width, height, out);
    }

    fn read_pixels_async(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        callback: ReadbackCallback,
    ) {
        self.record(Call::ReadPixelsAsync(x, y, width, height));
        let mut data = vec![0u8; width.max(0) as usize * height.max(0) as usize * 4];
        self.read_region(x, y, width, height, &mut data);
        callback(data);
    }
}

/// What the opaque queue observed when asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueObservation {
    pub pipeline_mode: String,
    pub active: Option<RenderTextureId>,
    pub runtime_value_mode: bool,
    pub bound_framebuffer: Option<u32>,
    pub shadow_bias: Option<Vec4>,
}

/// Opaque queue that draws nothing and records the context it saw.
#[derive(Default)]
pub struct RecordingQueue {
    pub observed: Vec<QueueObservation>,
    pub fail: bool,
    pub shader_values: ShaderData<u32>,
}

impl OpaqueQueue<FakeDevice> for RecordingQueue {
    fn shader_values_mut(&mut self) -> &mut ShaderData<u32> {
        &mut self.shader_values
    }

    fn render(&mut self, device: &FakeDevice, context: &RenderContext) -> Result<(), RenderError> {
        self.observed.push(QueueObservation {
            pipeline_mode: context.pipeline_mode.clone(),
            active: context.current_active(),
            runtime_value_mode: context.runtime_value_mode(),
            bound_framebuffer: device.bound_framebuffer(),
            shadow_bias: self.shader_values.vector(SHADOW_BIAS),
        });
        if self.fail {
            return Err(RenderError::Gpu("draw call failed".to_string()));
        }
        Ok(())
    }
}

/// Plain camera with public fields.
pub struct TestCamera {
    pub viewport: Viewport,
    pub near: f32,
    pub far: f32,
    pub depth_texture: Option<u32>,
    pub depth_normal_texture: Option<u32>,
    pub shader_values: ShaderData<u32>,
}

impl TestCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(0, 0, width, height),
            near: 1.0,
            far: 100.0,
            depth_texture: None,
            depth_normal_texture: None,
            shader_values: ShaderData::new(),
        }
    }
}

impl DepthCamera<u32> for TestCamera {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn near_plane(&self) -> f32 {
        self.near
    }

    fn far_plane(&self) -> f32 {
        self.far
    }

    fn set_depth_texture(&mut self, texture: Option<u32>) {
        self.depth_texture = texture;
    }

    fn set_depth_normal_texture(&mut self, texture: Option<u32>) {
        self.depth_normal_texture = texture;
    }

    fn shader_values_mut(&mut self) -> &mut ShaderData<u32> {
        &mut self.shader_values
    }
}

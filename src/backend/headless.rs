//! Recording backend with no GPU behind it.
//!
//! Every call lands in an ordered log, buffer contents and bindings are kept
//! so they can be inspected, and a registry counts live objects by kind the
//! way a debug layer reports them. It enforces the same ordering rules a real
//! swap chain does: resizing fails while any back-buffer reference is alive,
//! and acquiring a GDI device context detaches the render target.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::debug;
use raw_window_handle::RawWindowHandle;

use crate::core::shader::{assemble_container, ShaderBytecode, ShaderStage};
use crate::error::{GpuError, GpuResult};
use crate::traits::{BackendFactory, GdiContext, GraphicsBackend};
use crate::types::{
    BlendDesc, BufferDesc, BufferUsage, Extent, FontDesc, InputElement, Rect, Rgb, TextFormat,
    TextureDesc, Topology, Viewport,
};

pub type ObjectId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Device,
    Context,
    SwapChain,
    Buffer,
    Texture,
    ShaderView,
    TargetView,
    BackBuffer,
    InputLayout,
    VertexShader,
    PixelShader,
    BlendState,
    Font,
}

/// Calls that can be made to fail with `Recording::fail_next`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateDevice,
    CompileShader,
    CreateBuffer,
    CreateTexture,
    CreateShaderView,
    CreateTargetView,
    CreateFont,
    WriteDiscard,
    ResizeBuffers,
    BackBuffer,
    AcquireDc,
    ReleaseDc,
    Present,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { kind: ObjectKind, id: ObjectId },
    Release { kind: ObjectKind, id: ObjectId },
    SetInputLayout(ObjectId),
    SetVertexShader(ObjectId),
    SetPixelShader(ObjectId),
    SetTopology(Topology),
    SetBlendState(ObjectId),
    SetVertexBuffer { stream: u32, buffer: ObjectId, stride: u32 },
    SetConstantBuffers { first_slot: u32, buffers: Vec<ObjectId> },
    SetShaderView { slot: u32, view: ObjectId },
    SetRenderTarget(ObjectId),
    UnbindRenderTarget,
    SetViewport(Viewport),
    WriteDiscard { buffer: ObjectId, bytes: Vec<u8> },
    Draw { vertex_count: u32, first_vertex: u32 },
    ClearRenderTarget { view: ObjectId, rgba: [f32; 4] },
    ResizeBuffers(Extent),
    AcquireDc(ObjectId),
    SetTransparentBackground,
    SelectFont(ObjectId),
    SetTextColor(Rgb),
    DrawText { text: String, area: Rect, format: TextFormat },
    ReleaseDc,
    Present { sync_interval: u32 },
    ClearState,
}

/// Pipeline bindings as the immediate context would hold them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundState {
    pub render_target: Option<ObjectId>,
    pub viewport: Option<Viewport>,
    pub vertex_buffers: BTreeMap<u32, ObjectId>,
    pub constant_buffers: BTreeMap<u32, ObjectId>,
    pub shader_views: BTreeMap<u32, ObjectId>,
    pub input_layout: Option<ObjectId>,
    pub vertex_shader: Option<ObjectId>,
    pub pixel_shader: Option<ObjectId>,
    pub blend_state: Option<ObjectId>,
    pub topology: Option<Topology>,
}

#[derive(Default)]
struct Recorder {
    next_id: ObjectId,
    live: HashMap<ObjectId, ObjectKind>,
    calls: Vec<Call>,
    buffers: HashMap<ObjectId, (BufferDesc, Vec<u8>)>,
    target_sizes: HashMap<ObjectId, Extent>,
    texture_sizes: HashMap<ObjectId, Extent>,
    bound: BoundState,
    swap_chain_size: Extent,
    failures: HashSet<Operation>,
    discard_calls: bool,
}

impl Recorder {
    fn record(&mut self, call: Call) {
        if !self.discard_calls {
            self.calls.push(call);
        }
    }

    fn create(&mut self, kind: ObjectKind) -> ObjectId {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, kind);
        self.record(Call::Create { kind, id });
        id
    }

    fn release(&mut self, id: ObjectId) {
        if let Some(kind) = self.live.remove(&id) {
            self.buffers.remove(&id);
            self.target_sizes.remove(&id);
            self.texture_sizes.remove(&id);
            self.record(Call::Release { kind, id });
        }
    }

    fn take_failure(&mut self, operation: Operation) -> bool {
        self.failures.remove(&operation)
    }

    fn live_of(&self, kind: ObjectKind) -> usize {
        self.live.values().filter(|&&k| k == kind).count()
    }
}

/// Shared view of everything a headless backend has done
#[derive(Clone, Default)]
pub struct Recording {
    inner: Rc<RefCell<Recorder>>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recording that tracks objects and bindings but keeps no call log
    pub fn without_log() -> Self {
        let recording = Self::default();
        recording.inner.borrow_mut().discard_calls = true;
        recording
    }

    fn track(&self, kind: ObjectKind) -> Tracked {
        let id = self.inner.borrow_mut().create(kind);
        Tracked {
            id,
            kind,
            recorder: Rc::clone(&self.inner),
        }
    }

    fn push(&self, call: Call) {
        self.inner.borrow_mut().record(call);
    }

    fn fail_point(&self, operation: Operation, err: impl FnOnce() -> GpuError) -> GpuResult<()> {
        if self.inner.borrow_mut().take_failure(operation) {
            Err(err())
        } else {
            Ok(())
        }
    }

    /// Make the next `operation` fail once
    pub fn fail_next(&self, operation: Operation) {
        self.inner.borrow_mut().failures.insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn live_objects(&self) -> usize {
        self.inner.borrow().live.len()
    }

    pub fn live_of(&self, kind: ObjectKind) -> usize {
        self.inner.borrow().live_of(kind)
    }

    /// Live object counts by kind, as a debug layer would report them
    pub fn report_live_objects(&self) -> BTreeMap<ObjectKind, usize> {
        let recorder = self.inner.borrow();
        let mut report = BTreeMap::new();
        for kind in recorder.live.values() {
            *report.entry(*kind).or_insert(0) += 1;
        }
        report
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.inner.borrow().live.contains_key(&id)
    }

    pub fn bound(&self) -> BoundState {
        self.inner.borrow().bound.clone()
    }

    pub fn buffer_contents(&self, id: ObjectId) -> Option<Vec<u8>> {
        self.inner
            .borrow()
            .buffers
            .get(&id)
            .map(|(_, contents)| contents.clone())
    }

    /// Contents of the buffer bound to constant slot `slot`
    pub fn constant_slot_contents(&self, slot: u32) -> Option<Vec<u8>> {
        let id = *self.inner.borrow().bound.constant_buffers.get(&slot)?;
        self.buffer_contents(id)
    }

    /// Contents of the buffer bound to vertex stream `stream`
    pub fn vertex_stream_contents(&self, stream: u32) -> Option<Vec<u8>> {
        let id = *self.inner.borrow().bound.vertex_buffers.get(&stream)?;
        self.buffer_contents(id)
    }

    pub fn target_size(&self, id: ObjectId) -> Option<Extent> {
        self.inner.borrow().target_sizes.get(&id).copied()
    }

    pub fn swap_chain_size(&self) -> Extent {
        self.inner.borrow().swap_chain_size
    }
}

impl fmt::Debug for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recorder = self.inner.borrow();
        f.debug_struct("Recording")
            .field("calls", &recorder.calls.len())
            .field("live", &recorder.live.len())
            .finish()
    }
}

/// A live object; dropping it releases it in the registry
pub struct Tracked {
    id: ObjectId,
    kind: ObjectKind,
    recorder: Rc<RefCell<Recorder>>,
}

impl Tracked {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.recorder.borrow_mut().release(self.id);
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

/// GDI calls buffered while the device context is held
#[derive(Debug, Default)]
pub struct HeadlessDc {
    calls: Vec<Call>,
}

impl GdiContext for HeadlessDc {
    type Font = Tracked;

    fn set_transparent_background(&mut self) {
        self.calls.push(Call::SetTransparentBackground);
    }

    fn select_font(&mut self, font: &Tracked) {
        self.calls.push(Call::SelectFont(font.id));
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.calls.push(Call::SetTextColor(color));
    }

    fn draw_text(&mut self, text: &str, area: Rect, format: TextFormat) {
        self.calls.push(Call::DrawText {
            text: text.to_string(),
            area,
            format,
        });
    }
}

pub struct HeadlessBackend {
    recording: Recording,
    swap_chain: Tracked,
    context: Tracked,
    device: Tracked,
}

impl HeadlessBackend {
    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Buffer = Tracked;
    type Texture = Tracked;
    type ShaderView = Tracked;
    type TargetView = Tracked;
    type BackBuffer = Tracked;
    type InputLayout = Tracked;
    type VertexShader = Tracked;
    type PixelShader = Tracked;
    type BlendState = Tracked;
    type Font = Tracked;
    type Gdi = HeadlessDc;

    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_shader: &ShaderBytecode,
    ) -> GpuResult<Tracked> {
        if elements.is_empty() || vertex_shader.is_empty() {
            return Err(GpuError::resource("input layout", "no elements or bytecode"));
        }
        Ok(self.recording.track(ObjectKind::InputLayout))
    }

    fn create_vertex_shader(&mut self, _bytecode: &ShaderBytecode) -> GpuResult<Tracked> {
        Ok(self.recording.track(ObjectKind::VertexShader))
    }

    fn create_pixel_shader(&mut self, _bytecode: &ShaderBytecode) -> GpuResult<Tracked> {
        Ok(self.recording.track(ObjectKind::PixelShader))
    }

    fn create_blend_state(&mut self, _desc: &BlendDesc) -> GpuResult<Tracked> {
        Ok(self.recording.track(ObjectKind::BlendState))
    }

    fn create_buffer(&mut self, desc: &BufferDesc, contents: Option<&[u8]>) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::CreateBuffer, || {
            GpuError::resource("buffer", "injected failure")
        })?;

        let initial = match (desc.usage, contents) {
            (BufferUsage::Immutable, None) => {
                return Err(GpuError::resource("buffer", "immutable buffer without contents"));
            }
            (_, Some(bytes)) if bytes.len() != desc.size as usize => {
                return Err(GpuError::resource(
                    "buffer",
                    format!("{} initial bytes for a {}-byte buffer", bytes.len(), desc.size),
                ));
            }
            (_, Some(bytes)) => bytes.to_vec(),
            (_, None) => vec![0; desc.size as usize],
        };

        let buffer = self.recording.track(ObjectKind::Buffer);
        self.recording
            .inner
            .borrow_mut()
            .buffers
            .insert(buffer.id, (*desc, initial));
        Ok(buffer)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::CreateTexture, || {
            GpuError::resource("texture", "injected failure")
        })?;

        if desc.size.is_empty() {
            return Err(GpuError::resource("texture", "zero-sized texture"));
        }
        if pixels.len() != desc.row_pitch() as usize * desc.size.height as usize {
            return Err(GpuError::resource("texture", "pixel data does not match row pitch"));
        }

        let texture = self.recording.track(ObjectKind::Texture);
        self.recording
            .inner
            .borrow_mut()
            .texture_sizes
            .insert(texture.id, desc.size);
        Ok(texture)
    }

    fn create_shader_view(&mut self, _texture: &Tracked) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::CreateShaderView, || {
            GpuError::resource("shader resource view", "injected failure")
        })?;
        Ok(self.recording.track(ObjectKind::ShaderView))
    }

    fn create_target_view(&mut self, _back_buffer: &Tracked) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::CreateTargetView, || {
            GpuError::resource("render target view", "injected failure")
        })?;

        let view = self.recording.track(ObjectKind::TargetView);
        let size = self.recording.swap_chain_size();
        self.recording
            .inner
            .borrow_mut()
            .target_sizes
            .insert(view.id, size);
        Ok(view)
    }

    fn create_font(&mut self, desc: &FontDesc) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::CreateFont, || {
            GpuError::resource("font", "injected failure")
        })?;
        debug!("Headless font {} {}px", desc.face, desc.height);
        Ok(self.recording.track(ObjectKind::Font))
    }

    fn set_input_layout(&mut self, layout: &Tracked) {
        self.recording.inner.borrow_mut().bound.input_layout = Some(layout.id);
        self.recording.push(Call::SetInputLayout(layout.id));
    }

    fn set_vertex_shader(&mut self, shader: &Tracked) {
        self.recording.inner.borrow_mut().bound.vertex_shader = Some(shader.id);
        self.recording.push(Call::SetVertexShader(shader.id));
    }

    fn set_pixel_shader(&mut self, shader: &Tracked) {
        self.recording.inner.borrow_mut().bound.pixel_shader = Some(shader.id);
        self.recording.push(Call::SetPixelShader(shader.id));
    }

    fn set_topology(&mut self, topology: Topology) {
        self.recording.inner.borrow_mut().bound.topology = Some(topology);
        self.recording.push(Call::SetTopology(topology));
    }

    fn set_blend_state(&mut self, state: &Tracked) {
        self.recording.inner.borrow_mut().bound.blend_state = Some(state.id);
        self.recording.push(Call::SetBlendState(state.id));
    }

    fn set_vertex_buffer(&mut self, stream: u32, buffer: &Tracked, stride: u32) {
        self.recording
            .inner
            .borrow_mut()
            .bound
            .vertex_buffers
            .insert(stream, buffer.id);
        self.recording.push(Call::SetVertexBuffer {
            stream,
            buffer: buffer.id,
            stride,
        });
    }

    fn set_constant_buffers(&mut self, first_slot: u32, buffers: &[&Tracked]) {
        let ids: Vec<ObjectId> = buffers.iter().map(|b| b.id).collect();
        {
            let mut recorder = self.recording.inner.borrow_mut();
            for (offset, id) in ids.iter().enumerate() {
                recorder
                    .bound
                    .constant_buffers
                    .insert(first_slot + offset as u32, *id);
            }
        }
        self.recording.push(Call::SetConstantBuffers {
            first_slot,
            buffers: ids,
        });
    }

    fn set_shader_view(&mut self, slot: u32, view: &Tracked) {
        self.recording
            .inner
            .borrow_mut()
            .bound
            .shader_views
            .insert(slot, view.id);
        self.recording.push(Call::SetShaderView { slot, view: view.id });
    }

    fn set_render_target(&mut self, view: &Tracked) {
        self.recording.inner.borrow_mut().bound.render_target = Some(view.id);
        self.recording.push(Call::SetRenderTarget(view.id));
    }

    fn unbind_render_target(&mut self) {
        self.recording.inner.borrow_mut().bound.render_target = None;
        self.recording.push(Call::UnbindRenderTarget);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.recording.inner.borrow_mut().bound.viewport = Some(viewport);
        self.recording.push(Call::SetViewport(viewport));
    }

    fn write_discard(&mut self, buffer: &Tracked, bytes: &[u8]) -> GpuResult<()> {
        self.recording.fail_point(Operation::WriteDiscard, || {
            GpuError::map("buffer", "injected failure")
        })?;

        {
            let mut recorder = self.recording.inner.borrow_mut();
            let (desc, contents) = recorder
                .buffers
                .get_mut(&buffer.id)
                .ok_or_else(|| GpuError::map("buffer", "unknown buffer"))?;

            if desc.usage != BufferUsage::Dynamic {
                return Err(GpuError::map("buffer", "buffer is not CPU-writable"));
            }
            if bytes.len() > desc.size as usize {
                return Err(GpuError::map(
                    "buffer",
                    format!("{} bytes into a {}-byte buffer", bytes.len(), desc.size),
                ));
            }

            // discard: whatever was there before is gone
            contents.clear();
            contents.extend_from_slice(bytes);
            contents.resize(desc.size as usize, 0);
        }

        self.recording.push(Call::WriteDiscard {
            buffer: buffer.id,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.recording.push(Call::Draw {
            vertex_count,
            first_vertex,
        });
    }

    fn clear_render_target(&mut self, view: &Tracked, rgba: [f32; 4]) {
        self.recording.push(Call::ClearRenderTarget { view: view.id, rgba });
    }

    fn resize_buffers(&mut self, size: Extent) -> GpuResult<()> {
        let resize_error = |reason: &str| GpuError::Resize {
            width: size.width,
            height: size.height,
            reason: reason.to_string(),
        };

        self.recording
            .fail_point(Operation::ResizeBuffers, || resize_error("injected failure"))?;

        {
            let mut recorder = self.recording.inner.borrow_mut();
            if recorder.live_of(ObjectKind::TargetView) > 0
                || recorder.live_of(ObjectKind::BackBuffer) > 0
            {
                return Err(resize_error("back buffer references are still alive"));
            }
            if recorder.bound.render_target.is_some() {
                return Err(resize_error("a render target is still bound"));
            }
            recorder.swap_chain_size = size;
        }

        self.recording.push(Call::ResizeBuffers(size));
        Ok(())
    }

    fn back_buffer(&mut self) -> GpuResult<Tracked> {
        self.recording.fail_point(Operation::BackBuffer, || {
            GpuError::Surface("injected failure".to_string())
        })?;
        Ok(self.recording.track(ObjectKind::BackBuffer))
    }

    fn with_gdi(
        &mut self,
        back_buffer: &Tracked,
        draw: impl FnOnce(&mut Self::Gdi),
    ) -> GpuResult<()> {
        self.recording.fail_point(Operation::AcquireDc, || {
            GpuError::Surface("GetDC: injected failure".to_string())
        })?;

        self.recording.push(Call::AcquireDc(back_buffer.id));

        let mut dc = HeadlessDc::default();
        draw(&mut dc);

        let mut recorder = self.recording.inner.borrow_mut();
        for call in dc.calls {
            recorder.record(call);
        }
        recorder.record(Call::ReleaseDc);
        // GDI access detaches the surface from the output merger
        recorder.bound.render_target = None;

        if recorder.take_failure(Operation::ReleaseDc) {
            return Err(GpuError::Surface("ReleaseDC: injected failure".to_string()));
        }
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> GpuResult<()> {
        self.recording.fail_point(Operation::Present, || {
            GpuError::Present("injected failure".to_string())
        })?;
        self.recording.push(Call::Present { sync_interval });
        Ok(())
    }

    fn clear_state(&mut self) {
        self.recording.inner.borrow_mut().bound = BoundState::default();
        self.recording.push(Call::ClearState);
    }

    fn shutdown(self) {
        let Self {
            recording,
            swap_chain,
            context,
            device,
        } = self;

        drop(swap_chain);
        drop(context);
        drop(device);
        debug!("Headless device shut down, {} objects live", recording.live_objects());
    }
}

/// Creates headless backends that all record into one `Recording`
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    recording: Recording,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recording(recording: Recording) -> Self {
        Self { recording }
    }

    /// For long-running hosts, where an unbounded call log would only grow
    pub fn without_log() -> Self {
        Self::with_recording(Recording::without_log())
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

impl BackendFactory for HeadlessFactory {
    type Backend = HeadlessBackend;

    fn create(&self, window: RawWindowHandle) -> GpuResult<HeadlessBackend> {
        self.recording.fail_point(Operation::CreateDevice, || {
            GpuError::DeviceCreation("injected failure".to_string())
        })?;

        debug!("Headless device for {:?}", window);

        let device = self.recording.track(ObjectKind::Device);
        let context = self.recording.track(ObjectKind::Context);
        let swap_chain = self.recording.track(ObjectKind::SwapChain);

        Ok(HeadlessBackend {
            recording: self.recording.clone(),
            swap_chain,
            context,
            device,
        })
    }

    /// A chunk-bearing container tagged with the stage's entry point
    fn shader(&self, stage: ShaderStage) -> GpuResult<ShaderBytecode> {
        self.recording.fail_point(Operation::CompileShader, || {
            GpuError::InvalidShader(format!("{}: injected failure", stage.entry_point()))
        })?;
        ShaderBytecode::from_bytes(assemble_container(&[(
            *b"SHEX",
            stage.entry_point().as_bytes(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferKind;
    use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
    use std::num::NonZeroIsize;

    fn window() -> RawWindowHandle {
        RawWindowHandle::Win32(Win32WindowHandle::new(NonZeroIsize::new(1).unwrap()))
    }

    #[test]
    fn test_dropping_tracked_releases() {
        let recording = Recording::new();
        let object = recording.track(ObjectKind::Buffer);
        assert_eq!(recording.live_of(ObjectKind::Buffer), 1);

        let id = object.id();
        drop(object);
        assert_eq!(recording.live_objects(), 0);
        assert_eq!(
            recording.calls().last(),
            Some(&Call::Release {
                kind: ObjectKind::Buffer,
                id
            })
        );
    }

    #[test]
    fn test_without_log_still_tracks_objects() {
        let factory = HeadlessFactory::without_log();
        let mut backend = factory.create(window()).unwrap();
        backend.resize_buffers(Extent::new(32, 16)).unwrap();

        assert!(factory.recording().calls().is_empty());
        assert_eq!(factory.recording().live_objects(), 3);
        assert_eq!(factory.recording().swap_chain_size(), Extent::new(32, 16));

        backend.shutdown();
        assert_eq!(factory.recording().live_objects(), 0);
        assert!(factory.recording().calls().is_empty());
    }

    #[test]
    fn test_shutdown_releases_swap_chain_context_device() {
        let factory = HeadlessFactory::new();
        let backend = factory.create(window()).unwrap();
        assert_eq!(factory.recording().live_objects(), 3);

        factory.recording().clear_calls();
        backend.shutdown();

        let kinds: Vec<ObjectKind> = factory
            .recording()
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::Release { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![ObjectKind::SwapChain, ObjectKind::Context, ObjectKind::Device]
        );
        assert_eq!(factory.recording().live_objects(), 0);
    }

    #[test]
    fn test_resize_refused_while_back_buffer_alive() {
        let factory = HeadlessFactory::new();
        let mut backend = factory.create(window()).unwrap();

        let back_buffer = backend.back_buffer().unwrap();
        let err = backend.resize_buffers(Extent::new(800, 600)).unwrap_err();
        assert!(err.is_fatal());

        drop(back_buffer);
        assert!(backend.resize_buffers(Extent::new(800, 600)).is_ok());
        assert_eq!(factory.recording().swap_chain_size(), Extent::new(800, 600));
    }

    #[test]
    fn test_immutable_buffer_rejects_writes() {
        let factory = HeadlessFactory::new();
        let mut backend = factory.create(window()).unwrap();
        let desc = BufferDesc {
            size: 8,
            usage: BufferUsage::Immutable,
            kind: BufferKind::Vertex,
        };

        let buffer = backend.create_buffer(&desc, Some(&[0; 8])).unwrap();
        assert!(backend.write_discard(&buffer, &[1; 8]).is_err());
        assert!(backend.create_buffer(&desc, None).is_err());
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let factory = HeadlessFactory::new();
        let mut backend = factory.create(window()).unwrap();

        factory.recording().fail_next(Operation::Present);
        assert!(matches!(backend.present(0), Err(GpuError::Present(_))));
        assert!(backend.present(0).is_ok());
    }

    #[test]
    fn test_gdi_scope_detaches_render_target() {
        let factory = HeadlessFactory::new();
        let mut backend = factory.create(window()).unwrap();
        backend.resize_buffers(Extent::new(64, 64)).unwrap();

        let back_buffer = backend.back_buffer().unwrap();
        let view = backend.create_target_view(&back_buffer).unwrap();
        backend.set_render_target(&view);

        backend
            .with_gdi(&back_buffer, |dc| dc.set_text_color(Rgb::WHITE))
            .unwrap();

        assert_eq!(factory.recording().bound().render_target, None);
        let calls = factory.recording().calls();
        let tail = &calls[calls.len() - 3..];
        assert_eq!(
            tail,
            &[
                Call::AcquireDc(back_buffer.id()),
                Call::SetTextColor(Rgb::WHITE),
                Call::ReleaseDc
            ]
        );
    }

    #[test]
    fn test_factory_shaders_validate() {
        let factory = HeadlessFactory::new();
        let vertex = factory.shader(ShaderStage::Vertex).unwrap();
        assert!(vertex.len() > 32);
    }
}

//! Direct3D 11 backend.
//!
//! One hardware device with a single-buffered, GDI-compatible BGRA swap chain
//! on the host window. Every COM object is reference counted by the `windows`
//! crate, so dropping a value is the release call.

use std::ffi::{c_void, CString};
use std::path::PathBuf;
use std::ptr::copy_nonoverlapping;
use std::slice::from_raw_parts;

use log::{debug, info, warn};
use raw_window_handle::RawWindowHandle;
use windows::core::{s, Interface, PCSTR};
use windows::Win32::Foundation::{COLORREF, FALSE, HWND, RECT, TRUE};
use windows::Win32::Graphics::Direct3D::{Fxc::D3DCompile, *};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::{Common::*, *};
use windows::Win32::Graphics::Gdi::{
    CreateFontIndirectW, DeleteObject, DrawTextW, SelectObject, SetBkMode, SetTextColor,
    DRAW_TEXT_FORMAT, DT_EDITCONTROL, DT_NOFULLWIDTHCHARBREAK, DT_NOPREFIX, DT_WORDBREAK, HDC,
    HFONT, LOGFONTW, TRANSPARENT,
};

use crate::core::shader::{ShaderBytecode, ShaderStage, QUAD_HLSL};
use crate::error::{GpuError, GpuResult};
use crate::traits::{BackendFactory, GdiContext, GraphicsBackend};
use crate::types::{
    BlendDesc, BlendFactor, BufferDesc, BufferKind, BufferUsage, Extent, FontDesc, InputElement,
    Rect, Rgb, TextFormat, TextureDesc, Topology, Viewport,
};

const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_B8G8R8A8_UNORM;

/// Creates D3D11 devices on Win32 windows
#[derive(Debug, Clone, Default)]
pub struct D3d11Factory {
    /// Create the device with the debug layer and report live objects at shutdown
    pub debug_layer: bool,
    /// Load precompiled `.cso` objects from here instead of compiling at startup
    pub shader_dir: Option<PathBuf>,
}

impl D3d11Factory {
    pub fn new(debug_layer: bool, shader_dir: Option<PathBuf>) -> Self {
        Self {
            debug_layer,
            shader_dir,
        }
    }

    fn compile(stage: ShaderStage) -> GpuResult<ShaderBytecode> {
        let (entry_point, target) = match stage {
            ShaderStage::Vertex => (s!("vs_main"), s!("vs_4_0")),
            ShaderStage::Pixel => (s!("ps_main"), s!("ps_4_0")),
        };

        let mut code = None;
        let mut errors = None;

        let status = unsafe {
            D3DCompile(
                QUAD_HLSL.as_ptr() as *const c_void,
                QUAD_HLSL.len(),
                PCSTR::null(),
                None,
                None,
                entry_point,
                target,
                0,
                0,
                &mut code,
                Some(&mut errors),
            )
        };

        if let Err(err) = status {
            let message = errors
                .map(|blob| unsafe { blob_bytes(&blob) }.to_vec())
                .map(|bytes| String::from_utf8_lossy(&bytes).trim_end().to_string())
                .unwrap_or_else(|| err.to_string());
            return Err(GpuError::InvalidShader(format!(
                "{}: {}",
                stage.entry_point(),
                message
            )));
        }

        let code = code.ok_or_else(|| {
            GpuError::InvalidShader(format!("{}: compiler returned no code", stage.entry_point()))
        })?;
        let bytes = unsafe { blob_bytes(&code) }.to_vec();
        debug!("Compiled {} ({} bytes)", stage.entry_point(), bytes.len());
        ShaderBytecode::from_bytes(bytes)
    }
}

unsafe fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
}

impl BackendFactory for D3d11Factory {
    type Backend = D3d11Backend;

    fn create(&self, window: RawWindowHandle) -> GpuResult<D3d11Backend> {
        let hwnd = match window {
            RawWindowHandle::Win32(handle) => HWND(handle.hwnd.get() as *mut c_void),
            other => {
                return Err(GpuError::DeviceCreation(format!(
                    "unsupported window handle {:?}",
                    other
                )));
            }
        };

        // Zero extents take the size of the window's client area
        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Format: BACK_BUFFER_FORMAT,
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 1,
            OutputWindow: hwnd,
            Windowed: TRUE,
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: DXGI_SWAP_CHAIN_FLAG_GDI_COMPATIBLE.0 as u32,
        };

        let mut flags = D3D11_CREATE_DEVICE_SINGLETHREADED | D3D11_CREATE_DEVICE_BGRA_SUPPORT;
        if self.debug_layer {
            flags |= D3D11_CREATE_DEVICE_DEBUG;
        }

        let mut swap_chain = None;
        let mut device = None;
        let mut context = None;

        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                flags,
                None,
                D3D11_SDK_VERSION,
                Some(&swap_chain_desc),
                Some(&mut swap_chain),
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let missing = || GpuError::DeviceCreation("driver returned no object".to_string());
        let backend = D3d11Backend {
            swap_chain: swap_chain.ok_or_else(missing)?,
            context: context.ok_or_else(missing)?,
            device: device.ok_or_else(missing)?,
            debug_layer: self.debug_layer,
        };

        info!(
            "D3D11 device created{}",
            if self.debug_layer { " with debug layer" } else { "" }
        );
        Ok(backend)
    }

    fn shader(&self, stage: ShaderStage) -> GpuResult<ShaderBytecode> {
        match &self.shader_dir {
            Some(dir) => ShaderBytecode::load(dir, stage),
            None => Self::compile(stage),
        }
    }
}

/// A GDI font handle, deleted on drop
pub struct GdiFont(HFONT);

impl Drop for GdiFont {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteObject(self.0);
        }
    }
}

/// Device context acquired from the back-buffer surface
pub struct GdiDc {
    hdc: HDC,
}

impl GdiContext for GdiDc {
    type Font = GdiFont;

    fn set_transparent_background(&mut self) {
        unsafe {
            SetBkMode(self.hdc, TRANSPARENT);
        }
    }

    fn select_font(&mut self, font: &GdiFont) {
        unsafe {
            SelectObject(self.hdc, font.0);
        }
    }

    fn set_text_color(&mut self, color: Rgb) {
        unsafe {
            SetTextColor(self.hdc, COLORREF(color.to_colorref()));
        }
    }

    fn draw_text(&mut self, text: &str, area: Rect, format: TextFormat) {
        let mut utf16: Vec<u16> = text.encode_utf16().collect();
        let mut rect = RECT {
            left: area.left,
            top: area.top,
            right: area.right,
            bottom: area.bottom,
        };

        let mut flags = DRAW_TEXT_FORMAT(0);
        if format.word_break {
            flags |= DT_WORDBREAK;
        }
        if format.no_prefix {
            flags |= DT_NOPREFIX;
        }
        if format.edit_control {
            flags |= DT_EDITCONTROL;
        }
        if format.no_full_width_char_break {
            flags |= DT_NOFULLWIDTHCHARBREAK;
        }

        unsafe {
            DrawTextW(self.hdc, &mut utf16, &mut rect, flags);
        }
    }
}

fn blend_factor(factor: BlendFactor) -> D3D11_BLEND {
    match factor {
        BlendFactor::Zero => D3D11_BLEND_ZERO,
        BlendFactor::One => D3D11_BLEND_ONE,
        BlendFactor::SrcAlpha => D3D11_BLEND_SRC_ALPHA,
        BlendFactor::InvSrcAlpha => D3D11_BLEND_INV_SRC_ALPHA,
    }
}

pub struct D3d11Backend {
    swap_chain: IDXGISwapChain,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
    debug_layer: bool,
}

impl GraphicsBackend for D3d11Backend {
    type Buffer = ID3D11Buffer;
    type Texture = ID3D11Texture2D;
    type ShaderView = ID3D11ShaderResourceView;
    type TargetView = ID3D11RenderTargetView;
    type BackBuffer = ID3D11Texture2D;
    type InputLayout = ID3D11InputLayout;
    type VertexShader = ID3D11VertexShader;
    type PixelShader = ID3D11PixelShader;
    type BlendState = ID3D11BlendState;
    type Font = GdiFont;
    type Gdi = GdiDc;

    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_shader: &ShaderBytecode,
    ) -> GpuResult<ID3D11InputLayout> {
        let names = elements
            .iter()
            .map(|element| CString::new(element.semantic))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| GpuError::resource("input layout", e))?;

        let descs: Vec<D3D11_INPUT_ELEMENT_DESC> = elements
            .iter()
            .zip(&names)
            .map(|(element, name)| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(name.as_ptr() as *const u8),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32_FLOAT,
                InputSlot: element.stream,
                AlignedByteOffset: 0,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();

        let mut layout = None;
        unsafe {
            self.device
                .CreateInputLayout(&descs, vertex_shader.as_bytes(), Some(&mut layout))
        }
        .map_err(|e| GpuError::resource("input layout", e))?;
        layout.ok_or_else(|| GpuError::resource("input layout", "no object returned"))
    }

    fn create_vertex_shader(&mut self, bytecode: &ShaderBytecode) -> GpuResult<ID3D11VertexShader> {
        let mut shader = None;
        unsafe {
            self.device
                .CreateVertexShader(bytecode.as_bytes(), None, Some(&mut shader))
        }
        .map_err(|e| GpuError::resource("vertex shader", e))?;
        shader.ok_or_else(|| GpuError::resource("vertex shader", "no object returned"))
    }

    fn create_pixel_shader(&mut self, bytecode: &ShaderBytecode) -> GpuResult<ID3D11PixelShader> {
        let mut shader = None;
        unsafe {
            self.device
                .CreatePixelShader(bytecode.as_bytes(), None, Some(&mut shader))
        }
        .map_err(|e| GpuError::resource("pixel shader", e))?;
        shader.ok_or_else(|| GpuError::resource("pixel shader", "no object returned"))
    }

    fn create_blend_state(&mut self, blend: &BlendDesc) -> GpuResult<ID3D11BlendState> {
        let mut desc = D3D11_BLEND_DESC {
            AlphaToCoverageEnable: FALSE,
            IndependentBlendEnable: FALSE,
            ..Default::default()
        };
        desc.RenderTarget[0] = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: TRUE,
            SrcBlend: blend_factor(blend.src_color),
            DestBlend: blend_factor(blend.dst_color),
            BlendOp: D3D11_BLEND_OP_ADD,
            SrcBlendAlpha: blend_factor(blend.src_alpha),
            DestBlendAlpha: blend_factor(blend.dst_alpha),
            BlendOpAlpha: D3D11_BLEND_OP_ADD,
            RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
        };

        let mut state = None;
        unsafe { self.device.CreateBlendState(&desc, Some(&mut state)) }
            .map_err(|e| GpuError::resource("blend state", e))?;
        state.ok_or_else(|| GpuError::resource("blend state", "no object returned"))
    }

    fn create_buffer(
        &mut self,
        desc: &BufferDesc,
        contents: Option<&[u8]>,
    ) -> GpuResult<ID3D11Buffer> {
        let (usage, cpu_access) = match desc.usage {
            BufferUsage::Immutable => (D3D11_USAGE_IMMUTABLE, 0),
            BufferUsage::Dynamic => (D3D11_USAGE_DYNAMIC, D3D11_CPU_ACCESS_WRITE.0 as u32),
        };
        let bind = match desc.kind {
            BufferKind::Vertex => D3D11_BIND_VERTEX_BUFFER,
            BufferKind::Constant => D3D11_BIND_CONSTANT_BUFFER,
        };

        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: desc.size,
            Usage: usage,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: cpu_access,
            MiscFlags: 0,
            StructureByteStride: 0,
        };

        let init = contents.map(|bytes| D3D11_SUBRESOURCE_DATA {
            pSysMem: bytes.as_ptr() as *const c_void,
            ..Default::default()
        });

        let mut buffer = None;
        unsafe {
            self.device.CreateBuffer(
                &buffer_desc,
                init.as_ref().map(|data| data as *const _),
                Some(&mut buffer),
            )
        }
        .map_err(|e| GpuError::resource("buffer", e))?;
        buffer.ok_or_else(|| GpuError::resource("buffer", "no object returned"))
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> GpuResult<ID3D11Texture2D> {
        let texture_desc = D3D11_TEXTURE2D_DESC {
            Width: desc.size.width,
            Height: desc.size.height,
            MipLevels: TextureDesc::MIP_LEVELS,
            ArraySize: TextureDesc::ARRAY_SIZE,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_IMMUTABLE,
            BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
            ..Default::default()
        };

        let init = D3D11_SUBRESOURCE_DATA {
            pSysMem: pixels.as_ptr() as *const c_void,
            SysMemPitch: desc.row_pitch(),
            ..Default::default()
        };

        let mut texture = None;
        unsafe {
            self.device
                .CreateTexture2D(&texture_desc, Some(&init), Some(&mut texture))
        }
        .map_err(|e| GpuError::resource("texture", e))?;
        texture.ok_or_else(|| GpuError::resource("texture", "no object returned"))
    }

    fn create_shader_view(&mut self, texture: &ID3D11Texture2D) -> GpuResult<ID3D11ShaderResourceView> {
        let mut view = None;
        unsafe {
            self.device
                .CreateShaderResourceView(texture, None, Some(&mut view))
        }
        .map_err(|e| GpuError::resource("shader resource view", e))?;
        view.ok_or_else(|| GpuError::resource("shader resource view", "no object returned"))
    }

    fn create_target_view(
        &mut self,
        back_buffer: &ID3D11Texture2D,
    ) -> GpuResult<ID3D11RenderTargetView> {
        let mut view = None;
        unsafe {
            self.device
                .CreateRenderTargetView(back_buffer, None, Some(&mut view))
        }
        .map_err(|e| GpuError::resource("render target view", e))?;
        view.ok_or_else(|| GpuError::resource("render target view", "no object returned"))
    }

    fn create_font(&mut self, desc: &FontDesc) -> GpuResult<GdiFont> {
        let mut logfont = LOGFONTW {
            lfHeight: desc.height,
            lfWeight: desc.weight,
            ..Default::default()
        };
        let face: Vec<u16> = desc.face.encode_utf16().collect();
        if face.len() >= logfont.lfFaceName.len() {
            return Err(GpuError::resource("font", format!("face name {:?} is too long", desc.face)));
        }
        logfont.lfFaceName[..face.len()].copy_from_slice(&face);

        let font = unsafe { CreateFontIndirectW(&logfont) };
        if font.is_invalid() {
            return Err(GpuError::resource("font", format!("no font matches {:?}", desc.face)));
        }
        Ok(GdiFont(font))
    }

    fn set_input_layout(&mut self, layout: &ID3D11InputLayout) {
        unsafe { self.context.IASetInputLayout(layout) }
    }

    fn set_vertex_shader(&mut self, shader: &ID3D11VertexShader) {
        unsafe { self.context.VSSetShader(shader, None) }
    }

    fn set_pixel_shader(&mut self, shader: &ID3D11PixelShader) {
        unsafe { self.context.PSSetShader(shader, None) }
    }

    fn set_topology(&mut self, topology: Topology) {
        let topology = match topology {
            Topology::TriangleStrip => D3D11_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        };
        unsafe { self.context.IASetPrimitiveTopology(topology) }
    }

    fn set_blend_state(&mut self, state: &ID3D11BlendState) {
        unsafe { self.context.OMSetBlendState(state, None, 0xFFFF_FFFF) }
    }

    fn set_vertex_buffer(&mut self, stream: u32, buffer: &ID3D11Buffer, stride: u32) {
        unsafe {
            self.context.IASetVertexBuffers(
                stream,
                1,
                Some(&Some(buffer.clone())),
                Some(&stride),
                Some(&0),
            );
        }
    }

    fn set_constant_buffers(&mut self, first_slot: u32, buffers: &[&ID3D11Buffer]) {
        let buffers: Vec<Option<ID3D11Buffer>> =
            buffers.iter().map(|buffer| Some((*buffer).clone())).collect();
        unsafe { self.context.VSSetConstantBuffers(first_slot, Some(buffers.as_slice())) }
    }

    fn set_shader_view(&mut self, slot: u32, view: &ID3D11ShaderResourceView) {
        unsafe {
            self.context
                .PSSetShaderResources(slot, Some(&[Some(view.clone())]));
        }
    }

    fn set_render_target(&mut self, view: &ID3D11RenderTargetView) {
        unsafe {
            self.context
                .OMSetRenderTargets(Some(&[Some(view.clone())]), None);
        }
    }

    fn unbind_render_target(&mut self) {
        unsafe { self.context.OMSetRenderTargets(None, None) }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        unsafe { self.context.RSSetViewports(Some(&[viewport])) }
    }

    fn write_discard(&mut self, buffer: &ID3D11Buffer, bytes: &[u8]) -> GpuResult<()> {
        let mut desc = D3D11_BUFFER_DESC::default();
        unsafe { buffer.GetDesc(&mut desc) };
        if bytes.len() > desc.ByteWidth as usize {
            return Err(GpuError::map(
                "buffer",
                format!("{} bytes into a {}-byte buffer", bytes.len(), desc.ByteWidth),
            ));
        }

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            self.context
                .Map(buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))
                .map_err(|e| GpuError::map("buffer", e))?;
            copy_nonoverlapping(bytes.as_ptr(), mapped.pData as *mut u8, bytes.len());
            self.context.Unmap(buffer, 0);
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        unsafe { self.context.Draw(vertex_count, first_vertex) }
    }

    fn clear_render_target(&mut self, view: &ID3D11RenderTargetView, rgba: [f32; 4]) {
        unsafe { self.context.ClearRenderTargetView(view, &rgba) }
    }

    fn resize_buffers(&mut self, size: Extent) -> GpuResult<()> {
        unsafe {
            self.swap_chain.ResizeBuffers(
                1,
                size.width,
                size.height,
                BACK_BUFFER_FORMAT,
                DXGI_SWAP_CHAIN_FLAG_GDI_COMPATIBLE,
            )
        }
        .map_err(|e| GpuError::Resize {
            width: size.width,
            height: size.height,
            reason: e.to_string(),
        })
    }

    fn back_buffer(&mut self) -> GpuResult<ID3D11Texture2D> {
        unsafe { self.swap_chain.GetBuffer::<ID3D11Texture2D>(0) }
            .map_err(|e| GpuError::Surface(format!("GetBuffer: {}", e)))
    }

    fn with_gdi(
        &mut self,
        back_buffer: &ID3D11Texture2D,
        draw: impl FnOnce(&mut Self::Gdi),
    ) -> GpuResult<()> {
        let surface: IDXGISurface1 = back_buffer
            .cast()
            .map_err(|e| GpuError::Surface(format!("IDXGISurface1: {}", e)))?;

        let hdc = unsafe { surface.GetDC(FALSE) }
            .map_err(|e| GpuError::Surface(format!("GetDC: {}", e)))?;

        let mut dc = GdiDc { hdc };
        draw(&mut dc);

        unsafe { surface.ReleaseDC(None) }
            .map_err(|e| GpuError::Surface(format!("ReleaseDC: {}", e)))
    }

    fn present(&mut self, sync_interval: u32) -> GpuResult<()> {
        unsafe { self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) }
            .ok()
            .map_err(|e| GpuError::Present(e.to_string()))
    }

    fn clear_state(&mut self) {
        unsafe { self.context.ClearState() }
    }

    fn shutdown(self) {
        let Self {
            swap_chain,
            context,
            device,
            debug_layer,
        } = self;

        drop(swap_chain);
        drop(context);

        // Anything still listed here besides the device itself has leaked
        if debug_layer {
            match device.cast::<ID3D11Debug>() {
                Ok(debug) => {
                    if let Err(e) = unsafe { debug.ReportLiveDeviceObjects(D3D11_RLDO_DETAIL) } {
                        warn!("ReportLiveDeviceObjects failed: {}", e);
                    }
                }
                Err(e) => warn!("Debug layer interface unavailable: {}", e),
            }
        }

        drop(device);
    }
}

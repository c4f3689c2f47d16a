use log::info;
use raw_window_handle::RawWindowHandle;

use crate::error::GpuResult;
use crate::traits::{BackendFactory, GraphicsBackend};

/// Owns the device, its immediate context and the swap chain
///
/// Created once per window and torn down once; every other resource borrows
/// the backend through this handle.
pub struct DeviceContext<B: GraphicsBackend> {
    backend: B,
}

impl<B: GraphicsBackend> DeviceContext<B> {
    /// Create a hardware device and a swap chain sized from the window
    pub fn initialize<F>(factory: &F, window: RawWindowHandle) -> GpuResult<Self>
    where
        F: BackendFactory<Backend = B>,
    {
        let backend = factory.create(window)?;
        info!("Device and swap chain created");
        Ok(Self { backend })
    }

    pub fn backend(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Unbind every pipeline stage so no bound object outlives its release
    pub fn clear_bindings(&mut self) {
        self.backend.clear_state();
    }

    /// Release swap chain, context and device; bindings must already be clear
    pub fn release(self) {
        self.backend.shutdown();
        info!("Device released");
    }
}

use thiserror::Error;

pub type GpuResult<T> = std::result::Result<T, GpuError>;

/// Whether a failure leaves the renderer able to continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// No object exists to continue with; the host must shut down
    Fatal,
    /// A status-only call failed; later frames may still succeed
    Recoverable,
}

/// Errors raised by the rendering core and its backends
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create device and swap chain: {0}")]
    DeviceCreation(String),

    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    #[error("failed to map {resource}: {reason}")]
    Map {
        resource: &'static str,
        reason: String,
    },

    #[error("failed to present swap chain: {0}")]
    Present(String),

    #[error("failed to resize swap chain buffers to {width}x{height}: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("failed to access back buffer surface: {0}")]
    Surface(String),

    #[error("invalid shader bytecode: {0}")]
    InvalidShader(String),

    #[error("texture payload is {actual} bytes, expected {expected} for {width}x{height} BGRA8")]
    InvalidTexture {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{operation} requested while the pipeline is {state}")]
    Lifecycle {
        operation: &'static str,
        state: &'static str,
    },
}

impl GpuError {
    pub fn resource(resource: &'static str, reason: impl ToString) -> Self {
        Self::ResourceCreation {
            resource,
            reason: reason.to_string(),
        }
    }

    pub fn map(resource: &'static str, reason: impl ToString) -> Self {
        Self::Map {
            resource,
            reason: reason.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::DeviceCreation(_)
            | Self::ResourceCreation { .. }
            | Self::Resize { .. }
            | Self::InvalidShader(_) => Severity::Fatal,
            Self::Map { .. }
            | Self::Present(_)
            | Self::Surface(_)
            | Self::InvalidTexture { .. }
            | Self::Lifecycle { .. } => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_failures_are_fatal() {
        assert!(GpuError::DeviceCreation("no adapter".into()).is_fatal());
        assert!(GpuError::resource("vertex buffer", "E_OUTOFMEMORY").is_fatal());
        assert!(GpuError::InvalidShader("bad magic".into()).is_fatal());
    }

    #[test]
    fn test_status_failures_are_recoverable() {
        assert_eq!(
            GpuError::Present("DXGI_ERROR_DEVICE_REMOVED".into()).severity(),
            Severity::Recoverable
        );
        assert_eq!(
            GpuError::map("constant buffer", "E_INVALIDARG").severity(),
            Severity::Recoverable
        );
    }

    #[test]
    fn test_messages_name_the_resource() {
        let err = GpuError::resource("shader resource view", "E_INVALIDARG");
        assert_eq!(
            err.to_string(),
            "failed to create shader resource view: E_INVALIDARG"
        );

        let err = GpuError::InvalidTexture {
            width: 2,
            height: 2,
            expected: 16,
            actual: 12,
        };
        assert!(err.to_string().contains("expected 16"));
    }
}

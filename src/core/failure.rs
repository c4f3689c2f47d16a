use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{GpuError, GpuResult, Severity};

/// How failures of status-only graphics calls are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Every failure propagates to the caller
    #[default]
    Strict,
    /// Recoverable failures are logged and discarded; fatal ones still propagate
    Lenient,
}

impl FailurePolicy {
    /// Apply the policy to the status of a call with no result value
    pub fn check(self, operation: &str, status: GpuResult<()>) -> GpuResult<()> {
        match status {
            Ok(()) => Ok(()),
            Err(err) if self == Self::Lenient && err.severity() == Severity::Recoverable => {
                warn!("Ignoring failed {}: {}", operation, err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn discards(self, err: &GpuError) -> bool {
        self == Self::Lenient && !err.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_propagates_recoverable() {
        let status = Err(GpuError::Present("DXGI_ERROR_INVALID_CALL".into()));
        assert!(FailurePolicy::Strict.check("present", status).is_err());
    }

    #[test]
    fn test_lenient_discards_recoverable() {
        let status = Err(GpuError::map("vertex buffer", "E_OUTOFMEMORY"));
        assert!(FailurePolicy::Lenient.check("map", status).is_ok());
    }

    #[test]
    fn test_lenient_keeps_fatal() {
        let status = Err(GpuError::Resize {
            width: 800,
            height: 600,
            reason: "E_INVALIDARG".into(),
        });
        let err = FailurePolicy::Lenient.check("resize", status).unwrap_err();
        assert!(err.is_fatal());
        assert!(!FailurePolicy::Lenient.discards(&err));
    }

    #[test]
    fn test_default_is_strict() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Strict);
    }

    #[test]
    fn test_deserializes_lowercase() {
        let policy: FailurePolicy = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(policy, FailurePolicy::Lenient);
    }
}

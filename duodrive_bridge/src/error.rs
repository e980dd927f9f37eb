//! Bridge error taxonomy.
//!
//! Only two classes exist: a missing or malformed argument at a hook
//! boundary, and a bus identity that resolves to neither axis. Both are
//! returned synchronously and never mutate per-axis state.

use duodrive_common::axis::NodeId;
use duodrive_common::od::OdStatus;
use thiserror::Error;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Which argument was missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// No entry context supplied with a hook call.
    MissingContext,
    /// No data buffer supplied with a hook call.
    MissingBuffer,
    /// Buffer narrower than the entry value.
    ShortBuffer {
        /// Entry width in bytes.
        expected: usize,
        /// Supplied buffer length.
        actual: usize,
    },
    /// Both axis slots configured with the same bus identity.
    DuplicateIdentity(NodeId),
}

impl std::fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContext => f.write_str("missing entry context"),
            Self::MissingBuffer => f.write_str("missing data buffer"),
            Self::ShortBuffer { expected, actual } => {
                write!(f, "buffer of {actual} bytes, entry needs {expected}")
            }
            Self::DuplicateIdentity(node) => write!(f, "identity {node} used for both axes"),
        }
    }
}

/// Errors returned by bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(InvalidArgument),

    /// The bus identity does not belong to either configured axis.
    #[error("unknown axis identity {0}")]
    UnknownAxis(NodeId),
}

impl BridgeError {
    /// Status code reported to the transport for this error.
    pub const fn status(&self) -> OdStatus {
        match self {
            Self::InvalidArgument(InvalidArgument::ShortBuffer { .. }) => OdStatus::TypeMismatch,
            Self::InvalidArgument(_) | Self::UnknownAxis(_) => OdStatus::DevIncompat,
        }
    }
}

impl From<InvalidArgument> for BridgeError {
    fn from(arg: InvalidArgument) -> Self {
        Self::InvalidArgument(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_axis_maps_to_dev_incompat() {
        let err = BridgeError::UnknownAxis(NodeId::new(0x0C));
        assert_eq!(err.status(), OdStatus::DevIncompat);
        assert!(err.to_string().contains("0x0C"));
    }

    #[test]
    fn short_buffer_maps_to_type_mismatch() {
        let err = BridgeError::from(InvalidArgument::ShortBuffer { expected: 2, actual: 1 });
        assert_eq!(err.status(), OdStatus::TypeMismatch);
        assert!(err.to_string().contains("1 bytes"));
    }

    #[test]
    fn missing_arguments_map_to_dev_incompat() {
        for arg in [InvalidArgument::MissingContext, InvalidArgument::MissingBuffer] {
            assert_eq!(BridgeError::from(arg).status(), OdStatus::DevIncompat);
        }
    }
}

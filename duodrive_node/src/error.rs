//! Node error types.

use duodrive_bridge::{BridgeError, StartupError};
use duodrive_common::config::ConfigError;
use thiserror::Error;

/// Error types for node operations.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bridge could not be constructed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Network parameters could not be written.
    #[error("Network start-up failed: {0}")]
    Startup(#[from] StartupError),

    /// No driver registered under the requested name.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver or core used before initialization, or initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Fieldbus communication failure.
    #[error("Fieldbus communication error: {0}")]
    Communication(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use duodrive_common::axis::NodeId;
    use duodrive_common::od::OdStatus;

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err = NodeError::from(BridgeError::UnknownAxis(NodeId::new(0x0C)));
        assert!(err.to_string().contains("0x0C"));

        let err = NodeError::from(StartupError::OdParameters {
            index: 0x1400,
            sub: 1,
            status: OdStatus::NoObject,
        });
        assert!(err.to_string().contains("1400h"));
    }

    #[test]
    fn driver_not_found_names_the_driver() {
        let err = NodeError::DriverNotFound("ethercat".to_string());
        assert_eq!(err.to_string(), "Driver not found: ethercat");
    }
}

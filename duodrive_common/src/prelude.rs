//! Prelude module for common re-exports.
//!
//! ```rust
//! use duodrive_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Axis Identity ──────────────────────────────────────────────────
pub use crate::axis::{AxisId, NodeId};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AxisConfig, BridgeConfig, ConfigError, ConfigLoader, LogLevel, NetworkConfig, SharedConfig,
};

// ─── Object Dictionary ──────────────────────────────────────────────
pub use crate::od::{DriveEntry, EntryContext, EventHandle, OdStatus, PdoMapping};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, NODE_ID_LEFT, NODE_ID_RIGHT};

/// Default velocity poll period as Duration.
pub const DEFAULT_VELOCITY_POLL: Duration =
    Duration::from_micros(crate::consts::DEFAULT_VELOCITY_POLL_US as u64);

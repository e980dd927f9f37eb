//! Workspace-wide constants.
//!
//! Single source of truth for the bus addresses, network defaults and paths
//! used by the bridge and the node host.

/// Number of axis slots served by one bridge.
pub const AXIS_COUNT: usize = 2;

/// Default bus address of the right drive.
pub const NODE_ID_RIGHT: u8 = 0x0A;

/// Default bus address of the left drive.
pub const NODE_ID_LEFT: u8 = 0x0B;

/// Highest valid CANopen node id.
pub const MAX_NODE_ID: u8 = 0x7F;

/// Largest 11-bit COB-ID.
pub const MAX_COB_ID: u32 = 0x7FF;

/// Default COB-ID base of the status/position frame received from a drive.
pub const DEFAULT_RPDO_COB_BASE: u32 = 0x380;

/// Default COB-ID base of the command frame sent to a drive.
pub const DEFAULT_TPDO_COB_BASE: u32 = 0x500;

/// Default SYNC communication cycle period (µs).
pub const DEFAULT_SYNC_PERIOD_US: u32 = 1_000_000;

/// Default SYNC COB-ID with the "producer" bit (bit 30) set.
pub const DEFAULT_SYNC_COB_ID: u32 = 0x4000_0080;

/// Manufacturer-specific, event-driven transmission type.
pub const DEFAULT_TRANSMISSION_TYPE: u8 = 0xFE;

/// Default TPDO inhibit time in multiples of 100 µs.
pub const DEFAULT_INHIBIT_TIME_100US: u16 = 1000;

/// Default TPDO event timer (ms, 0 = disabled).
pub const DEFAULT_EVENT_TIMER_MS: u16 = 0;

/// Default period of the supervisory velocity poll (µs).
pub const DEFAULT_VELOCITY_POLL_US: u32 = 10_000;

/// Dictionary offset between consecutive drive profiles (CiA 402 multi-axis layout).
pub const PROFILE_AXIS_STRIDE: u16 = 0x800;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/duodrive/bridge.toml";

/// Canonical service name (used for logging).
pub const BRIDGE_SERVICE_NAME: &str = "duodrive-bridge";

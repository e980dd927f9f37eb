//! Configuration loading traits and the bridge configuration.
//!
//! A bridge is described by one TOML file: shared service settings, the static
//! network parameters written at start-up, and exactly one record per axis
//! slot.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "duodrive-bridge"
//!
//! [network]
//! sync_period_us = 1000000
//! velocity_poll_us = 10000
//!
//! [[axes]]
//! axis = "right"
//! node_id = 0x0A
//! pdo_number = 0
//!
//! [[axes]]
//! axis = "left"
//! node_id = 0x0B
//! pdo_number = 1
//! profile_offset = 0x800
//! extensions = ["status_word", "control_word"]
//! ```

use crate::axis::{AxisId, NodeId};
use crate::consts::*;
use crate::od::DriveEntry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Every decoded frame and planned control word.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Rejected frames and recoverable problems.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common service fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: BRIDGE_SERVICE_NAME.to_string(),
        }
    }
}

// ─── Network ────────────────────────────────────────────────────────

fn default_sync_period_us() -> u32 {
    DEFAULT_SYNC_PERIOD_US
}

fn default_sync_cob_id() -> u32 {
    DEFAULT_SYNC_COB_ID
}

fn default_transmission_type() -> u8 {
    DEFAULT_TRANSMISSION_TYPE
}

fn default_inhibit_time() -> u16 {
    DEFAULT_INHIBIT_TIME_100US
}

fn default_event_timer() -> u16 {
    DEFAULT_EVENT_TIMER_MS
}

fn default_velocity_poll_us() -> u32 {
    DEFAULT_VELOCITY_POLL_US
}

/// Static network parameters written once during start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// SYNC communication cycle period (µs).
    #[serde(default = "default_sync_period_us")]
    pub sync_period_us: u32,

    /// SYNC COB-ID (bit 30 set = this node produces SYNC).
    #[serde(default = "default_sync_cob_id")]
    pub sync_cob_id: u32,

    /// Transmission type of the command frame.
    #[serde(default = "default_transmission_type")]
    pub transmission_type: u8,

    /// Inhibit time of the command frame (100 µs units).
    #[serde(default = "default_inhibit_time")]
    pub inhibit_time_100us: u16,

    /// Event timer of the command frame (ms, 0 = disabled).
    #[serde(default = "default_event_timer")]
    pub event_timer_ms: u16,

    /// Period of the supervisory velocity poll (µs).
    #[serde(default = "default_velocity_poll_us")]
    pub velocity_poll_us: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            sync_period_us: DEFAULT_SYNC_PERIOD_US,
            sync_cob_id: DEFAULT_SYNC_COB_ID,
            transmission_type: DEFAULT_TRANSMISSION_TYPE,
            inhibit_time_100us: DEFAULT_INHIBIT_TIME_100US,
            event_timer_ms: DEFAULT_EVENT_TIMER_MS,
            velocity_poll_us: DEFAULT_VELOCITY_POLL_US,
        }
    }
}

// ─── Axes ───────────────────────────────────────────────────────────

fn default_rpdo_cob_base() -> u32 {
    DEFAULT_RPDO_COB_BASE
}

fn default_tpdo_cob_base() -> u32 {
    DEFAULT_TPDO_COB_BASE
}

fn default_extensions() -> Vec<DriveEntry> {
    DriveEntry::ALL.to_vec()
}

/// Per-axis configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Slot this record configures.
    pub axis: AxisId,

    /// Bus address of the drive.
    pub node_id: NodeId,

    /// PDO parameter record number (0 → 1400h/1600h/1800h/1A00h).
    pub pdo_number: u8,

    /// Offset of this drive's profile entries in the dictionary.
    #[serde(default)]
    pub profile_offset: u16,

    /// COB-ID base of the frame received from the drive (node id is ORed in).
    #[serde(default = "default_rpdo_cob_base")]
    pub rpdo_cob_base: u32,

    /// COB-ID base of the frame sent to the drive (node id is ORed in).
    #[serde(default = "default_tpdo_cob_base")]
    pub tpdo_cob_base: u32,

    /// Entries that get a bridge extension attached.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<DriveEntry>,
}

impl AxisConfig {
    /// Default record for a slot, using the stock node ids.
    pub fn for_axis(axis: AxisId) -> Self {
        let (node, offset) = match axis {
            AxisId::Right => (NODE_ID_RIGHT, 0),
            AxisId::Left => (NODE_ID_LEFT, PROFILE_AXIS_STRIDE),
        };
        Self {
            axis,
            node_id: NodeId::new(node),
            pdo_number: axis.index() as u8,
            profile_offset: offset,
            rpdo_cob_base: DEFAULT_RPDO_COB_BASE,
            tpdo_cob_base: DEFAULT_TPDO_COB_BASE,
            extensions: default_extensions(),
        }
    }

    /// Whether an extension is configured for `entry`.
    #[inline]
    pub fn has_extension(&self, entry: DriveEntry) -> bool {
        self.extensions.contains(&entry)
    }

    /// COB-ID of the frame received from the drive.
    #[inline]
    pub fn rpdo_cob_id(&self) -> u32 {
        self.rpdo_cob_base | self.node_id.raw() as u32
    }

    /// COB-ID of the frame sent to the drive.
    #[inline]
    pub fn tpdo_cob_id(&self) -> u32 {
        self.tpdo_cob_base | self.node_id.raw() as u32
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.node_id.is_valid() {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: node_id {} outside 1..={}",
                self.axis, self.node_id, MAX_NODE_ID
            )));
        }
        if self.profile_offset % PROFILE_AXIS_STRIDE != 0 {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: profile_offset 0x{:X} is not a multiple of 0x{:X}",
                self.axis, self.profile_offset, PROFILE_AXIS_STRIDE
            )));
        }
        if DriveEntry::ALL
            .iter()
            .any(|e| e.checked_index(self.profile_offset).is_none())
        {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: profile_offset 0x{:X} moves drive entries past FFFFh",
                self.axis, self.profile_offset
            )));
        }
        for (name, cob) in [("rpdo", self.rpdo_cob_id()), ("tpdo", self.tpdo_cob_id())] {
            if cob > MAX_COB_ID {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: {name} COB-ID 0x{cob:X} exceeds 11 bits",
                    self.axis
                )));
            }
        }
        Ok(())
    }
}

// ─── Bridge ─────────────────────────────────────────────────────────

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Service settings.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Static network parameters.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Exactly one record per axis slot.
    pub axes: Vec<AxisConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            network: NetworkConfig::default(),
            axes: AxisId::ALL.iter().map(|&a| AxisConfig::for_axis(a)).collect(),
        }
    }
}

impl BridgeConfig {
    /// Record for a slot, if present.
    pub fn axis(&self, axis: AxisId) -> Option<&AxisConfig> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the bridge configuration.
    ///
    /// # Validation Rules
    /// 1. `service_name` not empty
    /// 2. `sync_period_us` > 0 and `velocity_poll_us` > 0
    /// 3. Exactly one record per axis slot
    /// 4. Node ids valid and distinct
    /// 5. PDO numbers and profile offsets distinct; offsets are whole
    ///    profile strides that keep every drive entry inside the dictionary
    /// 6. COB-IDs fit in 11 bits
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.network.sync_period_us == 0 {
            return Err(ConfigError::ValidationError(
                "sync_period_us must be greater than 0".to_string(),
            ));
        }
        if self.network.velocity_poll_us == 0 {
            return Err(ConfigError::ValidationError(
                "velocity_poll_us must be greater than 0".to_string(),
            ));
        }

        if self.axes.len() != AXIS_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "expected {AXIS_COUNT} axes, got {}",
                self.axes.len()
            )));
        }
        for slot in AxisId::ALL {
            if self.axis(slot).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "missing configuration for axis {slot}"
                )));
            }
        }

        for axis in &self.axes {
            axis.validate()?;
        }

        let (a, b) = (&self.axes[0], &self.axes[1]);
        if a.node_id == b.node_id {
            return Err(ConfigError::ValidationError(format!(
                "node_id {} assigned to both axes",
                a.node_id
            )));
        }
        if a.pdo_number == b.pdo_number {
            return Err(ConfigError::ValidationError(format!(
                "pdo_number {} assigned to both axes",
                a.pdo_number
            )));
        }
        if a.profile_offset == b.profile_offset {
            return Err(ConfigError::ValidationError(format!(
                "profile_offset 0x{:X} assigned to both axes",
                a.profile_offset
            )));
        }

        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_matches_stock_addresses() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());

        let right = config.axis(AxisId::Right).unwrap();
        assert_eq!(right.node_id, NodeId::new(0x0A));
        assert_eq!(right.rpdo_cob_id(), 0x38A);
        assert_eq!(right.tpdo_cob_id(), 0x50A);

        let left = config.axis(AxisId::Left).unwrap();
        assert_eq!(left.rpdo_cob_id(), 0x38B);
        assert_eq!(left.tpdo_cob_id(), 0x50B);
        assert_eq!(left.profile_offset, PROFILE_AXIS_STRIDE);
    }

    #[test]
    fn log_level_default_and_directive() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[1].node_id = config.axes[0].node_id;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("node_id")
        ));
    }

    #[test]
    fn same_slot_twice_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[1].axis = AxisId::Right;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_node_id_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[0].node_id = NodeId::new(0);
        assert!(config.validate().is_err());
        config.axes[0].node_id = NodeId::new(0x80);
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_cob_base_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[0].tpdo_cob_base = 0x800;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_periods_are_rejected() {
        let mut config = BridgeConfig::default();
        config.network.sync_period_us = 0;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.network.velocity_poll_us = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shared_profile_offset_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[1].profile_offset = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn profile_offset_past_dictionary_end_is_rejected() {
        let mut config = BridgeConfig::default();
        config.axes[1].profile_offset = 0xA000;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.axes[1].profile_offset = 0x9800;
        assert!(config.validate().is_ok());
        assert_eq!(DriveEntry::TargetVelocity.index(0x9800), 0xF8FF);
    }

    #[test]
    fn overlapping_profile_offsets_are_rejected() {
        let mut config = BridgeConfig::default();
        for offset in [1, 0x40, 0xBF, 0x7FF] {
            config.axes[1].profile_offset = offset;
            assert!(config.validate().is_err(), "offset 0x{offset:X} accepted");
        }
        config.axes[1].profile_offset = 0x1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn extensions_default_to_all_entries() {
        let config = BridgeConfig::from_toml(
            r#"
[[axes]]
axis = "right"
node_id = 0x0A
pdo_number = 0

[[axes]]
axis = "left"
node_id = 0x0B
pdo_number = 1
profile_offset = 0x800
extensions = ["status_word"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        let right = config.axis(AxisId::Right).unwrap();
        for entry in DriveEntry::ALL {
            assert!(right.has_extension(entry));
        }
        let left = config.axis(AxisId::Left).unwrap();
        assert!(left.has_extension(DriveEntry::StatusWord));
        assert!(!left.has_extension(DriveEntry::ControlWord));
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn unknown_axis_field_is_a_parse_error() {
        let result = BridgeConfig::from_toml(
            r#"
[[axes]]
axis = "right"
node_id = 10
pdo_number = 0
bogus = 1
"#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}

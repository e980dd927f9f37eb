//! duodrive common library
//!
//! Shared types and configuration loading for the duodrive workspace: the
//! two-slot axis identity, CANopen object dictionary addressing, hook status
//! codes and the TOML configuration of the dual-drive bridge.
//!
//! # Module Structure
//!
//! - [`axis`] - `AxisId` slots and bus `NodeId` tokens
//! - [`od`] - Object dictionary indices, entry widths, PDO mapping words, `OdStatus`
//! - [`config`] - Configuration loading traits and the bridge configuration
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use duodrive_common::prelude::*;
//!
//! let config = BridgeConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.axis(AxisId::Left).map(|a| a.node_id), Some(NodeId::new(0x0B)));
//! ```

pub mod axis;
pub mod config;
pub mod consts;
pub mod od;
pub mod prelude;

//! # Duodrive Node Library
//!
//! Hosts the drive bridge on a fieldbus driver and runs the cyclic loop.
//!
//! # Module Structure
//!
//! - [`core`] - NodeCore struct, cyclic loop management
//! - [`driver`] - `FieldbusDriver` trait
//! - [`drivers`] - Driver implementations and factory
//! - [`error`] - Node error type
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    duodrive_node                          │
//! │  ┌──────────────┐   hooks    ┌──────────────────────────┐ │
//! │  │ DriveBridge  │◄──────────►│  FieldbusDriver          │ │
//! │  │ (Arc)        │   events   │  (dictionary + bus)      │ │
//! │  └──────▲───────┘            └────────────▲─────────────┘ │
//! │         │                                 │               │
//! │         └────────────┬────────────────────┘               │
//! │                ┌─────┴──────┐                             │
//! │                │  NodeCore  │ (cyclic loop, velocity poll)│
//! │                └────────────┘                             │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod core;
pub mod driver;
pub mod drivers;
pub mod error;

pub use crate::core::{LoopStats, NodeCore};
pub use driver::{CycleReport, FieldbusDriver};
pub use error::NodeError;

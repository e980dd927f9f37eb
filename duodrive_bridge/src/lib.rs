//! # duodrive Bridge Library
//!
//! Coordinates two CiA 402 drives behind one CANopen object dictionary.
//! The transport calls into the bridge from its receive and frame-assembly
//! callbacks; a periodic supervisory task polls the velocity detector.
//!
//! ## Components
//!
//! 1. **AxisRegistry** ([`registry`]) - bus identity → axis slot
//! 2. **StatusDecoder** ([`status`]) - statusword → lifecycle state, stored per axis
//! 3. **ControlWordPlanner** ([`planner`]) - stored status → next controlword
//! 4. **VelocityChangeDetector** ([`velocity`]) - gates event-driven transmission
//! 5. **PositionRelay** ([`DriveBridge::relay`]) - forwards position feedback to the sink
//!
//! [`DriveBridge`] owns the two axis slots and exposes the operations;
//! [`hooks`] adapts them to the dictionary read/write extension interface,
//! [`startup`] writes the static network parameters.
//!
//! ## Zero-Allocation Hot Path
//!
//! Per-axis state is a fixed two-slot arena of atomics allocated at
//! construction. Decode, plan, relay and check never allocate or block and
//! may be called concurrently from the receive path and the periodic task.

#![deny(missing_docs)]

pub mod bridge;
pub mod error;
pub mod hooks;
pub mod planner;
pub mod registry;
pub mod sink;
pub mod startup;
pub mod status;
pub mod velocity;

pub use crate::bridge::DriveBridge;
pub use crate::error::{BridgeError, InvalidArgument};
pub use crate::hooks::OdExtension;
pub use crate::planner::ControlWord;
pub use crate::registry::AxisRegistry;
pub use crate::sink::{BridgeEvent, EventSink, NullSink, TracingSink};
pub use crate::startup::{OdConfigurator, StartupError, configure_network};
pub use crate::status::{DriveLifecycleState, DriveStatus};
pub use crate::velocity::EventTrigger;

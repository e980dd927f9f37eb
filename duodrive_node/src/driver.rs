//! Fieldbus driver trait.
//!
//! A driver owns the object dictionary and the bus. The node core hands it
//! the bridge as an [`OdExtension`] every cycle; the driver calls the
//! extension whenever a hooked entry is written from a received frame or
//! read to assemble an outgoing one.
//!
//! # Lifecycle
//!
//! 1. `init()` - build the dictionary for the configured axes
//! 2. `configurator()` - start-up parameters are written through it
//! 3. `cycle()` - called every loop period; `write_object()` and
//!    `velocity_command()` may be used between cycles
//! 4. `shutdown()` - called once when the node stops

use duodrive_bridge::{EventTrigger, OdConfigurator, OdExtension};
use duodrive_common::axis::AxisId;
use duodrive_common::config::BridgeConfig;
use std::time::Duration;

use crate::error::NodeError;

/// Frame traffic of one driver cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// A SYNC was produced this cycle.
    pub sync: bool,
    /// Frames received and dispatched to the dictionary.
    pub received: usize,
    /// Frames assembled and sent.
    pub transmitted: usize,
}

/// Interface for pluggable fieldbus drivers.
///
/// The `EventTrigger` supertrait is how the bridge requests an out-of-cycle
/// transmission; requests made between cycles are served by the next
/// `cycle()` call.
pub trait FieldbusDriver: EventTrigger + Send {
    /// Driver identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Driver version.
    fn version(&self) -> &'static str;

    /// Prepare the dictionary and bus for the configured axes.
    ///
    /// # Errors
    /// `NodeError::InitFailed` if the driver cannot serve the configuration.
    fn init(&mut self, config: &BridgeConfig) -> Result<(), NodeError>;

    /// Typed setters of the driver's dictionary.
    fn configurator(&mut self) -> &mut dyn OdConfigurator;

    /// Run one cycle: receive, dispatch and transmit frames due within `dt`.
    ///
    /// # Errors
    /// `NodeError::InitFailed` if called before `init()`.
    fn cycle(&mut self, extension: &dyn OdExtension, dt: Duration) -> Result<CycleReport, NodeError>;

    /// Write an object as a remote client would (expedited SDO download).
    ///
    /// # Errors
    /// `NodeError::Communication` if the dictionary rejects the write.
    fn write_object(&mut self, index: u16, sub: u8, data: &[u8]) -> Result<(), NodeError>;

    /// Velocity currently held for `axis` in the velocity command entry.
    fn velocity_command(&self, axis: AxisId) -> Option<i32>;

    /// Release the bus.
    fn shutdown(&mut self) -> Result<(), NodeError>;
}

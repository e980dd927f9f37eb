//! Simulation driver module.
//!
//! Software stand-in for a CANopen master with two velocity drives on the
//! bus, for development and testing without hardware.

mod dictionary;
mod drive;
mod driver;
mod frame;

pub use dictionary::SimulatedDictionary;
pub use drive::SimulatedDrive;
pub use driver::SimulationDriver;
pub use frame::Frame;

use crate::driver::FieldbusDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn FieldbusDriver> {
    Box::new(SimulationDriver::new())
}

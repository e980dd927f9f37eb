//! Fieldbus driver implementations.
//!
//! - [`simulation`] - In-memory bus, dictionary and drives

pub mod simulation;

use crate::driver::FieldbusDriver;
use crate::error::NodeError;

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn FieldbusDriver>;

/// Built-in drivers by name.
const DRIVERS: &[(&str, DriverFactory)] = &[("simulation", simulation::create_driver)];

/// Names of the built-in drivers.
pub fn driver_names() -> impl Iterator<Item = &'static str> {
    DRIVERS.iter().map(|(name, _)| *name)
}

/// Create a driver instance by name.
///
/// # Errors
/// `NodeError::DriverNotFound` if no driver is registered under `name`.
pub fn create_driver(name: &str) -> Result<Box<dyn FieldbusDriver>, NodeError> {
    DRIVERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, factory)| factory())
        .ok_or_else(|| NodeError::DriverNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_driver_is_built_in() {
        let driver = create_driver("simulation").unwrap();
        assert_eq!(driver.name(), "simulation");
        assert!(driver_names().any(|n| n == "simulation"));
    }

    #[test]
    fn unknown_driver_is_reported() {
        assert!(matches!(
            create_driver("ethercat"),
            Err(NodeError::DriverNotFound(name)) if name == "ethercat"
        ));
    }
}

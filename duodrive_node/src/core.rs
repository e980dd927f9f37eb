//! Node core and cyclic loop management.
//!
//! `NodeCore` owns the bridge and the fieldbus driver. Each cycle runs the
//! driver (frames in, hooks, frames out), copies the velocity command entry
//! (2000h) into the bridge and then runs the supervisory velocity poll,
//! which may queue event transmissions for the next cycle.

use duodrive_bridge::{DriveBridge, DriveLifecycleState, TracingSink, configure_network};
use duodrive_common::axis::AxisId;
use duodrive_common::config::BridgeConfig;
use duodrive_common::consts::AXIS_COUNT;
use duodrive_common::od::{IDX_VELOCITY_COMMAND, velocity_command_sub};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::driver::{CycleReport, FieldbusDriver};
use crate::drivers::create_driver;
use crate::error::NodeError;

/// Loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Number of cycles executed
    pub cycles: u64,
    /// SYNC periods elapsed
    pub syncs: u64,
    /// Frames received
    pub frames_received: u64,
    /// Frames transmitted
    pub frames_transmitted: u64,
    /// Event transmissions requested by the velocity poll
    pub velocity_events: u64,
    /// Cycles that overran the cycle time
    pub timing_violations: u64,
}

/// Node core: bridge, driver and loop.
pub struct NodeCore {
    config: BridgeConfig,
    bridge: Arc<DriveBridge>,
    driver: Option<Box<dyn FieldbusDriver>>,
    /// Running flag for loop control
    running: Arc<AtomicBool>,
    cycle_time: Duration,
    /// Velocities to command once both drives are enabled.
    target_velocities: Option<[i32; AXIS_COUNT]>,
    stats: LoopStats,
}

impl NodeCore {
    /// Create a node from a configuration.
    ///
    /// # Errors
    /// Returns error if the configuration fails validation.
    pub fn new(config: BridgeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let bridge = Arc::new(DriveBridge::from_config(&config, TracingSink)?);
        let cycle_time = Duration::from_micros(config.network.velocity_poll_us as u64);

        info!(
            "NodeCore created: right={}, left={}, cycle_time={}us",
            bridge.registry().node_id(AxisId::Right),
            bridge.registry().node_id(AxisId::Left),
            cycle_time.as_micros()
        );

        Ok(Self {
            config,
            bridge,
            driver: None,
            running: Arc::new(AtomicBool::new(false)),
            cycle_time,
            target_velocities: None,
            stats: LoopStats::default(),
        })
    }

    /// Load, validate and create a node from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, NodeError> {
        info!("Loading configuration from {:?}", path);
        Self::new(BridgeConfig::load_validated(path)?)
    }

    /// Create the named driver and initialize it.
    pub fn init(&mut self, driver_name: &str) -> Result<(), NodeError> {
        let driver = create_driver(driver_name)?;
        self.init_with(driver)
    }

    /// Initialize with a driver instance and write the network configuration.
    pub fn init_with(&mut self, mut driver: Box<dyn FieldbusDriver>) -> Result<(), NodeError> {
        info!("Initializing NodeCore with driver {} v{}", driver.name(), driver.version());
        driver.init(&self.config)?;
        configure_network(driver.configurator(), &self.config)?;
        self.driver = Some(driver);
        info!("NodeCore initialized successfully");
        Ok(())
    }

    /// Command these velocities once both drives report operation enabled.
    pub fn set_target_velocities(&mut self, right: i32, left: i32) {
        self.target_velocities = Some([right, left]);
    }

    /// Run one cycle of `dt`.
    ///
    /// # Errors
    /// `NodeError::InitFailed` before `init()`, or the driver's cycle error.
    pub fn step(&mut self, dt: Duration) -> Result<CycleReport, NodeError> {
        let driver = self
            .driver
            .as_mut()
            .ok_or_else(|| NodeError::InitFailed("driver not initialized".to_string()))?;

        let report = driver.cycle(&*self.bridge, dt)?;

        if let Some(targets) = self.target_velocities {
            let enabled = AxisId::ALL
                .iter()
                .all(|&a| self.bridge.lifecycle(a) == DriveLifecycleState::OperationEnabled);
            if enabled {
                for axis in AxisId::ALL {
                    let velocity = targets[axis.index()];
                    driver.write_object(
                        IDX_VELOCITY_COMMAND,
                        velocity_command_sub(axis),
                        &velocity.to_le_bytes(),
                    )?;
                }
                info!(right = targets[0], left = targets[1], "both drives enabled, velocities commanded");
                self.target_velocities = None;
            }
        }

        // The velocity command entry is the single source of commanded values.
        for axis in AxisId::ALL {
            if let Some(velocity) = driver.velocity_command(axis) {
                self.bridge.set_commanded_velocity(axis, velocity);
            }
        }

        let changed = self.bridge.poll_velocities(&**driver);

        self.stats.cycles += 1;
        self.stats.syncs += report.sync as u64;
        self.stats.frames_received += report.received as u64;
        self.stats.frames_transmitted += report.transmitted as u64;
        self.stats.velocity_events += changed.len() as u64;
        Ok(report)
    }

    /// Run the cyclic loop until the running flag is cleared or `max_cycles`
    /// cycles have run.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<(), NodeError> {
        info!("Starting NodeCore loop (cycle_time={}us)...", self.cycle_time.as_micros());
        self.running.store(true, Ordering::SeqCst);

        let mut last_cycle = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                info!("Cycle limit reached");
                break;
            }

            let cycle_start = Instant::now();
            let dt = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            self.step(dt)?;

            let elapsed = cycle_start.elapsed();
            if elapsed > self.cycle_time {
                self.stats.timing_violations += 1;
                if self.stats.timing_violations <= 10 || self.stats.timing_violations % 1000 == 0 {
                    warn!(
                        "Timing violation #{}: cycle took {}us (target {}us)",
                        self.stats.timing_violations,
                        elapsed.as_micros(),
                        self.cycle_time.as_micros()
                    );
                }
            } else {
                std::thread::sleep(self.cycle_time - elapsed);
            }

            if self.stats.cycles % 1000 == 0 {
                debug!(
                    "Loop: {} cycles, {} syncs, rx={}, tx={}, velocity events={}",
                    self.stats.cycles,
                    self.stats.syncs,
                    self.stats.frames_received,
                    self.stats.frames_transmitted,
                    self.stats.velocity_events
                );
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "NodeCore loop stopped after {} cycles (violations: {})",
            self.stats.cycles, self.stats.timing_violations
        );
        Ok(())
    }

    /// Write a dictionary object through the driver, as a remote client would.
    ///
    /// # Errors
    /// `NodeError::InitFailed` before `init()`, or the driver's write error.
    pub fn write_object(&mut self, index: u16, sub: u8, data: &[u8]) -> Result<(), NodeError> {
        self.driver
            .as_mut()
            .ok_or_else(|| NodeError::InitFailed("driver not initialized".to_string()))?
            .write_object(index, sub, data)
    }

    /// Stop the loop and release the driver.
    pub fn shutdown(&mut self) -> Result<(), NodeError> {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        if let Some(driver) = self.driver.as_mut() {
            driver.shutdown()?;
        }
        Ok(())
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Shared handle to the bridge.
    pub fn bridge(&self) -> &Arc<DriveBridge> {
        &self.bridge
    }

    /// Loaded configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Loop counters.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }
}

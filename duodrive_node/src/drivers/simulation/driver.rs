//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements [`FieldbusDriver`] with an in-memory
//! dictionary and one simulated drive per configured axis. Frames are routed
//! by COB-ID and packed/unpacked through the PDO mapping records written at
//! start-up, so a wrong start-up configuration shows up as a drive that
//! never moves.
//!
//! Timing: every SYNC period each drive sends its feedback frame and every
//! command frame is sent. An event request sends the command frame carrying
//! the requested entry between SYNCs, no sooner than its inhibit time after
//! the previous transmission.

use super::dictionary::SimulatedDictionary;
use super::drive::SimulatedDrive;
use super::frame::Frame;
use crate::driver::{CycleReport, FieldbusDriver};
use crate::error::NodeError;
use duodrive_bridge::{EventTrigger, OdConfigurator, OdExtension};
use duodrive_common::axis::AxisId;
use duodrive_common::config::BridgeConfig;
use duodrive_common::consts::MAX_COB_ID;
use duodrive_common::od::{
    EventHandle, IDX_COMM_CYCLE_PERIOD, IDX_RPDO_COMM_BASE, IDX_RPDO_MAP_BASE, IDX_SYNC_COB_ID,
    IDX_TPDO_COMM_BASE, IDX_TPDO_MAP_BASE, IDX_VELOCITY_COMMAND, pdo_sub, velocity_command_sub,
};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// SYNC COB-ID bit 30: this node produces SYNC.
const SYNC_PRODUCER: u32 = 1 << 30;

/// One configured axis: its drive and PDO record number.
#[derive(Debug)]
struct SimAxis {
    axis: AxisId,
    pdo_number: u16,
    drive: SimulatedDrive,
    /// Time since the command frame was last sent.
    since_tx: Duration,
}

/// Simulation driver implementing the FieldbusDriver trait.
#[derive(Debug)]
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Initialized flag
    initialized: bool,
    dictionary: SimulatedDictionary,
    axes: Vec<SimAxis>,
    /// Transmission requests not served yet.
    pending: Mutex<Vec<EventHandle>>,
    since_sync: Duration,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            initialized: false,
            dictionary: SimulatedDictionary::default(),
            axes: Vec::new(),
            pending: Mutex::new(Vec::new()),
            since_sync: Duration::ZERO,
        }
    }

    /// The simulated dictionary.
    pub fn dictionary(&self) -> &SimulatedDictionary {
        &self.dictionary
    }

    /// Simulated drive of `axis`, once initialized.
    pub fn drive(&self, axis: AxisId) -> Option<&SimulatedDrive> {
        self.axes.iter().find(|a| a.axis == axis).map(|a| &a.drive)
    }

    /// Number of transmission requests waiting for the next cycle.
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }

    fn sync_period(&self) -> Option<Duration> {
        let cob = self.dictionary.get(IDX_SYNC_COB_ID, 0)?;
        let period = self.dictionary.get(IDX_COMM_CYCLE_PERIOD, 0)?;
        (cob & SYNC_PRODUCER != 0 && period > 0).then(|| Duration::from_micros(period as u64))
    }

    fn inhibit_time(&self, pdo: u16) -> Duration {
        let units = self
            .dictionary
            .get(IDX_TPDO_COMM_BASE + pdo, pdo_sub::INHIBIT_TIME)
            .unwrap_or(0);
        Duration::from_micros(units as u64 * 100)
    }

    fn maps_entry(&self, pdo: u16, handle: EventHandle) -> bool {
        self.dictionary
            .mappings(IDX_TPDO_MAP_BASE + pdo)
            .iter()
            .any(|m| m.index == handle.index)
    }

    fn cob_id(&self, comm: u16) -> Option<u16> {
        self.dictionary
            .get(comm, pdo_sub::COB_ID)
            .map(|cob| (cob & MAX_COB_ID) as u16)
    }

    /// Dispatch a received frame through the matching receive mapping.
    fn receive(&mut self, extension: &dyn OdExtension, frame: &Frame) -> bool {
        let Some(pdo) = self
            .axes
            .iter()
            .map(|a| a.pdo_number)
            .find(|&n| self.cob_id(IDX_RPDO_COMM_BASE + n) == Some(frame.cob_id))
        else {
            trace!(%frame, "no receive PDO for frame");
            return false;
        };

        let mut offset = 0;
        for m in self.dictionary.mappings(IDX_RPDO_MAP_BASE + pdo) {
            let len = m.bits as usize / 8;
            let Some(bytes) = frame.data().get(offset..offset + len) else {
                warn!(%frame, index = format_args!("{:04X}h", m.index), "frame shorter than mapping");
                break;
            };
            offset += len;

            if let Err(status) = self.dictionary.write_bytes(m.index, m.sub, bytes) {
                warn!(index = format_args!("{:04X}h", m.index), %status, "mapped object not writable");
                continue;
            }
            if let Some(ctx) = self.dictionary.extension(m.index) {
                let status = extension.on_write(Some(&ctx), Some(bytes));
                if !status.is_ok() {
                    warn!(index = format_args!("{:04X}h", m.index), %status, "write extension failed");
                }
            }
        }
        true
    }

    /// Assemble the command frame of transmit PDO `pdo`.
    fn assemble(&mut self, extension: &dyn OdExtension, pdo: u16) -> Frame {
        let mut frame = Frame::new(self.cob_id(IDX_TPDO_COMM_BASE + pdo).unwrap_or(0));
        for m in self.dictionary.mappings(IDX_TPDO_MAP_BASE + pdo) {
            let Some((mut bytes, width)) = self.dictionary.read_bytes(m.index, m.sub) else {
                warn!(index = format_args!("{:04X}h", m.index), "mapped object missing");
                continue;
            };
            if let Some(ctx) = self.dictionary.extension(m.index) {
                let status = extension.on_read(Some(&ctx), Some(&mut bytes[..width]));
                if status.is_ok() {
                    if let Err(status) = self.dictionary.write_bytes(m.index, m.sub, &bytes[..width]) {
                        warn!(index = format_args!("{:04X}h", m.index), %status, "mapped object not writable");
                    }
                } else {
                    warn!(index = format_args!("{:04X}h", m.index), %status, "read extension failed");
                }
            }
            let len = (m.bits as usize / 8).min(width);
            if !frame.push(&bytes[..len]) {
                warn!(%frame, "mapping exceeds frame length");
                break;
            }
        }
        frame
    }

    fn transmit(&mut self, extension: &dyn OdExtension, slot: usize) {
        let pdo = self.axes[slot].pdo_number;
        let frame = self.assemble(extension, pdo);
        trace!(%frame, "tx");
        self.axes[slot].since_tx = Duration::ZERO;
        for axis in &mut self.axes {
            axis.drive.receive(&frame);
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTrigger for SimulationDriver {
    fn request_event_transmission(&self, handle: EventHandle, sub_index: u8) {
        trace!(index = format_args!("{:04X}h", handle.index), sub_index, "event requested");
        self.pending.lock().push(handle);
    }
}

impl FieldbusDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &BridgeConfig) -> Result<(), NodeError> {
        if config.axes.is_empty() {
            return Err(NodeError::InitFailed("no axes configured".to_string()));
        }
        info!("Initializing simulation driver with {} axes", config.axes.len());

        self.dictionary = SimulatedDictionary::for_config(config);
        self.axes = config
            .axes
            .iter()
            .map(|a| SimAxis {
                axis: a.axis,
                pdo_number: a.pdo_number as u16,
                drive: SimulatedDrive::new(a),
                since_tx: Duration::ZERO,
            })
            .collect();
        self.pending.lock().clear();
        self.since_sync = Duration::ZERO;
        self.initialized = true;
        Ok(())
    }

    fn configurator(&mut self) -> &mut dyn OdConfigurator {
        &mut self.dictionary
    }

    fn cycle(&mut self, extension: &dyn OdExtension, dt: Duration) -> Result<CycleReport, NodeError> {
        if !self.initialized {
            return Err(NodeError::InitFailed("simulation driver not initialized".to_string()));
        }
        let mut report = CycleReport::default();

        for axis in &mut self.axes {
            axis.drive.integrate(dt);
            axis.since_tx += dt;
        }

        if let Some(period) = self.sync_period() {
            self.since_sync += dt;
            if self.since_sync >= period {
                self.since_sync -= period;
                report.sync = true;
            }
        }

        if report.sync {
            let feedback: Vec<Frame> = self.axes.iter().map(|a| a.drive.feedback()).collect();
            for frame in &feedback {
                if self.receive(extension, frame) {
                    report.received += 1;
                }
            }
        }

        let requested = std::mem::take(&mut *self.pending.lock());
        let mut deferred = Vec::new();
        for slot in 0..self.axes.len() {
            let pdo = self.axes[slot].pdo_number;
            let wanted = requested.iter().any(|&h| self.maps_entry(pdo, h));
            let due = report.sync
                || (wanted && self.axes[slot].since_tx >= self.inhibit_time(pdo));
            if due {
                self.transmit(extension, slot);
                report.transmitted += 1;
            } else if wanted {
                deferred.extend(requested.iter().copied().filter(|&h| self.maps_entry(pdo, h)));
            }
        }
        if !deferred.is_empty() {
            debug!(count = deferred.len(), "event transmission inhibited");
            self.pending.lock().extend(deferred);
        }

        Ok(report)
    }

    fn write_object(&mut self, index: u16, sub: u8, data: &[u8]) -> Result<(), NodeError> {
        if !self.initialized {
            return Err(NodeError::InitFailed("simulation driver not initialized".to_string()));
        }
        self.dictionary.write_bytes(index, sub, data).map_err(|status| {
            NodeError::Communication(format!("SDO download {index:04X}h:{sub:02X} failed ({status})"))
        })?;
        debug!(index = format_args!("{index:04X}h"), sub, "SDO download");
        Ok(())
    }

    fn velocity_command(&self, axis: AxisId) -> Option<i32> {
        self.dictionary
            .get(IDX_VELOCITY_COMMAND, velocity_command_sub(axis))
            .map(|raw| raw as i32)
    }

    fn shutdown(&mut self) -> Result<(), NodeError> {
        info!("Simulation driver shutting down");
        self.pending.lock().clear();
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duodrive_bridge::{DriveBridge, NullSink, configure_network};
    use duodrive_bridge::DriveLifecycleState::*;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.network.sync_period_us = 1000;
        config.network.inhibit_time_100us = 5;
        config
    }

    fn setup() -> (SimulationDriver, DriveBridge<NullSink>) {
        let config = config();
        let mut driver = SimulationDriver::new();
        driver.init(&config).unwrap();
        configure_network(driver.configurator(), &config).unwrap();
        let bridge = DriveBridge::from_config(&config, NullSink).unwrap();
        (driver, bridge)
    }

    const SYNC: Duration = Duration::from_micros(1000);
    /// Less than a SYNC period, more than the inhibit time.
    const BETWEEN_SYNCS: Duration = Duration::from_micros(600);

    #[test]
    fn cycle_before_init_fails() {
        let mut driver = SimulationDriver::new();
        let bridge = DriveBridge::from_config(&config(), NullSink).unwrap();
        assert!(driver.cycle(&bridge, SYNC).is_err());
    }

    #[test]
    fn drives_reach_operation_enabled_over_sync_cycles() {
        let (mut driver, bridge) = setup();
        for _ in 0..4 {
            let report = driver.cycle(&bridge, SYNC).unwrap();
            assert!(report.sync);
            assert_eq!(report.received, 2);
            assert_eq!(report.transmitted, 2);
        }
        for axis in AxisId::ALL {
            assert_eq!(driver.drive(axis).unwrap().state(), OperationEnabled);
            assert_eq!(bridge.lifecycle(axis), OperationEnabled);
        }
    }

    #[test]
    fn no_traffic_between_syncs_without_requests() {
        let (mut driver, bridge) = setup();
        let report = driver.cycle(&bridge, Duration::from_micros(400)).unwrap();
        assert_eq!(report, CycleReport::default());
    }

    #[test]
    fn event_request_sends_only_the_owning_frame() {
        let (mut driver, bridge) = setup();
        for _ in 0..4 {
            driver.cycle(&bridge, SYNC).unwrap();
        }

        bridge.set_commanded_velocity(AxisId::Left, 800);
        assert_eq!(bridge.poll_velocities(&driver).len(), 1);
        assert_eq!(driver.pending_requests(), 1);

        let report = driver.cycle(&bridge, BETWEEN_SYNCS).unwrap();
        assert!(!report.sync);
        assert_eq!(report.transmitted, 1);
        assert_eq!(driver.drive(AxisId::Left).unwrap().target_velocity(), 800);
        assert_eq!(driver.drive(AxisId::Right).unwrap().target_velocity(), 0);
        assert_eq!(driver.pending_requests(), 0);
    }

    #[test]
    fn inhibit_time_defers_back_to_back_requests() {
        let (mut driver, bridge) = setup();
        for _ in 0..4 {
            driver.cycle(&bridge, SYNC).unwrap();
        }

        bridge.set_commanded_velocity(AxisId::Right, 10);
        bridge.poll_velocities(&driver);
        assert_eq!(driver.cycle(&bridge, BETWEEN_SYNCS).unwrap().transmitted, 1);

        bridge.set_commanded_velocity(AxisId::Right, 20);
        bridge.poll_velocities(&driver);
        // Inhibit is 500 µs; 10 µs later the request waits.
        assert_eq!(driver.cycle(&bridge, Duration::from_micros(10)).unwrap().transmitted, 0);
        assert_eq!(driver.pending_requests(), 1);
        assert_eq!(driver.drive(AxisId::Right).unwrap().target_velocity(), 10);

        let report = driver.cycle(&bridge, Duration::from_micros(500)).unwrap();
        assert_eq!(driver.drive(AxisId::Right).unwrap().target_velocity(), 20);
        assert!(report.transmitted >= 1);
        assert_eq!(driver.pending_requests(), 0);
    }

    #[test]
    fn position_feedback_reaches_dictionary() {
        let (mut driver, bridge) = setup();
        for _ in 0..4 {
            driver.cycle(&bridge, SYNC).unwrap();
        }
        bridge.set_commanded_velocity(AxisId::Right, 1_000_000);
        bridge.poll_velocities(&driver);
        driver.cycle(&bridge, BETWEEN_SYNCS).unwrap();
        assert!(driver.cycle(&bridge, SYNC).unwrap().sync);

        let position = driver.drive(AxisId::Right).unwrap().position();
        assert!(position > 0);
        // Feedback is sampled at the SYNC, after integration.
        assert_eq!(driver.dictionary().get(0x6064, 0), Some(position as u32));
    }

    #[test]
    fn velocity_command_entry_is_network_writable() {
        let (mut driver, _bridge) = setup();
        assert_eq!(driver.velocity_command(AxisId::Left), Some(0));

        driver.write_object(0x2000, 2, &(-700i32).to_le_bytes()).unwrap();
        assert_eq!(driver.velocity_command(AxisId::Left), Some(-700));
        assert_eq!(driver.velocity_command(AxisId::Right), Some(0));

        assert!(matches!(
            driver.write_object(0x2000, 3, &[0; 4]),
            Err(NodeError::Communication(_))
        ));
        assert!(matches!(
            driver.write_object(0x2000, 1, &[0; 2]),
            Err(NodeError::Communication(_))
        ));
    }

    #[test]
    fn write_object_before_init_fails() {
        let mut driver = SimulationDriver::new();
        assert!(matches!(
            driver.write_object(0x2000, 1, &[0; 4]),
            Err(NodeError::InitFailed(_))
        ));
        assert_eq!(driver.velocity_command(AxisId::Right), None);
    }

    #[test]
    fn unconfigured_network_never_syncs() {
        let config = config();
        let mut driver = SimulationDriver::new();
        driver.init(&config).unwrap();
        let bridge = DriveBridge::from_config(&config, NullSink).unwrap();
        for _ in 0..10 {
            assert!(!driver.cycle(&bridge, SYNC).unwrap().sync);
        }
        assert_eq!(driver.drive(AxisId::Right).unwrap().state(), SwitchOnDisabled);
    }
}

//! One-shot network configuration written before the bus goes operational.
//!
//! Sets up SYNC, then for each axis the frame received from the drive
//! (statusword + position actual) and the frame sent to it (controlword +
//! target velocity), and attaches the bridge extensions to the mapped
//! entries. The first failing setter aborts the sequence.

use duodrive_common::axis::AxisId;
use duodrive_common::config::{AxisConfig, BridgeConfig};
use duodrive_common::od::{
    DriveEntry, EntryContext, IDX_COMM_CYCLE_PERIOD, IDX_RPDO_COMM_BASE, IDX_RPDO_MAP_BASE,
    IDX_SYNC_COB_ID, IDX_TPDO_COMM_BASE, IDX_TPDO_MAP_BASE, OdStatus, pdo_sub,
};
use thiserror::Error;
use tracing::{debug, info};

/// Frame received from a drive.
const RPDO_ENTRIES: [DriveEntry; 2] = [DriveEntry::StatusWord, DriveEntry::PositionActual];
/// Frame sent to a drive.
const TPDO_ENTRIES: [DriveEntry; 2] = [DriveEntry::ControlWord, DriveEntry::TargetVelocity];

/// Typed dictionary setters used during start-up.
///
/// Each setter addresses `index:sub` and fails with the status the
/// dictionary reported.
pub trait OdConfigurator {
    /// Write an 8-bit value.
    fn set_u8(&mut self, index: u16, sub: u8, value: u8) -> Result<(), OdStatus>;
    /// Write a 16-bit value.
    fn set_u16(&mut self, index: u16, sub: u8, value: u16) -> Result<(), OdStatus>;
    /// Write a 32-bit value.
    fn set_u32(&mut self, index: u16, sub: u8, value: u32) -> Result<(), OdStatus>;
    /// Attach the bridge extension to the entry at `index`, with `ctx` handed
    /// back on every access.
    fn attach_extension(&mut self, index: u16, ctx: EntryContext) -> Result<(), OdStatus>;
}

/// Start-up failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartupError {
    /// A dictionary parameter could not be written.
    #[error("failed to set OD parameter {index:04X}h:{sub:02X} ({status})")]
    OdParameters {
        /// Index of the entry whose setter failed.
        index: u16,
        /// Sub-index of the failed write (0 for extension attachment).
        sub: u8,
        /// Status reported by the dictionary.
        status: OdStatus,
    },
}

impl StartupError {
    /// Dictionary index of the failing entry.
    pub const fn index(&self) -> u16 {
        match self {
            Self::OdParameters { index, .. } => *index,
        }
    }
}

fn at(index: u16, sub: u8) -> impl FnOnce(OdStatus) -> StartupError {
    move |status| StartupError::OdParameters { index, sub, status }
}

/// Write the complete network configuration for both axes.
///
/// # Errors
/// `StartupError::OdParameters` naming the first entry that failed.
pub fn configure_network<D: OdConfigurator + ?Sized>(
    od: &mut D,
    config: &BridgeConfig,
) -> Result<(), StartupError> {
    let net = &config.network;
    od.set_u32(IDX_COMM_CYCLE_PERIOD, 0, net.sync_period_us)
        .map_err(at(IDX_COMM_CYCLE_PERIOD, 0))?;
    od.set_u32(IDX_SYNC_COB_ID, 0, net.sync_cob_id)
        .map_err(at(IDX_SYNC_COB_ID, 0))?;
    info!(
        period_us = net.sync_period_us,
        cob_id = format_args!("0x{:08X}", net.sync_cob_id),
        "SYNC configured"
    );

    for axis in AxisId::ALL {
        if let Some(axis_config) = config.axis(axis) {
            configure_axis(od, config, axis_config)?;
        }
    }
    Ok(())
}

fn configure_axis<D: OdConfigurator + ?Sized>(
    od: &mut D,
    config: &BridgeConfig,
    axis: &AxisConfig,
) -> Result<(), StartupError> {
    let pdo = axis.pdo_number as u16;

    // Frame from the drive.
    let comm = IDX_RPDO_COMM_BASE + pdo;
    let map = IDX_RPDO_MAP_BASE + pdo;
    od.set_u32(comm, pdo_sub::COB_ID, axis.rpdo_cob_id())
        .map_err(at(comm, pdo_sub::COB_ID))?;
    write_mapping(od, map, &RPDO_ENTRIES, axis.profile_offset)?;
    attach(od, axis, &RPDO_ENTRIES)?;

    // Frame to the drive.
    let net = &config.network;
    let comm = IDX_TPDO_COMM_BASE + pdo;
    let map = IDX_TPDO_MAP_BASE + pdo;
    od.set_u32(comm, pdo_sub::COB_ID, axis.tpdo_cob_id())
        .map_err(at(comm, pdo_sub::COB_ID))?;
    od.set_u8(comm, pdo_sub::TRANSMISSION_TYPE, net.transmission_type)
        .map_err(at(comm, pdo_sub::TRANSMISSION_TYPE))?;
    od.set_u16(comm, pdo_sub::INHIBIT_TIME, net.inhibit_time_100us)
        .map_err(at(comm, pdo_sub::INHIBIT_TIME))?;
    od.set_u16(comm, pdo_sub::EVENT_TIMER, net.event_timer_ms)
        .map_err(at(comm, pdo_sub::EVENT_TIMER))?;
    write_mapping(od, map, &TPDO_ENTRIES, axis.profile_offset)?;
    attach(od, axis, &TPDO_ENTRIES)?;

    info!(
        axis = %axis.axis,
        node = %axis.node_id,
        rpdo = format_args!("0x{:03X}", axis.rpdo_cob_id()),
        tpdo = format_args!("0x{:03X}", axis.tpdo_cob_id()),
        "axis PDOs configured"
    );
    Ok(())
}

fn write_mapping<D: OdConfigurator + ?Sized>(
    od: &mut D,
    map: u16,
    entries: &[DriveEntry],
    profile_offset: u16,
) -> Result<(), StartupError> {
    od.set_u8(map, pdo_sub::COUNT, entries.len() as u8)
        .map_err(at(map, pdo_sub::COUNT))?;
    for (sub, entry) in (1u8..).zip(entries) {
        let word = entry.mapping(profile_offset).encode();
        od.set_u32(map, sub, word).map_err(at(map, sub))?;
        debug!(map = format_args!("{map:04X}h"), sub, word = format_args!("0x{word:08X}"), "mapped");
    }
    Ok(())
}

fn attach<D: OdConfigurator + ?Sized>(
    od: &mut D,
    axis: &AxisConfig,
    entries: &[DriveEntry],
) -> Result<(), StartupError> {
    for &entry in entries.iter().filter(|&&e| axis.has_extension(e)) {
        let index = entry.index(axis.profile_offset);
        od.attach_extension(index, EntryContext::new(axis.node_id, entry))
            .map_err(at(index, 0))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts everything and counts writes.
    #[derive(Default)]
    struct Counting {
        writes: usize,
        attached: Vec<(u16, EntryContext)>,
    }

    impl OdConfigurator for Counting {
        fn set_u8(&mut self, _: u16, _: u8, _: u8) -> Result<(), OdStatus> {
            self.writes += 1;
            Ok(())
        }
        fn set_u16(&mut self, _: u16, _: u8, _: u16) -> Result<(), OdStatus> {
            self.writes += 1;
            Ok(())
        }
        fn set_u32(&mut self, _: u16, _: u8, _: u32) -> Result<(), OdStatus> {
            self.writes += 1;
            Ok(())
        }
        fn attach_extension(&mut self, index: u16, ctx: EntryContext) -> Result<(), OdStatus> {
            self.attached.push((index, ctx));
            Ok(())
        }
    }

    #[test]
    fn default_config_performs_every_write() {
        let mut od = Counting::default();
        configure_network(&mut od, &BridgeConfig::default()).unwrap();
        // 2 SYNC + per axis (1 + 3 RPDO, 4 + 3 TPDO).
        assert_eq!(od.writes, 2 + 2 * 11);
        assert_eq!(od.attached.len(), 8);
    }

    #[test]
    fn extensions_follow_configuration() {
        let mut config = BridgeConfig::default();
        config.axes[1].extensions = vec![DriveEntry::StatusWord];
        let mut od = Counting::default();
        configure_network(&mut od, &config).unwrap();

        let left: Vec<_> = od
            .attached
            .iter()
            .filter(|(_, ctx)| ctx.identity == config.axes[1].node_id)
            .collect();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].0, 0x6841);
    }

    #[test]
    fn error_reports_index_and_sub() {
        let err = StartupError::OdParameters {
            index: 0x1A01,
            sub: 2,
            status: OdStatus::SubNotExist,
        };
        assert_eq!(err.index(), 0x1A01);
        assert!(err.to_string().contains("1A01h:02"));
    }
}

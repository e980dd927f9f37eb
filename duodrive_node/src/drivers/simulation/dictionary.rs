//! In-memory object dictionary.
//!
//! Holds only the objects the bridge configures or hooks: SYNC, the PDO
//! parameter records in use, the drive-profile entries of each axis and
//! the velocity command entry. Writes are checked against the object's
//! existence and width the way a real dictionary would reject them.

use duodrive_bridge::OdConfigurator;
use duodrive_common::config::BridgeConfig;
use duodrive_common::consts::AXIS_COUNT;
use duodrive_common::od::{
    DriveEntry, EntryContext, IDX_COMM_CYCLE_PERIOD, IDX_RPDO_COMM_BASE, IDX_RPDO_MAP_BASE,
    IDX_SYNC_COB_ID, IDX_TPDO_COMM_BASE, IDX_TPDO_MAP_BASE, IDX_VELOCITY_COMMAND, OdStatus,
    PdoMapping, pdo_sub,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Mapped objects per PDO.
pub const MAX_MAPPED_OBJECTS: u8 = 8;

/// One sub-index: current value and its width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    value: u32,
    width: u8,
}

/// Simulated object dictionary.
#[derive(Debug, Default)]
pub struct SimulatedDictionary {
    slots: BTreeMap<(u16, u8), Slot>,
    extensions: BTreeMap<u16, EntryContext>,
}

impl SimulatedDictionary {
    /// Dictionary with the objects needed by `config`.
    pub fn for_config(config: &BridgeConfig) -> Self {
        let mut od = Self::default();
        od.define(IDX_COMM_CYCLE_PERIOD, 0, 4);
        od.define(IDX_SYNC_COB_ID, 0, 4);

        for axis in &config.axes {
            let pdo = axis.pdo_number as u16;
            for comm in [IDX_RPDO_COMM_BASE + pdo, IDX_TPDO_COMM_BASE + pdo] {
                od.define(comm, pdo_sub::COB_ID, 4);
                od.define(comm, pdo_sub::TRANSMISSION_TYPE, 1);
                od.define(comm, pdo_sub::INHIBIT_TIME, 2);
                od.define(comm, pdo_sub::EVENT_TIMER, 2);
            }
            for map in [IDX_RPDO_MAP_BASE + pdo, IDX_TPDO_MAP_BASE + pdo] {
                od.define(map, pdo_sub::COUNT, 1);
                for sub in 1..=MAX_MAPPED_OBJECTS {
                    od.define(map, sub, 4);
                }
            }
            for entry in DriveEntry::ALL {
                od.define(entry.index(axis.profile_offset), 0, entry.width() as u8);
            }
        }

        od.slots
            .insert((IDX_VELOCITY_COMMAND, 0), Slot { value: AXIS_COUNT as u32, width: 1 });
        for sub in 1..=AXIS_COUNT as u8 {
            od.define(IDX_VELOCITY_COMMAND, sub, 4);
        }
        od
    }

    fn define(&mut self, index: u16, sub: u8, width: u8) {
        self.slots.insert((index, sub), Slot { value: 0, width });
    }

    fn has_object(&self, index: u16) -> bool {
        self.slots.range((index, 0)..=(index, u8::MAX)).next().is_some()
    }

    fn set(&mut self, index: u16, sub: u8, value: u32, width: u8) -> Result<(), OdStatus> {
        if !self.has_object(index) {
            return Err(OdStatus::NoObject);
        }
        let slot = self.slots.get_mut(&(index, sub)).ok_or(OdStatus::SubNotExist)?;
        if slot.width != width {
            return Err(OdStatus::TypeMismatch);
        }
        slot.value = value;
        trace!(index = format_args!("{index:04X}h"), sub, value, "od write");
        Ok(())
    }

    /// Current value of `index:sub`.
    pub fn get(&self, index: u16, sub: u8) -> Option<u32> {
        self.slots.get(&(index, sub)).map(|s| s.value)
    }

    /// Width in bytes of `index:sub`.
    pub fn width(&self, index: u16, sub: u8) -> Option<usize> {
        self.slots.get(&(index, sub)).map(|s| s.width as usize)
    }

    /// Little-endian bytes of `index:sub`, truncated to its width.
    pub fn read_bytes(&self, index: u16, sub: u8) -> Option<([u8; 4], usize)> {
        self.slots
            .get(&(index, sub))
            .map(|s| (s.value.to_le_bytes(), s.width as usize))
    }

    /// Store little-endian bytes into `index:sub`; extra bytes are ignored.
    pub fn write_bytes(&mut self, index: u16, sub: u8, bytes: &[u8]) -> Result<(), OdStatus> {
        let slot = self.slots.get_mut(&(index, sub)).ok_or(OdStatus::NoObject)?;
        let width = slot.width as usize;
        if bytes.len() < width {
            return Err(OdStatus::TypeMismatch);
        }
        let mut raw = [0u8; 4];
        raw[..width].copy_from_slice(&bytes[..width]);
        slot.value = u32::from_le_bytes(raw);
        Ok(())
    }

    /// Extension context attached to `index`, if any.
    pub fn extension(&self, index: u16) -> Option<EntryContext> {
        self.extensions.get(&index).copied()
    }

    /// Valid mapping entries of a mapping record, in sub-index order.
    pub fn mappings(&self, map: u16) -> Vec<PdoMapping> {
        let count = self.get(map, pdo_sub::COUNT).unwrap_or(0).min(MAX_MAPPED_OBJECTS as u32) as u8;
        (1..=count)
            .filter_map(|sub| self.get(map, sub))
            .map(PdoMapping::decode)
            .collect()
    }
}

impl OdConfigurator for SimulatedDictionary {
    fn set_u8(&mut self, index: u16, sub: u8, value: u8) -> Result<(), OdStatus> {
        self.set(index, sub, value as u32, 1)
    }

    fn set_u16(&mut self, index: u16, sub: u8, value: u16) -> Result<(), OdStatus> {
        self.set(index, sub, value as u32, 2)
    }

    fn set_u32(&mut self, index: u16, sub: u8, value: u32) -> Result<(), OdStatus> {
        self.set(index, sub, value, 4)
    }

    fn attach_extension(&mut self, index: u16, ctx: EntryContext) -> Result<(), OdStatus> {
        if !self.has_object(index) {
            return Err(OdStatus::NoObject);
        }
        self.extensions.insert(index, ctx);
        Ok(())
    }
}

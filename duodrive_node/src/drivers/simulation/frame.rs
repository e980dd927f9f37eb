//! Classic CAN data frame (11-bit identifier, up to 8 data bytes).

use std::fmt;

/// Maximum payload of a classic CAN frame.
pub const MAX_DLC: usize = 8;

/// One frame on the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    /// COB-ID.
    pub cob_id: u16,
    len: u8,
    data: [u8; MAX_DLC],
}

impl Frame {
    /// Empty frame for `cob_id`.
    pub const fn new(cob_id: u16) -> Self {
        Self {
            cob_id,
            len: 0,
            data: [0; MAX_DLC],
        }
    }

    /// Append bytes; `false` (frame unchanged) if they do not fit.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        let start = self.len as usize;
        let end = start + bytes.len();
        if end > MAX_DLC {
            return false;
        }
        self.data[start..end].copy_from_slice(bytes);
        self.len = end as u8;
        true
    }

    /// Payload.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X} [{}]", self.cob_id, self.len)?;
        for b in self.data() {
            write!(f, " {b:02X}")?;
        }
        Ok(())
    }
}

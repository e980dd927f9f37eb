//! Dictionary read/write extensions.
//!
//! The transport invokes these whenever it writes a received value into a
//! hooked entry or reads a hooked entry to assemble an outgoing frame. The
//! entry context tells the bridge which drive and which entry the call is
//! for. Values are little-endian, as on the bus.

use duodrive_common::axis::AxisId;
use duodrive_common::od::{DriveEntry, EntryContext, OdStatus};

use crate::bridge::DriveBridge;
use crate::error::{BridgeError, BridgeResult, InvalidArgument};
use crate::sink::EventSink;

/// Read/write extension attached to dictionary entries.
///
/// Arguments are optional because the transport may call without them; a
/// missing argument is rejected before any state is touched.
pub trait OdExtension: Send + Sync {
    /// Called after the transport received a new value for the entry.
    fn on_write(&self, ctx: Option<&EntryContext>, data: Option<&[u8]>) -> OdStatus;

    /// Called when the transport needs the entry's current value.
    ///
    /// Returning `Ok` without writing leaves the buffer's previous contents
    /// on the bus.
    fn on_read(&self, ctx: Option<&EntryContext>, buf: Option<&mut [u8]>) -> OdStatus;
}

/// First `N` bytes of `data`, or `ShortBuffer`.
fn leading<const N: usize>(data: &[u8]) -> BridgeResult<[u8; N]> {
    data.get(..N)
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or(BridgeError::InvalidArgument(InvalidArgument::ShortBuffer {
            expected: N,
            actual: data.len(),
        }))
}

fn check_len(buf: &[u8], entry: DriveEntry) -> BridgeResult<()> {
    if buf.len() < entry.width() {
        return Err(InvalidArgument::ShortBuffer {
            expected: entry.width(),
            actual: buf.len(),
        }
        .into());
    }
    Ok(())
}

impl<S: EventSink> DriveBridge<S> {
    /// `None` when the transport never writes this entry.
    fn write_entry(&self, ctx: &EntryContext, data: &[u8]) -> Option<BridgeResult<()>> {
        let result = match ctx.entry {
            DriveEntry::StatusWord => leading::<2>(data)
                .and_then(|bytes| self.decode(ctx.identity, u16::from_le_bytes(bytes)))
                .map(|_| ()),
            DriveEntry::PositionActual => leading::<4>(data)
                .and_then(|bytes| self.relay(ctx.identity, i32::from_le_bytes(bytes))),
            DriveEntry::ControlWord | DriveEntry::TargetVelocity => return None,
        };
        Some(result)
    }

    /// `None` when the transport never reads this entry.
    fn read_entry(&self, ctx: &EntryContext, buf: &mut [u8]) -> Option<BridgeResult<()>> {
        if matches!(ctx.entry, DriveEntry::StatusWord | DriveEntry::PositionActual) {
            return None;
        }
        let result = check_len(buf, ctx.entry)
            .and_then(|()| self.resolve_or_reject(ctx.identity, ctx.entry))
            .map(|axis: AxisId| match ctx.entry {
                DriveEntry::ControlWord => {
                    if let Some(word) = self.plan(axis) {
                        buf[..2].copy_from_slice(&word.raw().to_le_bytes());
                    }
                }
                _ => {
                    let velocity = self.last_published_velocity(axis);
                    buf[..4].copy_from_slice(&velocity.to_le_bytes());
                }
            });
        Some(result)
    }

    fn hook_status(&self, ctx: Option<&EntryContext>, result: BridgeResult<()>) -> OdStatus {
        match result {
            Ok(()) => OdStatus::Ok,
            Err(error) => {
                // Unknown identities were already reported during resolution.
                if !matches!(error, BridgeError::UnknownAxis(_)) {
                    self.reject(ctx.map(|c| c.identity), ctx.map(|c| c.entry), error);
                }
                error.status()
            }
        }
    }
}

impl<S: EventSink> OdExtension for DriveBridge<S> {
    fn on_write(&self, ctx: Option<&EntryContext>, data: Option<&[u8]>) -> OdStatus {
        let result = match (ctx, data) {
            (None, _) => Err(InvalidArgument::MissingContext.into()),
            (Some(_), None) => Err(InvalidArgument::MissingBuffer.into()),
            (Some(c), Some(data)) => match self.write_entry(c, data) {
                Some(result) => result,
                None => return OdStatus::UnsupportedAccess,
            },
        };
        self.hook_status(ctx, result)
    }

    fn on_read(&self, ctx: Option<&EntryContext>, buf: Option<&mut [u8]>) -> OdStatus {
        let result = match (ctx, buf) {
            (None, _) => Err(InvalidArgument::MissingContext.into()),
            (Some(_), None) => Err(InvalidArgument::MissingBuffer.into()),
            (Some(c), Some(buf)) => match self.read_entry(c, buf) {
                Some(result) => result,
                None => return OdStatus::UnsupportedAccess,
            },
        };
        self.hook_status(ctx, result)
    }
}

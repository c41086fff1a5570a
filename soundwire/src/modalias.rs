//! # Modalias
//!
//! Canonical compatibility strings published with device events:
//!
//! - Peripheral: `sdw:m<MFG>p<PART>`, both as 4-digit uppercase hex
//! - Controller: `sdw:<name>`
//!
//! The text is bounded; anything past [`MODALIAS_LEN`] bytes is dropped rather
//! than failing the caller.

use crate::device::Device;
use crate::id::DeviceId;
use crate::register::DeviceRegistry;
use crate::{SdwError, SdwResult};
use core::fmt::Write;
use static_assertions::const_assert;

/// Modalias buffer size in bytes
pub const MODALIAS_LEN: usize = 32;

// "sdw:m" + 4 hex + "p" + 4 hex
const_assert!(MODALIAS_LEN >= 14);

/// Bounded modalias text
pub type Modalias = heapless::String<MODALIAS_LEN>;

/// Writer that silently truncates once the buffer is full
struct Truncating<'a>(&'a mut Modalias);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Modalias of a peripheral identity
pub fn peripheral_modalias(id: DeviceId) -> Modalias {
    let mut buf = Modalias::new();
    let _ = write!(Truncating(&mut buf), "sdw:m{:04X}p{:04X}", id.mfg_id, id.part_id);
    buf
}

/// Modalias of a controller name
pub fn controller_modalias(master_name: &str) -> Modalias {
    let mut buf = Modalias::new();
    let _ = write!(Truncating(&mut buf), "sdw:{}", master_name);
    buf
}

/// Modalias of any bus device
pub fn modalias(dev: &Device) -> Modalias {
    match dev {
        Device::Peripheral(p) => peripheral_modalias(p.id()),
        Device::Controller(c) => controller_modalias(c.master_name()),
    }
}

/// Publish the modalias of `dev` through the registry's event channel
///
/// Fails with [`SdwError::NoMemory`] if the registry cannot take the variable.
pub fn uevent(dev: &Device, registry: &dyn DeviceRegistry) -> SdwResult<()> {
    let alias = modalias(dev);
    let key = dev.as_dyn().bus().config().modalias_key;

    log::debug!("{}: uevent {}={}", dev.name(), key, alias);

    registry
        .emit_event(dev, key, &alias)
        .map_err(|_| SdwError::NoMemory)
}

//! # Power Domain
//!
//! Seam to the power-management domain subsystem. Attach and detach bracket the
//! bound lifetime of every device on the bus and may block on clock or
//! regulator I/O.

use crate::device::SdwDevice;
use crate::SdwResult;

/// Power-management domain collaborator
pub trait PowerDomain: Send + Sync {
    /// Attach `dev` to its domain
    ///
    /// `power_on` asks the domain to also power the device up. The bind
    /// protocol always attaches with `power_on == false`.
    fn attach(&self, dev: &dyn SdwDevice, power_on: bool) -> SdwResult<()>;

    /// Detach `dev` from its domain
    fn detach(&self, dev: &dyn SdwDevice, power_on: bool);
}

/// Domain used when the platform provides none
///
/// Attaching succeeds without doing anything, like a device that has no PM
/// domain in firmware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPowerDomain;

impl PowerDomain for NoPowerDomain {
    fn attach(&self, _dev: &dyn SdwDevice, _power_on: bool) -> SdwResult<()> {
        Ok(())
    }

    fn detach(&self, _dev: &dyn SdwDevice, _power_on: bool) {}
}

//! # Bind Protocol
//!
//! Probe, remove and shutdown wrappers shared by both device classes. Each
//! class plugs in through [`ClassDriver`]; the step order below is the same
//! for peripherals and controllers.
//!
//! ## Probe
//!
//! 1. Resolve what the driver's probe receives (matched id / platform data)
//! 2. Install the driver's capability set on the device
//! 3. Attach the power domain, unpowered
//! 4. Call the driver's probe; on error detach and return the error
//! 5. Class post-probe step (peripherals: properties and clock-stop timeout)
//! 6. Mark probed and release the probe completion
//!
//! ## Remove
//!
//! The driver's remove runs first, then the power domain is detached whether
//! or not remove succeeded.

use crate::controller::Controller;
use crate::device::{Device, SdwDevice};
use crate::driver::{ControllerDriver, Driver, PeripheralDriver, PlatformData};
use crate::id::DeviceId;
use crate::matching;
use crate::peripheral::Peripheral;
use crate::{SdwError, SdwResult};

/// Class-specific half of the bind protocol
pub trait ClassDriver: Send + Sync + 'static {
    /// Device class this driver binds
    type Device: SdwDevice;

    /// What the driver's probe receives besides the device
    type Matched;

    /// Driver name
    fn driver_name(&self) -> &'static str;

    /// Split tagged handles into this class, `None` on a class mismatch
    fn from_parts<'a>(dev: &'a Device, drv: &'a Driver) -> Option<(&'a Self::Device, &'a Self)>;

    /// Resolve the probe argument for `dev`
    fn resolve(&self, dev: &Self::Device) -> Option<Self::Matched>;

    /// Install this driver's capability set on `dev`
    fn install_ops(&self, _dev: &Self::Device) {}

    /// Remove this driver's capability set from `dev`
    fn clear_ops(&self, _dev: &Self::Device) {}

    /// Call the driver's probe
    fn call_probe(&self, dev: &Self::Device, matched: Self::Matched) -> SdwResult<()>;

    /// Class work done after a successful probe
    fn after_probe(&self, _dev: &Self::Device) {}

    /// Check if the driver declares a remove callback
    fn declares_remove(&self) -> bool;

    /// Call the driver's remove, `None` if it declares none
    fn call_remove(&self, dev: &Self::Device) -> Option<SdwResult<()>>;

    /// Check if the driver declares a shutdown callback
    fn declares_shutdown(&self) -> bool;

    /// Call the driver's shutdown, returns `false` if it declares none
    fn call_shutdown(&self, dev: &Self::Device) -> bool;
}

// =============================================================================
// Generic Protocol
// =============================================================================

/// Bind `drv` to `dev`
///
/// On success the device is probed, its completion released and its power
/// domain attached. On failure nothing is left behind: the domain is
/// detached again and the device stays unprobed.
pub fn probe<D: ClassDriver>(dev: &D::Device, drv: &D) -> SdwResult<()> {
    let Some(matched) = drv.resolve(dev) else {
        log::warn!("{}: no entry in {} for a matched device", dev.name(), drv.driver_name());
        return Err(SdwError::NotFound);
    };

    drv.install_ops(dev);

    let pm = dev.bus().power_domain();

    // attach to power domain but don't turn on
    if let Err(err) = pm.attach(dev, false) {
        drv.clear_ops(dev);
        return Err(err);
    }

    if let Err(err) = drv.call_probe(dev, matched) {
        log::error!("{}: Probe of {} failed: {}", dev.name(), drv.driver_name(), err);
        pm.detach(dev, false);
        drv.clear_ops(dev);
        return Err(err);
    }

    drv.after_probe(dev);

    dev.bind_state().mark_probed();
    log::debug!("{}: bound to {}", dev.name(), drv.driver_name());

    Ok(())
}

/// Unbind `drv` from `dev`
///
/// Returns the driver's remove error, if any, after the power domain has been
/// detached.
pub fn remove<D: ClassDriver>(dev: &D::Device, drv: &D) -> SdwResult<()> {
    let ret = drv.call_remove(dev).unwrap_or(Ok(()));
    if let Err(err) = &ret {
        log::warn!("{}: remove of {} failed: {}", dev.name(), drv.driver_name(), err);
    }

    dev.bus().power_domain().detach(dev, false);

    drv.clear_ops(dev);
    dev.bind_state().mark_unprobed();
    log::debug!("{}: unbound from {}", dev.name(), drv.driver_name());

    ret
}

/// Quiesce `dev` for system shutdown
///
/// No power-domain work: the system is going down.
pub fn shutdown<D: ClassDriver>(dev: &D::Device, drv: &D) {
    if drv.call_shutdown(dev) {
        log::debug!("{}: shut down by {}", dev.name(), drv.driver_name());
    }
}

// =============================================================================
// Peripheral Class
// =============================================================================

impl ClassDriver for PeripheralDriver {
    type Device = Peripheral;
    type Matched = &'static DeviceId;

    fn driver_name(&self) -> &'static str {
        self.name
    }

    fn from_parts<'a>(dev: &'a Device, drv: &'a Driver) -> Option<(&'a Peripheral, &'a Self)> {
        match (dev, drv) {
            (Device::Peripheral(p), Driver::Peripheral(d)) => Some((&**p, &**d)),
            _ => None,
        }
    }

    fn resolve(&self, dev: &Peripheral) -> Option<&'static DeviceId> {
        matching::peripheral_lookup(dev, self)
    }

    fn install_ops(&self, dev: &Peripheral) {
        dev.set_ops(self.ops.clone());
    }

    fn clear_ops(&self, dev: &Peripheral) {
        dev.set_ops(None);
    }

    fn call_probe(&self, dev: &Peripheral, id: &'static DeviceId) -> SdwResult<()> {
        match &self.probe {
            Some(probe) => probe(dev, id),
            None => Err(SdwError::InvalidDriver),
        }
    }

    fn after_probe(&self, dev: &Peripheral) {
        // device is probed so let's read the properties now
        if let Some(read_prop) = dev.ops().and_then(|ops| ops.read_prop) {
            if let Err(err) = read_prop(dev) {
                log::debug!("{}: read_prop failed: {}", dev.name(), err);
            }
        }

        let bus = dev.bus();
        let fallback = bus.config().fallback_clk_stop_timeout;
        dev.update_props(|props| {
            if props.clk_stop_timeout == 0 {
                props.clk_stop_timeout = fallback;
            }
        });

        let effective = bus.raise_clk_stop_timeout(dev.props().clk_stop_timeout);
        log::debug!("{}: bus clock-stop timeout now {} ms", dev.name(), effective);
    }

    fn declares_remove(&self) -> bool {
        self.remove.is_some()
    }

    fn call_remove(&self, dev: &Peripheral) -> Option<SdwResult<()>> {
        self.remove.as_ref().map(|remove| remove(dev))
    }

    fn declares_shutdown(&self) -> bool {
        self.shutdown.is_some()
    }

    fn call_shutdown(&self, dev: &Peripheral) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                shutdown(dev);
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Controller Class
// =============================================================================

impl ClassDriver for ControllerDriver {
    type Device = Controller;
    type Matched = Option<PlatformData>;

    fn driver_name(&self) -> &'static str {
        self.name
    }

    fn from_parts<'a>(dev: &'a Device, drv: &'a Driver) -> Option<(&'a Controller, &'a Self)> {
        match (dev, drv) {
            (Device::Controller(c), Driver::Controller(d)) => Some((&**c, &**d)),
            _ => None,
        }
    }

    fn resolve(&self, dev: &Controller) -> Option<Option<PlatformData>> {
        Some(dev.platform_data().cloned())
    }

    fn call_probe(&self, dev: &Controller, pdata: Option<PlatformData>) -> SdwResult<()> {
        match &self.probe {
            Some(probe) => probe(dev, pdata.as_ref()),
            None => Err(SdwError::InvalidDriver),
        }
    }

    fn declares_remove(&self) -> bool {
        self.remove.is_some()
    }

    fn call_remove(&self, dev: &Controller) -> Option<SdwResult<()>> {
        self.remove.as_ref().map(|remove| remove(dev))
    }

    fn declares_shutdown(&self) -> bool {
        self.shutdown.is_some()
    }

    fn call_shutdown(&self, dev: &Controller) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                shutdown(dev);
                true
            }
            None => false,
        }
    }
}

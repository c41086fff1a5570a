//! # Driver Registration
//!
//! Wraps a driver in a [`DriverRecord`] carrying the bind protocol's entry
//! points and hands it to the device registry. Probe is always wired; remove
//! and shutdown are only wired when the driver declares them, so a registry
//! can tell "no callback" apart from "callback that does nothing".

use crate::bind::{self, ClassDriver};
use crate::device::{Device, DeviceKind};
use crate::driver::{ControllerDriver, Driver, PeripheralDriver};
use crate::matching;
use crate::{SdwError, SdwResult};
use alloc::sync::Arc;
use bitflags::bitflags;

bitflags! {
    /// Bind entry points installed on a driver record
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindHooks: u8 {
        /// Probe wrapper (always present)
        const PROBE = 1 << 0;
        /// Remove wrapper
        const REMOVE = 1 << 1;
        /// Shutdown wrapper
        const SHUTDOWN = 1 << 2;
    }
}

/// Probe/remove entry point
pub type BindHook = fn(&Device, &Driver) -> SdwResult<()>;
/// Shutdown entry point
pub type ShutdownHook = fn(&Device, &Driver);

/// Device registry the bus activates drivers through
pub trait DeviceRegistry: Send + Sync {
    /// Activate a driver record
    fn register_driver(&self, record: DriverRecord) -> SdwResult<()>;

    /// Deactivate the driver registered under `name`
    fn unregister_driver(&self, name: &str);

    /// Publish an event variable for `dev`
    fn emit_event(&self, dev: &Device, key: &str, value: &str) -> SdwResult<()>;
}

/// Registered driver with its bind entry points
pub struct DriverRecord {
    driver: Driver,
    probe: BindHook,
    remove: Option<BindHook>,
    shutdown: Option<ShutdownHook>,
}

impl DriverRecord {
    fn install<D: ClassDriver>(drv: &D, driver: Driver) -> Self {
        Self {
            driver,
            probe: probe_hook::<D>,
            remove: drv.declares_remove().then_some(remove_hook::<D> as BindHook),
            shutdown: drv
                .declares_shutdown()
                .then_some(shutdown_hook::<D> as ShutdownHook),
        }
    }

    /// Driver name
    pub fn name(&self) -> &'static str {
        self.driver.name()
    }

    /// Class of devices this record binds
    pub fn kind(&self) -> DeviceKind {
        self.driver.kind()
    }

    /// Underlying driver
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Installed entry points
    pub fn hooks(&self) -> BindHooks {
        let mut hooks = BindHooks::PROBE;
        hooks.set(BindHooks::REMOVE, self.remove.is_some());
        hooks.set(BindHooks::SHUTDOWN, self.shutdown.is_some());
        hooks
    }

    /// Bus match callback for this driver
    pub fn matches(&self, dev: &Device) -> bool {
        matching::bus_match(dev, &self.driver)
    }

    /// Run the probe wrapper
    pub fn probe(&self, dev: &Device) -> SdwResult<()> {
        (self.probe)(dev, &self.driver)
    }

    /// Run the remove wrapper, `None` if none is installed
    pub fn remove(&self, dev: &Device) -> Option<SdwResult<()>> {
        self.remove.map(|hook| hook(dev, &self.driver))
    }

    /// Run the shutdown wrapper, returns `false` if none is installed
    pub fn shutdown(&self, dev: &Device) -> bool {
        match self.shutdown {
            Some(hook) => {
                hook(dev, &self.driver);
                true
            }
            None => false,
        }
    }
}

impl core::fmt::Debug for DriverRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriverRecord")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("hooks", &self.hooks())
            .finish()
    }
}

fn probe_hook<D: ClassDriver>(dev: &Device, drv: &Driver) -> SdwResult<()> {
    let (dev, drv) = D::from_parts(dev, drv).ok_or(SdwError::InvalidDevice)?;
    bind::probe(dev, drv)
}

fn remove_hook<D: ClassDriver>(dev: &Device, drv: &Driver) -> SdwResult<()> {
    let (dev, drv) = D::from_parts(dev, drv).ok_or(SdwError::InvalidDevice)?;
    bind::remove(dev, drv)
}

fn shutdown_hook<D: ClassDriver>(dev: &Device, drv: &Driver) {
    if let Some((dev, drv)) = D::from_parts(dev, drv) {
        bind::shutdown(dev, drv);
    }
}

// =============================================================================
// Registration Facade
// =============================================================================

/// Register a peripheral driver
///
/// Fails with [`SdwError::InvalidDriver`] before touching the registry if the
/// driver has no probe routine. Otherwise returns the registry's result.
pub fn register_peripheral_driver(
    registry: &dyn DeviceRegistry,
    drv: PeripheralDriver,
) -> SdwResult<()> {
    if !drv.has_probe() {
        log::error!("driver {} didn't provide SDW probe routine", drv.name);
        return Err(SdwError::InvalidDriver);
    }

    let drv = Arc::new(drv);
    let record = DriverRecord::install(&*drv, Driver::Peripheral(drv.clone()));
    registry.register_driver(record)
}

/// Unregister a peripheral driver
pub fn unregister_peripheral_driver(registry: &dyn DeviceRegistry, name: &str) {
    registry.unregister_driver(name);
}

/// Register a controller driver
///
/// Same contract as [`register_peripheral_driver`].
pub fn register_controller_driver(
    registry: &dyn DeviceRegistry,
    drv: ControllerDriver,
) -> SdwResult<()> {
    if !drv.has_probe() {
        log::error!("driver {} didn't provide SDW probe routine", drv.name);
        return Err(SdwError::InvalidDriver);
    }

    let drv = Arc::new(drv);
    let record = DriverRecord::install(&*drv, Driver::Controller(drv.clone()));
    registry.register_driver(record)
}

/// Unregister a controller driver
pub fn unregister_controller_driver(registry: &dyn DeviceRegistry, name: &str) {
    registry.unregister_driver(name);
}

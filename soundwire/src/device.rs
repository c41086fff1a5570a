//! # Bus Devices
//!
//! State common to both device classes and the tagged [`Device`] handle the
//! registry works with.

use crate::bus::Bus;
use crate::completion::Completion;
use crate::controller::Controller;
use crate::peripheral::Peripheral;
use crate::register::DriverRecord;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, MutexGuard, RwLock};

/// Device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Peripheral ("slave") endpoint
    Peripheral,
    /// Bus controller ("master") endpoint
    Controller,
}

/// Behaviour shared by every device on the bus
pub trait SdwDevice: Send + Sync {
    /// Device name
    fn name(&self) -> &str;

    /// Device class
    fn kind(&self) -> DeviceKind;

    /// Owning bus
    fn bus(&self) -> &Arc<Bus>;

    /// Bind bookkeeping
    fn bind_state(&self) -> &BindState;
}

/// Bind bookkeeping of one device
///
/// A device is bound when a driver record is installed, `probed` is set and
/// the probe completion has been released for the current bind.
#[derive(Debug, Default)]
pub struct BindState {
    /// Serializes probe/remove/shutdown of this device
    lock: Mutex<()>,
    /// Bound driver, written by the registry
    driver: RwLock<Option<Arc<DriverRecord>>>,
    /// Set once the driver's probe succeeded
    probed: AtomicBool,
    /// Released when probe finishes
    probe_complete: Completion,
}

impl BindState {
    /// Create unbound state
    pub const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            driver: RwLock::new(None),
            probed: AtomicBool::new(false),
            probe_complete: Completion::new(),
        }
    }

    /// Take the per-device lifecycle lock
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Currently bound driver record
    pub fn driver(&self) -> Option<Arc<DriverRecord>> {
        self.driver.read().clone()
    }

    /// Install or clear the bound driver record
    pub fn set_driver(&self, record: Option<Arc<DriverRecord>>) {
        *self.driver.write() = record;
    }

    /// Check if the driver's probe has completed
    pub fn is_probed(&self) -> bool {
        self.probed.load(Ordering::Acquire)
    }

    /// Probe completion gate
    pub fn probe_complete(&self) -> &Completion {
        &self.probe_complete
    }

    /// Check the full bound invariant
    pub fn is_bound(&self) -> bool {
        self.driver.read().is_some() && self.is_probed() && self.probe_complete.is_done()
    }

    pub(crate) fn mark_probed(&self) {
        self.probed.store(true, Ordering::Release);
        self.probe_complete.complete();
    }

    pub(crate) fn mark_unprobed(&self) {
        self.probed.store(false, Ordering::Release);
        self.probe_complete.reinit();
    }
}

/// Device handle as seen by the registry
#[derive(Debug, Clone)]
pub enum Device {
    /// Peripheral device
    Peripheral(Arc<Peripheral>),
    /// Controller device
    Controller(Arc<Controller>),
}

impl Device {
    /// Borrow the class-independent view
    pub fn as_dyn(&self) -> &dyn SdwDevice {
        match self {
            Self::Peripheral(p) => &**p,
            Self::Controller(c) => &**c,
        }
    }

    /// Device name
    pub fn name(&self) -> &str {
        self.as_dyn().name()
    }

    /// Device class
    pub fn kind(&self) -> DeviceKind {
        self.as_dyn().kind()
    }

    /// Bind bookkeeping
    pub fn bind_state(&self) -> &BindState {
        self.as_dyn().bind_state()
    }

    /// Check if two handles refer to the same device
    pub fn same(&self, other: &Device) -> bool {
        match (self, other) {
            (Self::Peripheral(a), Self::Peripheral(b)) => Arc::ptr_eq(a, b),
            (Self::Controller(a), Self::Controller(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Arc<Peripheral>> for Device {
    fn from(p: Arc<Peripheral>) -> Self {
        Self::Peripheral(p)
    }
}

impl From<Arc<Controller>> for Device {
    fn from(c: Arc<Controller>) -> Self {
        Self::Controller(c)
    }
}

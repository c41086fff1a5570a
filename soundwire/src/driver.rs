//! # Driver Records
//!
//! Drivers are described by their callbacks. `probe` is mandatory, everything
//! else is optional, and an absent callback stays `None` all the way into the
//! registered record.

use crate::controller::Controller;
use crate::device::DeviceKind;
use crate::id::DeviceId;
use crate::peripheral::Peripheral;
use crate::SdwResult;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

/// Opaque data handed to a controller driver's probe
pub type PlatformData = Arc<dyn Any + Send + Sync>;

/// Peripheral probe callback
pub type PeripheralProbeFn = Box<dyn Fn(&Peripheral, &DeviceId) -> SdwResult<()> + Send + Sync>;
/// Peripheral remove callback
pub type PeripheralRemoveFn = Box<dyn Fn(&Peripheral) -> SdwResult<()> + Send + Sync>;
/// Peripheral shutdown callback
pub type PeripheralShutdownFn = Box<dyn Fn(&Peripheral) + Send + Sync>;
/// Peripheral property reader
pub type ReadPropFn = Arc<dyn Fn(&Peripheral) -> SdwResult<()> + Send + Sync>;

/// Controller probe callback
pub type ControllerProbeFn =
    Box<dyn Fn(&Controller, Option<&PlatformData>) -> SdwResult<()> + Send + Sync>;
/// Controller callback returning a status
pub type ControllerFn = Box<dyn Fn(&Controller) -> SdwResult<()> + Send + Sync>;
/// Controller shutdown callback
pub type ControllerShutdownFn = Box<dyn Fn(&Controller) + Send + Sync>;

// =============================================================================
// Peripheral Drivers
// =============================================================================

/// Capability set a peripheral driver installs on its devices
#[derive(Clone, Default)]
pub struct PeripheralOps {
    /// Fill the device's property bag after probe
    pub read_prop: Option<ReadPropFn>,
}

impl PeripheralOps {
    /// Create an empty capability set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set property reader
    pub fn read_prop(
        mut self,
        f: impl Fn(&Peripheral) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.read_prop = Some(Arc::new(f));
        self
    }
}

impl core::fmt::Debug for PeripheralOps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeripheralOps")
            .field("read_prop", &self.read_prop.is_some())
            .finish()
    }
}

/// Peripheral ("slave") driver
///
/// # Example
///
/// ```rust,ignore
/// static IDS: &[DeviceId] = sdw_id_table![(0x025d, 0x0711)];
///
/// let drv = PeripheralDriver::new("rt711", IDS)
///     .probe(|dev, id| {
///         log::info!("{} bound as {}", dev.name(), id);
///         Ok(())
///     })
///     .ops(PeripheralOps::new().read_prop(|dev| {
///         dev.update_props(|p| p.clk_stop_timeout = 20);
///         Ok(())
///     }));
/// ```
pub struct PeripheralDriver {
    /// Driver name
    pub name: &'static str,
    /// Supported identities, sentinel-terminated
    pub id_table: &'static [DeviceId],
    pub(crate) ops: Option<PeripheralOps>,
    pub(crate) probe: Option<PeripheralProbeFn>,
    pub(crate) remove: Option<PeripheralRemoveFn>,
    pub(crate) shutdown: Option<PeripheralShutdownFn>,
}

impl PeripheralDriver {
    /// Create a driver with no callbacks
    pub fn new(name: &'static str, id_table: &'static [DeviceId]) -> Self {
        Self {
            name,
            id_table,
            ops: None,
            probe: None,
            remove: None,
            shutdown: None,
        }
    }

    /// Set probe
    pub fn probe(
        mut self,
        f: impl Fn(&Peripheral, &DeviceId) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.probe = Some(Box::new(f));
        self
    }

    /// Set remove
    pub fn remove(
        mut self,
        f: impl Fn(&Peripheral) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.remove = Some(Box::new(f));
        self
    }

    /// Set shutdown
    pub fn shutdown(mut self, f: impl Fn(&Peripheral) + Send + Sync + 'static) -> Self {
        self.shutdown = Some(Box::new(f));
        self
    }

    /// Set capability set installed on bound devices
    pub fn ops(mut self, ops: PeripheralOps) -> Self {
        self.ops = Some(ops);
        self
    }

    /// Check if the driver declares a probe routine
    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }
}

impl core::fmt::Debug for PeripheralDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeripheralDriver")
            .field("name", &self.name)
            .field("id_table", &self.id_table)
            .field("ops", &self.ops)
            .field("probe", &self.probe.is_some())
            .field("remove", &self.remove.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

// =============================================================================
// Controller Drivers
// =============================================================================

/// Controller ("master") driver
///
/// Controllers carry no hardware identity, so the driver name doubles as the
/// match key.
pub struct ControllerDriver {
    /// Driver name, matched against controller names
    pub name: &'static str,
    pub(crate) probe: Option<ControllerProbeFn>,
    pub(crate) remove: Option<ControllerFn>,
    pub(crate) shutdown: Option<ControllerShutdownFn>,
    pub(crate) startup: Option<ControllerFn>,
    pub(crate) process_wake_event: Option<ControllerFn>,
}

impl ControllerDriver {
    /// Create a driver with no callbacks
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            probe: None,
            remove: None,
            shutdown: None,
            startup: None,
            process_wake_event: None,
        }
    }

    /// Set probe
    pub fn probe(
        mut self,
        f: impl Fn(&Controller, Option<&PlatformData>) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.probe = Some(Box::new(f));
        self
    }

    /// Set remove
    pub fn remove(
        mut self,
        f: impl Fn(&Controller) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.remove = Some(Box::new(f));
        self
    }

    /// Set shutdown
    pub fn shutdown(mut self, f: impl Fn(&Controller) + Send + Sync + 'static) -> Self {
        self.shutdown = Some(Box::new(f));
        self
    }

    /// Set startup
    pub fn startup(
        mut self,
        f: impl Fn(&Controller) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.startup = Some(Box::new(f));
        self
    }

    /// Set wake event handler
    pub fn process_wake_event(
        mut self,
        f: impl Fn(&Controller) -> SdwResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.process_wake_event = Some(Box::new(f));
        self
    }

    /// Check if the driver declares a probe routine
    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }
}

impl core::fmt::Debug for ControllerDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerDriver")
            .field("name", &self.name)
            .field("probe", &self.probe.is_some())
            .field("remove", &self.remove.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .field("startup", &self.startup.is_some())
            .field("process_wake_event", &self.process_wake_event.is_some())
            .finish()
    }
}

// =============================================================================
// Tagged Driver
// =============================================================================

/// Driver handle as seen by the registry
#[derive(Debug, Clone)]
pub enum Driver {
    /// Peripheral driver
    Peripheral(Arc<PeripheralDriver>),
    /// Controller driver
    Controller(Arc<ControllerDriver>),
}

impl Driver {
    /// Driver name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Peripheral(d) => d.name,
            Self::Controller(d) => d.name,
        }
    }

    /// Class of devices this driver binds
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Peripheral(_) => DeviceKind::Peripheral,
            Self::Controller(_) => DeviceKind::Controller,
        }
    }
}

//! # Controller Devices
//!
//! A controller ("master") device represents one link of a SoundWire
//! controller. It has no hardware identity; drivers bind to it by name.

use crate::bus::Bus;
use crate::device::{BindState, DeviceKind, SdwDevice};
use crate::driver::{ControllerDriver, Driver, PlatformData};
use crate::SdwResult;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;

/// Controller ("master") device record
pub struct Controller {
    /// Name drivers are matched against
    master_name: String,
    /// Device name (`sdw-master-<link>`)
    dev_name: String,
    link_id: u32,
    pdata: Option<PlatformData>,
    bus: Arc<Bus>,
    state: BindState,
}

impl Controller {
    /// Create the controller device for link `link_id`
    pub fn new(
        bus: Arc<Bus>,
        master_name: impl Into<String>,
        link_id: u32,
        pdata: Option<PlatformData>,
    ) -> Self {
        Self {
            master_name: master_name.into(),
            dev_name: format!("sdw-master-{}", link_id),
            link_id,
            pdata,
            bus,
            state: BindState::new(),
        }
    }

    /// Name drivers are matched against
    pub fn master_name(&self) -> &str {
        &self.master_name
    }

    /// Link number
    pub fn link_id(&self) -> u32 {
        self.link_id
    }

    /// Platform data passed to the driver's probe
    pub fn platform_data(&self) -> Option<&PlatformData> {
        self.pdata.as_ref()
    }

    /// Check if the driver's probe has completed
    pub fn is_probed(&self) -> bool {
        self.state.is_probed()
    }

    /// Run the bound driver's `startup` callback, if any
    pub fn startup(&self) -> SdwResult<()> {
        match self.bound_driver() {
            Some(drv) => match &drv.startup {
                Some(startup) => startup(self),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Run the bound driver's `process_wake_event` callback, if any
    pub fn process_wake_event(&self) -> SdwResult<()> {
        match self.bound_driver() {
            Some(drv) => match &drv.process_wake_event {
                Some(wake) => wake(self),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    fn bound_driver(&self) -> Option<Arc<ControllerDriver>> {
        let record = self.state.driver()?;
        match record.driver() {
            Driver::Controller(drv) => Some(drv.clone()),
            Driver::Peripheral(_) => None,
        }
    }
}

impl SdwDevice for Controller {
    fn name(&self) -> &str {
        &self.dev_name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Controller
    }

    fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    fn bind_state(&self) -> &BindState {
        &self.state
    }
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.dev_name)
            .field("master_name", &self.master_name)
            .field("link_id", &self.link_id)
            .field("probed", &self.is_probed())
            .finish_non_exhaustive()
    }
}

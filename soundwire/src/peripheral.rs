//! # Peripheral Devices
//!
//! A peripheral is identified by its manufacturer and part id. The discovery
//! code creates the record; the bind protocol fills in its ops and properties.

use crate::bus::Bus;
use crate::device::{BindState, DeviceKind, SdwDevice};
use crate::driver::PeripheralOps;
use crate::id::DeviceId;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use spin::{Mutex, RwLock};

/// Properties a peripheral driver reports after probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeripheralProps {
    /// Worst-case clock-stop preparation time in ms, 0 when undeclared
    pub clk_stop_timeout: u32,
    /// Device can signal wake while the clock is stopped
    pub wake_capable: bool,
}

/// Peripheral ("slave") device record
pub struct Peripheral {
    id: DeviceId,
    name: String,
    bus: Arc<Bus>,
    ops: RwLock<Option<PeripheralOps>>,
    props: Mutex<PeripheralProps>,
    state: BindState,
}

impl Peripheral {
    /// Create a peripheral discovered on `bus`
    pub fn new(bus: Arc<Bus>, id: DeviceId) -> Self {
        let name = format!(
            "sdw:{}:{:04x}:{:04x}",
            bus.link_id(),
            id.mfg_id,
            id.part_id
        );
        Self::with_props(bus, id, name, PeripheralProps::default())
    }

    /// Create a peripheral with an explicit name and firmware-declared properties
    pub fn with_props(
        bus: Arc<Bus>,
        id: DeviceId,
        name: impl Into<String>,
        props: PeripheralProps,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            ops: RwLock::new(None),
            props: Mutex::new(props),
            state: BindState::new(),
        }
    }

    /// Hardware identity
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Capability set installed by the bound driver
    pub fn ops(&self) -> Option<PeripheralOps> {
        self.ops.read().clone()
    }

    pub(crate) fn set_ops(&self, ops: Option<PeripheralOps>) {
        *self.ops.write() = ops;
    }

    /// Snapshot of the property bag
    pub fn props(&self) -> PeripheralProps {
        *self.props.lock()
    }

    /// Update the property bag
    ///
    /// Drivers call this from `read_prop`.
    pub fn update_props(&self, f: impl FnOnce(&mut PeripheralProps)) {
        f(&mut *self.props.lock());
    }

    /// Check if the driver's probe has completed
    pub fn is_probed(&self) -> bool {
        self.state.is_probed()
    }
}

impl SdwDevice for Peripheral {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Peripheral
    }

    fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    fn bind_state(&self) -> &BindState {
        &self.state
    }
}

impl core::fmt::Debug for Peripheral {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Peripheral")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("props", &self.props())
            .field("probed", &self.is_probed())
            .finish_non_exhaustive()
    }
}

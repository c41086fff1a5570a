//! # Match Predicate
//!
//! Decides whether a driver fits a device. Pure: nothing here touches device
//! or driver state.

use crate::controller::Controller;
use crate::device::Device;
use crate::driver::{ControllerDriver, Driver, PeripheralDriver};
use crate::id::{self, DeviceId};
use crate::peripheral::Peripheral;

/// Find the first table entry equal to `id`
pub fn lookup_id(table: &[DeviceId], id: DeviceId) -> Option<&DeviceId> {
    id::entries(table).find(|entry| entry.mfg_id == id.mfg_id && entry.part_id == id.part_id)
}

/// Find the identity entry of `drv` that matches peripheral `dev`
pub fn peripheral_lookup(dev: &Peripheral, drv: &PeripheralDriver) -> Option<&'static DeviceId> {
    lookup_id(drv.id_table, dev.id())
}

/// Check a controller name against a driver name
///
/// There is no hardware information for controllers, so the driver name only
/// has to start with the controller name: `"link-0"` matches a driver named
/// `"link-0-ctrl"`. The comparison covers exactly the controller name's
/// length, which also means an empty controller name matches any driver.
pub fn controller_name_matches(master_name: &str, driver_name: &str) -> bool {
    driver_name.as_bytes().starts_with(master_name.as_bytes())
}

/// Check if controller driver `drv` fits controller `dev`
pub fn controller_matches(dev: &Controller, drv: &ControllerDriver) -> bool {
    controller_name_matches(dev.master_name(), drv.name)
}

/// Bus match callback
///
/// Devices only ever match drivers of their own class.
pub fn bus_match(dev: &Device, drv: &Driver) -> bool {
    match (dev, drv) {
        (Device::Peripheral(p), Driver::Peripheral(d)) => peripheral_lookup(p, d).is_some(),
        (Device::Controller(c), Driver::Controller(d)) => controller_matches(c, d),
        _ => false,
    }
}

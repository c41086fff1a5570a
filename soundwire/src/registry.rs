//! # Bus Registry
//!
//! In-memory device registry for the SoundWire bus. It drives the bind
//! protocol the way a device core does:
//!
//! - adding a device publishes its modalias and binds it to the first
//!   registered driver that matches and probes successfully
//! - registering a driver binds every unbound device it matches
//! - unregistering a driver unbinds its devices
//!
//! Table locks are never held across driver callbacks; each device's own bind
//! lock serializes its probe/remove/shutdown.

use crate::device::Device;
use crate::modalias;
use crate::register::{DeviceRegistry, DriverRecord};
use crate::{SdwError, SdwResult};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::{Mutex, RwLock};

/// Event variable published for a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Device name
    pub device: String,
    /// Variable name
    pub key: String,
    /// Variable value
    pub value: String,
}

/// Bus registry
pub struct BusRegistry {
    /// Registered drivers, in registration order
    drivers: RwLock<Vec<Arc<DriverRecord>>>,
    /// Known devices, in discovery order
    devices: RwLock<Vec<Device>>,
    /// Published events
    events: Mutex<Vec<DeviceEvent>>,
}

impl BusRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            drivers: RwLock::new(Vec::new()),
            devices: RwLock::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Add a discovered device and try to bind it
    ///
    /// A probe failure is not an error here: the device simply stays unbound
    /// until a later driver registration matches it.
    pub fn add_device(&self, dev: Device) -> SdwResult<()> {
        {
            let mut devices = self.devices.write();
            if devices.iter().any(|d| d.same(&dev)) {
                return Err(SdwError::AlreadyRegistered);
            }
            modalias::uevent(&dev, self)?;
            devices.push(dev.clone());
        }

        log::debug!(
            "Added {} device: {}",
            dev.as_dyn().bus().config().name,
            dev.name()
        );

        self.attach_device(&dev);
        Ok(())
    }

    /// Unbind and forget a device
    pub fn remove_device(&self, dev: &Device) -> SdwResult<()> {
        let found = {
            let mut devices = self.devices.write();
            let before = devices.len();
            devices.retain(|d| !d.same(dev));
            devices.len() != before
        };
        if !found {
            return Err(SdwError::NotFound);
        }

        self.release(dev);
        Ok(())
    }

    /// Run every bound device's shutdown hook
    pub fn shutdown(&self) {
        for dev in self.device_snapshot() {
            let state = dev.bind_state();
            let _guard = state.lock();
            if let Some(record) = state.driver() {
                record.shutdown(&dev);
            }
        }
    }

    /// Name of the driver bound to `dev`
    pub fn bound_driver(&self, dev: &Device) -> Option<&'static str> {
        dev.bind_state().driver().map(|record| record.name())
    }

    /// Get a registered driver record by name
    pub fn driver(&self, name: &str) -> Option<Arc<DriverRecord>> {
        self.drivers.read().iter().find(|r| r.name() == name).cloned()
    }

    /// Names of all registered drivers
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.drivers.read().iter().map(|r| r.name()).collect()
    }

    /// All known devices
    pub fn list_devices(&self) -> Vec<Device> {
        self.device_snapshot()
    }

    /// Events published so far
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().clone()
    }

    fn device_snapshot(&self) -> Vec<Device> {
        self.devices.read().clone()
    }

    fn driver_snapshot(&self) -> Vec<Arc<DriverRecord>> {
        self.drivers.read().clone()
    }

    /// Try every registered driver on `dev`, stop at the first that binds
    fn attach_device(&self, dev: &Device) -> bool {
        for record in self.driver_snapshot() {
            if dev.bind_state().driver().is_some() {
                return true;
            }
            if !record.matches(dev) {
                continue;
            }
            match self.really_probe(dev, &record) {
                Some(Ok(())) => return true,
                Some(Err(err)) => {
                    log::debug!("{}: {} did not bind: {}", dev.name(), record.name(), err);
                }
                None => {}
            }
        }
        false
    }

    /// Bind `record` to every unbound device it matches
    fn attach_driver(&self, record: &Arc<DriverRecord>) {
        for dev in self.device_snapshot() {
            if dev.bind_state().driver().is_some() || !record.matches(&dev) {
                continue;
            }
            if let Some(Err(err)) = self.really_probe(&dev, record) {
                log::debug!("{}: {} did not bind: {}", dev.name(), record.name(), err);
            }
        }
    }

    /// Probe `dev` with `record` under the device's bind lock
    ///
    /// Returns `None` without probing if the device is already bound or
    /// `record` has been unregistered since the caller looked it up.
    fn really_probe(&self, dev: &Device, record: &Arc<DriverRecord>) -> Option<SdwResult<()>> {
        let state = dev.bind_state();
        let _guard = state.lock();

        if state.driver().is_some() {
            return None;
        }

        {
            // the slot is filled while the table is read-locked, so an
            // unregister either sees this binding or we see it gone
            let drivers = self.drivers.read();
            if !drivers.iter().any(|r| Arc::ptr_eq(r, record)) {
                return None;
            }
            state.set_driver(Some(record.clone()));
        }

        let ret = record.probe(dev);
        if ret.is_err() {
            state.set_driver(None);
        }
        Some(ret)
    }

    /// Unbind `dev` from whatever driver it has
    fn release(&self, dev: &Device) {
        let state = dev.bind_state();
        let _guard = state.lock();

        if let Some(record) = state.driver() {
            Self::unbind_locked(dev, &record);
        }
    }

    /// Unbind `dev` only if it is still bound to `record`
    fn release_from(&self, dev: &Device, record: &Arc<DriverRecord>) {
        let bound_here = |dev: &Device| {
            dev.bind_state()
                .driver()
                .is_some_and(|r| Arc::ptr_eq(&r, record))
        };
        if !bound_here(dev) {
            return;
        }

        let _guard = dev.bind_state().lock();
        if bound_here(dev) {
            Self::unbind_locked(dev, record);
        }
    }

    fn unbind_locked(dev: &Device, record: &DriverRecord) {
        let state = dev.bind_state();

        match record.remove(dev) {
            Some(Err(err)) => {
                log::warn!("{}: remove by {} returned {}", dev.name(), record.name(), err);
            }
            Some(Ok(())) => {}
            // no remove hook: the registry still owes the detach
            None => {
                let sdw = dev.as_dyn();
                sdw.bus().power_domain().detach(sdw, false);
                if let Device::Peripheral(p) = dev {
                    p.set_ops(None);
                }
                state.mark_unprobed();
            }
        }
        state.set_driver(None);
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for BusRegistry {
    fn register_driver(&self, record: DriverRecord) -> SdwResult<()> {
        let record = Arc::new(record);
        {
            let mut drivers = self.drivers.write();
            if drivers.iter().any(|r| r.name() == record.name()) {
                return Err(SdwError::AlreadyRegistered);
            }
            drivers.push(record.clone());
        }

        log::info!("Registered driver: {} ({:?})", record.name(), record.hooks());

        self.attach_driver(&record);
        Ok(())
    }

    fn unregister_driver(&self, name: &str) {
        let record = {
            let mut drivers = self.drivers.write();
            let Some(pos) = drivers.iter().position(|r| r.name() == name) else {
                return;
            };
            drivers.remove(pos)
        };

        for dev in self.device_snapshot() {
            self.release_from(&dev, &record);
        }

        log::info!("Unregistered driver: {}", name);
    }

    fn emit_event(&self, dev: &Device, key: &str, value: &str) -> SdwResult<()> {
        self.events.lock().push(DeviceEvent {
            device: String::from(dev.name()),
            key: String::from(key),
            value: String::from(value),
        });
        Ok(())
    }
}

impl core::fmt::Debug for BusRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BusRegistry")
            .field("drivers", &self.list_drivers())
            .field("devices", &self.devices.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{
        register_controller_driver, register_peripheral_driver, unregister_peripheral_driver,
    };
    use crate::testing::{
        CallLog, RecordingPowerDomain, controller_on, peripheral_on, test_bus, test_bus_with,
    };
    use crate::{ControllerDriver, DeviceId, PeripheralDriver, PeripheralOps};

    static RT711: &[DeviceId] = crate::sdw_id_table![(0x025d, 0x0711)];
    static ANY_REALTEK: &[DeviceId] =
        crate::sdw_id_table![(0x025d, 0x0711), (0x025d, 0x1316)];

    #[test]
    fn test_add_device_publishes_modalias() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));

        registry.add_device(dev.clone()).expect("add should succeed");

        let events = registry.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device, dev.name());
        assert_eq!(events[0].key, "MODALIAS");
        assert_eq!(events[0].value, "sdw:m025Dp0711");
    }

    #[test]
    fn test_add_device_twice_fails() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));

        registry.add_device(dev.clone()).expect("add should succeed");
        assert_eq!(registry.add_device(dev), Err(SdwError::AlreadyRegistered));
    }

    #[test]
    fn test_driver_registration_binds_existing_devices() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        let other = Device::Peripheral(peripheral_on(&bus, 0x01fa, 0x4243));
        registry.add_device(dev.clone()).expect("add should succeed");
        registry.add_device(other.clone()).expect("add should succeed");

        let drv = PeripheralDriver::new("rt711", RT711).probe(|_, _| Ok(()));
        register_peripheral_driver(&registry, drv).expect("register should succeed");

        assert_eq!(registry.bound_driver(&dev), Some("rt711"));
        assert!(dev.bind_state().is_bound());
        assert_eq!(registry.bound_driver(&other), None);
        assert!(!other.bind_state().is_bound());
    }

    #[test]
    fn test_device_add_binds_to_registered_driver() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let drv = ControllerDriver::new("intel-sdw-link").probe(|_, _| Ok(()));
        register_controller_driver(&registry, drv).expect("register should succeed");

        let dev = Device::Controller(controller_on(&bus, "intel-sdw", 0));
        registry.add_device(dev.clone()).expect("add should succeed");

        assert_eq!(registry.bound_driver(&dev), Some("intel-sdw-link"));
        assert!(dev.bind_state().is_bound());
    }

    #[test]
    fn test_failed_probe_tries_next_driver() {
        let registry = BusRegistry::new();
        let bus = test_bus();

        let failing = PeripheralDriver::new("rt711-broken", RT711)
            .probe(|_, _| Err(SdwError::DriverProbe(-19)));
        let working = PeripheralDriver::new("realtek-generic", ANY_REALTEK).probe(|_, _| Ok(()));
        register_peripheral_driver(&registry, failing).expect("register should succeed");
        register_peripheral_driver(&registry, working).expect("register should succeed");

        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        registry.add_device(dev.clone()).expect("add should succeed");

        assert_eq!(registry.bound_driver(&dev), Some("realtek-generic"));
    }

    #[test]
    fn test_failed_probe_leaves_device_unbound() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let drv =
            PeripheralDriver::new("rt711", RT711).probe(|_, _| Err(SdwError::DriverProbe(-5)));
        register_peripheral_driver(&registry, drv).expect("register should succeed");

        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        registry.add_device(dev.clone()).expect("add should succeed");

        assert_eq!(registry.bound_driver(&dev), None);
        assert!(!dev.bind_state().is_probed());
        assert!(!dev.bind_state().probe_complete().is_done());
    }

    #[test]
    fn test_duplicate_driver_name_rejected() {
        let registry = BusRegistry::new();
        let first = PeripheralDriver::new("rt711", RT711).probe(|_, _| Ok(()));
        let second = PeripheralDriver::new("rt711", ANY_REALTEK).probe(|_, _| Ok(()));

        register_peripheral_driver(&registry, first).expect("register should succeed");
        assert_eq!(
            register_peripheral_driver(&registry, second),
            Err(SdwError::AlreadyRegistered)
        );
        assert_eq!(registry.list_drivers(), alloc::vec!["rt711"]);
    }

    #[test]
    fn test_unregister_runs_remove_and_detaches() {
        let registry = BusRegistry::new();
        let pm = Arc::new(RecordingPowerDomain::new());
        let bus = test_bus_with(pm.clone());
        let log = CallLog::new();

        let remove_log = log.clone();
        let drv = PeripheralDriver::new("rt711", RT711)
            .probe(|_, _| Ok(()))
            .remove(move |_| {
                remove_log.push("remove");
                Ok(())
            });
        register_peripheral_driver(&registry, drv).expect("register should succeed");

        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        registry.add_device(dev.clone()).expect("add should succeed");
        assert!(pm.is_attached(dev.name()));

        unregister_peripheral_driver(&registry, "rt711");

        assert_eq!(log.calls(), alloc::vec!["remove"]);
        assert!(!pm.is_attached(dev.name()));
        assert!(!dev.bind_state().is_bound());
        assert!(registry.driver("rt711").is_none());
    }

    #[test]
    fn test_rebind_after_unregister_releases_completion_again() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        registry.add_device(dev.clone()).expect("add should succeed");

        let drv = PeripheralDriver::new("rt711", RT711).probe(|_, _| Ok(()));
        register_peripheral_driver(&registry, drv).expect("register should succeed");
        unregister_peripheral_driver(&registry, "rt711");
        assert!(!dev.bind_state().is_bound());

        let drv = PeripheralDriver::new("rt711", RT711).probe(|_, _| Ok(()));
        register_peripheral_driver(&registry, drv).expect("register should succeed");

        assert!(dev.bind_state().is_bound());
        assert_eq!(dev.bind_state().probe_complete().releases(), 2);
    }

    #[test]
    fn test_remove_device_unbinds() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let drv = PeripheralDriver::new("rt711", RT711).probe(|_, _| Ok(()));
        register_peripheral_driver(&registry, drv).expect("register should succeed");
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        registry.add_device(dev.clone()).expect("add should succeed");

        registry.remove_device(&dev).expect("remove should succeed");

        assert!(!dev.bind_state().is_bound());
        assert!(registry.list_devices().is_empty());
        assert_eq!(registry.remove_device(&dev), Err(SdwError::NotFound));
    }

    #[test]
    fn test_shutdown_reaches_bound_devices() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let log = CallLog::new();

        let shutdown_log = log.clone();
        let drv = ControllerDriver::new("intel-sdw")
            .probe(|_, _| Ok(()))
            .shutdown(move |c| {
                shutdown_log.push_owned(alloc::format!("shutdown {}", c.link_id()));
            });
        register_controller_driver(&registry, drv).expect("register should succeed");

        registry
            .add_device(Device::Controller(controller_on(&bus, "intel-sdw", 1)))
            .expect("add should succeed");
        registry
            .add_device(Device::Controller(controller_on(&bus, "amd-sdw", 2)))
            .expect("add should succeed");

        registry.shutdown();

        assert_eq!(log.calls(), alloc::vec!["shutdown 1"]);
    }

    #[test]
    fn test_unregister_without_remove_hook_detaches() {
        let registry = BusRegistry::new();
        let pm = Arc::new(RecordingPowerDomain::new());
        let bus = test_bus_with(pm.clone());
        let periph = peripheral_on(&bus, 0x025d, 0x0711);
        let dev = Device::Peripheral(periph.clone());
        registry.add_device(dev.clone()).expect("add should succeed");

        let probe_only = || {
            PeripheralDriver::new("rt711", RT711)
                .probe(|_, _| Ok(()))
                .ops(PeripheralOps::new().read_prop(|_| Ok(())))
        };

        register_peripheral_driver(&registry, probe_only()).expect("register should succeed");
        assert_eq!((pm.attach_calls(), pm.detach_calls()), (1, 0));
        assert!(periph.ops().is_some());

        unregister_peripheral_driver(&registry, "rt711");
        assert!(!dev.bind_state().is_bound());
        assert!(!pm.is_attached(dev.name()));
        assert_eq!((pm.attach_calls(), pm.detach_calls()), (1, 1));
        assert!(periph.ops().is_none());

        register_peripheral_driver(&registry, probe_only()).expect("register should succeed");
        assert!(dev.bind_state().is_bound());
        assert!(pm.is_attached(dev.name()));
        assert_eq!((pm.attach_calls(), pm.detach_calls()), (2, 1));
    }

    #[test]
    fn test_driver_unregistered_mid_attach_is_skipped() {
        static REGISTRY: BusRegistry = BusRegistry::new();
        let bus = test_bus();

        let first = PeripheralDriver::new("first", ANY_REALTEK).probe(|_, _| {
            unregister_peripheral_driver(&REGISTRY, "second");
            Err(SdwError::DriverProbe(-19))
        });
        let second = PeripheralDriver::new("second", RT711).probe(|_, _| Ok(()));
        register_peripheral_driver(&REGISTRY, first).expect("register should succeed");
        register_peripheral_driver(&REGISTRY, second).expect("register should succeed");

        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));
        REGISTRY.add_device(dev.clone()).expect("add should succeed");

        assert_eq!(REGISTRY.list_drivers(), alloc::vec!["first"]);
        assert_eq!(REGISTRY.bound_driver(&dev), None);
        assert!(!dev.bind_state().is_probed());
    }

    #[test]
    fn test_concurrent_add_of_same_device() {
        let registry = BusRegistry::new();
        let bus = test_bus();
        let dev = Device::Peripheral(peripheral_on(&bus, 0x025d, 0x0711));

        let results: Vec<SdwResult<()>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let registry = &registry;
                    let dev = dev.clone();
                    s.spawn(move || registry.add_device(dev))
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("worker panicked"))
                .collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(registry.list_devices().len(), 1);
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn test_renamed_bus_publishes_configured_key() {
        let registry = BusRegistry::new();
        let config = crate::BusConfig::new().name("sdw-test").modalias_key("SDW_ALIAS");
        let bus = Arc::new(crate::Bus::new(5, config));
        let dev = Device::Controller(controller_on(&bus, "intel-sdw", 5));

        registry.add_device(dev).expect("add should succeed");

        assert_eq!(bus.config().name, "sdw-test");
        let events = registry.events();
        assert_eq!(events[0].key, "SDW_ALIAS");
        assert_eq!(events[0].value, "sdw:intel-sdw");
    }
}

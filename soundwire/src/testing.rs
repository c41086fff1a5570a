//! Test doubles shared by the unit tests.

use crate::bus::Bus;
use crate::completion::Clock;
use crate::config::BusConfig;
use crate::controller::Controller;
use crate::device::{Device, SdwDevice};
use crate::id::DeviceId;
use crate::peripheral::Peripheral;
use crate::power::PowerDomain;
use crate::register::{DeviceRegistry, DriverRecord};
use crate::{SdwError, SdwResult};
use spin::Mutex;
use std::string::{String, ToString};
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::vec::Vec;

/// Wall clock for completion timeouts
pub struct StdClock(Instant);

impl StdClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.0.elapsed()
    }
}

pub fn test_bus() -> Arc<Bus> {
    Arc::new(Bus::new(0, BusConfig::new()))
}

pub fn test_bus_with(pm: Arc<dyn PowerDomain>) -> Arc<Bus> {
    Arc::new(Bus::with_power_domain(0, BusConfig::new(), pm))
}

pub fn peripheral_on(bus: &Arc<Bus>, mfg_id: u16, part_id: u16) -> Arc<Peripheral> {
    Arc::new(Peripheral::new(bus.clone(), DeviceId::new(mfg_id, part_id)))
}

pub fn controller_on(bus: &Arc<Bus>, master_name: &str, link_id: u32) -> Arc<Controller> {
    Arc::new(Controller::new(bus.clone(), master_name, link_id, None))
}

/// Ordered record of driver callbacks
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: &str) {
        self.0.lock().push(call.to_string());
    }

    pub fn push_owned(&self, call: String) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

// =============================================================================
// Power Domain
// =============================================================================

/// Power domain that tracks which devices are attached
#[derive(Default)]
pub struct RecordingPowerDomain {
    attached: Mutex<Vec<String>>,
    attach_calls: Mutex<u32>,
    detach_calls: Mutex<u32>,
    power_on_requests: Mutex<u32>,
    fail_attach: Mutex<Option<SdwError>>,
}

impl RecordingPowerDomain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_attach(&self, err: Option<SdwError>) {
        *self.fail_attach.lock() = err;
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.attached.lock().iter().any(|n| n == name)
    }

    pub fn attach_calls(&self) -> u32 {
        *self.attach_calls.lock()
    }

    pub fn detach_calls(&self) -> u32 {
        *self.detach_calls.lock()
    }

    pub fn power_on_requests(&self) -> u32 {
        *self.power_on_requests.lock()
    }
}

impl PowerDomain for RecordingPowerDomain {
    fn attach(&self, dev: &dyn SdwDevice, power_on: bool) -> SdwResult<()> {
        *self.attach_calls.lock() += 1;
        if power_on {
            *self.power_on_requests.lock() += 1;
        }
        if let Some(err) = self.fail_attach.lock().clone() {
            return Err(err);
        }
        self.attached.lock().push(dev.name().to_string());
        Ok(())
    }

    fn detach(&self, dev: &dyn SdwDevice, _power_on: bool) {
        *self.detach_calls.lock() += 1;
        self.attached.lock().retain(|n| n != dev.name());
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Registry that stores records and events without binding anything
#[derive(Default)]
pub struct RecordingRegistry {
    records: Mutex<Vec<Arc<DriverRecord>>>,
    events: Mutex<Vec<(String, String, String)>>,
    register_calls: Mutex<usize>,
    fail_register: Mutex<Option<SdwError>>,
    fail_events: Mutex<bool>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_register(&self, err: Option<SdwError>) {
        *self.fail_register.lock() = err;
    }

    pub fn fail_events(&self, fail: bool) {
        *self.fail_events.lock() = fail;
    }

    pub fn register_calls(&self) -> usize {
        *self.register_calls.lock()
    }

    pub fn record(&self, name: &str) -> Option<Arc<DriverRecord>> {
        self.records.lock().iter().find(|r| r.name() == name).cloned()
    }

    /// Events as `(device, key, value)`
    pub fn events(&self) -> Vec<(String, String, String)> {
        self.events.lock().clone()
    }
}

impl DeviceRegistry for RecordingRegistry {
    fn register_driver(&self, record: DriverRecord) -> SdwResult<()> {
        *self.register_calls.lock() += 1;
        if let Some(err) = self.fail_register.lock().clone() {
            return Err(err);
        }
        self.records.lock().push(Arc::new(record));
        Ok(())
    }

    fn unregister_driver(&self, name: &str) {
        self.records.lock().retain(|r| r.name() != name);
    }

    fn emit_event(&self, dev: &Device, key: &str, value: &str) -> SdwResult<()> {
        if *self.fail_events.lock() {
            return Err(SdwError::Registry(-12));
        }
        self.events
            .lock()
            .push((dev.name().to_string(), key.to_string(), value.to_string()));
        Ok(())
    }
}

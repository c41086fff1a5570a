//! # Helix SoundWire Bus
//!
//! Binding core of the SoundWire bus. It decides which registered driver fits a
//! discovered device and runs the probe/remove/shutdown lifecycle of the resulting
//! pair:
//!
//! - Identity tables and the bus match predicate
//! - Modalias formatting and uevent publication
//! - A bind protocol shared by peripheral and controller devices
//! - Power-domain attach/detach around the bound lifetime
//! - A one-shot completion callers can wait on for probe to finish
//! - Driver registration with conditional remove/shutdown hooks
//!
//! ## Device Classes
//!
//! - **Peripherals** (`sdw_slave`): matched by manufacturer/part id
//! - **Controllers** (`sdw_master`): matched by name, no hardware identity available
//!
//! ## Bind Lifecycle
//!
//! 1. Registration (driver record with installed hooks)
//! 2. Match
//! 3. Power-domain attach
//! 4. Driver probe (rolled back on failure)
//! 5. Property read and clock-stop timeout negotiation
//! 6. Probe completion
//! 7. Remove / Shutdown

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod bind;
pub mod bus;
pub mod completion;
pub mod config;
pub mod controller;
pub mod device;
pub mod driver;
pub mod id;
pub mod matching;
pub mod modalias;
pub mod peripheral;
pub mod power;
pub mod register;
pub mod registry;

#[cfg(test)]
mod testing;

pub use bind::ClassDriver;
pub use bus::Bus;
pub use completion::{Clock, Completion};
pub use config::BusConfig;
pub use controller::Controller;
pub use device::{BindState, Device, DeviceKind, SdwDevice};
pub use driver::{ControllerDriver, Driver, PeripheralDriver, PeripheralOps, PlatformData};
pub use id::DeviceId;
pub use matching::bus_match;
pub use modalias::{Modalias, modalias, uevent};
pub use peripheral::{Peripheral, PeripheralProps};
pub use power::{NoPowerDomain, PowerDomain};
pub use register::{
    BindHooks, DeviceRegistry, DriverRecord, register_controller_driver,
    register_peripheral_driver, unregister_controller_driver, unregister_peripheral_driver,
};
pub use registry::BusRegistry;

/// Bus result type
pub type SdwResult<T> = Result<T, SdwError>;

/// SoundWire bus errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdwError {
    /// No identity table entry matches the device
    NotFound,
    /// Driver record is missing its mandatory probe routine
    InvalidDriver,
    /// Hook dispatched with a device or driver of the wrong class
    InvalidDevice,
    /// Power-domain collaborator failed
    PowerDomain(i32),
    /// Driver probe callback failed
    DriverProbe(i32),
    /// Driver remove callback failed
    DriverRemove(i32),
    /// Driver name or device already registered
    AlreadyRegistered,
    /// Registry refused the operation
    Registry(i32),
    /// No room left for an event variable
    NoMemory,
}

impl core::fmt::Display for SdwError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no matching device id"),
            Self::InvalidDriver => write!(f, "driver has no probe routine"),
            Self::InvalidDevice => write!(f, "device and driver class mismatch"),
            Self::PowerDomain(code) => write!(f, "power domain error {}", code),
            Self::DriverProbe(code) => write!(f, "driver probe error {}", code),
            Self::DriverRemove(code) => write!(f, "driver remove error {}", code),
            Self::AlreadyRegistered => write!(f, "already registered"),
            Self::Registry(code) => write!(f, "registry error {}", code),
            Self::NoMemory => write!(f, "out of event memory"),
        }
    }
}

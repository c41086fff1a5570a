//! # Bus Instance
//!
//! State shared by every device on one SoundWire link.

use crate::config::BusConfig;
use crate::power::{NoPowerDomain, PowerDomain};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

/// One SoundWire bus (link)
pub struct Bus {
    /// Link number
    link_id: u32,
    /// Bus-wide clock-stop timeout (ms), only ever raised
    clk_stop_timeout: AtomicU32,
    /// Power domain devices on this bus attach to
    power_domain: Arc<dyn PowerDomain>,
    /// Tunables
    config: BusConfig,
}

impl Bus {
    /// Create a bus with no power domain
    pub fn new(link_id: u32, config: BusConfig) -> Self {
        Self::with_power_domain(link_id, config, Arc::new(NoPowerDomain))
    }

    /// Create a bus whose devices attach to `power_domain`
    pub fn with_power_domain(
        link_id: u32,
        config: BusConfig,
        power_domain: Arc<dyn PowerDomain>,
    ) -> Self {
        Self {
            link_id,
            clk_stop_timeout: AtomicU32::new(config.initial_clk_stop_timeout),
            power_domain,
            config,
        }
    }

    /// Link number
    pub fn link_id(&self) -> u32 {
        self.link_id
    }

    /// Bus configuration
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Power domain of this bus
    pub fn power_domain(&self) -> &dyn PowerDomain {
        &*self.power_domain
    }

    /// Current bus-wide clock-stop timeout (ms)
    pub fn clk_stop_timeout(&self) -> u32 {
        self.clk_stop_timeout.load(Ordering::Acquire)
    }

    /// Raise the bus-wide clock-stop timeout to at least `ms`
    ///
    /// Returns the effective timeout after the update.
    pub fn raise_clk_stop_timeout(&self, ms: u32) -> u32 {
        let previous = self.clk_stop_timeout.fetch_max(ms, Ordering::AcqRel);
        previous.max(ms)
    }
}

impl core::fmt::Debug for Bus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bus")
            .field("link_id", &self.link_id)
            .field("clk_stop_timeout", &self.clk_stop_timeout())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

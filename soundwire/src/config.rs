//! # Bus Configuration
//!
//! Per-bus tunables, built the same way as module metadata.

/// Worst-case clock-stop timeout allowed by MIPI DisCo, in milliseconds
pub const DISCO_CLK_STOP_TIMEOUT_MS: u32 = 300;

/// Bus type name
pub const BUS_NAME: &str = "soundwire";

/// Event variable carrying the modalias
pub const MODALIAS_KEY: &str = "MODALIAS";

/// Bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Bus type name
    pub name: &'static str,
    /// Clock-stop timeout given to peripherals that declare none (ms)
    pub fallback_clk_stop_timeout: u32,
    /// Bus-wide clock-stop timeout before any peripheral probes (ms)
    pub initial_clk_stop_timeout: u32,
    /// Event variable name used to publish the modalias
    pub modalias_key: &'static str,
}

impl BusConfig {
    /// Create the default configuration
    pub const fn new() -> Self {
        Self {
            name: BUS_NAME,
            fallback_clk_stop_timeout: DISCO_CLK_STOP_TIMEOUT_MS,
            initial_clk_stop_timeout: 0,
            modalias_key: MODALIAS_KEY,
        }
    }

    /// Set bus name
    pub const fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set fallback clock-stop timeout
    pub const fn fallback_clk_stop_timeout(mut self, ms: u32) -> Self {
        self.fallback_clk_stop_timeout = ms;
        self
    }

    /// Set initial bus clock-stop timeout
    pub const fn initial_clk_stop_timeout(mut self, ms: u32) -> Self {
        self.initial_clk_stop_timeout = ms;
        self
    }

    /// Set modalias event key
    pub const fn modalias_key(mut self, key: &'static str) -> Self {
        self.modalias_key = key;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}

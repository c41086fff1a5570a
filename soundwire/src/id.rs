//! # Device Identity
//!
//! Peripheral identity and the driver-side identity tables matched against it.

/// Peripheral identity (manufacturer id, part id)
///
/// A table entry with `mfg_id == 0` is the sentinel that ends an identity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    /// MIPI manufacturer id
    pub mfg_id: u16,
    /// Vendor-defined part id
    pub part_id: u16,
}

impl DeviceId {
    /// Table terminator
    pub const SENTINEL: Self = Self { mfg_id: 0, part_id: 0 };

    /// Create a new identity
    pub const fn new(mfg_id: u16, part_id: u16) -> Self {
        Self { mfg_id, part_id }
    }

    /// Check if this entry terminates a table
    pub const fn is_sentinel(&self) -> bool {
        self.mfg_id == 0
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.mfg_id, self.part_id)
    }
}

/// Iterate the live entries of an identity table.
///
/// Stops at the first sentinel, or at the end of the slice if the table
/// carries none.
pub fn entries(table: &[DeviceId]) -> impl Iterator<Item = &DeviceId> {
    table.iter().take_while(|id| !id.is_sentinel())
}

/// Declare a sentinel-terminated identity table
///
/// ```rust,ignore
/// static IDS: &[DeviceId] = sdw_id_table![(0x025d, 0x0711), (0x025d, 0x1316)];
/// ```
#[macro_export]
macro_rules! sdw_id_table {
    ($(($mfg:expr, $part:expr)),* $(,)?) => {
        &[
            $($crate::id::DeviceId::new($mfg, $part),)*
            $crate::id::DeviceId::SENTINEL,
        ]
    };
}

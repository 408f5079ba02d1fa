// Licensed under the Apache-2.0 license

use crate::error::PmError;

/// Index into the boot-ROM's resident service table.
///
/// The table is fixed before this firmware ever runs; the engine calls
/// entries by number and never overrides or reimplements them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomServiceId(pub u8);

/// The delegated ROM service seam.
///
/// One-way dependency: some reset pulses and power-island sequences are
/// forwarded wholesale to a pre-existing boot-resident routine. Statuses
/// coming back are returned to the caller unchanged.
pub trait RomServices {
    fn call(&mut self, service: RomServiceId) -> Result<(), PmError>;
}

// Licensed under the Apache-2.0 license

use crate::{Mmio, RegBit};

/// A bounded poll ran out of attempts before the condition held.
///
/// The budget is a fixed iteration count, never wall-clock time: the engine
/// runs to completion inside a single dispatch and the only thing it may
/// wait on is a hardware status bit with a known worst-case settle time.
/// Hosted targets may back an attempt with a monotonic-clock deadline, but
/// the contract stays bounded either way so tests are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollExpired;

/// Poll until every bit of `bit.mask` reads set, at most `max_attempts` reads.
pub fn poll_set<M: Mmio + ?Sized>(
    mmio: &mut M,
    bit: RegBit,
    max_attempts: u32,
) -> Result<(), PollExpired> {
    for _ in 0..max_attempts {
        if (mmio.read32(bit.addr) & bit.mask) == bit.mask {
            return Ok(());
        }
    }
    Err(PollExpired)
}

/// Poll until every bit of `bit.mask` reads clear, at most `max_attempts` reads.
pub fn poll_clear<M: Mmio + ?Sized>(
    mmio: &mut M,
    bit: RegBit,
    max_attempts: u32,
) -> Result<(), PollExpired> {
    for _ in 0..max_attempts {
        if (mmio.read32(bit.addr) & bit.mask) == 0 {
            return Ok(());
        }
    }
    Err(PollExpired)
}

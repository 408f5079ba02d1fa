// Licensed under the Apache-2.0 license

//! Host-side register file for exercising the power-management engine.
//!
//! `MockMmio` keeps a sparse map of 32-bit registers and records every write
//! and delay in order, so tests can assert on exact hardware sequences (a
//! reset pulse writing set-then-clear, a PLL bypass strictly preceding a
//! reset assert, and so on). Reads are not traced; polling loops would bury
//! the interesting events.

use pm_hal::Mmio;
use std::collections::BTreeMap;

/// One observable hardware event, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Write { addr: u32, value: u32 },
    Delay { us: u32 },
}

/// A read-side script: after `after_reads` further reads of an address,
/// apply the OR and AND masks to the stored value. Used to model status
/// bits that move on their own, such as a PLL lock indication coming up or
/// an island power status dropping.
struct ReadLatch {
    after_reads: u32,
    or_mask: u32,
    and_mask: u32,
}

#[derive(Default)]
pub struct MockMmio {
    regs: BTreeMap<u32, u32>,
    latches: BTreeMap<u32, ReadLatch>,
    trace: Vec<TraceEvent>,
}

impl MockMmio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a register value without it appearing in the trace.
    pub fn preload(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
    }

    /// Current value of a register (0 if never touched).
    pub fn value(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Arrange for `mask` to read as set at `addr` after `after_reads` more
    /// reads of that address. `0` means the very next read already sees it.
    pub fn latch_bit_after_reads(&mut self, addr: u32, mask: u32, after_reads: u32) {
        self.latches.insert(
            addr,
            ReadLatch {
                after_reads,
                or_mask: mask,
                and_mask: !0,
            },
        );
    }

    /// Arrange for `mask` to read as clear at `addr` after `after_reads`
    /// more reads of that address.
    pub fn clear_bit_after_reads(&mut self, addr: u32, mask: u32, after_reads: u32) {
        self.latches.insert(
            addr,
            ReadLatch {
                after_reads,
                or_mask: 0,
                and_mask: !mask,
            },
        );
    }

    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Every value written to `addr`, in order.
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.trace
            .iter()
            .filter_map(|ev| match ev {
                TraceEvent::Write { addr: a, value } if *a == addr => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl Mmio for MockMmio {
    fn read32(&mut self, addr: u32) -> u32 {
        if let Some(latch) = self.latches.get_mut(&addr) {
            if latch.after_reads == 0 {
                let (or_mask, and_mask) = (latch.or_mask, latch.and_mask);
                self.latches.remove(&addr);
                let v = self.regs.entry(addr).or_insert(0);
                *v = (*v | or_mask) & and_mask;
            } else {
                latch.after_reads -= 1;
            }
        }
        self.value(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
        self.trace.push(TraceEvent::Write { addr, value });
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.push(TraceEvent::Delay { us });
    }
}

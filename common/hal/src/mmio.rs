// Licensed under the Apache-2.0 license

/// One control or status bit (or group of bits) in a 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegBit {
    pub addr: u32,
    pub mask: u32,
}

impl RegBit {
    pub const fn new(addr: u32, mask: u32) -> Self {
        RegBit { addr, mask }
    }
}

/// A bit field described by register address, shift and width.
///
/// This is the shape in which the SoC memory map hands out PLL parameter
/// locations: the engine validates values against `max_value()` and performs
/// read-modify-write at the shift/width, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegField {
    pub addr: u32,
    pub shift: u32,
    pub width: u32,
}

impl RegField {
    pub const fn new(addr: u32, shift: u32, width: u32) -> Self {
        RegField { addr, shift, width }
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u32 {
        ((1u64 << self.width) - 1) as u32
    }

    /// Field mask positioned within the register.
    pub const fn mask(&self) -> u32 {
        self.max_value() << self.shift
    }
}

/// Access to the memory-mapped register space.
///
/// Reads and writes never fail; a register access that would fault is a
/// platform integration bug, not a runtime condition the engine handles.
/// `delay_us` exists for the few reset sequences that need a settle time
/// between edges and defaults to a no-op on hosts with no notion of one.
pub trait Mmio {
    fn read32(&mut self, addr: u32) -> u32;
    fn write32(&mut self, addr: u32, value: u32);

    fn delay_us(&mut self, _us: u32) {}

    /// Read-modify-write: bits selected by `mask` take `value`, the rest are
    /// preserved.
    fn rmw32(&mut self, addr: u32, mask: u32, value: u32) {
        let old = self.read32(addr);
        self.write32(addr, (old & !mask) | (value & mask));
    }

    fn set_bits(&mut self, bit: RegBit) {
        self.rmw32(bit.addr, bit.mask, bit.mask);
    }

    fn clear_bits(&mut self, bit: RegBit) {
        self.rmw32(bit.addr, bit.mask, 0);
    }

    /// True when every bit of the mask reads back set.
    fn bit_is_set(&mut self, bit: RegBit) -> bool {
        (self.read32(bit.addr) & bit.mask) == bit.mask
    }

    fn read_field(&mut self, field: RegField) -> u32 {
        (self.read32(field.addr) >> field.shift) & field.max_value()
    }

    fn write_field(&mut self, field: RegField, value: u32) {
        self.rmw32(field.addr, field.mask(), value << field.shift);
    }
}

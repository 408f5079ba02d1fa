// Licensed under the Apache-2.0 license

//! Reset lines: assert/release/pulse control over a heterogeneous set of
//! hardware reset mechanisms, plus the per-line access masks consulted by
//! the request dispatcher.
//!
//! Line identifiers are offset by [`RESET_ID_BASE`] on the wire so they
//! cannot be confused with other resource identifiers.

use crate::error::PmError;
use crate::node::IpiMask;
use crate::rom::{RomServiceId, RomServices};
use crate::subsystem::PmSubsystem;
use num_enum::TryFromPrimitive;
use pm_hal::{Mmio, RegBit};

/// First reset line identifier on the wire.
pub const RESET_ID_BASE: u32 = 1000;

/// GPIO bank output registers drive pins in their low half and carry the
/// per-pin write mask in the upper half; a cleared mask bit selects the pin.
const GPIO_PIN_MASK_BITS: u32 = 0xffff_0000;
/// Settle time between the edges of a GPIO-driven pulse.
const GPIO_PULSE_DELAY_US: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum ResetAction {
    Release = 0,
    Assert = 1,
    Pulse = 2,
}

/// Hardware mechanism behind one reset line.
#[derive(Debug, Clone, Copy)]
pub enum ResetLineVariant {
    /// Level-controlled bit in a reset register.
    Generic { ctrl: RegBit },
    /// Control bit with the asserted level read back from a separate
    /// status register at the same mask position.
    Gpo { ctrl: RegBit, status_addr: u32 },
    /// Control bit whose pulse is delegated to a ROM-resident routine.
    /// Lines with `has_assert` false are pulse-only.
    Rom {
        ctrl: RegBit,
        has_assert: bool,
        service: RomServiceId,
    },
    /// Programmable-logic reset, fully forwarded to the platform hooks.
    Pl,
    /// Reset wired through a GPIO bank pin. Pulse-only.
    GpioBankIo {
        mask_data: u32,
        direction: u32,
        read_data: u32,
        /// True when the pin lives in the bank's lower-half data register.
        is_mask_data_lsw: bool,
        line: u8,
    },
}

/// Platform description of one reset line.
pub struct ResetConfig {
    pub variant: ResetLineVariant,
}

pub(crate) struct ResetLine {
    pub(crate) variant: ResetLineVariant,
    pub(crate) access: IpiMask,
}

impl ResetLine {
    pub(crate) fn new(cfg: &ResetConfig) -> Self {
        ResetLine {
            variant: cfg.variant,
            access: IpiMask::EMPTY,
        }
    }
}

/// Platform-supplied handling for programmable-logic resets.
///
/// The engine has no insight into the fabric; platforms that carry no
/// programmable logic keep the defaults, which report the line released
/// and do nothing.
pub trait PlHooks {
    fn reset_assert(&mut self, _action: ResetAction) {}

    /// Asserted level of the fabric reset: 1 asserted, 0 released.
    fn reset_get_status(&mut self) -> u32 {
        0
    }

    fn reset_pulse(&mut self) -> Result<(), PmError> {
        Ok(())
    }
}

/// Default hooks for platforms without programmable logic.
pub struct NoOpPlHooks;

impl PlHooks for NoOpPlHooks {}

/// Pulse a reset wired through a GPIO bank pin.
///
/// The pin is switched to output, then driven through assert, release and
/// assert edges with a settle delay after each. The sequence ends with the
/// line asserted.
fn gpio_pulse<M: Mmio + ?Sized>(
    mmio: &mut M,
    mask_data: u32,
    direction: u32,
    is_mask_data_lsw: bool,
    line: u8,
) {
    let dirm_shift = if is_mask_data_lsw { 0 } else { 16 };
    mmio.set_bits(RegBit::new(direction, 1 << (dirm_shift + u32::from(line))));

    let select = !(1u32 << (16 + u32::from(line)));
    let assert_value = ((1 << line) | GPIO_PIN_MASK_BITS) & select;
    let release_value = GPIO_PIN_MASK_BITS & select;

    mmio.write32(mask_data, assert_value);
    mmio.delay_us(GPIO_PULSE_DELAY_US);
    mmio.write32(mask_data, release_value);
    mmio.delay_us(GPIO_PULSE_DELAY_US);
    mmio.write32(mask_data, assert_value);
    mmio.delay_us(GPIO_PULSE_DELAY_US);
}

impl<M: Mmio, R: RomServices, P: PlHooks> PmSubsystem<M, R, P> {
    fn reset_index(&self, id: u32) -> Result<usize, PmError> {
        let idx = id
            .checked_sub(RESET_ID_BASE)
            .ok_or(PmError::InvalidParam)? as usize;
        if idx >= self.resets.len() {
            return Err(PmError::InvalidParam);
        }
        Ok(idx)
    }

    /// Apply an action to a reset line.
    ///
    /// Pulse-only lines refuse level actions with `InvalidParam`. ROM
    /// pulse statuses come back to the caller unchanged.
    pub fn reset_assert(&mut self, id: u32, action: ResetAction) -> Result<(), PmError> {
        let idx = self.reset_index(id)?;
        let Self {
            mmio,
            rom,
            pl,
            resets,
            ..
        } = self;
        let variant = resets[idx].variant;
        match action {
            ResetAction::Assert | ResetAction::Release => {
                let asserted = action == ResetAction::Assert;
                let ctrl = match variant {
                    ResetLineVariant::Generic { ctrl } => ctrl,
                    ResetLineVariant::Gpo { ctrl, .. } => ctrl,
                    ResetLineVariant::Rom {
                        ctrl,
                        has_assert: true,
                        ..
                    } => ctrl,
                    ResetLineVariant::Pl => {
                        pl.reset_assert(action);
                        return Ok(());
                    }
                    // Pulse-only lines have no level control.
                    ResetLineVariant::Rom {
                        has_assert: false, ..
                    }
                    | ResetLineVariant::GpioBankIo { .. } => {
                        return Err(PmError::InvalidParam);
                    }
                };
                if asserted {
                    mmio.set_bits(ctrl);
                } else {
                    mmio.clear_bits(ctrl);
                }
                Ok(())
            }
            ResetAction::Pulse => match variant {
                ResetLineVariant::Generic { ctrl } | ResetLineVariant::Gpo { ctrl, .. } => {
                    mmio.set_bits(ctrl);
                    mmio.clear_bits(ctrl);
                    Ok(())
                }
                ResetLineVariant::Rom { service, .. } => rom.call(service),
                ResetLineVariant::Pl => pl.reset_pulse(),
                ResetLineVariant::GpioBankIo {
                    mask_data,
                    direction,
                    is_mask_data_lsw,
                    line,
                    ..
                } => {
                    gpio_pulse(mmio, mask_data, direction, is_mask_data_lsw, line);
                    Ok(())
                }
            },
        }
    }

    /// Asserted level of a reset line: 1 asserted, 0 released.
    pub fn reset_get_status(&mut self, id: u32) -> Result<u32, PmError> {
        let idx = self.reset_index(id)?;
        let Self {
            mmio, pl, resets, ..
        } = self;
        let asserted = match resets[idx].variant {
            ResetLineVariant::Generic { ctrl } | ResetLineVariant::Rom { ctrl, .. } => {
                mmio.bit_is_set(ctrl)
            }
            ResetLineVariant::Gpo { ctrl, status_addr } => {
                (mmio.read32(status_addr) & ctrl.mask) == ctrl.mask
            }
            ResetLineVariant::Pl => return Ok(pl.reset_get_status()),
            ResetLineVariant::GpioBankIo {
                read_data, line, ..
            } => (mmio.read32(read_data) >> (16 + u32::from(line))) & 1 == 1,
        };
        Ok(u32::from(asserted))
    }

    /// Replace the set of masters allowed to control a reset line.
    pub fn reset_set_config(&mut self, id: u32, access: IpiMask) -> Result<(), PmError> {
        let idx = self.reset_index(id)?;
        self.resets[idx].access = access;
        Ok(())
    }

    /// Clear every line's access mask; until reconfigured, no master may
    /// control any reset.
    pub fn reset_clear_config(&mut self) {
        for line in &mut self.resets {
            line.access = IpiMask::EMPTY;
        }
    }

    pub fn reset_has_access(&self, master: IpiMask, id: u32) -> Result<bool, PmError> {
        let idx = self.reset_index(id)?;
        Ok(self.resets[idx].access.permits(master))
    }
}

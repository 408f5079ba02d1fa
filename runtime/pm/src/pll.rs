// Licensed under the Apache-2.0 license

//! PLL lifecycle: suspend/resume around use counting, lock sequencing,
//! tuning-parameter access and integer/fractional mode switching.
//!
//! Each PLL owns a control, configuration and fractional register plus a
//! lock status bit. While a PLL is suspended its three registers are held
//! in a saved context; the saved flag is true exactly between a suspend and
//! the following resume. Lock waits are bounded polls, never unbounded
//! spins.

use crate::error::PmError;
use crate::node::{DomainId, IpiMask, Node, NodeFlags, PllId};
use crate::power;
use crate::reset::PlHooks;
use crate::rom::RomServices;
use crate::subsystem::PmSubsystem;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use pm_hal::{poll_set, Mmio, RegBit, RegField};

/// Control register: hold-in-reset bit.
pub const PLL_CTRL_RESET: u32 = 1 << 0;
/// Control register: bypass bit, output follows the reference clock.
pub const PLL_CTRL_BYPASS: u32 = 1 << 3;
/// Fractional register: fractional mode enable.
pub const PLL_FRAC_ENABLED: u32 = 1 << 31;
/// Attempt budget for the lock status bit after releasing reset.
pub const PLL_LOCK_POLL_ATTEMPTS: u32 = 0x10000;

/// Register block of one PLL.
#[derive(Debug, Clone, Copy)]
pub struct PllRegs {
    pub ctrl: u32,
    pub cfg: u32,
    pub frac: u32,
    pub lock: RegBit,
    /// Error-interrupt enable bits masked out around glitch-prone
    /// reprogramming windows, absent on PLLs with no such wiring.
    pub error_irq: Option<RegBit>,
}

/// Saved register snapshot, valid only while `saved` is true.
#[derive(Debug, Clone, Copy, Default)]
struct PllContext {
    ctrl: u32,
    cfg: u32,
    frac: u32,
    saved: bool,
}

/// Platform description of one PLL.
pub struct PllConfig {
    pub name: &'static str,
    pub parent: Option<DomainId>,
    pub regs: PllRegs,
    /// Changing the feedback divisor retunes the output for every consumer,
    /// so it is refused while the PLL is shared.
    pub exclusive_fbdiv: bool,
}

pub struct PllNode {
    pub(crate) node: Node,
    regs: PllRegs,
    ctx: PllContext,
    /// Clock consumers currently attached downstream.
    child_count: u32,
    exclusive_fbdiv: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PllState {
    Reset = 0,
    Locked = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum PllMode {
    Reset = 0,
    Integer = 1,
    Fractional = 2,
}

/// Tunable PLL parameters and where each lives in the register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum PllParam {
    Div2 = 0,
    FbDiv = 1,
    Data = 2,
    PreSrc = 3,
    PostSrc = 4,
    LockDly = 5,
    LockCnt = 6,
    Lfhf = 7,
    Cp = 8,
    Res = 9,
}

impl PllParam {
    fn field(self, regs: &PllRegs) -> RegField {
        match self {
            PllParam::Div2 => RegField::new(regs.ctrl, 16, 1),
            PllParam::FbDiv => RegField::new(regs.ctrl, 8, 7),
            PllParam::Data => RegField::new(regs.frac, 0, 16),
            PllParam::PreSrc => RegField::new(regs.ctrl, 20, 3),
            PllParam::PostSrc => RegField::new(regs.ctrl, 24, 3),
            PllParam::LockDly => RegField::new(regs.cfg, 25, 7),
            PllParam::LockCnt => RegField::new(regs.cfg, 13, 10),
            PllParam::Lfhf => RegField::new(regs.cfg, 10, 2),
            PllParam::Cp => RegField::new(regs.cfg, 5, 4),
            PllParam::Res => RegField::new(regs.cfg, 0, 4),
        }
    }
}

impl PllNode {
    pub(crate) fn new(cfg: &PllConfig) -> Self {
        PllNode {
            node: Node::new(cfg.name, cfg.parent),
            regs: cfg.regs,
            ctx: PllContext::default(),
            child_count: 0,
            exclusive_fbdiv: cfg.exclusive_fbdiv,
        }
    }

    pub fn name(&self) -> &'static str {
        self.node.name
    }

    pub(crate) fn clear_config(&mut self) {
        self.ctx.saved = false;
        self.child_count = 0;
    }

    fn state(&self) -> PllState {
        if self.node.state == PllState::Locked as u8 {
            PllState::Locked
        } else {
            PllState::Reset
        }
    }

    fn set_state(&mut self, state: PllState) {
        self.node.state = state as u8;
    }
}

/// Mask the PLL's error interrupt, returning the bits that were enabled so
/// they can be restored after the glitch-prone window closes.
fn error_irq_save<M: Mmio + ?Sized>(mmio: &mut M, regs: &PllRegs) -> u32 {
    match regs.error_irq {
        Some(bit) => {
            let enabled = mmio.read32(bit.addr) & bit.mask;
            mmio.rmw32(bit.addr, bit.mask, 0);
            enabled
        }
        None => 0,
    }
}

fn error_irq_restore<M: Mmio + ?Sized>(mmio: &mut M, regs: &PllRegs, enabled: u32) {
    if let Some(bit) = regs.error_irq {
        mmio.rmw32(bit.addr, bit.mask, enabled);
    }
}

/// Release reset, wait for lock, then take the PLL out of bypass.
///
/// On a lock timeout the PLL is put back into reset before the error is
/// reported, so a failed wake never leaves an unlocked PLL driving its
/// consumers.
fn lock_sequence<M: Mmio + ?Sized>(mmio: &mut M, regs: &PllRegs) -> Result<(), PmError> {
    mmio.rmw32(regs.ctrl, PLL_CTRL_RESET, 0);
    match poll_set(mmio, regs.lock, PLL_LOCK_POLL_ATTEMPTS) {
        Ok(()) => {
            mmio.rmw32(regs.ctrl, PLL_CTRL_BYPASS, 0);
            Ok(())
        }
        Err(_) => {
            mmio.rmw32(regs.ctrl, PLL_CTRL_RESET, PLL_CTRL_RESET);
            Err(PmError::Timeout)
        }
    }
}

fn suspend<M: Mmio + ?Sized>(
    mmio: &mut M,
    domains: &mut [power::PowerDomain],
    pll: &mut PllNode,
) {
    pll.ctx.ctrl = mmio.read32(pll.regs.ctrl);
    pll.ctx.cfg = mmio.read32(pll.regs.cfg);
    pll.ctx.frac = mmio.read32(pll.regs.frac);
    pll.ctx.saved = true;
    pll.node.flags.insert(NodeFlags::CONTEXT_SAVED);

    if pll.ctx.ctrl & PLL_CTRL_RESET == 0 {
        // Bypass strictly precedes reset so no glitch reaches consumers.
        mmio.rmw32(pll.regs.ctrl, PLL_CTRL_BYPASS, PLL_CTRL_BYPASS);
        mmio.rmw32(pll.regs.ctrl, PLL_CTRL_RESET, PLL_CTRL_RESET);
    }
    pll.set_state(PllState::Reset);

    if pll.node.flags.contains(NodeFlags::PARENT_REQUESTED) {
        if let Some(parent) = pll.node.parent {
            power::domain_release(mmio, domains, parent);
        }
        pll.node.flags.remove(NodeFlags::PARENT_REQUESTED);
    }
}

fn resume<M: Mmio + ?Sized>(
    mmio: &mut M,
    domains: &mut [power::PowerDomain],
    pll: &mut PllNode,
) -> Result<(), PmError> {
    let irq = error_irq_save(mmio, &pll.regs);

    // Park the PLL before rewriting its configuration.
    mmio.rmw32(pll.regs.ctrl, PLL_CTRL_BYPASS, PLL_CTRL_BYPASS);
    mmio.rmw32(pll.regs.ctrl, PLL_CTRL_RESET, PLL_CTRL_RESET);
    mmio.write32(pll.regs.ctrl, pll.ctx.ctrl | PLL_CTRL_RESET | PLL_CTRL_BYPASS);
    mmio.write32(pll.regs.cfg, pll.ctx.cfg);
    mmio.write32(pll.regs.frac, pll.ctx.frac);

    let was_held_in_reset = pll.ctx.ctrl & PLL_CTRL_RESET != 0;
    pll.ctx.saved = false;
    pll.node.flags.remove(NodeFlags::CONTEXT_SAVED);

    if was_held_in_reset {
        // The PLL was suspended while already in reset; staying there is
        // the restored state, not a failure.
        pll.set_state(PllState::Reset);
        error_irq_restore(mmio, &pll.regs, irq);
        return Ok(());
    }

    if let Some(parent) = pll.node.parent {
        if !pll.node.flags.contains(NodeFlags::PARENT_REQUESTED) {
            power::domain_request(mmio, domains, parent);
            pll.node.flags.insert(NodeFlags::PARENT_REQUESTED);
        }
    }

    let result = lock_sequence(mmio, &pll.regs);
    error_irq_restore(mmio, &pll.regs, irq);
    match result {
        Ok(()) => {
            pll.set_state(PllState::Locked);
            Ok(())
        }
        Err(err) => {
            pll.set_state(PllState::Reset);
            Err(err)
        }
    }
}

impl<M: Mmio, R: RomServices, P: PlHooks> PmSubsystem<M, R, P> {
    /// Bring a PLL back into use, restoring and locking it if its context
    /// was saved by an earlier release.
    pub fn pll_request(&mut self, id: PllId) -> Result<(), PmError> {
        let Self {
            mmio,
            domains,
            plls,
            ..
        } = self;
        let pll = plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        pll.node.flags.insert(NodeFlags::REQUESTED);
        if pll.ctx.saved {
            resume(mmio, domains, pll)?;
        }
        Ok(())
    }

    /// Drop a PLL out of use: save its context and park it in bypassed
    /// reset.
    pub fn pll_release(&mut self, id: PllId) -> Result<(), PmError> {
        let Self {
            mmio,
            domains,
            plls,
            ..
        } = self;
        let pll = plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        pll.node.flags.remove(NodeFlags::REQUESTED);
        suspend(mmio, domains, pll);
        Ok(())
    }

    /// Write one tuning parameter.
    ///
    /// The shared-feedback-divisor refusal is checked before the value, so
    /// a shared PLL reports `MultipleUsers` even for an out-of-range write.
    /// An out-of-range value leaves the register untouched.
    pub fn pll_set_parameter(
        &mut self,
        id: PllId,
        param: PllParam,
        value: u32,
    ) -> Result<(), PmError> {
        let Self { mmio, plls, .. } = self;
        let pll = plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        if param == PllParam::FbDiv && pll.exclusive_fbdiv && pll.child_count > 1 {
            return Err(PmError::MultipleUsers);
        }
        let field = param.field(&pll.regs);
        if value > field.max_value() {
            return Err(PmError::InvalidParam);
        }
        mmio.write_field(field, value);
        Ok(())
    }

    pub fn pll_get_parameter(&mut self, id: PllId, param: PllParam) -> Result<u32, PmError> {
        let Self { mmio, plls, .. } = self;
        let pll = plls.get(id.0).ok_or(PmError::InvalidParam)?;
        Ok(mmio.read_field(param.field(&pll.regs)))
    }

    /// Switch a PLL between reset, integer and fractional mode.
    ///
    /// Entering fractional mode with a zero fractional data value is
    /// refused with `NoData` before any register is written.
    pub fn pll_set_mode(&mut self, id: PllId, mode: PllMode) -> Result<(), PmError> {
        let Self { mmio, plls, .. } = self;
        let pll = plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        if mode == PllMode::Fractional {
            let data = mmio.read_field(PllParam::Data.field(&pll.regs));
            if data == 0 {
                return Err(PmError::NoData);
            }
        }

        let irq = error_irq_save(mmio, &pll.regs);
        mmio.rmw32(pll.regs.ctrl, PLL_CTRL_BYPASS, PLL_CTRL_BYPASS);
        mmio.rmw32(pll.regs.ctrl, PLL_CTRL_RESET, PLL_CTRL_RESET);

        if mode == PllMode::Reset {
            pll.set_state(PllState::Reset);
            error_irq_restore(mmio, &pll.regs, irq);
            return Ok(());
        }

        let frac_enable = if mode == PllMode::Fractional {
            PLL_FRAC_ENABLED
        } else {
            0
        };
        mmio.rmw32(pll.regs.frac, PLL_FRAC_ENABLED, frac_enable);

        let result = lock_sequence(mmio, &pll.regs);
        error_irq_restore(mmio, &pll.regs, irq);
        match result {
            Ok(()) => {
                pll.set_state(PllState::Locked);
                Ok(())
            }
            Err(err) => {
                pll.set_state(PllState::Reset);
                Err(err)
            }
        }
    }

    /// Current mode, derived from hardware rather than bookkeeping.
    pub fn pll_get_mode(&mut self, id: PllId) -> Result<PllMode, PmError> {
        let Self { mmio, plls, .. } = self;
        let pll = plls.get(id.0).ok_or(PmError::InvalidParam)?;
        if mmio.read32(pll.regs.ctrl) & PLL_CTRL_RESET != 0 {
            return Ok(PllMode::Reset);
        }
        if mmio.read32(pll.regs.frac) & PLL_FRAC_ENABLED != 0 {
            Ok(PllMode::Fractional)
        } else {
            Ok(PllMode::Integer)
        }
    }

    /// A downstream clock started using this PLL's output.
    pub fn pll_attach_consumer(&mut self, id: PllId) -> Result<(), PmError> {
        let pll = self.plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        pll.child_count += 1;
        Ok(())
    }

    pub fn pll_detach_consumer(&mut self, id: PllId) -> Result<(), PmError> {
        let pll = self.plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        if pll.child_count == 0 {
            log::warn!("{}: consumer detach below zero", pll.node.name);
            return Err(PmError::Internal);
        }
        pll.child_count -= 1;
        Ok(())
    }

    pub fn pll_state(&self, id: PllId) -> Result<PllState, PmError> {
        self.plls
            .get(id.0)
            .map(PllNode::state)
            .ok_or(PmError::InvalidParam)
    }

    pub fn pll_context_saved(&self, id: PllId) -> Result<bool, PmError> {
        self.plls
            .get(id.0)
            .map(|pll| pll.ctx.saved)
            .ok_or(PmError::InvalidParam)
    }

    pub fn pll_permitted_masters(&self, id: PllId) -> Result<IpiMask, PmError> {
        self.plls
            .get(id.0)
            .map(|pll| pll.node.access)
            .ok_or(PmError::InvalidParam)
    }

    pub fn pll_set_permission(&mut self, id: PllId, access: IpiMask) -> Result<(), PmError> {
        let pll = self.plls.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        pll.node.access = access;
        Ok(())
    }

    pub fn pll_has_access(&self, master: IpiMask, id: PllId) -> Result<bool, PmError> {
        let pll = self.plls.get(id.0).ok_or(PmError::InvalidParam)?;
        Ok(pll.node.access.permits(master))
    }
}

// Licensed under the Apache-2.0 license

use crate::error::PmError;
use crate::pll::{PllConfig, PllNode};
use crate::power::{DomainConfig, PowerDomain};
use crate::reset::{PlHooks, ResetConfig, ResetLine};
use crate::rom::RomServices;
use crate::slave::{SlaveConfig, SlaveNode};
use arrayvec::ArrayVec;
use pm_hal::Mmio;

pub const MAX_POWER_DOMAINS: usize = 8;
pub const MAX_SLAVES: usize = 32;
pub const MAX_PLLS: usize = 8;
pub const MAX_RESET_LINES: usize = 128;

/// Platform tables describing one SoC variant.
///
/// Addresses, masks and shifts come straight from the SoC memory map; the
/// engine never discovers them at runtime. Domain parents must precede
/// their children in the table, which both rules out cycles and fixes the
/// power-up ordering.
pub struct SocConfig<'a> {
    pub domains: &'a [DomainConfig],
    pub slaves: &'a [SlaveConfig],
    pub plls: &'a [PllConfig],
    pub resets: &'a [ResetConfig],
}

/// The power/clock/reset resource manager.
///
/// Owns the injected hardware seams (register space, ROM service table,
/// programmable-logic hooks) and the fixed resource arenas. All entry
/// points run synchronously to completion; the surrounding IPI dispatch
/// loop is responsible for serializing calls.
pub struct PmSubsystem<M: Mmio, R: RomServices, P: PlHooks> {
    pub(crate) mmio: M,
    pub(crate) rom: R,
    pub(crate) pl: P,
    pub(crate) domains: ArrayVec<PowerDomain, MAX_POWER_DOMAINS>,
    pub(crate) slaves: ArrayVec<SlaveNode, MAX_SLAVES>,
    pub(crate) plls: ArrayVec<PllNode, MAX_PLLS>,
    pub(crate) resets: ArrayVec<ResetLine, MAX_RESET_LINES>,
}

impl<M: Mmio, R: RomServices, P: PlHooks> PmSubsystem<M, R, P> {
    pub fn new(mmio: M, rom: R, pl: P, config: &SocConfig) -> Result<Self, PmError> {
        if config.domains.len() > MAX_POWER_DOMAINS
            || config.slaves.len() > MAX_SLAVES
            || config.plls.len() > MAX_PLLS
            || config.resets.len() > MAX_RESET_LINES
        {
            return Err(PmError::InvalidParam);
        }

        let mut domains = ArrayVec::new();
        for (i, cfg) in config.domains.iter().enumerate() {
            // Parents precede children; this keeps the tree acyclic.
            if let Some(parent) = cfg.parent {
                if parent.0 >= i {
                    return Err(PmError::InvalidParam);
                }
            }
            domains.push(PowerDomain::new(cfg));
        }

        let mut slaves = ArrayVec::new();
        for cfg in config.slaves {
            if cfg.fsm.states.is_empty() {
                return Err(PmError::InvalidParam);
            }
            if let Some(parent) = cfg.parent {
                if parent.0 >= domains.len() {
                    return Err(PmError::InvalidParam);
                }
            }
            slaves.push(SlaveNode::new(cfg));
        }

        let mut plls = ArrayVec::new();
        for cfg in config.plls {
            if let Some(parent) = cfg.parent {
                if parent.0 >= domains.len() {
                    return Err(PmError::InvalidParam);
                }
            }
            plls.push(PllNode::new(cfg));
        }

        let mut resets = ArrayVec::new();
        for cfg in config.resets {
            resets.push(ResetLine::new(cfg));
        }

        Ok(PmSubsystem {
            mmio,
            rom,
            pl,
            domains,
            slaves,
            plls,
            resets,
        })
    }

    /// System-level reconfiguration: clear every logical flag, permission
    /// mask and saved-context marker without touching hardware state or
    /// destroying any record.
    pub fn clear_config(&mut self) {
        for domain in &mut self.domains {
            domain.use_count = 0;
        }
        for slave in &mut self.slaves {
            slave.node.clear_config();
        }
        for pll in &mut self.plls {
            pll.node.clear_config();
            pll.clear_config();
        }
        self.reset_clear_config();
    }

    /// The raw register space, exposed for platform bring-up and tests.
    pub fn mmio(&self) -> &M {
        &self.mmio
    }

    pub fn mmio_mut(&mut self) -> &mut M {
        &mut self.mmio
    }

    pub fn rom(&self) -> &R {
        &self.rom
    }

    pub fn rom_mut(&mut self) -> &mut R {
        &mut self.rom
    }

    pub fn pl_hooks(&self) -> &P {
        &self.pl
    }

    pub fn pl_hooks_mut(&mut self) -> &mut P {
        &mut self.pl
    }
}

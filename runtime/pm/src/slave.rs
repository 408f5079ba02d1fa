// Licensed under the Apache-2.0 license

//! Table-driven slave finite-state machine engine.
//!
//! Every slave carries a static FSM descriptor: the set of states it can
//! occupy (each tagged with the capabilities still available there) and the
//! legal transition edges. `slave_enter` validates a request against the
//! table, runs the slave's hardware-transition handler and only then commits
//! the new state. Multi-step handlers execute best-effort sequentially and
//! abort on the first failure without rolling back already-applied steps.

use crate::error::PmError;
use crate::node::{DomainId, Node, NodeFlags, SlaveId};
use crate::power;
use crate::reset::PlHooks;
use crate::rom::{RomServiceId, RomServices};
use crate::subsystem::PmSubsystem;
use bitflags::bitflags;
use pm_hal::{poll_clear, poll_set, Mmio, RegBit};

/// Attempt budget for a power-island status bit to follow its control bit.
pub const POWER_STATUS_POLL_ATTEMPTS: u32 = 0x1000;

bitflags! {
    /// What a slave still provides while occupying a given state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateCaps: u8 {
        /// Register interface reachable.
        const ACCESS = 1 << 0;
        /// Hardware context retained.
        const CONTEXT = 1 << 1;
        /// Able to generate a wake event.
        const WAKEUP = 1 << 2;
        /// Power island on.
        const POWER = 1 << 3;
    }
}

/// A state value local to one slave's FSM descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveState(pub u8);

#[derive(Debug, Clone, Copy)]
pub struct SlaveStateInfo {
    pub state: SlaveState,
    pub caps: StateCaps,
    /// Relative power draw in this state, used for reporting only.
    pub power: u8,
}

/// One legal transition edge and its worst-case latency in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct SlaveTran {
    pub from: SlaveState,
    pub to: SlaveState,
    pub latency: u32,
}

/// Static FSM descriptor shared by all slaves of one kind.
#[derive(Debug)]
pub struct SlaveFsm {
    pub states: &'static [SlaveStateInfo],
    pub transitions: &'static [SlaveTran],
}

impl SlaveFsm {
    pub(crate) fn state_info(&self, state: SlaveState) -> Option<&SlaveStateInfo> {
        self.states.iter().find(|info| info.state == state)
    }

    pub(crate) fn transition(&self, from: SlaveState, to: SlaveState) -> Option<&SlaveTran> {
        self.transitions
            .iter()
            .find(|tran| tran.from == from && tran.to == to)
    }

    fn worst_latency(&self) -> u32 {
        self.transitions
            .iter()
            .map(|tran| tran.latency)
            .max()
            .unwrap_or(0)
    }

    /// State offering the most capabilities; the wake target.
    fn fullest_state(&self) -> Option<&SlaveStateInfo> {
        self.states
            .iter()
            .max_by_key(|info| info.caps.bits().count_ones())
    }

    /// Lowest-power declared state; the force-down target.
    fn lowest_state(&self) -> Option<&SlaveStateInfo> {
        self.states.iter().min_by_key(|info| info.power)
    }
}

pub const STATE_OFF: SlaveState = SlaveState(0);
pub const STATE_ON: SlaveState = SlaveState(1);

/// Standard two-state descriptor used by most peripherals.
pub static STD_SLAVE_FSM: SlaveFsm = SlaveFsm {
    states: &[
        SlaveStateInfo {
            state: STATE_OFF,
            caps: StateCaps::empty(),
            power: 0,
        },
        SlaveStateInfo {
            state: STATE_ON,
            caps: StateCaps::all(),
            power: 100,
        },
    ],
    transitions: &[
        SlaveTran {
            from: STATE_ON,
            to: STATE_OFF,
            latency: 0,
        },
        SlaveTran {
            from: STATE_OFF,
            to: STATE_ON,
            latency: 1000,
        },
    ],
};

/// Control/status pair for one power island.
#[derive(Debug, Clone, Copy)]
pub struct IslandCtrl {
    pub ctrl: RegBit,
    pub status: RegBit,
}

/// Hardware-transition handler, one variant per concrete slave wiring.
///
/// The handler inspects which side of the powered boundary the transition
/// crosses and performs the matching sequence; transitions that stay on the
/// same side need no hardware work.
#[derive(Debug, Clone, Copy)]
pub enum SlaveHandler {
    /// Logical-only slave with no hardware sequence.
    None,
    /// Single power island.
    Island(IslandCtrl),
    /// Two independent islands, sequenced in table order. A failure on the
    /// first island aborts before the second is touched and the first is
    /// not rolled back.
    DualIsland([IslandCtrl; 2]),
    /// Power sequencing fully delegated to ROM-resident routines.
    Rom {
        up: RomServiceId,
        down: RomServiceId,
    },
    /// Island powered up first, then a ROM reset pulse on the wake path;
    /// the sleep path only powers the island down.
    IslandThenPulse {
        island: IslandCtrl,
        pulse: RomServiceId,
    },
}

/// How a slave's boot-time state is derived from observed hardware.
#[derive(Debug, Clone, Copy)]
pub struct BootProbe {
    /// Bit reflecting the island's power/enable status.
    pub bit: RegBit,
    pub powered: SlaveState,
    pub off: SlaveState,
}

/// Platform description of one slave.
pub struct SlaveConfig {
    pub name: &'static str,
    pub parent: Option<DomainId>,
    pub fsm: &'static SlaveFsm,
    pub handler: SlaveHandler,
    pub probe: Option<BootProbe>,
}

pub struct SlaveNode {
    pub(crate) node: Node,
    pub(crate) fsm: &'static SlaveFsm,
    pub(crate) handler: SlaveHandler,
    pub(crate) probe: Option<BootProbe>,
}

impl SlaveNode {
    pub(crate) fn new(cfg: &SlaveConfig) -> Self {
        let mut node = Node::new(cfg.name, cfg.parent);
        node.state = cfg.fsm.states[0].state.0;
        SlaveNode {
            node,
            fsm: cfg.fsm,
            handler: cfg.handler,
            probe: cfg.probe,
        }
    }

    pub fn name(&self) -> &'static str {
        self.node.name
    }

    pub fn state(&self) -> SlaveState {
        SlaveState(self.node.state)
    }
}

fn island_up<M: Mmio + ?Sized>(mmio: &mut M, island: &IslandCtrl) -> Result<(), PmError> {
    mmio.set_bits(island.ctrl);
    poll_set(mmio, island.status, POWER_STATUS_POLL_ATTEMPTS).map_err(|_| PmError::Timeout)
}

fn island_down<M: Mmio + ?Sized>(mmio: &mut M, island: &IslandCtrl) -> Result<(), PmError> {
    mmio.clear_bits(island.ctrl);
    poll_clear(mmio, island.status, POWER_STATUS_POLL_ATTEMPTS).map_err(|_| PmError::Timeout)
}

/// Run the hardware sequence for a transition crossing the powered boundary.
fn run_handler<M, R>(
    mmio: &mut M,
    rom: &mut R,
    handler: &SlaveHandler,
    was_powered: bool,
    goes_powered: bool,
) -> Result<(), PmError>
where
    M: Mmio + ?Sized,
    R: RomServices + ?Sized,
{
    match (was_powered, goes_powered) {
        (false, true) => match handler {
            SlaveHandler::None => Ok(()),
            SlaveHandler::Island(island) => island_up(mmio, island),
            SlaveHandler::DualIsland(islands) => {
                for island in islands {
                    island_up(mmio, island)?;
                }
                Ok(())
            }
            SlaveHandler::Rom { up, .. } => rom.call(*up),
            SlaveHandler::IslandThenPulse { island, pulse } => {
                island_up(mmio, island)?;
                rom.call(*pulse)
            }
        },
        (true, false) => match handler {
            SlaveHandler::None => Ok(()),
            SlaveHandler::Island(island) => island_down(mmio, island),
            SlaveHandler::DualIsland(islands) => {
                for island in islands {
                    island_down(mmio, island)?;
                }
                Ok(())
            }
            SlaveHandler::Rom { down, .. } => rom.call(*down),
            SlaveHandler::IslandThenPulse { island, .. } => island_down(mmio, island),
        },
        // Same side of the powered boundary: nothing to sequence.
        _ => Ok(()),
    }
}

impl<M: Mmio, R: RomServices, P: PlHooks> PmSubsystem<M, R, P> {
    /// Request a state transition on a slave.
    ///
    /// An edge absent from the transition table is a soft rejection
    /// (`NoFeature`), not a hardware error; the current state is left
    /// untouched. Handler failures propagate verbatim and also leave the
    /// state unchanged.
    pub fn slave_enter(&mut self, id: SlaveId, next: SlaveState) -> Result<(), PmError> {
        let Self {
            mmio,
            rom,
            domains,
            slaves,
            ..
        } = self;
        let slave = slaves.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        let curr = SlaveState(slave.node.state);

        let curr_info = match slave.fsm.state_info(curr) {
            Some(info) => info,
            None => {
                log::warn!("{}: in undeclared state {}", slave.node.name, curr.0);
                return Err(PmError::Internal);
            }
        };
        let next_info = match slave.fsm.state_info(next) {
            Some(info) => info,
            None => return Err(PmError::NoFeature),
        };
        if slave.fsm.transition(curr, next).is_none() {
            log::debug!(
                "{}: transition {} -> {} not declared",
                slave.node.name,
                curr.0,
                next.0
            );
            return Err(PmError::NoFeature);
        }

        let was_powered = curr_info.caps.contains(StateCaps::POWER);
        let goes_powered = next_info.caps.contains(StateCaps::POWER);

        // The parent domain must be requested before the slave reaches a
        // powered state. A later handler failure does not take the request
        // back.
        if goes_powered && !was_powered {
            if let Some(parent) = slave.node.parent {
                if !slave.node.flags.contains(NodeFlags::PARENT_REQUESTED) {
                    power::domain_request(mmio, domains, parent);
                    slave.node.flags.insert(NodeFlags::PARENT_REQUESTED);
                }
            }
        }

        run_handler(mmio, rom, &slave.handler, was_powered, goes_powered)?;
        slave.node.state = next.0;

        // The slave's own release is processed before the parent's.
        if was_powered && !goes_powered {
            if let Some(parent) = slave.node.parent {
                if slave.node.flags.contains(NodeFlags::PARENT_REQUESTED) {
                    power::domain_release(mmio, domains, parent);
                    slave.node.flags.remove(NodeFlags::PARENT_REQUESTED);
                }
            }
        }
        Ok(())
    }

    /// Derive every slave's boot state from observed hardware.
    ///
    /// Nothing is assumed powered on or off: the probe bit decides. Slaves
    /// found already powered take a request on their parent domain so the
    /// dependency invariant holds from the first dispatch onwards.
    pub fn slave_init_all(&mut self) {
        let Self {
            mmio,
            domains,
            slaves,
            ..
        } = self;
        for slave in slaves.iter_mut() {
            let state = match &slave.probe {
                Some(probe) => {
                    if mmio.bit_is_set(probe.bit) {
                        probe.powered
                    } else {
                        probe.off
                    }
                }
                None => slave.fsm.states[0].state,
            };
            slave.node.state = state.0;

            let powered = slave
                .fsm
                .state_info(state)
                .map(|info| info.caps.contains(StateCaps::POWER))
                .unwrap_or(false);
            if powered {
                if let Some(parent) = slave.node.parent {
                    power::domain_request(mmio, domains, parent);
                    slave.node.flags.insert(NodeFlags::PARENT_REQUESTED);
                }
            }
        }
    }

    /// Force the slave into its lowest-power declared state, bypassing the
    /// transition table. Best effort; a handler failure leaves the state
    /// unchanged.
    pub fn slave_force_down(&mut self, id: SlaveId) -> Result<(), PmError> {
        let Self {
            mmio,
            rom,
            domains,
            slaves,
            ..
        } = self;
        let slave = slaves.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        let curr = SlaveState(slave.node.state);
        let target = *slave.fsm.lowest_state().ok_or(PmError::Internal)?;

        let was_powered = slave
            .fsm
            .state_info(curr)
            .map(|info| info.caps.contains(StateCaps::POWER))
            .unwrap_or(false);
        let goes_powered = target.caps.contains(StateCaps::POWER);

        if curr != target.state {
            run_handler(mmio, rom, &slave.handler, was_powered, goes_powered)?;
            slave.node.state = target.state.0;
        }
        slave.node.flags.remove(NodeFlags::REQUESTED);

        if was_powered && !goes_powered {
            if let Some(parent) = slave.node.parent {
                if slave.node.flags.contains(NodeFlags::PARENT_REQUESTED) {
                    power::domain_release(mmio, domains, parent);
                    slave.node.flags.remove(NodeFlags::PARENT_REQUESTED);
                }
            }
        }
        Ok(())
    }

    pub fn slave_state(&self, id: SlaveId) -> Result<SlaveState, PmError> {
        self.slaves
            .get(id.0)
            .map(SlaveNode::state)
            .ok_or(PmError::InvalidParam)
    }

    /// Worst-case time for this slave to reach its fullest-capability state
    /// from where it is now.
    pub fn slave_wake_latency(&self, id: SlaveId) -> Result<u32, PmError> {
        let slave = self.slaves.get(id.0).ok_or(PmError::InvalidParam)?;
        let curr = SlaveState(slave.node.state);
        let target = slave.fsm.fullest_state().ok_or(PmError::Internal)?.state;
        Ok(match slave.fsm.transition(curr, target) {
            Some(tran) => tran.latency,
            // No direct edge declared; report the worst edge in the table.
            None => slave.fsm.worst_latency(),
        })
    }

    /// Relative power draw of the slave's current state.
    pub fn slave_power_consumption(&self, id: SlaveId) -> Result<u32, PmError> {
        let slave = self.slaves.get(id.0).ok_or(PmError::InvalidParam)?;
        match slave.fsm.state_info(SlaveState(slave.node.state)) {
            Some(info) => Ok(u32::from(info.power)),
            None => Err(PmError::Internal),
        }
    }

    pub fn slave_is_used(&self, id: SlaveId) -> Result<bool, PmError> {
        let slave = self.slaves.get(id.0).ok_or(PmError::InvalidParam)?;
        Ok(slave.node.flags.contains(NodeFlags::REQUESTED))
    }

    /// Bookkeeping for the `is_used` report; the requirement accounting
    /// itself lives with the out-of-scope request dispatcher.
    pub fn slave_set_requested(&mut self, id: SlaveId, requested: bool) -> Result<(), PmError> {
        let slave = self.slaves.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        slave.node.flags.set(NodeFlags::REQUESTED, requested);
        Ok(())
    }

    pub fn slave_latency_margin(&self, id: SlaveId) -> Result<u32, PmError> {
        self.slaves
            .get(id.0)
            .map(|slave| slave.node.latency_margin)
            .ok_or(PmError::InvalidParam)
    }

    pub fn slave_set_latency_margin(&mut self, id: SlaveId, margin: u32) -> Result<(), PmError> {
        let slave = self.slaves.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        slave.node.latency_margin = margin;
        Ok(())
    }

    pub fn slave_permitted_masters(&self, id: SlaveId) -> Result<crate::node::IpiMask, PmError> {
        self.slaves
            .get(id.0)
            .map(|slave| slave.node.access)
            .ok_or(PmError::InvalidParam)
    }

    pub fn slave_set_permission(
        &mut self,
        id: SlaveId,
        access: crate::node::IpiMask,
    ) -> Result<(), PmError> {
        let slave = self.slaves.get_mut(id.0).ok_or(PmError::InvalidParam)?;
        slave.node.access = access;
        Ok(())
    }
}

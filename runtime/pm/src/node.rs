// Licensed under the Apache-2.0 license

use bitflags::bitflags;

/// Index of a power domain in the subsystem's domain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainId(pub usize);

/// Index of a slave node in the subsystem's slave table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveId(pub usize);

/// Index of a PLL in the subsystem's PLL table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllId(pub usize);

/// Identity of a requesting master: one bit per CPU / IPI channel.
///
/// Bit positions correspond to IPI channel identifiers defined outside this
/// subsystem; the engine only ever intersects masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpiMask(pub u32);

impl IpiMask {
    pub const EMPTY: IpiMask = IpiMask(0);

    /// True when this access mask shares at least one channel bit with the
    /// master's identity mask.
    pub const fn permits(self, master: IpiMask) -> bool {
        self.0 & master.0 != 0
    }
}

bitflags! {
    /// Logical per-node flags, cleared by `clear_config`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Hardware context is saved and must be restored before next use.
        const CONTEXT_SAVED = 1 << 0;
        /// The resource is explicitly requested by some master.
        const REQUESTED = 1 << 1;
        /// This node currently holds a request on its parent power domain.
        const PARENT_REQUESTED = 1 << 2;
    }
}

/// Identity/state/permission envelope common to every manageable resource.
///
/// Nodes are constructed once from the platform tables at firmware start and
/// never destroyed; a system-level reconfiguration only clears the logical
/// flags and permission masks.
#[derive(Debug)]
pub struct Node {
    pub name: &'static str,
    pub(crate) parent: Option<DomainId>,
    /// Current discrete state; the meaning of the raw value is owned by the
    /// concrete resource class.
    pub(crate) state: u8,
    /// Wake-up time budget this node currently affords, in microseconds.
    pub(crate) latency_margin: u32,
    pub(crate) flags: NodeFlags,
    pub(crate) access: IpiMask,
}

impl Node {
    pub(crate) fn new(name: &'static str, parent: Option<DomainId>) -> Self {
        Node {
            name,
            parent,
            state: 0,
            latency_margin: 0,
            flags: NodeFlags::empty(),
            access: IpiMask::EMPTY,
        }
    }

    pub(crate) fn clear_config(&mut self) {
        self.flags = NodeFlags::empty();
        self.access = IpiMask::EMPTY;
        self.latency_margin = 0;
    }
}

// Licensed under the Apache-2.0 license

//! Power domains: parents in the resource dependency tree.
//!
//! A domain must be requested before any dependent node reaches a powered
//! state and is released only after the dependent's release has been
//! processed. The parent graph is a fixed acyclic tree supplied by the
//! platform tables; references are indices, never owning pointers.

use crate::node::DomainId;
use pm_hal::{Mmio, RegBit};

/// Platform description of one power domain.
#[derive(Debug, Clone, Copy)]
pub struct DomainConfig {
    pub name: &'static str,
    /// Parent domain; must appear earlier in the domain table.
    pub parent: Option<DomainId>,
    /// Power-enable bit, absent for always-on domains.
    pub ctrl: Option<RegBit>,
}

#[derive(Debug)]
pub(crate) struct PowerDomain {
    pub(crate) name: &'static str,
    pub(crate) parent: Option<DomainId>,
    pub(crate) ctrl: Option<RegBit>,
    pub(crate) use_count: u32,
}

impl PowerDomain {
    pub(crate) fn new(cfg: &DomainConfig) -> Self {
        PowerDomain {
            name: cfg.name,
            parent: cfg.parent,
            ctrl: cfg.ctrl,
            use_count: 0,
        }
    }
}

/// Take a reference on a domain, powering it up on the 0 -> 1 edge.
///
/// The parent is requested before this domain's enable bit is touched, so
/// power comes up from the root of the tree downwards.
pub(crate) fn domain_request<M: Mmio + ?Sized>(
    mmio: &mut M,
    domains: &mut [PowerDomain],
    id: DomainId,
) {
    let becoming_used = domains[id.0].use_count == 0;
    if becoming_used {
        if let Some(parent) = domains[id.0].parent {
            domain_request(mmio, domains, parent);
        }
    }
    let domain = &mut domains[id.0];
    domain.use_count += 1;
    if becoming_used {
        if let Some(bit) = domain.ctrl {
            mmio.set_bits(bit);
        }
    }
}

/// Drop a reference on a domain, powering it down on the 1 -> 0 edge.
///
/// This domain is powered down before its parent's release is considered.
pub(crate) fn domain_release<M: Mmio + ?Sized>(
    mmio: &mut M,
    domains: &mut [PowerDomain],
    id: DomainId,
) {
    let domain = &mut domains[id.0];
    if domain.use_count == 0 {
        log::warn!("release of unused power domain {}", domain.name);
        return;
    }
    domain.use_count -= 1;
    if domain.use_count == 0 {
        if let Some(bit) = domain.ctrl {
            mmio.clear_bits(bit);
        }
        if let Some(parent) = domain.parent {
            domain_release(mmio, domains, parent);
        }
    }
}

// Licensed under the Apache-2.0 license

//! Power, clock and reset lifecycle engine for an SoC platform-management
//! controller.
//!
//! The engine owns fixed arenas of resource records built from per-SoC
//! platform tables: power domains, FSM-driven slaves, PLLs and reset
//! lines. Requests arrive one at a time from an IPI dispatch loop and run
//! synchronously to completion; nothing in here is reentrant and nothing
//! blocks without a bounded attempt budget. Hardware is reached only
//! through the seams injected at construction: the [`pm_hal::Mmio`]
//! register space, the [`RomServices`] table and the [`PlHooks`]
//! programmable-logic callbacks.

#![cfg_attr(not(test), no_std)]

mod error;
pub use error::*;
mod node;
pub use node::*;
mod pll;
pub use pll::*;
mod power;
pub use power::DomainConfig;
mod reset;
pub use reset::*;
mod rom;
pub use rom::*;
mod slave;
pub use slave::*;
mod subsystem;
pub use subsystem::*;

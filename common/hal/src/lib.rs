// Licensed under the Apache-2.0 license

//! Register-access primitives shared by the platform-management firmware.
//!
//! The power/clock/reset engine never discovers register layouts on its own;
//! it is handed `(address, mask, shift)` triples from the per-SoC memory map
//! and drives them through the [`Mmio`] trait. On the real target the trait
//! is implemented with volatile pointer accesses; host-side tests supply a
//! mock register file instead.

#![cfg_attr(not(test), no_std)]

mod mmio;
pub use mmio::*;
mod poll;
pub use poll::*;

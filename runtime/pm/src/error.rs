// Licensed under the Apache-2.0 license

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Status codes returned to the request dispatcher.
///
/// On the IPI wire `0` means success; here success is `Ok(())` and only the
/// failure codes are enumerated. Register reads and writes never fail, so
/// the only fallible steps are bounded polls and delegated ROM/application
/// calls; their statuses are propagated to the caller unchanged.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum PmError {
    /// Bad ID or argument, or an operation the target line does not implement.
    InvalidParam = 1,
    /// The requested FSM transition is not declared for the current state.
    NoFeature = 2,
    /// A bounded hardware poll exhausted its attempt budget.
    Timeout = 3,
    /// Rejected to protect the other consumers of a shared clock generator.
    MultipleUsers = 4,
    /// Fractional mode requested without configured divider data.
    NoData = 5,
    /// Bookkeeping and hardware disagree in a way the engine cannot repair.
    Internal = 6,
}

// Licensed under the Apache-2.0 license

use crate::soc::{self, cold_boot_mmio, platform};
use pm_core::IpiMask;

const APU: IpiMask = IpiMask(1 << 0);
const RPU0: IpiMask = IpiMask(1 << 1);
const RPU1: IpiMask = IpiMask(1 << 2);

#[test]
fn test_access_is_any_shared_channel_bit() {
    let mut pm = platform(cold_boot_mmio());
    pm.reset_set_config(soc::RST_GEM0, IpiMask(APU.0 | RPU0.0))
        .unwrap();

    assert!(pm.reset_has_access(APU, soc::RST_GEM0).unwrap());
    assert!(pm.reset_has_access(RPU0, soc::RST_GEM0).unwrap());
    assert!(!pm.reset_has_access(RPU1, soc::RST_GEM0).unwrap());
    // A master driving several channels qualifies through any one of them.
    assert!(pm
        .reset_has_access(IpiMask(RPU0.0 | RPU1.0), soc::RST_GEM0)
        .unwrap());
}

#[test]
fn test_default_masks_deny_everyone() {
    let pm = platform(cold_boot_mmio());
    for master in [APU, RPU0, RPU1] {
        assert!(!pm.reset_has_access(master, soc::RST_GEM0).unwrap());
        assert!(!pm.pll_has_access(master, soc::APLL).unwrap());
        assert!(!pm
            .slave_permitted_masters(soc::USB0)
            .unwrap()
            .permits(master));
    }
}

#[test]
fn test_slave_and_pll_permissions() {
    let mut pm = platform(cold_boot_mmio());
    pm.slave_set_permission(soc::USB0, APU).unwrap();
    pm.pll_set_permission(soc::APLL, IpiMask(APU.0 | RPU0.0))
        .unwrap();

    assert!(pm.slave_permitted_masters(soc::USB0).unwrap().permits(APU));
    assert!(!pm.slave_permitted_masters(soc::USB0).unwrap().permits(RPU0));
    assert!(pm.pll_has_access(RPU0, soc::APLL).unwrap());
}

#[test]
fn test_clear_config_wipes_masks_and_logical_flags() {
    let mut pm = platform(cold_boot_mmio());
    pm.slave_set_permission(soc::USB0, APU).unwrap();
    pm.slave_set_requested(soc::USB0, true).unwrap();
    pm.slave_set_latency_margin(soc::USB0, 350).unwrap();
    pm.pll_set_permission(soc::APLL, APU).unwrap();
    pm.pll_release(soc::APLL).unwrap();
    pm.reset_set_config(soc::RST_GEM0, APU).unwrap();
    pm.mmio_mut().clear_trace();

    pm.clear_config();

    // Every mask, flag and margin is back to the deny-all default and no
    // register was touched on the way.
    assert!(!pm.slave_permitted_masters(soc::USB0).unwrap().permits(APU));
    assert!(!pm.slave_is_used(soc::USB0).unwrap());
    assert_eq!(pm.slave_latency_margin(soc::USB0).unwrap(), 0);
    assert!(!pm.pll_has_access(APU, soc::APLL).unwrap());
    assert!(!pm.pll_context_saved(soc::APLL).unwrap());
    assert!(!pm.reset_has_access(APU, soc::RST_GEM0).unwrap());
    assert!(pm.mmio().trace().is_empty());
}

// Licensed under the Apache-2.0 license

use crate::soc::{self, cold_boot_mmio, platform};
use log::LevelFilter;
use pm_core::{STATE_OFF, STATE_ON};
use simple_logger::SimpleLogger;

#[test]
fn test_boot_states_derive_from_hardware_probes() {
    let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();

    let mut mmio = cold_boot_mmio();
    // The first-stage boot loader left USB powered; PCIe came up through
    // its ROM configuration path. The GPU islands are off.
    mmio.preload(soc::USB0_ISLAND_STATUS, 1);
    mmio.preload(soc::PCIE_PWR_STATUS, 1);
    let mut pm = platform(mmio);

    pm.slave_init_all();
    log::info!("boot states derived");

    assert_eq!(pm.slave_state(soc::USB0).unwrap(), STATE_ON);
    assert_eq!(pm.slave_state(soc::TTC0).unwrap(), STATE_OFF);
    assert_eq!(pm.slave_state(soc::GPU).unwrap(), STATE_OFF);
    assert_eq!(pm.slave_state(soc::PCIE).unwrap(), STATE_ON);

    // PCIe was found powered, so the full-power domain picked up a request
    // during initialization. The low-power domain has no enable bit.
    assert_eq!(pm.mmio().writes_to(soc::FPD_PWR_CTRL), vec![1]);
}

#[test]
fn test_boot_with_everything_off_touches_no_domains() {
    let mut pm = platform(cold_boot_mmio());
    pm.slave_init_all();
    for id in [soc::USB0, soc::TTC0, soc::GPU, soc::PCIE] {
        assert_eq!(pm.slave_state(id).unwrap(), STATE_OFF);
    }
    assert!(pm.mmio().writes_to(soc::FPD_PWR_CTRL).is_empty());
}

#[test]
fn test_first_powered_slave_brings_up_its_domain() {
    let mut mmio = cold_boot_mmio();
    mmio.latch_bit_after_reads(soc::GPU_PP0_STATUS, 1, 0);
    mmio.latch_bit_after_reads(soc::GPU_PP1_STATUS, 1, 0);
    let mut pm = platform(mmio);
    pm.slave_init_all();

    pm.slave_enter(soc::GPU, STATE_ON).unwrap();

    // Domain enable strictly precedes the first island control write, and
    // the two GPU pixel-processor islands come up in table order.
    let fpd = pm
        .mmio()
        .trace()
        .iter()
        .position(|ev| matches!(ev, pm_testing_common::TraceEvent::Write { addr, .. } if *addr == soc::FPD_PWR_CTRL))
        .unwrap();
    let pp0 = pm
        .mmio()
        .trace()
        .iter()
        .position(|ev| matches!(ev, pm_testing_common::TraceEvent::Write { addr, .. } if *addr == soc::GPU_PP0_CTRL))
        .unwrap();
    let pp1 = pm
        .mmio()
        .trace()
        .iter()
        .position(|ev| matches!(ev, pm_testing_common::TraceEvent::Write { addr, .. } if *addr == soc::GPU_PP1_CTRL))
        .unwrap();
    assert!(fpd < pp0);
    assert!(pp0 < pp1);
}

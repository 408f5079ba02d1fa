// Licensed under the Apache-2.0 license

use crate::soc::{self, cold_boot_mmio, platform};
use pm_core::{PllMode, PllParam, PllState, PmError, STATE_OFF, STATE_ON};

#[test]
fn test_full_power_domain_suspend_resume_cycle() {
    let mut mmio = cold_boot_mmio();
    mmio.preload(soc::PCIE_PWR_STATUS, 1);
    let mut pm = platform(mmio);
    pm.slave_init_all();
    pm.pll_attach_consumer(soc::APLL).unwrap();

    // Suspend: the PCIe slave drops out first, then its clock generator.
    assert!(!pm.pll_context_saved(soc::APLL).unwrap());
    pm.slave_enter(soc::PCIE, STATE_OFF).unwrap();
    pm.pll_release(soc::APLL).unwrap();
    assert!(pm.pll_context_saved(soc::APLL).unwrap());
    assert_eq!(pm.pll_state(soc::APLL).unwrap(), PllState::Reset);
    assert_eq!(pm.rom().calls, vec![soc::ROM_PCIE_DOWN]);

    // Resume in reverse: clock first, then the slave.
    pm.pll_request(soc::APLL).unwrap();
    assert!(!pm.pll_context_saved(soc::APLL).unwrap());
    assert_eq!(pm.pll_state(soc::APLL).unwrap(), PllState::Locked);
    pm.slave_enter(soc::PCIE, STATE_ON).unwrap();
    assert_eq!(pm.slave_state(soc::PCIE).unwrap(), STATE_ON);

    // The saved divisor configuration came back intact.
    assert_eq!(
        pm.pll_get_parameter(soc::APLL, PllParam::FbDiv).unwrap(),
        0x48
    );
    // Domain trace: up at boot, down when the last user left, up again on
    // the PLL relock.
    assert_eq!(pm.mmio().writes_to(soc::FPD_PWR_CTRL), vec![1, 0, 1]);
}

#[test]
fn test_resume_lock_failure_leaves_pll_parked() {
    let mut mmio = cold_boot_mmio();
    // Lock indication gone: the PLL will never relock.
    mmio.preload(soc::CRF_PLL_STATUS, 0);
    mmio.preload(soc::APLL_CTRL, 0x48 << 8);
    let mut pm = platform(mmio);

    pm.pll_release(soc::APLL).unwrap();
    assert_eq!(pm.pll_request(soc::APLL), Err(PmError::Timeout));
    assert_eq!(pm.pll_state(soc::APLL).unwrap(), PllState::Reset);
    // Parked in reset, not left free-running unlocked.
    assert_ne!(pm.mmio().value(soc::APLL_CTRL) & 1, 0);
}

#[test]
fn test_shared_pll_keeps_running_across_one_users_cycle() {
    let mut pm = platform(cold_boot_mmio());
    pm.pll_attach_consumer(soc::IOPLL).unwrap();
    pm.pll_attach_consumer(soc::IOPLL).unwrap();

    // One consumer detaching does not suspend the PLL; suspension is an
    // explicit lifecycle call, consumer counting only guards retuning.
    pm.pll_detach_consumer(soc::IOPLL).unwrap();
    assert!(!pm.pll_context_saved(soc::IOPLL).unwrap());
    assert!(pm.mmio().writes_to(soc::IOPLL_CTRL).is_empty());
}

#[test]
fn test_mode_survives_suspend_resume() {
    let mut pm = platform(cold_boot_mmio());
    pm.pll_set_parameter(soc::APLL, PllParam::Data, 0x2000)
        .unwrap();
    pm.pll_set_mode(soc::APLL, PllMode::Fractional).unwrap();
    assert_eq!(pm.pll_get_mode(soc::APLL).unwrap(), PllMode::Fractional);

    pm.pll_release(soc::APLL).unwrap();
    pm.pll_request(soc::APLL).unwrap();
    // The fractional enable came back with the restored context.
    assert_eq!(pm.pll_get_mode(soc::APLL).unwrap(), PllMode::Fractional);
}

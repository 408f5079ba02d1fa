// Licensed under the Apache-2.0 license

//! A ZynqMP-flavoured platform description used by the scenario tests.
//!
//! Two power domains (the always-on low-power domain and the switchable
//! full-power domain), a handful of slaves covering every handler shape,
//! two PLLs and one reset line of each variant. Addresses follow the real
//! SoC's memory map closely enough to read naturally but the tests only
//! rely on the shapes, not the values.

use pm_core::{
    BootProbe, DomainConfig, DomainId, IslandCtrl, PlHooks, PllConfig, PllRegs, PmError,
    PmSubsystem, ResetAction, ResetConfig, ResetLineVariant, RomServiceId, RomServices,
    SlaveConfig, SlaveHandler, SocConfig, RESET_ID_BASE, STD_SLAVE_FSM,
};
use pm_hal::RegBit;
use pm_testing_common::MockMmio;

// PMU_GLOBAL power control/status block.
pub const FPD_PWR_CTRL: u32 = 0xffd8_0120;
pub const USB0_ISLAND_CTRL: u32 = 0xffd8_0160;
pub const USB0_ISLAND_STATUS: u32 = 0xffd8_0164;
pub const GPU_PP0_CTRL: u32 = 0xffd8_0168;
pub const GPU_PP0_STATUS: u32 = 0xffd8_016c;
pub const GPU_PP1_CTRL: u32 = 0xffd8_0170;
pub const GPU_PP1_STATUS: u32 = 0xffd8_0174;
pub const PCIE_PWR_STATUS: u32 = 0xffd8_0178;

// CRF_APB: full-power-domain clock and reset control.
pub const APLL_CTRL: u32 = 0xfd1a_0020;
pub const APLL_CFG: u32 = 0xfd1a_0024;
pub const APLL_FRAC: u32 = 0xfd1a_0028;
pub const CRF_PLL_STATUS: u32 = 0xfd1a_0044;
pub const CRF_PLL_ERR_INT_EN: u32 = 0xfd1a_0048;
pub const RST_FPD_TOP: u32 = 0xfd1a_0100;
pub const RST_FPD_STATUS: u32 = 0xfd1a_0104;

// CRL_APB: low-power-domain clock and reset control.
pub const IOPLL_CTRL: u32 = 0xff5e_0020;
pub const IOPLL_CFG: u32 = 0xff5e_0024;
pub const IOPLL_FRAC: u32 = 0xff5e_0028;
pub const CRL_PLL_STATUS: u32 = 0xff5e_0040;
pub const RST_LPD_IOU0: u32 = 0xff5e_0230;

// GPIO bank 1, upper-half pins.
pub const GPIO_MASK_DATA_1_MSW: u32 = 0xff0a_000c;
pub const GPIO_DIRM_1: u32 = 0xff0a_0244;
pub const GPIO_DATA_1_RO: u32 = 0xff0a_0064;
pub const BOARD_RESET_LINE: u8 = 11;

pub const LPD: DomainId = DomainId(0);
pub const FPD: DomainId = DomainId(1);

pub const USB0: pm_core::SlaveId = pm_core::SlaveId(0);
pub const TTC0: pm_core::SlaveId = pm_core::SlaveId(1);
pub const GPU: pm_core::SlaveId = pm_core::SlaveId(2);
pub const PCIE: pm_core::SlaveId = pm_core::SlaveId(3);

pub const APLL: pm_core::PllId = pm_core::PllId(0);
pub const IOPLL: pm_core::PllId = pm_core::PllId(1);

pub const RST_GEM0: u32 = RESET_ID_BASE;
pub const RST_FPD: u32 = RESET_ID_BASE + 1;
pub const RST_PCIE_CFG: u32 = RESET_ID_BASE + 2;
pub const RST_PL: u32 = RESET_ID_BASE + 3;
pub const RST_BOARD: u32 = RESET_ID_BASE + 4;

pub const ROM_PCIE_UP: RomServiceId = RomServiceId(1);
pub const ROM_PCIE_DOWN: RomServiceId = RomServiceId(2);
pub const ROM_PCIE_CFG_PULSE: RomServiceId = RomServiceId(3);

/// ROM service table that records calls and can be scripted to fail.
#[derive(Default)]
pub struct RecordingRom {
    pub calls: Vec<RomServiceId>,
    pub fail: Option<(RomServiceId, PmError)>,
}

impl RomServices for RecordingRom {
    fn call(&mut self, service: RomServiceId) -> Result<(), PmError> {
        self.calls.push(service);
        match self.fail {
            Some((failing, err)) if failing == service => Err(err),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricEvent {
    Assert(ResetAction),
    Pulse,
}

/// Programmable-logic hooks that record what the engine forwarded.
#[derive(Default)]
pub struct FabricHooks {
    pub events: Vec<FabricEvent>,
    pub status: u32,
}

impl PlHooks for FabricHooks {
    fn reset_assert(&mut self, action: ResetAction) {
        self.events.push(FabricEvent::Assert(action));
    }

    fn reset_get_status(&mut self) -> u32 {
        self.status
    }

    fn reset_pulse(&mut self) -> Result<(), PmError> {
        self.events.push(FabricEvent::Pulse);
        Ok(())
    }
}

fn domains() -> [DomainConfig; 2] {
    [
        DomainConfig {
            name: "lpd",
            parent: None,
            // Always on; the engine still counts uses.
            ctrl: None,
        },
        DomainConfig {
            name: "fpd",
            parent: None,
            ctrl: Some(RegBit::new(FPD_PWR_CTRL, 1)),
        },
    ]
}

fn slaves() -> [SlaveConfig; 4] {
    [
        SlaveConfig {
            name: "usb0",
            parent: Some(LPD),
            fsm: &STD_SLAVE_FSM,
            handler: SlaveHandler::Island(IslandCtrl {
                ctrl: RegBit::new(USB0_ISLAND_CTRL, 1),
                status: RegBit::new(USB0_ISLAND_STATUS, 1),
            }),
            probe: Some(BootProbe {
                bit: RegBit::new(USB0_ISLAND_STATUS, 1),
                powered: pm_core::STATE_ON,
                off: pm_core::STATE_OFF,
            }),
        },
        SlaveConfig {
            name: "ttc0",
            parent: Some(LPD),
            fsm: &STD_SLAVE_FSM,
            handler: SlaveHandler::None,
            probe: None,
        },
        SlaveConfig {
            name: "gpu",
            parent: Some(FPD),
            fsm: &STD_SLAVE_FSM,
            handler: SlaveHandler::DualIsland([
                IslandCtrl {
                    ctrl: RegBit::new(GPU_PP0_CTRL, 1),
                    status: RegBit::new(GPU_PP0_STATUS, 1),
                },
                IslandCtrl {
                    ctrl: RegBit::new(GPU_PP1_CTRL, 1),
                    status: RegBit::new(GPU_PP1_STATUS, 1),
                },
            ]),
            probe: Some(BootProbe {
                bit: RegBit::new(GPU_PP0_STATUS, 1),
                powered: pm_core::STATE_ON,
                off: pm_core::STATE_OFF,
            }),
        },
        SlaveConfig {
            name: "pcie",
            parent: Some(FPD),
            fsm: &STD_SLAVE_FSM,
            handler: SlaveHandler::Rom {
                up: ROM_PCIE_UP,
                down: ROM_PCIE_DOWN,
            },
            probe: Some(BootProbe {
                bit: RegBit::new(PCIE_PWR_STATUS, 1),
                powered: pm_core::STATE_ON,
                off: pm_core::STATE_OFF,
            }),
        },
    ]
}

fn plls() -> [PllConfig; 2] {
    [
        PllConfig {
            name: "apll",
            parent: Some(FPD),
            regs: PllRegs {
                ctrl: APLL_CTRL,
                cfg: APLL_CFG,
                frac: APLL_FRAC,
                lock: RegBit::new(CRF_PLL_STATUS, 1),
                error_irq: Some(RegBit::new(CRF_PLL_ERR_INT_EN, 1)),
            },
            exclusive_fbdiv: true,
        },
        PllConfig {
            name: "iopll",
            parent: Some(LPD),
            regs: PllRegs {
                ctrl: IOPLL_CTRL,
                cfg: IOPLL_CFG,
                frac: IOPLL_FRAC,
                lock: RegBit::new(CRL_PLL_STATUS, 1),
                error_irq: None,
            },
            exclusive_fbdiv: false,
        },
    ]
}

fn resets() -> [ResetConfig; 5] {
    [
        ResetConfig {
            variant: ResetLineVariant::Generic {
                ctrl: RegBit::new(RST_LPD_IOU0, 1 << 0),
            },
        },
        ResetConfig {
            variant: ResetLineVariant::Gpo {
                ctrl: RegBit::new(RST_FPD_TOP, 1 << 6),
                status_addr: RST_FPD_STATUS,
            },
        },
        ResetConfig {
            variant: ResetLineVariant::Rom {
                ctrl: RegBit::new(RST_FPD_TOP, 1 << 19),
                has_assert: false,
                service: ROM_PCIE_CFG_PULSE,
            },
        },
        ResetConfig {
            variant: ResetLineVariant::Pl,
        },
        ResetConfig {
            variant: ResetLineVariant::GpioBankIo {
                mask_data: GPIO_MASK_DATA_1_MSW,
                direction: GPIO_DIRM_1,
                read_data: GPIO_DATA_1_RO,
                is_mask_data_lsw: false,
                line: BOARD_RESET_LINE,
            },
        },
    ]
}

pub type Platform = PmSubsystem<MockMmio, RecordingRom, FabricHooks>;

/// Build the platform on top of a caller-prepared register file.
pub fn platform(mmio: MockMmio) -> Platform {
    let domains = domains();
    let slaves = slaves();
    let plls = plls();
    let resets = resets();
    let config = SocConfig {
        domains: &domains,
        slaves: &slaves,
        plls: &plls,
        resets: &resets,
    };
    PmSubsystem::new(mmio, RecordingRom::default(), FabricHooks::default(), &config)
        .expect("platform tables are consistent")
}

/// Register file for a cold boot with both PLLs already locked and running
/// by the first-stage boot loader, everything else off.
pub fn cold_boot_mmio() -> MockMmio {
    let mut mmio = MockMmio::new();
    for (ctrl, cfg) in [(APLL_CTRL, APLL_CFG), (IOPLL_CTRL, IOPLL_CFG)] {
        // Reset and bypass clear, a typical feedback divisor programmed.
        mmio.preload(ctrl, 0x48 << 8);
        mmio.preload(cfg, 0x7c5e);
    }
    mmio.preload(CRF_PLL_STATUS, 1);
    mmio.preload(CRL_PLL_STATUS, 1);
    mmio.preload(CRF_PLL_ERR_INT_EN, 1);
    mmio
}

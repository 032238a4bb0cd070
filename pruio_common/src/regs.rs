//! AM335x register map used by the host and the RTU.
//!
//! Every hardware block lives in a fixed physical window. Windows are
//! identified by [`WindowId`]; sub-register offsets are relative to the
//! start of their window. The four GPIO modules share one offset layout.
//!
//! PRU-ICSS blocks (IEP timer, config, RAMs) are listed with their
//! host-side physical address.

use bitflags::bitflags;
use static_assertions::const_assert;

/// Physical address range of a register window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Physical base address.
    pub base: u64,
    /// Window length in bytes.
    pub len: usize,
}

/// Register windows known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowId {
    /// GPIO module 0.
    Gpio0,
    /// GPIO module 1.
    Gpio1,
    /// GPIO module 2.
    Gpio2,
    /// GPIO module 3.
    Gpio3,
    /// Peripheral clock control (GPIO1–3 clocks).
    CmPer,
    /// Wake-up domain clock control (GPIO0 and ADC clocks).
    CmWkup,
    /// Touchscreen/ADC front end.
    AdcTsc,
    /// PRU-ICSS industrial ethernet peripheral (the loop timer).
    Iep,
    /// PRU-ICSS configuration block.
    PruCfg,
    /// PRU-ICSS shared data RAM (ring buffer and interest bitmaps).
    SharedRam,
    /// PRU0 data RAM.
    Pru0Dram,
    /// PRU0 control registers.
    Pru0Ctrl,
    /// PRU0 instruction RAM.
    Pru0Iram,
}

impl WindowId {
    /// GPIO windows indexed by module number.
    pub const GPIO: [WindowId; 4] = [Self::Gpio0, Self::Gpio1, Self::Gpio2, Self::Gpio3];

    /// Fixed physical address and length of this window.
    pub const fn region(self) -> Region {
        match self {
            Self::Gpio0 => Region { base: 0x44e0_7000, len: 0x1000 },
            Self::Gpio1 => Region { base: 0x4804_c000, len: 0x1000 },
            Self::Gpio2 => Region { base: 0x481a_c000, len: 0x1000 },
            Self::Gpio3 => Region { base: 0x481a_e000, len: 0x1000 },
            Self::CmPer => Region { base: 0x44e0_0000, len: 0x400 },
            Self::CmWkup => Region { base: 0x44e0_0400, len: 0x100 },
            Self::AdcTsc => Region { base: 0x44e0_d000, len: 0x1000 },
            Self::Iep => Region { base: 0x4a32_e000, len: 0x400 },
            Self::PruCfg => Region { base: 0x4a32_6000, len: 0x100 },
            Self::SharedRam => Region { base: 0x4a31_0000, len: 0x3000 },
            Self::Pru0Dram => Region { base: 0x4a30_0000, len: 0x2000 },
            Self::Pru0Ctrl => Region { base: 0x4a32_2000, len: 0x100 },
            Self::Pru0Iram => Region { base: 0x4a33_4000, len: 0x2000 },
        }
    }

    /// Short name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gpio0 => "gpio0",
            Self::Gpio1 => "gpio1",
            Self::Gpio2 => "gpio2",
            Self::Gpio3 => "gpio3",
            Self::CmPer => "cm_per",
            Self::CmWkup => "cm_wkup",
            Self::AdcTsc => "adc_tsc",
            Self::Iep => "iep",
            Self::PruCfg => "pru_cfg",
            Self::SharedRam => "shared_ram",
            Self::Pru0Dram => "pru0_dram",
            Self::Pru0Ctrl => "pru0_ctrl",
            Self::Pru0Iram => "pru0_iram",
        }
    }
}

// ─── GPIO ───────────────────────────────────────────────────────────

/// GPIO module sub-registers.
pub mod gpio {
    /// Module control (0 = enabled).
    pub const CTRL: usize = 0x130;
    /// Output enable: bit clear drives the pin, bit set tri-states it.
    pub const OE: usize = 0x134;
    /// Sampled pad levels.
    pub const DATAIN: usize = 0x138;
    /// Driven output levels.
    pub const DATAOUT: usize = 0x13c;
    /// Per-pin debounce enable.
    pub const DEBOUNCENABLE: usize = 0x150;
    /// Debounce time, `(value + 1) * 31 µs`.
    pub const DEBOUNCINGTIME: usize = 0x154;
    /// Writing 1 clears the matching DATAOUT bit.
    pub const CLEARDATAOUT: usize = 0x190;
    /// Writing 1 sets the matching DATAOUT bit.
    pub const SETDATAOUT: usize = 0x194;
}

// ─── Clock control ──────────────────────────────────────────────────

/// Clock module sub-registers.
pub mod clock {
    /// `CM_PER` offset of the GPIO1 clock control.
    pub const CM_PER_GPIO1_CLKCTRL: usize = 0xac;
    /// `CM_PER` offset of the GPIO2 clock control.
    pub const CM_PER_GPIO2_CLKCTRL: usize = 0xb0;
    /// `CM_PER` offset of the GPIO3 clock control.
    pub const CM_PER_GPIO3_CLKCTRL: usize = 0xb4;
    /// `CM_WKUP` offset of the GPIO0 clock control.
    pub const CM_WKUP_GPIO0_CLKCTRL: usize = 0x08;
    /// `CM_WKUP` offset of the ADC clock control.
    pub const CM_WKUP_ADC_TSC_CLKCTRL: usize = 0xbc;

    /// Module mode "enabled".
    pub const MODULEMODE_ENABLE: u32 = 0x02;
    /// Optional functional debounce clock enable.
    pub const OPTFCLKEN_DBCLK: u32 = 1 << 18;
}

// ─── ADC front end ──────────────────────────────────────────────────

/// ADC/TSC sub-registers.
pub mod adc {
    /// Interrupt status (write 1 to clear).
    pub const IRQSTATUS: usize = 0x28;
    /// Interrupt enable set.
    pub const IRQENABLE_SET: usize = 0x2c;
    /// Module control, see [`AdcCtrl`](super::AdcCtrl).
    pub const CTRL: usize = 0x40;
    /// Conversion range limits.
    pub const ADCRANGE: usize = 0x48;
    /// Clock divider (value + 1).
    pub const CLKDIV: usize = 0x4c;
    /// One bit per enabled step; bit 0 is the charge step.
    pub const STEPENABLE: usize = 0x54;
    /// Words pending in FIFO0.
    pub const FIFO0COUNT: usize = 0xe4;
    /// Words pending in FIFO1.
    pub const FIFO1COUNT: usize = 0xf0;
    /// FIFO0 read port.
    pub const FIFO0DATA: usize = 0x100;
    /// FIFO1 read port.
    pub const FIFO1DATA: usize = 0x200;

    /// End-of-sequence interrupt bit.
    pub const IRQ_END_OF_SEQUENCE: u32 = 1 << 1;

    /// Step configuration register of step `n` (1–16).
    pub const fn stepconfig(n: usize) -> usize {
        0x64 + (n - 1) * 8
    }

    /// Step delay register of step `n` (1–16).
    pub const fn stepdelay(n: usize) -> usize {
        0x68 + (n - 1) * 8
    }

    /// Shift of the positive input selector in a step config word.
    pub const STEPCONFIG_SEL_INP_SHIFT: u32 = 19;
    /// Shift of the negative input selector in a step config word.
    pub const STEPCONFIG_SEL_INM_SHIFT: u32 = 15;
    /// Step config bit routing results to FIFO1 instead of FIFO0.
    pub const STEPCONFIG_FIFO1: u32 = 1 << 26;
    /// Mask of an input selector after shifting.
    pub const STEPCONFIG_INPUT_MASK: u32 = 0x0f;
    /// Shift of the hardware averaging field in a step config word.
    pub const STEPCONFIG_AVERAGING_SHIFT: u32 = 2;
    /// Shift of the sample delay field in a step delay word.
    pub const STEPDELAY_SAMPLE_SHIFT: u32 = 24;

    /// Step id tag in a FIFO word (bits 16–19).
    pub const FIFO_STEP_ID_MASK: u32 = 0x000f_0000;
    /// Shift of the step id tag.
    pub const FIFO_STEP_ID_SHIFT: u32 = 16;
    /// Conversion result in a FIFO word.
    pub const FIFO_DATA_MASK: u32 = 0x0fff;
    /// FIFO depth in words.
    pub const FIFO_DEPTH: usize = 64;
}

bitflags! {
    /// ADC `CTRL` register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdcCtrl: u32 {
        /// Converter enabled.
        const ENABLE = 1 << 0;
        /// Tag each FIFO word with its step id.
        const STEP_ID_TAG = 1 << 1;
        /// Step config registers writable.
        const STEPCONFIG_WRITE_PROTECT_OFF = 1 << 2;
    }
}

// ─── IEP timer ──────────────────────────────────────────────────────

/// IEP timer sub-registers.
pub mod iep {
    /// Global config: enable bit and increment value.
    pub const TMR_GLB_CFG: usize = 0x00;
    /// Global status (overflow).
    pub const TMR_GLB_STS: usize = 0x04;
    /// Compensation.
    pub const TMR_COMPEN: usize = 0x08;
    /// Counter (write 1s to clear).
    pub const TMR_CNT: usize = 0x0c;
    /// Compare config.
    pub const TMR_CMP_CFG: usize = 0x40;
    /// Compare status (write 1 to clear).
    pub const TMR_CMP_STS: usize = 0x44;
    /// Compare 0 value.
    pub const TMR_CMP0: usize = 0x48;
    /// Compare 1 value.
    pub const TMR_CMP1: usize = 0x4c;

    /// Counter enable bit in `TMR_GLB_CFG`.
    pub const GLB_CFG_CNT_ENABLE: u32 = 1;
    /// Shift of the default increment field in `TMR_GLB_CFG`.
    pub const GLB_CFG_DEFAULT_INC_SHIFT: u32 = 4;
    /// Mask of the default increment field after shifting.
    pub const GLB_CFG_DEFAULT_INC_MASK: u32 = 0x0f;
    /// IEP input clock period in nanoseconds (200 MHz).
    pub const CLOCK_PERIOD_NS: u64 = 5;
    /// Compare 0 match bit in `TMR_CMP_STS`.
    pub const CMP_STS_CMP0: u32 = 1;
}

bitflags! {
    /// IEP `TMR_CMP_CFG` register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IepCmpCfg: u32 {
        /// Reset the counter on a compare 0 match.
        const CMP0_RST_CNT_EN = 1 << 0;
        /// Compare 0 event enabled.
        const CMP0_EN = 1 << 1;
        /// Compare 1 event enabled.
        const CMP1_EN = 1 << 2;
    }
}

// ─── PRU-ICSS ───────────────────────────────────────────────────────

/// PRU-ICSS config and PRU control sub-registers.
pub mod pru {
    /// `SYSCFG` in the PRU-ICSS config block.
    pub const CFG_SYSCFG: usize = 0x04;
    /// `SYSCFG` bit that, when set, blocks the OCP master port.
    pub const SYSCFG_STANDBY_INIT: u32 = 1 << 4;

    /// PRU control register.
    pub const CONTROL: usize = 0x00;
    /// Soft reset, active low.
    pub const CONTROL_SOFT_RST_N: u32 = 1 << 0;
    /// Execution enable.
    pub const CONTROL_ENABLE: u32 = 1 << 1;
    /// Shift of the program counter reset value.
    pub const CONTROL_PCTR_RST_VAL_SHIFT: u32 = 16;
}

const_assert!(adc::stepconfig(7) == 0x94);
const_assert!(adc::stepdelay(16) == 0xe0);

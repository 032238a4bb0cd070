//! Register-level drivers for the peripherals the loop touches.
//!
//! [`Peripherals`] groups the register windows of one board. It is generic
//! over [`RegisterWindow`] so the same drivers run against `/dev/mem`
//! mappings or the simulator in [`crate::sim`].

use std::path::Path;

use pruio_common::consts::GPIO_MODULES;
use pruio_common::error::{ShmError, ShmResult};
use pruio_common::mmio::{MappedWindow, RegisterWindow, map_gpio_windows, open_memory_device};
use pruio_common::regs::{AdcCtrl, IepCmpCfg, WindowId, adc, clock, gpio, iep, pru};

use crate::adc::SWEEP_INPUTS;
use crate::mux::MuxPosition;

/// IEP compare value for one loop period: 83.333 µs at 200 MHz, increment 5.
pub const IEP_COMPARE_TICKS: u32 = 83_333;

/// IEP counter increment per clock.
pub const IEP_INCREMENT: u32 = 5;

/// `STEPENABLE` mask for steps 1–7.
pub const SWEEP_STEP_MASK: u32 = 0xfe;

/// GPIO0 debounce time, `(255 + 1) * 31 µs`.
pub const GPIO0_DEBOUNCE: u32 = 255;

/// Register windows used by the sampling loop.
pub struct Peripherals<W> {
    /// GPIO modules 0–3.
    pub gpio: [W; GPIO_MODULES],
    /// Peripheral clock control.
    pub cm_per: W,
    /// Wake-up clock control.
    pub cm_wkup: W,
    /// ADC front end.
    pub adc: W,
    /// IEP timer.
    pub iep: W,
    /// PRU-ICSS configuration.
    pub pru_cfg: W,
}

impl Peripherals<MappedWindow> {
    /// Map every window through `device`.
    pub fn map(device: &Path) -> ShmResult<Self> {
        let region = WindowId::AdcTsc.region();
        let file = open_memory_device(device).map_err(|source| ShmError::Map {
            window: WindowId::AdcTsc.name(),
            base: region.base,
            len: region.len,
            source,
        })?;
        Ok(Self {
            gpio: map_gpio_windows(device)?,
            cm_per: MappedWindow::map(&file, WindowId::CmPer)?,
            cm_wkup: MappedWindow::map(&file, WindowId::CmWkup)?,
            adc: MappedWindow::map(&file, WindowId::AdcTsc)?,
            iep: MappedWindow::map(&file, WindowId::Iep)?,
            pru_cfg: MappedWindow::map(&file, WindowId::PruCfg)?,
        })
    }
}

impl<W: RegisterWindow> Peripherals<W> {
    // ─── Init ───────────────────────────────────────────────────────

    /// Open the OCP master port so the PRU can reach L4 peripherals.
    pub fn enable_ocp(&self) {
        self.pru_cfg
            .clear_bits(pru::CFG_SYSCFG, pru::SYSCFG_STANDBY_INIT);
    }

    /// Enable all GPIO modules and their clocks.
    pub fn init_gpio(&self) {
        let clocks = [
            (&self.cm_wkup, clock::CM_WKUP_GPIO0_CLKCTRL),
            (&self.cm_per, clock::CM_PER_GPIO1_CLKCTRL),
            (&self.cm_per, clock::CM_PER_GPIO2_CLKCTRL),
            (&self.cm_per, clock::CM_PER_GPIO3_CLKCTRL),
        ];
        for (module, (cm, offset)) in self.gpio.iter().zip(clocks) {
            module.write(gpio::CTRL, 0);
            cm.write(offset, clock::MODULEMODE_ENABLE | clock::OPTFCLKEN_DBCLK);
        }
        self.gpio[0].write(gpio::DEBOUNCINGTIME, GPIO0_DEBOUNCE);
    }

    /// Program the seven-step one-shot sweep and enable the converter.
    pub fn init_adc(&self) {
        self.cm_wkup
            .write(clock::CM_WKUP_ADC_TSC_CLKCTRL, clock::MODULEMODE_ENABLE);
        self.adc.clear_bits(adc::CTRL, AdcCtrl::ENABLE.bits());

        self.adc.write(adc::CLKDIV, 0);
        self.adc.write(adc::ADCRANGE, 0x0fff << 16);
        self.adc.write(adc::STEPENABLE, 0);

        self.adc
            .set_bits(adc::CTRL, AdcCtrl::STEPCONFIG_WRITE_PROTECT_OFF.bits());
        for (index, input) in SWEEP_INPUTS.iter().enumerate() {
            let step = index + 1;
            // Software one-shot, no averaging, FIFO0.
            let config = (input << adc::STEPCONFIG_SEL_INP_SHIFT)
                | (input << adc::STEPCONFIG_SEL_INM_SHIFT);
            self.adc.write(adc::stepconfig(step), config);
            self.adc.write(adc::stepdelay(step), 0);
        }
        self.adc.set_bits(adc::CTRL, AdcCtrl::STEP_ID_TAG.bits());

        self.adc.write(adc::IRQSTATUS, adc::IRQ_END_OF_SEQUENCE);
        self.adc.write(adc::IRQENABLE_SET, adc::IRQ_END_OF_SEQUENCE);
        self.adc
            .clear_bits(adc::CTRL, AdcCtrl::STEPCONFIG_WRITE_PROTECT_OFF.bits());

        self.flush_fifo(adc::FIFO0COUNT, adc::FIFO0DATA);
        self.flush_fifo(adc::FIFO1COUNT, adc::FIFO1DATA);

        self.adc.set_bits(adc::CTRL, AdcCtrl::ENABLE.bits());
    }

    fn flush_fifo(&self, count: usize, data: usize) {
        for _ in 0..self.adc.read(count) {
            self.adc.read(data);
        }
    }

    /// Program the IEP timer to raise compare 0 every `compare` counts and
    /// restart from zero on each match.
    pub fn init_iep_timer(&self, compare: u32) {
        self.iep.clear_bits(iep::TMR_GLB_CFG, iep::GLB_CFG_CNT_ENABLE);
        self.iep.write(iep::TMR_CNT, u32::MAX);
        self.iep.write(iep::TMR_GLB_STS, 1);
        self.iep.write(iep::TMR_CMP_STS, 0xf);

        self.iep.write(iep::TMR_CMP0, compare);
        self.iep.write(
            iep::TMR_CMP_CFG,
            (IepCmpCfg::CMP0_EN | IepCmpCfg::CMP0_RST_CNT_EN).bits(),
        );
        self.iep
            .set_bits(iep::TMR_GLB_CFG, IEP_INCREMENT << iep::GLB_CFG_DEFAULT_INC_SHIFT);
        self.iep.write(iep::TMR_COMPEN, 0);
        self.iep.set_bits(iep::TMR_GLB_CFG, iep::GLB_CFG_CNT_ENABLE);
    }

    // ─── Per cycle ──────────────────────────────────────────────────

    /// Drive the multiplexer select lines for `position`.
    #[inline]
    pub fn set_mux(&self, position: MuxPosition) {
        for line in position.lines() {
            let register = if line.high {
                gpio::SETDATAOUT
            } else {
                gpio::CLEARDATAOUT
            };
            self.gpio[line.module].write(register, 1 << line.bit);
        }
    }

    /// Kick off one conversion sweep.
    #[inline]
    pub fn start_sweep(&self) {
        self.adc.write(adc::STEPENABLE, SWEEP_STEP_MASK);
    }

    /// Results waiting in FIFO0.
    #[inline]
    pub fn fifo0_count(&self) -> u32 {
        self.adc.read(adc::FIFO0COUNT)
    }

    /// Pop one FIFO0 result as `(step_id, raw_value)`.
    #[inline]
    pub fn read_fifo0(&self) -> (u8, u16) {
        let word = self.adc.read(adc::FIFO0DATA);
        let step = (word & adc::FIFO_STEP_ID_MASK) >> adc::FIFO_STEP_ID_SHIFT;
        (step as u8, (word & adc::FIFO_DATA_MASK) as u16)
    }

    /// Data-in word of GPIO module `module`.
    #[inline]
    pub fn datain(&self, module: usize) -> u32 {
        self.gpio[module].read(gpio::DATAIN)
    }

    /// `true` once compare 0 has matched.
    #[inline]
    pub fn compare_pending(&self) -> bool {
        self.iep.read(iep::TMR_CMP_STS) & iep::CMP_STS_CMP0 != 0
    }

    /// Spin until compare 0 matches, then acknowledge it.
    ///
    /// Returns `true` if the match had already happened on entry, i.e. the
    /// cycle overran its period.
    pub fn wait_for_compare(&self) -> bool {
        let overrun = self.compare_pending();
        while !self.compare_pending() {
            std::hint::spin_loop();
        }
        self.iep.write(iep::TMR_CMP_STS, iep::CMP_STS_CMP0);
        overrun
    }
}

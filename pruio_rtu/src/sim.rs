//! Register-level board simulator.
//!
//! [`SimBoard`] emulates the register semantics the loop and the host rely
//! on, so both can run on a development machine:
//!
//! - GPIO: `OE` resets to all inputs; `DATAIN` reflects externally applied
//!   levels on input pins and `DATAOUT` on output pins; `SETDATAOUT` and
//!   `CLEARDATAOUT` modify `DATAOUT`.
//! - ADC: writing `STEPENABLE` while the converter is enabled converts the
//!   enabled steps at once, tags results with their step id, pushes them to
//!   the FIFO selected by each step config and raises end-of-sequence.
//!   Input AIN6 carries the multiplexer signal picked by the select lines.
//! - IEP: compare 0 becomes pending once per period of wall-clock time.
//!   The period follows `CMP0` and the increment, or a fixed override.
//!   While the counter is disabled the compare flag reads as set, so an
//!   unconfigured timer never blocks the loop.
//! - Everything else is plain storage.
//!
//! All windows of one board share a single lock; each register access is
//! atomic with respect to the others.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pruio_common::consts::{GPIO_MODULES, MUX_POSITIONS};
use pruio_common::message::Level;
use pruio_common::mmio::RegisterWindow;
use pruio_common::pins::{MUX_SELECT_PINS, bit_of, module_of};
use pruio_common::regs::{AdcCtrl, IepCmpCfg, WindowId, adc, gpio, iep};

use crate::adc::MUX_CHANNELS;
use crate::hw::Peripherals;

const WINDOWS: [WindowId; 13] = [
    WindowId::Gpio0,
    WindowId::Gpio1,
    WindowId::Gpio2,
    WindowId::Gpio3,
    WindowId::CmPer,
    WindowId::CmWkup,
    WindowId::AdcTsc,
    WindowId::Iep,
    WindowId::PruCfg,
    WindowId::SharedRam,
    WindowId::Pru0Dram,
    WindowId::Pru0Ctrl,
    WindowId::Pru0Iram,
];

/// AIN input wired to the multiplexer output.
const MUX_INPUT: usize = 6;

/// Handle to a simulated board. Clones share the same board.
#[derive(Clone)]
pub struct SimBoard {
    state: Arc<Mutex<BoardState>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Board at reset; timer period follows its registers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::new(None))),
        }
    }

    /// Board whose timer fires every `period` regardless of `CMP0`.
    ///
    /// A zero `period` leaves pacing to the timer registers.
    pub fn with_period(period: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::new(Some(period)))),
        }
    }

    /// Register window `id`.
    pub fn window(&self, id: WindowId) -> SimWindow {
        SimWindow {
            id,
            state: Arc::clone(&self.state),
        }
    }

    /// The four GPIO windows.
    pub fn gpio_windows(&self) -> [SimWindow; GPIO_MODULES] {
        WindowId::GPIO.map(|id| self.window(id))
    }

    /// Every window the sampling loop uses.
    pub fn peripherals(&self) -> Peripherals<SimWindow> {
        Peripherals {
            gpio: self.gpio_windows(),
            cm_per: self.window(WindowId::CmPer),
            cm_wkup: self.window(WindowId::CmWkup),
            adc: self.window(WindowId::AdcTsc),
            iep: self.window(WindowId::Iep),
            pru_cfg: self.window(WindowId::PruCfg),
        }
    }

    /// Apply an external level to `pin`.
    pub fn set_input(&self, pin: u8, level: Level) {
        let mut state = self.state.lock();
        let word = &mut state.inputs[module_of(pin)];
        let mask = 1 << bit_of(pin);
        if level.is_high() {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Set the raw 12-bit signal behind logical ADC channel `channel`.
    ///
    /// Channels 0–5 are wired to AIN0–AIN5, channels 6–13 sit behind the
    /// multiplexer.
    pub fn set_adc_channel(&self, channel: u8, raw: u16) {
        let mut state = self.state.lock();
        let raw = raw & adc::FIFO_DATA_MASK as u16;
        if let Some(position) = MUX_CHANNELS.iter().position(|&c| c == channel) {
            state.mux_inputs[position] = raw;
        } else if let Some(input) = state.ain.get_mut(channel as usize) {
            *input = raw;
        }
    }

    /// Level `pin` is driven to by `DATAOUT`.
    pub fn output_level(&self, pin: u8) -> Level {
        let state = self.state.lock();
        let word = state.word(WindowId::GPIO[module_of(pin)], gpio::DATAOUT);
        Level::of_bit(word, bit_of(pin))
    }

    /// `true` if `OE` configures `pin` as an output.
    pub fn is_output(&self, pin: u8) -> bool {
        let state = self.state.lock();
        state.word(WindowId::GPIO[module_of(pin)], gpio::OE) & (1 << bit_of(pin)) == 0
    }

    /// Multiplexer position currently selected by the select lines.
    pub fn mux_position(&self) -> usize {
        self.state.lock().mux_position()
    }

    /// Timer periods elapsed and acknowledged so far.
    pub fn timer_ticks(&self) -> u64 {
        self.state.lock().timer.ticks
    }

    /// Raw stored value of a register, without side effects.
    pub fn peek(&self, id: WindowId, offset: usize) -> u32 {
        self.state.lock().word(id, offset)
    }

    /// Copy `len` bytes starting at `offset` out of window `id`.
    pub fn read_bytes(&self, id: WindowId, offset: usize, len: usize) -> Vec<u8> {
        let state = self.state.lock();
        (offset..offset + len)
            .map(|byte| (state.word(id, byte & !3) >> ((byte & 3) * 8)) as u8)
            .collect()
    }
}

/// One register window of a [`SimBoard`].
#[derive(Clone)]
pub struct SimWindow {
    id: WindowId,
    state: Arc<Mutex<BoardState>>,
}

impl RegisterWindow for SimWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn read(&self, offset: usize) -> u32 {
        self.state.lock().read(self.id, offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.state.lock().write(self.id, offset, value);
    }
}

// ─── Board state ────────────────────────────────────────────────────

struct TimerState {
    period_override: Option<Duration>,
    // Start of the current period while the counter runs.
    period_start: Option<Instant>,
    ticks: u64,
}

struct BoardState {
    registers: HashMap<WindowId, Vec<u32>>,
    inputs: [u32; GPIO_MODULES],
    ain: [u16; 8],
    mux_inputs: [u16; MUX_POSITIONS],
    fifos: [VecDeque<u32>; 2],
    timer: TimerState,
}

impl BoardState {
    fn new(period_override: Option<Duration>) -> Self {
        let mut registers: HashMap<WindowId, Vec<u32>> = WINDOWS
            .iter()
            .map(|&id| (id, vec![0; id.region().len / 4]))
            .collect();
        for id in WindowId::GPIO {
            if let Some(words) = registers.get_mut(&id) {
                words[gpio::OE / 4] = u32::MAX;
            }
        }
        Self {
            registers,
            inputs: [0; GPIO_MODULES],
            ain: [0; 8],
            mux_inputs: [0; MUX_POSITIONS],
            fifos: [VecDeque::new(), VecDeque::new()],
            timer: TimerState {
                period_override,
                period_start: None,
                ticks: 0,
            },
        }
    }

    fn word(&self, id: WindowId, offset: usize) -> u32 {
        self.registers
            .get(&id)
            .and_then(|words| words.get(offset / 4))
            .copied()
            .unwrap_or(0)
    }

    fn store(&mut self, id: WindowId, offset: usize, value: u32) {
        if let Some(slot) = self
            .registers
            .get_mut(&id)
            .and_then(|words| words.get_mut(offset / 4))
        {
            *slot = value;
        }
    }

    fn read(&mut self, id: WindowId, offset: usize) -> u32 {
        match id {
            WindowId::Gpio0 | WindowId::Gpio1 | WindowId::Gpio2 | WindowId::Gpio3 => {
                self.read_gpio(id, offset)
            }
            WindowId::AdcTsc => match offset {
                adc::FIFO0COUNT => self.fifos[0].len() as u32,
                adc::FIFO1COUNT => self.fifos[1].len() as u32,
                adc::FIFO0DATA => self.fifos[0].pop_front().unwrap_or(0),
                adc::FIFO1DATA => self.fifos[1].pop_front().unwrap_or(0),
                _ => self.word(id, offset),
            },
            WindowId::Iep if offset == iep::TMR_CMP_STS => {
                let pending = self.compare_due(Instant::now());
                self.word(id, offset) | u32::from(pending)
            }
            _ => self.word(id, offset),
        }
    }

    fn write(&mut self, id: WindowId, offset: usize, value: u32) {
        match id {
            WindowId::Gpio0 | WindowId::Gpio1 | WindowId::Gpio2 | WindowId::Gpio3 => {
                self.write_gpio(id, offset, value)
            }
            WindowId::AdcTsc => self.write_adc(offset, value),
            WindowId::Iep => self.write_iep(offset, value),
            _ => self.store(id, offset, value),
        }
    }

    // ─── GPIO ───────────────────────────────────────────────────────

    fn read_gpio(&self, id: WindowId, offset: usize) -> u32 {
        match offset {
            gpio::DATAIN => {
                let module = gpio_module(id);
                let oe = self.word(id, gpio::OE);
                let dataout = self.word(id, gpio::DATAOUT);
                (self.inputs[module] & oe) | (dataout & !oe)
            }
            gpio::SETDATAOUT | gpio::CLEARDATAOUT => self.word(id, gpio::DATAOUT),
            _ => self.word(id, offset),
        }
    }

    fn write_gpio(&mut self, id: WindowId, offset: usize, value: u32) {
        let dataout = self.word(id, gpio::DATAOUT);
        match offset {
            gpio::SETDATAOUT => self.store(id, gpio::DATAOUT, dataout | value),
            gpio::CLEARDATAOUT => self.store(id, gpio::DATAOUT, dataout & !value),
            gpio::DATAIN => {}
            _ => self.store(id, offset, value),
        }
    }

    fn mux_position(&self) -> usize {
        MUX_SELECT_PINS.iter().fold(0, |position, &pin| {
            let word = self.word(WindowId::GPIO[module_of(pin)], gpio::DATAOUT);
            (position << 1) | ((word >> bit_of(pin)) & 1) as usize
        })
    }

    // ─── ADC ────────────────────────────────────────────────────────

    fn write_adc(&mut self, offset: usize, value: u32) {
        let id = WindowId::AdcTsc;
        match offset {
            adc::IRQSTATUS => {
                let status = self.word(id, offset);
                self.store(id, offset, status & !value);
            }
            adc::STEPENABLE => {
                self.store(id, offset, value);
                let ctrl = AdcCtrl::from_bits_truncate(self.word(id, adc::CTRL));
                if ctrl.contains(AdcCtrl::ENABLE) && value != 0 {
                    self.sweep(value, ctrl.contains(AdcCtrl::STEP_ID_TAG));
                }
            }
            adc::FIFO0COUNT | adc::FIFO1COUNT | adc::FIFO0DATA | adc::FIFO1DATA => {}
            _ => self.store(id, offset, value),
        }
    }

    fn sweep(&mut self, enabled: u32, tag: bool) {
        let id = WindowId::AdcTsc;
        let mux = self.mux_position();
        for step in 1..=16usize {
            if enabled & (1 << step) == 0 {
                continue;
            }
            let config = self.word(id, adc::stepconfig(step));
            let input = ((config >> adc::STEPCONFIG_SEL_INP_SHIFT) & adc::STEPCONFIG_INPUT_MASK)
                as usize;
            let sample = if input == MUX_INPUT {
                self.mux_inputs[mux]
            } else {
                self.ain.get(input).copied().unwrap_or(0)
            };
            let step_id = if tag { ((step - 1) as u32) << adc::FIFO_STEP_ID_SHIFT } else { 0 };
            let fifo = &mut self.fifos[usize::from(config & adc::STEPCONFIG_FIFO1 != 0)];
            if fifo.len() < adc::FIFO_DEPTH {
                fifo.push_back(step_id | u32::from(sample));
            }
        }
        // One-shot steps disable themselves.
        self.store(id, adc::STEPENABLE, 0);
        let status = self.word(id, adc::IRQSTATUS);
        self.store(id, adc::IRQSTATUS, status | adc::IRQ_END_OF_SEQUENCE);
    }

    // ─── IEP ────────────────────────────────────────────────────────

    fn write_iep(&mut self, offset: usize, value: u32) {
        let id = WindowId::Iep;
        match offset {
            iep::TMR_GLB_CFG => {
                let was_running = self.word(id, offset) & iep::GLB_CFG_CNT_ENABLE != 0;
                let running = value & iep::GLB_CFG_CNT_ENABLE != 0;
                self.store(id, offset, value);
                if running && !was_running {
                    self.timer.period_start = Some(Instant::now());
                } else if !running {
                    self.timer.period_start = None;
                }
            }
            iep::TMR_CMP_STS => {
                let status = self.word(id, offset);
                self.store(id, offset, status & !value);
                if value & iep::CMP_STS_CMP0 != 0 {
                    self.acknowledge_compare(Instant::now());
                }
            }
            iep::TMR_GLB_STS => {
                let status = self.word(id, offset);
                self.store(id, offset, status & !value);
            }
            _ => self.store(id, offset, value),
        }
    }

    fn period(&self) -> Option<Duration> {
        if let Some(period) = self.timer.period_override.filter(|p| !p.is_zero()) {
            return Some(period);
        }
        let cfg = IepCmpCfg::from_bits_truncate(self.word(WindowId::Iep, iep::TMR_CMP_CFG));
        if !cfg.contains(IepCmpCfg::CMP0_EN) {
            return None;
        }
        let increment = u64::from(
            (self.word(WindowId::Iep, iep::TMR_GLB_CFG) >> iep::GLB_CFG_DEFAULT_INC_SHIFT)
                & iep::GLB_CFG_DEFAULT_INC_MASK,
        )
        .max(1);
        let compare = u64::from(self.word(WindowId::Iep, iep::TMR_CMP0));
        let nanos = compare * iep::CLOCK_PERIOD_NS / increment;
        (nanos > 0).then(|| Duration::from_nanos(nanos))
    }

    fn compare_due(&self, now: Instant) -> bool {
        match (self.timer.period_start, self.period()) {
            (Some(start), Some(period)) => now.duration_since(start) >= period,
            _ => true,
        }
    }

    fn acknowledge_compare(&mut self, now: Instant) {
        let (Some(start), Some(period)) = (self.timer.period_start, self.period()) else {
            return;
        };
        let elapsed = now.duration_since(start);
        if elapsed < period {
            return;
        }
        // The counter restarts at each match; skip periods that were missed.
        let periods = (elapsed.as_nanos() / period.as_nanos()) as u32;
        self.timer.period_start = Some(start + period * periods);
        self.timer.ticks += u64::from(periods);
    }
}

fn gpio_module(id: WindowId) -> usize {
    WindowId::GPIO.iter().position(|&g| g == id).unwrap_or(0)
}

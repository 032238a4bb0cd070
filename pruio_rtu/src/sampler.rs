//! The RTU sampling loop.
//!
//! [`Sampler`] owns every piece of RTU-side state: the register windows,
//! the producer half of the ring, the interest reader, the multiplexer
//! position and both channel tables. One iteration:
//!
//! 1. advance the multiplexer and drive its select lines
//! 2. start a conversion sweep
//! 3. drain whole sweeps from FIFO0 and map each result to a logical channel
//! 4. apply fast/slow channel reporting
//! 5. poll tracked GPIO pins for level changes
//! 6. pick up newly requested channels
//! 7. wait for the timer compare and acknowledge it
//!
//! Messages that do not fit in the ring are dropped and counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pruio_common::consts::GPIO_MODULES;
use pruio_common::error::ShmResult;
use pruio_common::message::Message;
use pruio_common::mmio::RegisterWindow;
use pruio_common::shm::attach_rtu;
use pruio_common::shm::interest::{InterestReader, InterestSnapshot};
use pruio_common::shm::region::SharedRegion;
use pruio_common::shm::ring::RingProducer;
use tracing::{debug, info, trace};

use crate::adc::{AdcChannels, SWEEP_STEPS, logical_channel};
use crate::gpio::GpioChannels;
use crate::hw::{IEP_COMPARE_TICKS, Peripherals};
use crate::mux::MuxPosition;

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Hardware and tables not yet initialised.
    Init,
    /// Iterating.
    Running,
}

/// Loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Completed iterations.
    pub cycles: u64,
    /// Iterations that reached the timer wait after compare had fired.
    pub overruns: u64,
    /// Messages written to the ring.
    pub messages: u64,
    /// Messages dropped on a full ring.
    pub dropped: u64,
}

/// RTU sampling loop over register windows `W`.
pub struct Sampler<W> {
    hw: Peripherals<W>,
    producer: RingProducer,
    interest: InterestReader,
    known: InterestSnapshot,
    mux: MuxPosition,
    adc: AdcChannels,
    gpio: GpioChannels,
    stats: SamplerStats,
    state: SamplerState,
    compare_ticks: u32,
}

impl<W: RegisterWindow> Sampler<W> {
    /// Attach to `region` as its RTU.
    ///
    /// # Errors
    /// `ShmError::AlreadyAttached` if another RTU holds the region.
    pub fn new(hw: Peripherals<W>, region: &Arc<SharedRegion>) -> ShmResult<Self> {
        let (producer, interest) = attach_rtu(region)?;
        Ok(Self {
            hw,
            producer,
            interest,
            known: InterestSnapshot::default(),
            mux: MuxPosition::default(),
            adc: AdcChannels::new(),
            gpio: GpioChannels::new(),
            stats: SamplerStats::default(),
            state: SamplerState::Init,
            compare_ticks: IEP_COMPARE_TICKS,
        })
    }

    /// Use a different IEP compare value (timer counts per iteration).
    pub fn with_compare_ticks(mut self, ticks: u32) -> Self {
        self.compare_ticks = ticks;
        self
    }

    /// Bring up the hardware and reset all loop state, then enter Running.
    pub fn init(&mut self) {
        self.hw.enable_ocp();
        self.producer.initialize();
        self.hw.init_adc();
        self.adc = AdcChannels::new();
        self.hw.init_gpio();
        self.gpio = GpioChannels::new();
        self.hw.init_iep_timer(self.compare_ticks);
        self.known = InterestSnapshot::default();
        self.mux = MuxPosition::default();
        self.stats = SamplerStats::default();
        self.state = SamplerState::Running;
        debug!(compare_ticks = self.compare_ticks, "Sampler initialised");
    }

    /// One iteration without the timer wait. Initialises first if needed.
    pub fn step(&mut self) {
        if self.state == SamplerState::Init {
            self.init();
        }

        self.mux = self.mux.next();
        self.hw.set_mux(self.mux);
        self.hw.start_sweep();

        self.process_adc();
        self.process_gpio();
        self.discover();

        self.stats.cycles += 1;
    }

    /// One full iteration, including the wait for the timer compare.
    pub fn run_cycle(&mut self) {
        self.step();
        if self.hw.wait_for_compare() {
            self.stats.overruns += 1;
            trace!(cycle = self.stats.cycles, "Timer overrun");
        }
    }

    /// Iterate until `halt` is set. Returns the final counters.
    pub fn run(&mut self, halt: &AtomicBool) -> SamplerStats {
        if self.state == SamplerState::Init {
            self.init();
        }
        info!("Sampler running");
        while !halt.load(Ordering::Acquire) {
            self.run_cycle();
        }
        let stats = self.stats;
        info!(
            cycles = stats.cycles,
            overruns = stats.overruns,
            messages = stats.messages,
            dropped = stats.dropped,
            "Sampler halted"
        );
        stats
    }

    fn process_adc(&mut self) {
        let Self {
            hw,
            adc,
            producer,
            stats,
            mux,
            ..
        } = self;
        while hw.fifo0_count() as usize >= SWEEP_STEPS {
            for _ in 0..SWEEP_STEPS {
                let (step, raw) = hw.read_fifo0();
                let Some(channel) = logical_channel(step, *mux) else {
                    continue;
                };
                if let Some(message) = adc.process(channel, raw, *mux) {
                    emit(producer, stats, message);
                }
            }
        }
    }

    fn process_gpio(&mut self) {
        let Self {
            hw,
            gpio,
            producer,
            stats,
            ..
        } = self;
        gpio.poll(|module| hw.datain(module), |message| emit(producer, stats, message));
    }

    fn discover(&mut self) {
        let current = self.interest.snapshot();
        if current == self.known {
            return;
        }
        for module in 0..GPIO_MODULES {
            let fresh = current.gpio[module] & !self.known.gpio[module];
            if fresh != 0 {
                self.gpio.discover(module, fresh);
            }
        }
        let fresh = current.adc & !self.known.adc;
        if fresh != 0 {
            self.adc.discover(fresh);
        }
        // Interest bits are never cleared, so the union is the new baseline.
        for module in 0..GPIO_MODULES {
            self.known.gpio[module] |= current.gpio[module];
        }
        self.known.adc |= current.adc;
    }

    /// Counters so far.
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    /// Current loop state.
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Multiplexer position of the last iteration.
    pub fn mux_position(&self) -> MuxPosition {
        self.mux
    }

    /// GPIO pins tracked so far, in discovery order.
    pub fn tracked_pins(&self) -> &[u8] {
        self.gpio.pins()
    }

    /// `true` if ADC channel `channel` is monitored.
    pub fn adc_enabled(&self, channel: u8) -> bool {
        self.adc.is_enabled(channel)
    }
}

#[inline]
fn emit(producer: &mut RingProducer, stats: &mut SamplerStats, message: Message) {
    if producer.write(message) {
        stats.messages += 1;
    } else {
        stats.dropped += 1;
    }
}

//! Host ↔ RTU integration on the simulated board.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pruio_common::consts::GPIO_MODULES;
use pruio_common::message::{Level, Message};
use pruio_common::pins::{Direction, MUX_SELECT_PINS};
use pruio_common::regs::{WindowId, pru};
use pruio_common::shm::region::SharedRegion;
use pruio_host::config::{SessionConfig, SimulationConfig};
use pruio_host::platform::{
    BeagleBone, DirectoryPinmux, OverlayLoader, PinmuxResolver, Platform, PrussRtu,
    RtuController, Simulation,
};
use pruio_host::{ChannelManager, HostError, HostResult, Session, SessionState};
use pruio_rtu::{Sampler, SimBoard, SimWindow};
use tempfile::TempDir;

fn sim_config(dir: &TempDir) -> SessionConfig {
    SessionConfig {
        simulation: SimulationConfig {
            tick_us: 200,
            pinmux_dir: dir.path().join("pinmux"),
        },
        ..SessionConfig::default()
    }
}

/// Drain until `want` shows up or the deadline passes; returns everything seen.
fn wait_for<W: pruio_common::mmio::RegisterWindow>(
    session: &mut Session<W>,
    want: Message,
) -> Vec<Message> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        seen.extend(session.drain_ring_buffer());
        if seen.contains(&want) {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    seen
}

// ─── End-to-end, stepped ────────────────────────────────────────────

#[test]
fn input_pin_transitions_produce_two_messages() {
    let board = SimBoard::new();
    let region = Arc::new(SharedRegion::allocate());
    let dir = TempDir::new().unwrap();
    let mut manager = ChannelManager::new(
        board.gpio_windows(),
        &region,
        Box::new(DirectoryPinmux::new(dir.path())),
    )
    .unwrap();
    let mut sampler = Sampler::new(board.peripherals(), &region).unwrap();

    manager.configure_pin(11, Direction::Input).unwrap();
    sampler.step();
    assert_eq!(sampler.tracked_pins(), &[11]);

    board.set_input(11, Level::High);
    sampler.step();
    board.set_input(11, Level::Low);
    sampler.step();
    sampler.step();

    let messages: Vec<_> = manager.drain_ring_buffer().collect();
    assert_eq!(
        messages,
        vec![Message::gpio(11, Level::High), Message::gpio(11, Level::Low)]
    );
    assert_eq!(manager.drain_ring_buffer().count(), 0);
}

#[test]
fn outputs_bypass_the_rtu() {
    let board = SimBoard::new();
    let region = Arc::new(SharedRegion::allocate());
    let dir = TempDir::new().unwrap();
    let mut manager = ChannelManager::new(
        board.gpio_windows(),
        &region,
        Box::new(DirectoryPinmux::new(dir.path())),
    )
    .unwrap();
    let mut sampler = Sampler::new(board.peripherals(), &region).unwrap();

    manager.configure_pin(50, Direction::Output).unwrap();
    manager.set_output(50, Level::High).unwrap();
    for _ in 0..8 {
        sampler.step();
    }

    assert_eq!(board.output_level(50), Level::High);
    assert!(sampler.tracked_pins().is_empty());
    assert_eq!(manager.drain_ring_buffer().count(), 0);
}

// ─── Session on the simulated platform ──────────────────────────────

#[test]
fn simulated_session_reports_input_changes() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = Simulation::new(&config.simulation);
    let mut session = Session::start(&platform, &config).unwrap();
    assert_eq!(session.state(), SessionState::Running);

    for pin in MUX_SELECT_PINS {
        assert!(platform.board().is_output(pin));
    }

    session.configure_pin(60, Direction::Input).unwrap();
    let seen = wait_for(&mut session, Message::gpio(60, Level::Low));
    assert_eq!(seen, vec![Message::gpio(60, Level::Low)]);

    platform.board().set_input(60, Level::High);
    let seen = wait_for(&mut session, Message::gpio(60, Level::High));
    assert_eq!(seen, vec![Message::gpio(60, Level::High)]);

    session.stop().unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    session.stop().unwrap();
}

#[test]
fn simulated_session_reports_slow_adc_channel() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = Simulation::new(&config.simulation);
    platform.board().set_adc_channel(9, 1234);

    let mut session = Session::start(&platform, &config).unwrap();
    session.register_adc_channel(9).unwrap();
    let seen = wait_for(&mut session, Message::adc(9, 1234));
    assert!(seen.contains(&Message::adc(9, 1234)));
}

#[test]
fn session_pin_configuration_is_idempotent_and_checked() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = Simulation::new(&config.simulation);
    let mut session = Session::start(&platform, &config).unwrap();

    session.configure_pin(50, Direction::Output).unwrap();
    session.configure_pin(50, Direction::Output).unwrap();
    assert!(matches!(
        session.configure_pin(50, Direction::Input),
        Err(HostError::PinConflict { pin: 50, .. })
    ));
    // Select lines are outputs already.
    assert!(matches!(
        session.configure_pin(115, Direction::Input),
        Err(HostError::PinConflict { pin: 115, .. })
    ));

    let state = fs::read_to_string(dir.path().join("pinmux/P9_14/state")).unwrap();
    assert_eq!(state, "output\n");

    session.set_output(50, Level::High).unwrap();
    assert_eq!(platform.board().output_level(50), Level::High);
}

#[test]
fn dropping_a_session_stops_its_rtu() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = Simulation::new(&config.simulation);
    let session = Session::start(&platform, &config).unwrap();
    drop(session);

    let ticks = platform.board().timer_ticks();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(platform.board().timer_ticks(), ticks);
}

// ─── Bring-up failures ──────────────────────────────────────────────

/// Directory pin mux that refuses one pin.
struct RejectPin {
    pin: u8,
    inner: DirectoryPinmux,
}

impl PinmuxResolver for RejectPin {
    fn state_path(&self, pin: u8) -> HostResult<PathBuf> {
        if pin == self.pin {
            return Err(HostError::PinConfig {
                pin,
                reason: "no pin mux helper".to_string(),
            });
        }
        self.inner.state_path(pin)
    }
}

/// RTU that starts but cannot be halted.
struct StuckRtu;

impl RtuController for StuckRtu {
    fn name(&self) -> &'static str {
        "stuck"
    }

    fn load_and_start(&mut self, _: &Path, _: &Path, _: u32) -> HostResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        Err(HostError::RtuFault("halt timed out".to_string()))
    }

    fn is_running(&self) -> bool {
        true
    }
}

enum RtuKind {
    Soft,
    Pru,
    Stuck,
}

/// Simulated board with a selectable RTU and an optionally refused pin.
struct TestBoard {
    sim: Simulation,
    pinmux_dir: PathBuf,
    reject: Option<u8>,
    rtu: RtuKind,
}

impl TestBoard {
    fn new(config: &SessionConfig, reject: Option<u8>, rtu: RtuKind) -> Self {
        Self {
            sim: Simulation::new(&config.simulation),
            pinmux_dir: config.simulation.pinmux_dir.clone(),
            reject,
            rtu,
        }
    }
}

impl Platform for TestBoard {
    type Window = SimWindow;

    fn name(&self) -> &'static str {
        "test"
    }

    fn overlay_loader(&self) -> Option<&dyn OverlayLoader> {
        None
    }

    fn map_gpio(&self) -> HostResult<[SimWindow; GPIO_MODULES]> {
        self.sim.map_gpio()
    }

    fn map_shared_memory(&self) -> HostResult<Arc<SharedRegion>> {
        self.sim.map_shared_memory()
    }

    fn rtu_controller(&self, region: &Arc<SharedRegion>) -> HostResult<Box<dyn RtuController>> {
        let board = self.sim.board();
        match self.rtu {
            RtuKind::Soft => self.sim.rtu_controller(region),
            RtuKind::Pru => Ok(Box::new(PrussRtu::new(
                board.window(WindowId::Pru0Ctrl),
                board.window(WindowId::Pru0Dram),
                board.window(WindowId::Pru0Iram),
            ))),
            RtuKind::Stuck => Ok(Box::new(StuckRtu)),
        }
    }

    fn pinmux_resolver(&self) -> Box<dyn PinmuxResolver> {
        let inner = DirectoryPinmux::new(&self.pinmux_dir);
        match self.reject {
            Some(pin) => Box::new(RejectPin { pin, inner }),
            None => Box::new(inner),
        }
    }
}

#[test]
fn failed_default_pins_halt_the_started_rtu() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = TestBoard::new(&config, Some(MUX_SELECT_PINS[0]), RtuKind::Soft);

    assert!(matches!(
        Session::start(&platform, &config),
        Err(HostError::PinConfig { pin: 115, .. })
    ));

    let ticks = platform.sim.board().timer_ticks();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(platform.sim.board().timer_ticks(), ticks);
}

#[test]
fn failed_rollback_keeps_the_bring_up_error() {
    let dir = TempDir::new().unwrap();
    let config = sim_config(&dir);
    let platform = TestBoard::new(&config, Some(MUX_SELECT_PINS[0]), RtuKind::Stuck);

    assert!(matches!(
        Session::start(&platform, &config),
        Err(HostError::PinConfig { pin: 115, .. })
    ));
}

#[test]
fn missing_firmware_aborts_bring_up() {
    let dir = TempDir::new().unwrap();
    let mut config = sim_config(&dir);
    config.firmware.data_image = dir.path().join("missing_data0.bin");
    config.firmware.text_image = dir.path().join("missing_text0.bin");
    let platform = TestBoard::new(&config, None, RtuKind::Pru);

    assert!(matches!(
        Session::start(&platform, &config),
        Err(HostError::FirmwareStart(_))
    ));
    let control = platform.sim.board().peek(WindowId::Pru0Ctrl, pru::CONTROL);
    assert_eq!(control & pru::CONTROL_ENABLE, 0);
    // Default pins are only configured once the RTU runs.
    assert!(!dir.path().join("pinmux").join("P9_27").exists());
}

#[test]
fn pru_session_starts_and_halts_firmware() {
    let dir = TempDir::new().unwrap();
    let mut config = sim_config(&dir);
    config.firmware.data_image = dir.path().join("pruio_data0.bin");
    config.firmware.text_image = dir.path().join("pruio_text0.bin");
    config.firmware.entry_address = 0x40;
    fs::write(&config.firmware.data_image, [0x01, 0x02, 0x03, 0x04]).unwrap();
    fs::write(&config.firmware.text_image, [0xef, 0xbe, 0xad, 0xde]).unwrap();
    let platform = TestBoard::new(&config, None, RtuKind::Pru);
    let board = platform.sim.board().clone();

    let mut session = Session::start(&platform, &config).unwrap();
    assert_eq!(board.peek(WindowId::Pru0Iram, 0), 0xdead_beef);
    assert_eq!(
        board.peek(WindowId::Pru0Ctrl, pru::CONTROL),
        (0x10 << pru::CONTROL_PCTR_RST_VAL_SHIFT) | pru::CONTROL_ENABLE
    );

    session.stop().unwrap();
    assert_eq!(
        board.peek(WindowId::Pru0Ctrl, pru::CONTROL),
        pru::CONTROL_SOFT_RST_N
    );
}

#[test]
fn missing_slots_file_aborts_bring_up() {
    let mut config = SessionConfig::default();
    config.platform.slots_path = "/nonexistent/bone_capemgr.9/slots".into();
    config.platform.settle_ms = 0;
    let platform = BeagleBone::new(&config.platform);
    assert!(matches!(
        Session::start(&platform, &config),
        Err(HostError::Overlay { .. })
    ));
}

#[test]
fn unmappable_registers_abort_bring_up() {
    let dir = TempDir::new().unwrap();
    let slots = dir.path().join("slots");
    fs::write(&slots, " 0: 54:PF---\n 7: ff:P-O-L Override Board Name,00A0,Override Manuf,PRUIO-DTO\n")
        .unwrap();

    let mut config = SessionConfig::default();
    config.platform.slots_path = slots.clone();
    config.platform.settle_ms = 0;
    config.platform.memory_device = dir.path().join("no-mem");
    let platform = BeagleBone::new(&config.platform);

    assert!(matches!(
        Session::start(&platform, &config),
        Err(HostError::RegisterMap(_))
    ));
    // The overlay was already present, so the slots file is untouched.
    assert!(fs::read_to_string(&slots).unwrap().contains("PRUIO-DTO"));
}

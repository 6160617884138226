//! Command dispatch and actuation
//!
//! The controller ties the pieces together: each [`Controller::tick`] runs
//! one line-reader pass (at most one byte consumed from the serial link),
//! then one dispatcher pass (at most one completed command executed).
//!
//! Timed actions - the magnet pulse and the motor settle delay - are
//! synchronous holds: the controller busy-waits on the clock and does no
//! other work until the hold elapses. One command always completes fully,
//! including its hold, before the next line is even read.

use core::fmt::Write as _;

use heapless::String;

use crate::command::{parse_decimal, Channel, Command, CommandTable, SpeedTier};
use crate::config::{StationConfig, StationVariant};
use crate::reader::LineReader;
use crate::traits::{ActuatorBank, Clock, Level, Restart, SerialPort};

/// The command-driven actuator controller.
///
/// Generic over the injected hardware capabilities so the same state
/// machine runs against the RP2040 firmware and against host-test mocks.
pub struct Controller<S, O, C, R> {
    config: StationConfig,
    table: CommandTable,
    reader: LineReader,
    /// Last-applied PWM duty per motor channel, for debounce. Starts at 0
    /// to match the power-on output state.
    last_duty: [u8; 2],
    serial: S,
    outputs: O,
    clock: C,
    reset: R,
}

impl<S, O, C, R> Controller<S, O, C, R>
where
    S: SerialPort,
    O: ActuatorBank,
    C: Clock,
    R: Restart,
{
    pub fn new(config: StationConfig, serial: S, outputs: O, clock: C, reset: R) -> Self {
        let table = CommandTable::new(config.variant);
        Self {
            config,
            table,
            reader: LineReader::new(),
            last_duty: [0; 2],
            serial,
            outputs,
            clock,
            reset,
        }
    }

    /// Print the startup banner and drive every output to its idle state.
    pub fn start(&mut self) {
        self.banner();
        self.init_outputs();
    }

    /// One scheduler tick: line-reader pass, then dispatcher pass.
    pub fn tick(&mut self) {
        if let Some(byte) = self.serial.poll_byte() {
            self.reader.feed(byte);
        }
        self.dispatch();
    }

    /// True while a completed line is pending dispatch.
    pub fn line_ready(&self) -> bool {
        self.reader.is_ready()
    }

    /// Last-applied duty for a motor channel (debounce state).
    pub fn last_applied(&self, channel: Channel) -> u8 {
        self.last_duty[channel.index()]
    }

    fn banner(&mut self) {
        match self.config.variant {
            StationVariant::Magnet => {
                self.serial.write_line("\nNANOSTATION_M");
                self.serial.write_line("\n<Magnet Station is ready for launch!>");
                self.serial.write_line(
                    "\nTrigger magnet on (1) for 10 seconds or type (-1) to reset the device.",
                );
            }
            StationVariant::Shaker => {
                self.serial.write_line("\nNANOSTATION_V");
                self.serial.write_line("\n<Vibration Station is ready for launch!>");
                self.serial.write_line(
                    "\nSet vibration motor speed (0-4) or type -1 to reset the device.",
                );
            }
            StationVariant::Combined => {
                self.serial.write_line("\nNANOSTATION_MV");
                self.serial.write_line("\n<Vibration/Magnet Station is ready for launch!>");
                self.serial.write_line(
                    "\nSet vibration motor speed Motor A:(0-3), Motor B:(10-13)\nSet Magnet A:(20-21) Magnet B:(30-31)\nType (-1) to reset the device.",
                );
            }
        }
    }

    /// Relays de-energized, PWM zeroed, ground lines low, then enable
    /// lines high - the H-bridge bring-up order of the combined board.
    fn init_outputs(&mut self) {
        for channel in [Channel::A, Channel::B] {
            if let Some(magnet) = self.config.magnet_channel(channel).copied() {
                self.outputs
                    .write_digital(magnet.relay_pin, magnet.energized.inverse());
            }
        }
        for channel in [Channel::A, Channel::B] {
            if let Some(motor) = self.config.motor_channel(channel).copied() {
                if let Some(enable) = motor.enable_pin {
                    self.outputs.write_digital(enable, Level::Low);
                }
                self.outputs.write_analog(motor.pwm_pin, 0);
                if let Some(ground) = motor.ground_pin {
                    self.outputs.write_digital(ground, Level::Low);
                }
                if let Some(enable) = motor.enable_pin {
                    self.outputs.write_digital(enable, Level::High);
                }
            }
        }
    }

    fn dispatch(&mut self) {
        let Some(line) = self.reader.take() else {
            return;
        };

        // Echo the received line before acting on it
        self.serial.write_bytes(line.bytes());
        self.serial.write_bytes(b"\r\n");

        let code = parse_decimal(line.bytes());
        match self.table.lookup(code) {
            None => self.invalid_input(),
            Some(Command::Reset) => self.reset.restart(),
            Some(Command::SetSpeed { channel, tier }) => self.set_speed(channel, tier),
            Some(Command::MagnetOn { channel }) => self.magnet_on(channel),
            Some(Command::MagnetOff { channel }) => self.magnet_off(channel),
        }
    }

    fn invalid_input(&mut self) {
        match self.config.variant {
            StationVariant::Magnet => self.serial.write_line("Invalid input."),
            StationVariant::Shaker | StationVariant::Combined => self
                .serial
                .write_line("Invalid input. Please enter a number between 0 and 4."),
        }
    }

    fn set_speed(&mut self, channel: Channel, tier: SpeedTier) {
        let Some(motor) = self.config.motor_channel(channel).copied() else {
            return;
        };
        let duty = motor.scale.duty(tier);

        if duty == self.last_duty[channel.index()] {
            self.serial
                .write_line("No change in speed. Keeping the previous setting.");
            return;
        }

        self.serial.write_str("Changing speed ... ");
        self.outputs.write_analog(motor.pwm_pin, 0);
        self.hold(self.config.settle_ms);

        self.serial.write_str("Setting motor speed to ... ");
        let mut percent: String<16> = String::new();
        // Cannot fail: "100.00" is the longest rendering
        let _ = write!(percent, "{:.2}", duty as f32 / 255.0 * 100.0);
        self.serial.write_line(&percent);

        self.outputs.write_analog(motor.pwm_pin, duty);
        self.last_duty[channel.index()] = duty;
    }

    fn magnet_on(&mut self, channel: Channel) {
        let Some(magnet) = self.config.magnet_channel(channel).copied() else {
            return;
        };
        self.magnet_diag(channel, "ON");
        self.outputs.write_digital(magnet.relay_pin, magnet.energized);
        self.hold(self.config.magnet_pulse_ms);
        self.outputs
            .write_digital(magnet.relay_pin, magnet.energized.inverse());
        self.magnet_diag(channel, "OFF");
    }

    fn magnet_off(&mut self, channel: Channel) {
        let Some(magnet) = self.config.magnet_channel(channel).copied() else {
            return;
        };
        self.outputs
            .write_digital(magnet.relay_pin, magnet.energized.inverse());
        self.magnet_diag(channel, "OFF");
    }

    fn magnet_diag(&mut self, channel: Channel, state: &str) {
        let mut msg: String<16> = String::new();
        // Cannot fail: "Magnet B - OFF" is the longest rendering
        match self.config.variant {
            StationVariant::Combined => {
                let _ = write!(msg, "Magnet {} - {}", channel, state);
            }
            _ => {
                let _ = write!(msg, "Magnet {}", state);
            }
        }
        self.serial.write_line(&msg);
    }

    /// Busy-wait for `ms` milliseconds.
    ///
    /// Nothing else runs during a hold; serial input stays buffered in the
    /// transport and is picked up on the ticks after the hold completes.
    fn hold(&self, ms: u32) {
        let start = self.clock.now_ms();
        while self.clock.now_ms().wrapping_sub(start) < u64::from(ms) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{AnalogWrite, DigitalWrite, PinId};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum OutputWrite {
        Digital { pin: PinId, level: Level, at_ms: u64 },
        Analog { pin: PinId, duty: u8, at_ms: u64 },
    }

    #[derive(Default)]
    struct Shared {
        now_ms: u64,
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        writes: Vec<OutputWrite>,
        resets: u32,
    }

    struct MockSerial(Rc<RefCell<Shared>>);

    impl SerialPort for MockSerial {
        fn poll_byte(&mut self) -> Option<u8> {
            self.0.borrow_mut().rx.pop_front()
        }

        fn write_bytes(&mut self, bytes: &[u8]) {
            self.0.borrow_mut().tx.extend_from_slice(bytes);
        }
    }

    struct MockOutputs(Rc<RefCell<Shared>>);

    impl DigitalWrite for MockOutputs {
        fn write_digital(&mut self, pin: PinId, level: Level) {
            let mut shared = self.0.borrow_mut();
            let at_ms = shared.now_ms;
            shared.writes.push(OutputWrite::Digital { pin, level, at_ms });
        }
    }

    impl AnalogWrite for MockOutputs {
        fn write_analog(&mut self, pin: PinId, duty: u8) {
            let mut shared = self.0.borrow_mut();
            let at_ms = shared.now_ms;
            shared.writes.push(OutputWrite::Analog { pin, duty, at_ms });
        }
    }

    /// Advances one millisecond per reading so busy-wait holds terminate.
    struct MockClock(Rc<RefCell<Shared>>);

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            let mut shared = self.0.borrow_mut();
            shared.now_ms += 1;
            shared.now_ms
        }
    }

    struct MockReset(Rc<RefCell<Shared>>);

    impl Restart for MockReset {
        fn restart(&mut self) {
            self.0.borrow_mut().resets += 1;
        }
    }

    type TestController = Controller<MockSerial, MockOutputs, MockClock, MockReset>;

    fn rig(config: StationConfig) -> (TestController, Rc<RefCell<Shared>>) {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let controller = Controller::new(
            config,
            MockSerial(shared.clone()),
            MockOutputs(shared.clone()),
            MockClock(shared.clone()),
            MockReset(shared.clone()),
        );
        (controller, shared)
    }

    /// Started rig with the boot-time output writes and banner cleared out.
    fn started_rig(config: StationConfig) -> (TestController, Rc<RefCell<Shared>>) {
        let (mut controller, shared) = rig(config);
        controller.start();
        shared.borrow_mut().writes.clear();
        shared.borrow_mut().tx.clear();
        (controller, shared)
    }

    fn feed_line(controller: &mut TestController, shared: &Rc<RefCell<Shared>>, line: &str) {
        shared.borrow_mut().rx.extend(line.bytes());
        for _ in 0..line.len() {
            controller.tick();
        }
    }

    fn tx_string(shared: &Rc<RefCell<Shared>>) -> std::string::String {
        std::string::String::from_utf8(shared.borrow().tx.clone()).unwrap()
    }

    #[test]
    fn test_banner_and_idle_outputs_magnet() {
        let (mut controller, shared) = rig(StationConfig::magnet());
        controller.start();

        let tx = tx_string(&shared);
        assert!(tx.starts_with("\nNANOSTATION_M\r\n"));
        assert!(tx.contains("<Magnet Station is ready for launch!>"));

        // Active-low relay idles high
        assert_eq!(
            shared.borrow().writes.as_slice(),
            &[OutputWrite::Digital {
                pin: PinId(8),
                level: Level::High,
                at_ms: 0
            }]
        );
    }

    #[test]
    fn test_combined_bridge_bring_up_order() {
        let (mut controller, shared) = rig(StationConfig::combined());
        controller.start();

        let tx = tx_string(&shared);
        assert!(tx.starts_with("\nNANOSTATION_MV\r\n"));

        let writes = shared.borrow().writes.clone();
        // Relays first, then per motor: enable low, pwm 0, ground low, enable high
        assert_eq!(writes.len(), 2 + 2 * 4);
        assert_eq!(
            writes[0],
            OutputWrite::Digital {
                pin: PinId(3),
                level: Level::Low,
                at_ms: 0
            }
        );
        assert_eq!(
            writes[2..6],
            [
                OutputWrite::Digital {
                    pin: PinId(5),
                    level: Level::Low,
                    at_ms: 0
                },
                OutputWrite::Analog {
                    pin: PinId(6),
                    duty: 0,
                    at_ms: 0
                },
                OutputWrite::Digital {
                    pin: PinId(7),
                    level: Level::Low,
                    at_ms: 0
                },
                OutputWrite::Digital {
                    pin: PinId(5),
                    level: Level::High,
                    at_ms: 0
                },
            ]
        );
    }

    #[test]
    fn test_magnet_pulse_energizes_then_releases() {
        let (mut controller, shared) = started_rig(StationConfig::magnet());
        feed_line(&mut controller, &shared, "1\n");

        let writes = shared.borrow().writes.clone();
        assert_eq!(writes.len(), 2);
        let (OutputWrite::Digital { pin: on_pin, level: on_level, at_ms: on_at },
             OutputWrite::Digital { pin: off_pin, level: off_level, at_ms: off_at }) =
            (writes[0], writes[1])
        else {
            panic!("expected two digital writes, got {:?}", writes);
        };
        assert_eq!((on_pin, on_level), (PinId(8), Level::Low));
        assert_eq!((off_pin, off_level), (PinId(8), Level::High));
        assert!(off_at - on_at >= 10_000, "pulse held only {} ms", off_at - on_at);

        assert!(!controller.line_ready());
        let tx = tx_string(&shared);
        assert!(tx.contains("Magnet ON"));
        assert!(tx.contains("Magnet OFF"));
    }

    #[test]
    fn test_magnet_off_is_immediate() {
        let (mut controller, shared) = started_rig(StationConfig::magnet());
        let before = shared.borrow().now_ms;
        feed_line(&mut controller, &shared, "0\n");

        let writes = shared.borrow().writes.clone();
        assert_eq!(
            writes.as_slice(),
            &[OutputWrite::Digital {
                pin: PinId(8),
                level: Level::High,
                at_ms: before
            }]
        );
        assert!(tx_string(&shared).contains("Magnet OFF"));
    }

    #[test]
    fn test_speed_change_settles_then_applies() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        feed_line(&mut controller, &shared, "2\n");

        let writes = shared.borrow().writes.clone();
        assert_eq!(writes.len(), 2);
        let (OutputWrite::Analog { pin: p0, duty: d0, at_ms: t0 },
             OutputWrite::Analog { pin: p1, duty: d1, at_ms: t1 }) = (writes[0], writes[1])
        else {
            panic!("expected two analog writes, got {:?}", writes);
        };
        assert_eq!((p0, d0), (PinId(9), 0));
        assert_eq!((p1, d1), (PinId(9), 160));
        assert!(t1 - t0 >= 1_000, "settled only {} ms", t1 - t0);

        assert_eq!(controller.last_applied(Channel::A), 160);
        let tx = tx_string(&shared);
        assert!(tx.starts_with("2\r\n"));
        assert!(tx.contains("Changing speed ... "));
        assert!(tx.contains("Setting motor speed to ... 62.75"));
    }

    #[test]
    fn test_repeated_speed_is_debounced() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        feed_line(&mut controller, &shared, "3\n");
        assert_eq!(controller.last_applied(Channel::A), 210);
        shared.borrow_mut().writes.clear();
        shared.borrow_mut().tx.clear();

        feed_line(&mut controller, &shared, "3\n");
        assert!(shared.borrow().writes.is_empty());
        let tx = tx_string(&shared);
        assert!(tx.contains("No change in speed. Keeping the previous setting."));
        assert!(!controller.line_ready());
    }

    #[test]
    fn test_speed_zero_debounces_against_power_on_state() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        feed_line(&mut controller, &shared, "0\n");
        assert!(shared.borrow().writes.is_empty());
        assert!(tx_string(&shared).contains("No change in speed."));

        feed_line(&mut controller, &shared, "0\n");
        assert!(shared.borrow().writes.is_empty());
    }

    #[test]
    fn test_debounce_state_is_per_channel() {
        let (mut controller, shared) = started_rig(StationConfig::combined());
        feed_line(&mut controller, &shared, "1\n");
        assert_eq!(controller.last_applied(Channel::A), 80);
        shared.borrow_mut().writes.clear();

        // Same duty on the other channel must not debounce
        feed_line(&mut controller, &shared, "11\n");
        assert_eq!(controller.last_applied(Channel::B), 80);
        let writes = shared.borrow().writes.clone();
        assert!(writes.iter().any(|w| matches!(
            w,
            OutputWrite::Analog {
                pin: PinId(10),
                duty: 80,
                ..
            }
        )));
    }

    #[test]
    fn test_combined_magnet_channel_routing() {
        let (mut controller, shared) = started_rig(StationConfig::combined());
        feed_line(&mut controller, &shared, "21\n");

        // Magnet B rides the channel-B relay, active-high
        let writes = shared.borrow().writes.clone();
        assert_eq!(writes.len(), 1);
        assert!(matches!(
            writes[0],
            OutputWrite::Digital {
                pin: PinId(2),
                level: Level::Low,
                ..
            }
        ));
        assert!(tx_string(&shared).contains("Magnet B - OFF"));
    }

    #[test]
    fn test_invalid_input_touches_no_actuator() {
        for config in [
            StationConfig::magnet(),
            StationConfig::shaker(),
            StationConfig::combined(),
        ] {
            let (mut controller, shared) = started_rig(config);
            feed_line(&mut controller, &shared, "99\n");

            assert!(shared.borrow().writes.is_empty());
            assert!(!controller.line_ready());
            assert!(tx_string(&shared).contains("Invalid input."));
        }
    }

    #[test]
    fn test_non_numeric_parses_as_zero_command() {
        // Permissive atoi parse: garbage acts like an explicit 0
        let (mut controller, shared) = started_rig(StationConfig::magnet());
        feed_line(&mut controller, &shared, "hello\n");

        let writes = shared.borrow().writes.clone();
        assert_eq!(writes.len(), 1);
        assert!(matches!(
            writes[0],
            OutputWrite::Digital {
                pin: PinId(8),
                level: Level::High,
                ..
            }
        ));
        assert!(tx_string(&shared).contains("Magnet OFF"));
    }

    #[test]
    fn test_reset_invokes_restart_once() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        feed_line(&mut controller, &shared, "-1\n");

        assert_eq!(shared.borrow().resets, 1);
        assert!(shared.borrow().writes.is_empty());
        assert!(!controller.line_ready());
    }

    #[test]
    fn test_echo_precedes_diagnostics() {
        let (mut controller, shared) = started_rig(StationConfig::combined());
        feed_line(&mut controller, &shared, "99\n");

        let tx = tx_string(&shared);
        assert!(tx.starts_with("99\r\n"));
    }

    #[test]
    fn test_echo_round_trips_long_lines() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        let line = "4444444444444444444444444444444"; // 31 bytes
        feed_line(&mut controller, &shared, line);
        feed_line(&mut controller, &shared, "\n");

        let tx = tx_string(&shared);
        assert!(tx.starts_with(line));
    }

    #[test]
    fn test_input_during_hold_is_deferred_not_lost() {
        let (mut controller, shared) = started_rig(StationConfig::shaker());
        // Queue a second command behind the first; the hold must finish
        // before any of it is read
        shared.borrow_mut().rx.extend("1\n4\n".bytes());
        for _ in 0..4 {
            controller.tick();
        }

        let writes = shared.borrow().writes.clone();
        let duties: Vec<u8> = writes
            .iter()
            .map(|w| match w {
                OutputWrite::Analog { duty, .. } => *duty,
                other => panic!("unexpected write {:?}", other),
            })
            .collect();
        assert_eq!(duties, [0, 150, 0, 220]);
        assert_eq!(controller.last_applied(Channel::A), 220);
    }
}

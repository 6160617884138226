//! Capability implementations over embassy-rp
//!
//! Bridges the board-agnostic controller traits to the RP2040: buffered
//! UART for the serial link, GPIO outputs for relays and bridge control
//! lines, PWM slices for the motor drivers, the embassy uptime clock, and
//! a cortex-m system reset.

use embassy_futures::block_on;
use embassy_rp::gpio::{Level as RpLevel, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::Instant;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use heapless::Vec;

use nanostation_core::traits::{
    AnalogWrite, Clock, DigitalWrite, Level, PinId, Restart, SerialPort,
};

/// Digital outputs a station can carry (combined build: 2 relays + 4
/// bridge control lines)
const MAX_DIGITAL_PINS: usize = 8;

/// PWM outputs a station can carry
const MAX_PWM_PINS: usize = 2;

/// Serial link over the buffered UART halves.
///
/// `poll_byte` only pops the driver's receive ring, so it never blocks;
/// bytes arriving during a controller hold accumulate there.
pub struct UartLink {
    tx: BufferedUartTx,
    rx: BufferedUartRx,
}

impl UartLink {
    pub fn new(tx: BufferedUartTx, rx: BufferedUartRx) -> Self {
        Self { tx, rx }
    }
}

impl SerialPort for UartLink {
    fn poll_byte(&mut self) -> Option<u8> {
        if !self.rx.read_ready().unwrap_or(false) {
            return None;
        }
        let mut byte = [0u8; 1];
        // Ready to read, so this resolves immediately
        match block_on(self.rx.read(&mut byte)) {
            Ok(n) if n > 0 => Some(byte[0]),
            _ => None,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let _ = block_on(self.tx.write_all(bytes));
    }
}

struct PwmChannel {
    pwm: Pwm<'static>,
    config: PwmConfig,
    top: u16,
}

/// Output bank mapping logical board pin numbers to RP2040 pins.
pub struct OutputBank {
    digital: Vec<(PinId, Output<'static>), MAX_DIGITAL_PINS>,
    pwm: Vec<(PinId, PwmChannel), MAX_PWM_PINS>,
}

impl Default for OutputBank {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBank {
    pub fn new() -> Self {
        Self {
            digital: Vec::new(),
            pwm: Vec::new(),
        }
    }

    /// Register a relay or bridge control line under a logical pin number.
    pub fn add_digital(&mut self, id: PinId, output: Output<'static>) {
        if self.digital.push((id, output)).is_err() {
            panic!("digital pin table full");
        }
    }

    /// Register a motor PWM output under a logical pin number.
    ///
    /// `top` sets the counter wrap and thereby the PWM frequency; duty
    /// values 0-255 are rescaled onto it.
    pub fn add_pwm(&mut self, id: PinId, pwm: Pwm<'static>, top: u16) {
        let mut config = PwmConfig::default();
        config.top = top;
        config.compare_a = 0;
        let mut channel = PwmChannel { pwm, config, top };
        channel.pwm.set_config(&channel.config);
        if self.pwm.push((id, channel)).is_err() {
            panic!("pwm pin table full");
        }
    }
}

impl DigitalWrite for OutputBank {
    fn write_digital(&mut self, pin: PinId, level: Level) {
        if let Some((_, output)) = self.digital.iter_mut().find(|(id, _)| *id == pin) {
            output.set_level(match level {
                Level::Low => RpLevel::Low,
                Level::High => RpLevel::High,
            });
        }
    }
}

impl AnalogWrite for OutputBank {
    fn write_analog(&mut self, pin: PinId, duty: u8) {
        if let Some((_, channel)) = self.pwm.iter_mut().find(|(id, _)| *id == pin) {
            let compare = (duty as u32 * channel.top as u32 / 255) as u16;
            channel.config.compare_a = compare;
            channel.pwm.set_config(&channel.config);
        }
    }
}

/// Milliseconds since boot from the embassy time driver.
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Full system reset via the ARM SCB. Does not return.
pub struct SystemReset;

impl Restart for SystemReset {
    fn restart(&mut self) {
        cortex_m::peripheral::SCB::sys_reset();
    }
}

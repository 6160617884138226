//! Nanostation - serial-commanded magnet / vibration test station
//!
//! Main firmware binary for RP2040-based station boards. The station
//! hardware variant is chosen at build time via cargo features
//! (`station-magnet`, `station-shaker`, `station-combined`).
//!
//! The controller is strictly single-threaded: one task reads at most one
//! serial byte per tick, dispatches at most one command, and blocks
//! through timed holds. Serial input arriving during a hold waits in the
//! buffered UART's receive ring.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level as RpLevel, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use nanostation_core::config::StationConfig;
use nanostation_core::controller::Controller;
use nanostation_core::traits::PinId;

mod board;
use board::{OutputBank, SystemReset, UartLink, UptimeClock};

#[cfg(not(any(
    feature = "station-magnet",
    feature = "station-shaker",
    feature = "station-combined"
)))]
compile_error!(
    "select a station variant feature: station-magnet, station-shaker or station-combined"
);

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// PWM counter wrap (determines frequency)
const PWM_TOP: u16 = 1000;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Nanostation firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Setup UART for the host link - the lab tooling talks 9600 baud
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 9600;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    let link = UartLink::new(tx, rx);

    let mut outputs = OutputBank::new();

    // Station wiring: logical pin numbers (as silk-screened on the station
    // boards) mapped to the RP2040 GPIOs they are routed to. Every output
    // starts in its de-energized/idle state.

    #[cfg(feature = "station-magnet")]
    let config = {
        // Magnet relay (logical pin 8, active-low) on GPIO15
        outputs.add_digital(PinId(8), Output::new(p.PIN_15, RpLevel::High));
        StationConfig::magnet()
    };

    #[cfg(all(feature = "station-shaker", not(feature = "station-magnet")))]
    let config = {
        // Motor PWM (logical pin 9) on GPIO6, PWM slice 3 output A
        outputs.add_pwm(
            PinId(9),
            Pwm::new_output_a(p.PWM_SLICE3, p.PIN_6, PwmConfig::default()),
            PWM_TOP,
        );
        StationConfig::shaker()
    };

    #[cfg(all(
        feature = "station-combined",
        not(any(feature = "station-magnet", feature = "station-shaker"))
    ))]
    let config = {
        // Relays A/B (logical 3/2, active-high) on GPIO2/GPIO3
        outputs.add_digital(PinId(3), Output::new(p.PIN_2, RpLevel::Low));
        outputs.add_digital(PinId(2), Output::new(p.PIN_3, RpLevel::Low));
        // Bridge A: enable (logical 5) GPIO4, ground ref (logical 7) GPIO5,
        // PWM (logical 6) GPIO6 = slice 3 output A
        outputs.add_digital(PinId(5), Output::new(p.PIN_4, RpLevel::Low));
        outputs.add_digital(PinId(7), Output::new(p.PIN_5, RpLevel::Low));
        outputs.add_pwm(
            PinId(6),
            Pwm::new_output_a(p.PWM_SLICE3, p.PIN_6, PwmConfig::default()),
            PWM_TOP,
        );
        // Bridge B: enable (logical 9) GPIO7, ground ref (logical 11) GPIO8,
        // PWM (logical 10) GPIO10 = slice 5 output A
        outputs.add_digital(PinId(9), Output::new(p.PIN_7, RpLevel::Low));
        outputs.add_digital(PinId(11), Output::new(p.PIN_8, RpLevel::Low));
        outputs.add_pwm(
            PinId(10),
            Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, PwmConfig::default()),
            PWM_TOP,
        );
        StationConfig::combined()
    };

    let mut controller = Controller::new(config, link, outputs, UptimeClock, SystemReset);
    controller.start();
    info!("Station ready, awaiting commands");

    loop {
        controller.tick();
        // Yield so the UART driver keeps its buffers serviced between ticks
        Timer::after_millis(1).await;
    }
}

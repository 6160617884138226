//! Station configuration
//!
//! A station is one of three fixed hardware builds; the variant decides the
//! command vocabulary, the wired channels, and the relay polarity. Pin
//! numbers and timings below are the board wiring of the deployed units.
//! Configuration is built once at startup and read-only afterwards.

use crate::command::{Channel, SpeedTier};
use crate::traits::{Level, PinId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relay hold time for a magnet pulse
pub const MAGNET_PULSE_MS: u32 = 10_000;

/// Zero-duty settle time preceding a motor speed change
pub const SPEED_SETTLE_MS: u32 = 1_000;

/// Station hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StationVariant {
    /// Single electromagnet, relay-driven
    Magnet,
    /// Single vibration motor, PWM-driven
    Shaker,
    /// Two motor + magnet pairs (channels A and B)
    Combined,
}

/// Duty scale for a motor channel
///
/// The single-motor build runs 4-8 V through its driver and uses the wide
/// four-tier scale; the combined build stays inside the 3.2-4 V calibration
/// band with a narrower three-tier scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpeedScale {
    /// off/150/160/210/220
    Single,
    /// off/80/90/100 (Full clamps to High)
    Dual,
}

impl SpeedScale {
    /// Resolve a speed tier to the PWM duty value for this scale.
    pub fn duty(self, tier: SpeedTier) -> u8 {
        match self {
            SpeedScale::Single => match tier {
                SpeedTier::Off => 0,
                SpeedTier::Low => 150,
                SpeedTier::Medium => 160,
                SpeedTier::High => 210,
                SpeedTier::Full => 220,
            },
            SpeedScale::Dual => match tier {
                SpeedTier::Off => 0,
                SpeedTier::Low => 80,
                SpeedTier::Medium => 90,
                // The three-tier scale has no Full step; clamp to High
                SpeedTier::High | SpeedTier::Full => 100,
            },
        }
    }
}

/// One relay-driven electromagnet
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MagnetChannelConfig {
    pub relay_pin: PinId,
    /// Level that energizes the coil; the standalone magnet board switches
    /// low-side (active-low), the combined board's relays are active-high.
    pub energized: Level,
}

/// One PWM-driven vibration motor
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorChannelConfig {
    pub pwm_pin: PinId,
    /// H-bridge enable line, held high after bring-up (combined build)
    pub enable_pin: Option<PinId>,
    /// Ground-reference line, held low (combined build)
    pub ground_pin: Option<PinId>,
    pub scale: SpeedScale,
}

/// Complete station configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationConfig {
    pub variant: StationVariant,
    /// Magnet channels indexed by [`Channel::index`]
    pub magnets: [Option<MagnetChannelConfig>; 2],
    /// Motor channels indexed by [`Channel::index`]
    pub motors: [Option<MotorChannelConfig>; 2],
    pub magnet_pulse_ms: u32,
    pub settle_ms: u32,
}

impl StationConfig {
    /// Standalone magnet station: one active-low relay on pin 8.
    pub fn magnet() -> Self {
        Self {
            variant: StationVariant::Magnet,
            magnets: [
                Some(MagnetChannelConfig {
                    relay_pin: PinId(8),
                    energized: Level::Low,
                }),
                None,
            ],
            motors: [None, None],
            magnet_pulse_ms: MAGNET_PULSE_MS,
            settle_ms: SPEED_SETTLE_MS,
        }
    }

    /// Standalone vibration station: one motor on PWM pin 9.
    pub fn shaker() -> Self {
        Self {
            variant: StationVariant::Shaker,
            magnets: [None, None],
            motors: [
                Some(MotorChannelConfig {
                    pwm_pin: PinId(9),
                    enable_pin: None,
                    ground_pin: None,
                    scale: SpeedScale::Single,
                }),
                None,
            ],
            magnet_pulse_ms: MAGNET_PULSE_MS,
            settle_ms: SPEED_SETTLE_MS,
        }
    }

    /// Combined station: motor + magnet on each of channels A and B.
    pub fn combined() -> Self {
        Self {
            variant: StationVariant::Combined,
            magnets: [
                Some(MagnetChannelConfig {
                    relay_pin: PinId(3),
                    energized: Level::High,
                }),
                Some(MagnetChannelConfig {
                    relay_pin: PinId(2),
                    energized: Level::High,
                }),
            ],
            motors: [
                Some(MotorChannelConfig {
                    pwm_pin: PinId(6),
                    enable_pin: Some(PinId(5)),
                    ground_pin: Some(PinId(7)),
                    scale: SpeedScale::Dual,
                }),
                Some(MotorChannelConfig {
                    pwm_pin: PinId(10),
                    enable_pin: Some(PinId(9)),
                    ground_pin: Some(PinId(11)),
                    scale: SpeedScale::Dual,
                }),
            ],
            magnet_pulse_ms: MAGNET_PULSE_MS,
            settle_ms: SPEED_SETTLE_MS,
        }
    }

    pub fn magnet_channel(&self, channel: Channel) -> Option<&MagnetChannelConfig> {
        self.magnets[channel.index()].as_ref()
    }

    pub fn motor_channel(&self, channel: Channel) -> Option<&MotorChannelConfig> {
        self.motors[channel.index()].as_ref()
    }
}

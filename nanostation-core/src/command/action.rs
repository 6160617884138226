//! Decoded actuator commands

use core::fmt;

/// Actuator channel identifier
///
/// Single-output variants only populate channel A; the combined station
/// wires a motor and a magnet on each of A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Index into per-channel state arrays
    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => f.write_str("A"),
            Channel::B => f.write_str("B"),
        }
    }
}

/// Named motor speed tier
///
/// The duty value a tier resolves to depends on the channel's duty scale
/// (see [`crate::config::SpeedScale`]); the tier names are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedTier {
    Off,
    Low,
    Medium,
    High,
    Full,
}

/// A decoded actuator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set a vibration motor to a speed tier (with zero-duty settle)
    SetSpeed { channel: Channel, tier: SpeedTier },
    /// Energize a magnet relay; auto-releases after the pulse timeout
    MagnetOn { channel: Channel },
    /// De-energize a magnet relay immediately
    MagnetOff { channel: Channel },
    /// Restart the device
    Reset,
}

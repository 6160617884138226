//! Actuator output abstractions
//!
//! The controller drives two kinds of outputs: discrete relay pins
//! (electromagnets, motor-driver enable lines) and PWM duty-cycle pins
//! (vibration motors). Implementations map logical pin numbers to the
//! actual hardware.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Logical output pin identifier, numbered as wired on the station board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinId(pub u8);

/// Digital output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level. Used to derive a relay's de-energized level
    /// from its configured energized level.
    pub fn inverse(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Discrete pin writes (relays, enable lines)
pub trait DigitalWrite {
    /// Drive the pin to the given level. Assumed synchronous and immediate.
    fn write_digital(&mut self, pin: PinId, level: Level);
}

/// PWM duty-cycle writes (motor drivers)
pub trait AnalogWrite {
    /// Write a duty value, scaled 0-255 (0 = off, 255 = full on).
    fn write_analog(&mut self, pin: PinId, duty: u8);
}

/// Combined output bank
///
/// The controller takes one implementation covering both write kinds;
/// a single GPIO/PWM peripheral block provides both in practice.
pub trait ActuatorBank: DigitalWrite + AnalogWrite {}

// Blanket implementation for types that implement both traits
impl<T: DigitalWrite + AnalogWrite> ActuatorBank for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_inverse() {
        assert_eq!(Level::Low.inverse(), Level::High);
        assert_eq!(Level::High.inverse(), Level::Low);
    }
}

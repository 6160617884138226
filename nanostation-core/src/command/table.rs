//! Integer code to command lookup
//!
//! Each station variant has its own fixed command vocabulary. The table is
//! built once at startup from the configured variant and is read-only
//! afterwards; unknown codes resolve to `None` and never reach an actuator.

use super::{Channel, Command, SpeedTier};
use crate::config::StationVariant;

/// Reset code, shared by every variant
pub const CODE_RESET: i32 = -1;

/// Per-variant command code mapping
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandTable {
    variant: StationVariant,
}

impl CommandTable {
    pub const fn new(variant: StationVariant) -> Self {
        Self { variant }
    }

    /// Map an integer code to a command, or `None` if unrecognized.
    pub fn lookup(&self, code: i32) -> Option<Command> {
        if code == CODE_RESET {
            return Some(Command::Reset);
        }

        match self.variant {
            StationVariant::Magnet => match code {
                0 => Some(Command::MagnetOff { channel: Channel::A }),
                1 => Some(Command::MagnetOn { channel: Channel::A }),
                _ => None,
            },
            StationVariant::Shaker => speed_tier(code).map(|tier| Command::SetSpeed {
                channel: Channel::A,
                tier,
            }),
            StationVariant::Combined => match code {
                // Motor tiers; the combined station has no Full tier
                0..=3 => speed_tier(code).map(|tier| Command::SetSpeed {
                    channel: Channel::A,
                    tier,
                }),
                10..=13 => speed_tier(code - 10).map(|tier| Command::SetSpeed {
                    channel: Channel::B,
                    tier,
                }),
                20 => Some(Command::MagnetOn { channel: Channel::B }),
                21 => Some(Command::MagnetOff { channel: Channel::B }),
                30 => Some(Command::MagnetOn { channel: Channel::A }),
                31 => Some(Command::MagnetOff { channel: Channel::A }),
                _ => None,
            },
        }
    }
}

fn speed_tier(offset: i32) -> Option<SpeedTier> {
    match offset {
        0 => Some(SpeedTier::Off),
        1 => Some(SpeedTier::Low),
        2 => Some(SpeedTier::Medium),
        3 => Some(SpeedTier::High),
        4 => Some(SpeedTier::Full),
        _ => None,
    }
}

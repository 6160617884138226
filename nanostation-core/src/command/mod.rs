//! Integer command vocabulary
//!
//! Commands arrive as line-delimited ASCII decimal integers. This module
//! covers the pipeline from completed line to decoded command:
//!
//! - [`parse::parse_decimal`] - leading-numeric-prefix integer parse
//! - [`action::Command`] - the decoded actuator commands
//! - [`table::CommandTable`] - per-variant integer code lookup

pub mod action;
pub mod parse;
pub mod table;

pub use action::{Channel, Command, SpeedTier};
pub use parse::parse_decimal;
pub use table::{CommandTable, CODE_RESET};

//! Hardware abstraction traits
//!
//! These traits define the interface between the controller logic
//! and hardware-specific implementations. The firmware implements them
//! over the chip HAL; unit tests implement them with recording mocks.

pub mod outputs;
pub mod reset;
pub mod serial;
pub mod time;

pub use outputs::{ActuatorBank, AnalogWrite, DigitalWrite, Level, PinId};
pub use reset::Restart;
pub use serial::SerialPort;
pub use time::Clock;

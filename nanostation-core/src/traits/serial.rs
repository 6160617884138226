//! Serial link abstraction
//!
//! The controller sees the serial transport as a non-blocking byte source
//! plus a text sink for operator diagnostics. Bytes not yet consumed stay
//! buffered in the transport (hardware FIFO or driver ring buffer), which
//! is what keeps input intact across blocking holds.

pub trait SerialPort {
    /// Take one byte from the receive side, if one is available.
    ///
    /// Never blocks; returns `None` when the receive buffer is empty.
    fn poll_byte(&mut self) -> Option<u8>;

    /// Write raw bytes to the transmit side.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a string fragment without a line ending.
    fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write a string followed by a CRLF line ending.
    fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_bytes(b"\r\n");
    }
}

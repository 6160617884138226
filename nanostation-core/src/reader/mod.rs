//! Serial line accumulation
//!
//! Bytes from the serial link accumulate into a bounded buffer until a
//! `\n` terminator completes the line. The reader consumes at most one
//! byte per invocation; bytes beyond the first stay buffered in the
//! transport and are picked up on later ticks.

use heapless::Vec;

/// Line buffer capacity. Lines keep at most `LINE_CAPACITY - 1` bytes;
/// the write cursor pins at the last slot on overflow.
pub const LINE_CAPACITY: usize = 32;

/// A completed command line handed off to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandLine {
    bytes: Vec<u8, LINE_CAPACITY>,
    truncated: bool,
}

impl CommandLine {
    /// Line content, terminator excluded.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if input bytes were discarded by the overflow clamp.
    ///
    /// Truncation is silent on the wire (the echoed line is simply the
    /// clamped content); this marker exists for internal diagnostics.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Accumulates one line at a time from a byte stream.
#[derive(Debug, Clone)]
pub struct LineReader {
    buf: [u8; LINE_CAPACITY],
    cursor: usize,
    overflowed: bool,
    ready: bool,
    ready_len: usize,
    ready_truncated: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            cursor: 0,
            overflowed: false,
            ready: false,
            ready_len: 0,
            ready_truncated: false,
        }
    }

    /// Feed a single byte.
    ///
    /// A terminator completes the pending line (the terminator itself is
    /// not stored) and resets the cursor; any other byte is appended with
    /// the cursor clamped at the last slot.
    pub fn feed(&mut self, byte: u8) {
        if byte == b'\n' {
            self.ready_len = self.cursor;
            self.ready_truncated = self.overflowed;
            self.ready = true;
            self.cursor = 0;
            self.overflowed = false;
        } else {
            self.buf[self.cursor] = byte;
            if self.cursor < LINE_CAPACITY - 1 {
                self.cursor += 1;
            } else {
                // Cursor pinned; this byte lands in the last slot and is
                // dropped when the line completes
                self.overflowed = true;
            }
        }
    }

    /// True once a completed line is pending.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Consume the pending line, clearing the ready flag.
    pub fn take(&mut self) -> Option<CommandLine> {
        if !self.ready {
            return None;
        }
        self.ready = false;

        let mut bytes = Vec::new();
        // Cannot fail: ready_len never exceeds LINE_CAPACITY
        let _ = bytes.extend_from_slice(&self.buf[..self.ready_len]);

        Some(CommandLine {
            bytes,
            truncated: self.ready_truncated,
        })
    }
}

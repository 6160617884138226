//! Monotonic time source

pub trait Clock {
    /// Milliseconds elapsed since boot. Monotonic, never goes backwards.
    fn now_ms(&self) -> u64;
}

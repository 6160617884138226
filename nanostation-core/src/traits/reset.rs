//! Device restart capability

pub trait Restart {
    /// Restart the controller.
    ///
    /// Hardware implementations normally do not return (watchdog trip or
    /// system reset); callers must not rely on completion of the current
    /// call stack after invoking this.
    fn restart(&mut self);
}

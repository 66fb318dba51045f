/// Trait for the address bus the CPU drives.
///
/// The core issues reads and writes in program order and never reorders
/// them; any locking or device fan-out is the implementor's concern.
pub trait Bus {
    /// Read from the bus at the given address, triggering any possible
    /// side-effects.
    fn read(&mut self, addr: u16) -> u8;

    /// Attempt to deterministically read from the bus.
    ///
    /// This should return None if such a read is not possible without
    /// side-effects (for instance, open bus reads or read-sensitive I/O
    /// ports). Trace and debug paths use this instead of `read`.
    fn peek(&self, addr: u16) -> Option<u8>;

    /// Write to the bus with the given data. Writes never fail from the
    /// CPU's point of view.
    fn write(&mut self, addr: u16, data: u8);
}

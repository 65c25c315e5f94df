//! Interface statistics

use core::sync::atomic::{AtomicU32, Ordering};

/// Frame counters, shared by the interrupt handler and the main context
///
/// Counters wrap on overflow. Reads are not synchronized with each other,
/// so a [`snapshot`](Statistics::snapshot) taken while frames are moving
/// is approximate.
#[derive(Debug, Default)]
pub struct Statistics {
    rx_frames: AtomicU32,
    rx_errors: AtomicU32,
    rx_dropped: AtomicU32,
    rx_overflows: AtomicU32,
    tx_frames: AtomicU32,
    tx_errors: AtomicU32,
    tx_dropped: AtomicU32,
}

/// A copy of the [`Statistics`] counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Snapshot {
    /// Frames captured into the arena
    pub rx_frames: u32,
    /// Frames with a bad length, or flagged by the receiver
    pub rx_errors: u32,
    /// Times capture stopped because the arena was full
    ///
    /// The frame stays in the MAC until the drain loop makes room.
    pub rx_dropped: u32,
    /// Frames dropped by the hardware because its receive FIFO overflowed
    pub rx_overflows: u32,
    /// Frames the hardware finished transmitting
    pub tx_frames: u32,
    /// Transmissions the hardware reported as failed
    pub tx_errors: u32,
    /// Outbound frames dropped before they reached the hardware
    pub tx_dropped: u32,
}

fn increment(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Statistics {
    /// Create zeroed statistics
    pub const fn new() -> Self {
        Self {
            rx_frames: AtomicU32::new(0),
            rx_errors: AtomicU32::new(0),
            rx_dropped: AtomicU32::new(0),
            rx_overflows: AtomicU32::new(0),
            tx_frames: AtomicU32::new(0),
            tx_errors: AtomicU32::new(0),
            tx_dropped: AtomicU32::new(0),
        }
    }

    /// Copy all counters
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            rx_errors: self.rx_errors.load(Ordering::Relaxed),
            rx_dropped: self.rx_dropped.load(Ordering::Relaxed),
            rx_overflows: self.rx_overflows.load(Ordering::Relaxed),
            tx_frames: self.tx_frames.load(Ordering::Relaxed),
            tx_errors: self.tx_errors.load(Ordering::Relaxed),
            tx_dropped: self.tx_dropped.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn rx_frame(&self) {
        increment(&self.rx_frames);
    }
    pub(crate) fn rx_error(&self) {
        increment(&self.rx_errors);
    }
    pub(crate) fn rx_dropped(&self) {
        increment(&self.rx_dropped);
    }
    pub(crate) fn rx_overflow(&self) {
        increment(&self.rx_overflows);
    }
    pub(crate) fn tx_frame(&self) {
        increment(&self.tx_frames);
    }
    pub(crate) fn tx_error(&self) {
        increment(&self.tx_errors);
    }
    pub(crate) fn tx_dropped(&self) {
        increment(&self.tx_dropped);
    }
}

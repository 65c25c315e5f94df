//! Driver state, and splitting it into handles

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    arena::FrameArena,
    capture::Capture,
    drain::Drain,
    interrupt::InterruptLine,
    mac::{Mac, LENGTH_MASK},
    memory::FrameMemory,
    stats::Statistics,
    transmit::Transmit,
};

/// The largest Ethernet II frame, without the FCS
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1514;

/// Largest supported transfer width, set by the alignment of [`FrameMemory`]
const MAX_TRANSFER_WIDTH: usize = 8;

/// Driver configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// The largest frame accepted in either direction, in bytes
    ///
    /// Captured frames with larger descriptor lengths are counted as
    /// receive errors. Larger outbound frames are dropped.
    pub max_frame_size: usize,
}

impl Config {
    /// Accept frames up to `max_frame_size` bytes
    pub const fn new(max_frame_size: usize) -> Self {
        Config { max_frame_size }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Errors from [`DriverState::split`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    /// The driver state was already split.
    StateTaken,
    /// The receive or transmit memory belongs to another driver.
    MemoryTaken,
    /// The receive memory can't hold two worst-case frames.
    ArenaTooSmall,
    /// The maximum frame size is zero, or too large for a descriptor, or the
    /// MAC's transfer width isn't supported.
    InvalidFrameSize,
}

/// State shared by the interrupt handler and the main context
///
/// Allocate a `static` object, then [`split`](DriverState::split) it once
/// the MAC is initialized.
///
/// ```
/// use ft9xx_eth::DriverState;
///
/// static STATE: DriverState = DriverState::new();
/// ```
pub struct DriverState {
    /// Arena write cursor; only stored by [`Capture`].
    pub(crate) write: AtomicUsize,
    /// Arena read cursor; only stored by [`Drain`].
    pub(crate) read: AtomicUsize,
    /// A frame is in the transmitter.
    pub(crate) tx_active: AtomicBool,
    /// The last frame failed to transmit.
    pub(crate) tx_failed: AtomicBool,
    pub(crate) stats: Statistics,
    taken: AtomicBool,
}

impl DriverState {
    /// Allocate driver state
    pub const fn new() -> Self {
        DriverState {
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            tx_active: AtomicBool::new(false),
            tx_failed: AtomicBool::new(false),
            stats: Statistics::new(),
            taken: AtomicBool::new(false),
        }
    }

    /// Returns the interface statistics
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Returns the arena offset where the next frame is captured
    ///
    /// The offset may sit in the overflow reservation; the next frame then
    /// lands at zero.
    pub fn write_cursor(&self) -> usize {
        self.write.load(Ordering::Acquire)
    }

    /// Returns the arena offset of the next frame to deliver
    pub fn read_cursor(&self) -> usize {
        self.read.load(Ordering::Acquire)
    }

    /// Split the state into the capture, drain and transmit handles
    ///
    /// `rx` becomes the frame arena, and `tx` becomes the transmit scratch
    /// buffer. `line` is the MAC's interrupt line; the drain and transmit
    /// handles mask it for short critical sections.
    ///
    /// Configuration is checked before anything is taken. If `tx` was
    /// already taken, `rx` and the state are still consumed.
    pub fn split<'a, M: Mac, L: InterruptLine, const RX: usize, const TX: usize>(
        &'a self,
        mac: &'a M,
        line: &'a L,
        rx: &'a FrameMemory<RX>,
        tx: &'a FrameMemory<TX>,
        config: Config,
    ) -> Result<Parts<'a, M, L>, Error> {
        let width = M::TRANSFER_WIDTH;
        let max_frame_size = config.max_frame_size;
        if max_frame_size == 0
            || max_frame_size > LENGTH_MASK as usize
            || !width.is_power_of_two()
            || width > MAX_TRANSFER_WIDTH
        {
            return Err(Error::InvalidFrameSize);
        }
        if RX < FrameArena::min_capacity(width, max_frame_size) {
            return Err(Error::ArenaTooSmall);
        }

        if self.taken.swap(true, Ordering::SeqCst) {
            return Err(Error::StateTaken);
        }
        let rx = rx.take().ok_or(Error::MemoryTaken)?;
        let scratch = tx.take().ok_or(Error::MemoryTaken)?.into_slice();

        // Safety: the region is exclusively ours for 'a, and FrameMemory is
        // aligned to at least the transfer width.
        let arena = unsafe { FrameArena::new(rx.as_ptr(), rx.len(), width, max_frame_size) }
            .ok_or(Error::ArenaTooSmall)?;
        // Safety: the capture handle only writes at the write cursor, and the
        // drain handle only reads behind it.
        let drain_arena = unsafe { arena.alias() };

        self.write.store(0, Ordering::Relaxed);
        self.read.store(0, Ordering::Relaxed);
        self.tx_active.store(false, Ordering::Relaxed);
        self.tx_failed.store(false, Ordering::Release);
        debug!(
            "SPLIT ARENA={=usize} SCRATCH={=usize} MAX={=usize}",
            RX,
            TX,
            max_frame_size
        );

        Ok(Parts {
            capture: Capture::new(mac, arena, self, max_frame_size),
            drain: Drain::new(mac, line, drain_arena, self, max_frame_size),
            transmit: Transmit::new(mac, line, scratch, self, max_frame_size),
        })
    }
}

impl Default for DriverState {
    fn default() -> Self {
        Self::new()
    }
}

/// The driver handles
///
/// Move `capture` into the MAC's interrupt handler. `drain` and `transmit`
/// stay in the main context.
pub struct Parts<'a, M, L> {
    /// Services the MAC interrupt.
    pub capture: Capture<'a, M>,
    /// Delivers captured frames.
    pub drain: Drain<'a, M, L>,
    /// Sends frames.
    pub transmit: Transmit<'a, M, L>,
}

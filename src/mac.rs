//! Ethernet MAC hardware interface
//!
//! The capture, drain and transmit paths never touch registers directly.
//! They go through [`Mac`], which exposes the handful of registers the
//! frame bridge needs: the receive frame counter, the data FIFO, and the
//! interrupt status / enable registers.

use bitflags::bitflags;

bitflags! {
    /// Ethernet MAC interrupt sources
    ///
    /// The bit positions match the FT900 `ETH_INT_STATUS` and `ETH_INT_ENABLE`
    /// registers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Interrupts : u8 {
        /// One or more frames are waiting in the receive FIFO.
        const RX_FRAME = 1 << 0;
        /// The last transmission failed.
        const TX_ERROR = 1 << 1;
        /// The transmit buffer drained; the last transmission completed.
        const TX_EMPTY = 1 << 2;
        /// The receive FIFO overflowed, and the hardware dropped a frame.
        const FIFO_OVERFLOW = 1 << 3;
        /// The receiver saw a bad frame.
        const RX_ERROR = 1 << 4;
        /// A management (MII) transaction completed.
        const MII_DONE = 1 << 5;
    }
}

impl Interrupts {
    /// Interrupts serviced by the frame bridge, including frame reception
    pub const BRIDGE: Self = Self::RX_FRAME
        .union(Self::TX_ERROR)
        .union(Self::TX_EMPTY)
        .union(Self::FIFO_OVERFLOW)
        .union(Self::RX_ERROR);
}

/// An Ethernet MAC with a word-oriented receive and transmit FIFO
///
/// Every receive frame is led by a descriptor word. The low 16 bits of the
/// descriptor are the number of payload bytes that follow in the FIFO.
/// Payload is always transferred in units of [`TRANSFER_WIDTH`](Mac::TRANSFER_WIDTH).
///
/// Methods take `&self`, since the MAC is shared by the interrupt handler
/// and the main context. Implementations must tolerate the interrupt
/// handler preempting the main context between any two calls. The only
/// register shared by both contexts is the interrupt enable register, and
/// the main context only modifies it inside a
/// [`CriticalSection`](crate::CriticalSection).
pub trait Mac {
    /// FIFO transfer width, in bytes
    ///
    /// Must be a power of two.
    const TRANSFER_WIDTH: usize;

    /// Returns the active interrupt sources, including disabled sources
    fn interrupt_status(&self) -> Interrupts;
    /// Returns the enabled interrupt sources
    fn interrupt_enable(&self) -> Interrupts;
    /// Replace the enabled interrupt sources
    fn set_interrupt_enable(&self, enable: Interrupts);
    /// Acknowledge (clear) the serviced interrupt sources
    fn acknowledge(&self, serviced: Interrupts);

    /// Returns the number of complete frames waiting in the receive FIFO
    fn pending_frames(&self) -> usize;
    /// Pop the descriptor that leads the next frame in the receive FIFO
    fn read_descriptor(&self) -> u32;
    /// Stream the payload of the current frame into `dst`
    ///
    /// `dst` is the payload length rounded up to the transfer width. Bytes
    /// beyond the payload length are zeroed.
    fn copy_from_hw(&self, dst: &mut [u8]);
    /// Drop the payload of the current frame from the receive FIFO
    fn discard_frame(&self);

    /// Indicates if the transmitter is enabled
    fn is_transmit_enabled(&self) -> bool;
    /// Stream `src` into the transmit buffer
    ///
    /// `src.len()` is a multiple of the transfer width.
    fn copy_to_hw(&self, src: &[u8]);
    /// Send the frame that's been streamed into the transmit buffer
    fn start_transmit(&self);
}

/// Mask for the payload length in a receive descriptor
pub(crate) const LENGTH_MASK: u32 = 0xFFFF;

/// Round `len` up to the next multiple of `width`
///
/// `width` must be a power of two.
pub(crate) const fn round_up(len: usize, width: usize) -> usize {
    (len + width - 1) & !(width - 1)
}

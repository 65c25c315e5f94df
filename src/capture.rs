//! Interrupt-context frame capture

use crate::{
    arena::FrameArena,
    mac::{Interrupts, Mac, LENGTH_MASK},
    state::DriverState,
};
use core::sync::atomic::Ordering;

/// The interrupt half of the driver
///
/// Call [`on_interrupt`](Capture::on_interrupt) from the MAC's interrupt
/// handler. `Capture` is the only writer of the arena's write cursor.
pub struct Capture<'a, M> {
    mac: &'a M,
    arena: FrameArena<'a>,
    state: &'a DriverState,
    max_frame_size: usize,
}

impl<'a, M: Mac> Capture<'a, M> {
    pub(crate) fn new(
        mac: &'a M,
        arena: FrameArena<'a>,
        state: &'a DriverState,
        max_frame_size: usize,
    ) -> Self {
        Capture {
            mac,
            arena,
            state,
            max_frame_size,
        }
    }

    /// Service the MAC interrupt
    ///
    /// Handles every enabled source, captures all pending frames that fit
    /// into the arena, and acknowledges what it serviced. Returns the
    /// serviced sources.
    pub fn on_interrupt(&mut self) -> Interrupts {
        let isr = self.mac.interrupt_status() & self.mac.interrupt_enable();
        let state = self.state;
        let stats = &state.stats;

        if isr.contains(Interrupts::RX_ERROR) {
            stats.rx_error();
        }
        if isr.contains(Interrupts::TX_ERROR) {
            stats.tx_error();
            state.tx_failed.store(true, Ordering::Release);
            state.tx_active.store(false, Ordering::Release);
            debug!("TX ERROR");
        }
        if isr.contains(Interrupts::FIFO_OVERFLOW) {
            stats.rx_overflow();
            debug!("RX FIFO OVERFLOW");
        }
        if isr.contains(Interrupts::RX_FRAME) {
            self.capture_frames();
        }
        if isr.contains(Interrupts::TX_EMPTY) {
            stats.tx_frame();
            state.tx_failed.store(false, Ordering::Release);
            state.tx_active.store(false, Ordering::Release);
        }

        self.mac.acknowledge(isr);
        isr
    }

    /// Move frames from the receive FIFO into the arena
    fn capture_frames(&mut self) {
        let initial = self.state.write.load(Ordering::Relaxed);
        let mut write = initial;

        while self.mac.pending_frames() > 0 {
            let read = self.state.read.load(Ordering::Acquire);
            let Some(start) = self.arena.reserve(write, read) else {
                // The frame stays in the FIFO until the drain loop makes room
                // and re-enables capture.
                self.state.stats.rx_dropped();
                self.mac
                    .set_interrupt_enable(self.mac.interrupt_enable() - Interrupts::RX_FRAME);
                warn!("ARENA FULL W={=usize} R={=usize}", write, read);
                break;
            };

            let length = (self.mac.read_descriptor() & LENGTH_MASK) as usize;
            if length == 0 || length > self.max_frame_size {
                self.mac.discard_frame();
                self.state.stats.rx_error();
                debug!("RX BAD LENGTH {=usize}", length);
                continue;
            }

            self.arena.write_header(start, length as u32);
            self.mac.copy_from_hw(self.arena.payload_mut(start, length));
            write = start + self.arena.record_len(length);
            self.state.write.store(write, Ordering::Release);
            self.state.stats.rx_frame();
            trace!("RX {=usize} @ {=usize}", length, start);
        }

        if write != initial {
            self.arena.write_sentinel(write);
        }
    }
}

//! Outbound frame coalescing
//!
//! The hardware transmit FIFO only takes whole transfer-width units. A
//! frame usually arrives as a chain of segments, and segments of any
//! length are valid. Leading segments whose lengths are multiples of the
//! transfer width stream straight into the FIFO. Starting at the first
//! unaligned segment, the rest of the chain is gathered into a scratch
//! buffer, zero-padded, and streamed with one more write.

use crate::{
    interrupt::{CriticalSection, InterruptLine},
    mac::{round_up, Mac},
    state::DriverState,
};
use core::sync::atomic::Ordering;

/// Transmit failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TxError {
    /// The MAC's transmitter is disabled.
    Disabled,
    /// The previous frame is still being sent. Try again later.
    Busy,
    /// The frame is empty, too large, or too large for the scratch buffer.
    Dropped,
}

/// The state of the most recent transmission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TxStatus {
    /// Nothing is in flight; the last frame (if any) was sent.
    Idle,
    /// A frame is in flight.
    Busy,
    /// The last frame failed. It's up to the caller to resend it.
    Failed,
}

/// The transmit path
pub struct Transmit<'a, M, L> {
    mac: &'a M,
    line: &'a L,
    scratch: &'a mut [u8],
    state: &'a DriverState,
    max_frame_size: usize,
}

impl<'a, M: Mac, L: InterruptLine> Transmit<'a, M, L> {
    pub(crate) fn new(
        mac: &'a M,
        line: &'a L,
        scratch: &'a mut [u8],
        state: &'a DriverState,
        max_frame_size: usize,
    ) -> Self {
        Transmit {
            mac,
            line,
            scratch,
            state,
            max_frame_size,
        }
    }

    /// Send one frame, described by a chain of segments
    ///
    /// Returns the number of bytes streamed into the FIFO, including
    /// padding. The chain is never modified.
    pub fn transmit(&mut self, chain: &[&[u8]]) -> Result<usize, TxError> {
        if !self.mac.is_transmit_enabled() {
            self.state.stats.tx_dropped();
            return Err(TxError::Disabled);
        }

        let total: usize = chain.iter().map(|segment| segment.len()).sum();
        if total == 0 || total > self.max_frame_size {
            self.state.stats.tx_dropped();
            debug!("TX BAD LENGTH {=usize}", total);
            return Err(TxError::Dropped);
        }

        {
            let _cs = CriticalSection::new(self.line);
            if self.state.tx_active.load(Ordering::Acquire) {
                return Err(TxError::Busy);
            }
            self.state.tx_active.store(true, Ordering::Relaxed);
            self.state.tx_failed.store(false, Ordering::Relaxed);
        }

        let width = M::TRANSFER_WIDTH;
        let split = chain
            .iter()
            .position(|segment| segment.len() % width != 0)
            .unwrap_or(chain.len());
        let (aligned, tail) = chain.split_at(split);
        let tail_len: usize = tail.iter().map(|segment| segment.len()).sum();
        let padded = round_up(tail_len, width);

        if padded > self.scratch.len() {
            self.state.tx_active.store(false, Ordering::Release);
            self.state.stats.tx_dropped();
            warn!("TX SCRATCH {=usize} > {=usize}", padded, self.scratch.len());
            return Err(TxError::Dropped);
        }

        let mut written = 0;
        for segment in aligned.iter().filter(|segment| !segment.is_empty()) {
            self.mac.copy_to_hw(segment);
            written += segment.len();
        }

        if padded > 0 {
            let mut offset = 0;
            for segment in tail {
                self.scratch[offset..offset + segment.len()].copy_from_slice(segment);
                offset += segment.len();
            }
            self.scratch[offset..padded].fill(0);
            self.mac.copy_to_hw(&self.scratch[..padded]);
            written += padded;
        }

        self.mac.start_transmit();
        trace!("TX {=usize} ({=usize})", total, written);
        Ok(written)
    }

    /// Returns the state of the most recent transmission
    pub fn status(&self) -> TxStatus {
        if self.state.tx_active.load(Ordering::Acquire) {
            TxStatus::Busy
        } else if self.state.tx_failed.load(Ordering::Acquire) {
            TxStatus::Failed
        } else {
            TxStatus::Idle
        }
    }

    /// Returns the size of the scratch buffer, in bytes
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }
}

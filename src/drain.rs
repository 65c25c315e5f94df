//! Main-context frame delivery

use crate::{
    arena::{FrameArena, SENTINEL},
    interrupt::{CriticalSection, InterruptLine},
    mac::{Interrupts, Mac},
    state::DriverState,
};
use core::sync::atomic::Ordering;

/// Receives captured frames
///
/// Any `FnMut(&[u8])` closure is a sink that's always ready.
pub trait FrameSink {
    /// Take a copy of `frame`
    ///
    /// `frame` is only valid for the duration of the call.
    fn deliver_frame(&mut self, frame: &[u8]);

    /// Indicates if the sink can take another frame
    ///
    /// When this returns `false`, the frame stays in the arena, and it's
    /// offered again on the next poll.
    fn ready(&mut self) -> bool {
        true
    }
}

impl<F: FnMut(&[u8])> FrameSink for F {
    fn deliver_frame(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// The polled half of the receive path
///
/// `Drain` is the only writer of the arena's read cursor.
pub struct Drain<'a, M, L> {
    mac: &'a M,
    line: &'a L,
    arena: FrameArena<'a>,
    state: &'a DriverState,
    max_frame_size: usize,
}

impl<'a, M: Mac, L: InterruptLine> Drain<'a, M, L> {
    pub(crate) fn new(
        mac: &'a M,
        line: &'a L,
        arena: FrameArena<'a>,
        state: &'a DriverState,
        max_frame_size: usize,
    ) -> Self {
        Drain {
            mac,
            line,
            arena,
            state,
            max_frame_size,
        }
    }

    /// Deliver captured frames to `sink`, oldest first
    ///
    /// Returns the number of delivered frames. Once there's room for
    /// another worst-case frame, this re-enables frame capture. An empty
    /// arena is a no-op, apart from that re-enable.
    pub fn poll<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let (mut read, write) = {
            let _cs = CriticalSection::new(self.line);
            (
                self.state.read.load(Ordering::Relaxed),
                self.state.write.load(Ordering::Acquire),
            )
        };

        let mut delivered = 0;
        while read != write {
            let pos = self.arena.wrap(read);
            if pos == write {
                read = pos;
                break;
            }

            let length = self.arena.read_length(pos);
            if length == SENTINEL {
                break;
            }
            let length = length as usize;
            if length == 0 || length > self.max_frame_size {
                self.state.stats.rx_error();
                warn!("RX CORRUPT {=usize} @ {=usize}", length, pos);
                read = write;
                break;
            }

            if !sink.ready() {
                break;
            }
            sink.deliver_frame(self.arena.payload(pos, length));
            read = pos + self.arena.record_len(length);
            self.state.read.store(read, Ordering::Release);
            delivered += 1;
        }

        let _cs = CriticalSection::new(self.line);
        self.state.read.store(read, Ordering::Release);
        let write = self.state.write.load(Ordering::Acquire);
        if self.arena.reserve(write, read).is_some() {
            let enable = self.mac.interrupt_enable();
            if !enable.contains(Interrupts::RX_FRAME) {
                self.mac.set_interrupt_enable(enable | Interrupts::RX_FRAME);
                debug!("RX RESUMED");
            }
        }
        delivered
    }

    /// Indicates if captured frames are waiting to be delivered
    pub fn is_empty(&self) -> bool {
        let read = self.state.read.load(Ordering::Relaxed);
        let write = self.state.write.load(Ordering::Acquire);
        read == write || self.arena.wrap(read) == write
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::FrameSink;
    use crate::{
        sim::{SimLine, SimMac},
        DriverState, FrameMemory,
    };
    use std::vec::Vec;

    struct Collect {
        frames: Vec<Vec<u8>>,
        room: usize,
    }

    impl FrameSink for Collect {
        fn deliver_frame(&mut self, frame: &[u8]) {
            self.frames.push(frame.to_vec());
            self.room -= 1;
        }
        fn ready(&mut self) -> bool {
            self.room > 0
        }
    }

    #[test]
    fn empty_drain_is_a_no_op() {
        static STATE: DriverState = DriverState::new();
        static RX: FrameMemory<4096> = FrameMemory::new();
        static TX: FrameMemory<1536> = FrameMemory::new();
        let mac = SimMac::<4>::new();
        let line = SimLine::default();
        let mut parts = STATE
            .split(&mac, &line, &RX, &TX, Default::default())
            .unwrap();

        let before = STATE.statistics().snapshot();
        let mut count = 0;
        for _ in 0..3 {
            assert_eq!(parts.drain.poll(&mut |_: &[u8]| count += 1), 0);
        }
        assert_eq!(count, 0);
        assert_eq!(STATE.statistics().snapshot(), before);
        assert_eq!(STATE.read_cursor(), 0);
        assert!(parts.drain.is_empty());
        assert!(!line.is_masked());
    }

    #[test]
    fn sink_backpressure_keeps_frames_queued() {
        static STATE: DriverState = DriverState::new();
        static RX: FrameMemory<4096> = FrameMemory::new();
        static TX: FrameMemory<1536> = FrameMemory::new();
        let mac = SimMac::<4>::new();
        let line = SimLine::default();
        let mut parts = STATE
            .split(&mac, &line, &RX, &TX, Default::default())
            .unwrap();

        for seed in 1..=3u8 {
            mac.push_frame(&[seed; 20]);
        }
        parts.capture.on_interrupt();

        let mut sink = Collect {
            frames: Vec::new(),
            room: 2,
        };
        assert_eq!(parts.drain.poll(&mut sink), 2);
        assert!(!parts.drain.is_empty());
        assert_eq!(parts.drain.poll(&mut sink), 0);

        sink.room = 5;
        assert_eq!(parts.drain.poll(&mut sink), 1);
        assert!(parts.drain.is_empty());
        let seeds: Vec<u8> = sink.frames.iter().map(|frame| frame[0]).collect();
        assert_eq!(seeds, [1, 2, 3]);
    }

    #[test]
    fn corrupt_header_skips_to_write_cursor() {
        static STATE: DriverState = DriverState::new();
        static RX: FrameMemory<4096> = FrameMemory::new();
        static TX: FrameMemory<1536> = FrameMemory::new();
        let mac = SimMac::<4>::new();
        let line = SimLine::default();
        let mut parts = STATE
            .split(&mac, &line, &RX, &TX, Default::default())
            .unwrap();

        mac.push_frame(&[0xAA; 16]);
        mac.push_frame(&[0xBB; 16]);
        parts.capture.on_interrupt();
        assert_eq!(STATE.write_cursor(), 40);

        // Scribble over the first header.
        unsafe { RX.as_mut_ptr().cast::<u32>().write(u32::to_le(5000)) };

        let mut frames = Vec::new();
        assert_eq!(parts.drain.poll(&mut |f: &[u8]| frames.push(f.to_vec())), 0);
        assert!(frames.is_empty());
        assert_eq!(STATE.read_cursor(), 40);
        assert_eq!(STATE.statistics().snapshot().rx_errors, 1);

        mac.push_frame(&[0xCC; 16]);
        parts.capture.on_interrupt();
        assert_eq!(parts.drain.poll(&mut |f: &[u8]| frames.push(f.to_vec())), 1);
        assert_eq!(frames, [[0xCC; 16]]);
    }
}

//! The receive frame arena
//!
//! The arena is similar to a circular buffer, but a frame record is never
//! split across the physical end of the buffer. Instead, the tail of the
//! arena is an overflow reservation sized for one worst-case record. A
//! record may start anywhere before the reservation and run into it; a
//! cursor that lands inside the reservation wraps to the start before the
//! next record is written (or read).
//!
//! A record is a header followed by the payload. The header's first four
//! bytes are the little-endian payload length; the header is padded to the
//! transfer width. The payload is zero-padded to the transfer width.
//!
//! ```text
//! 0          read               write            N - max_record    N
//! |  free    | rec | rec | rec  | SENTINEL  free  |  overflow       |
//! ```
//!
//! The interrupt handler owns the write cursor, and the drain loop owns the
//! read cursor. Both cursors are stored in the [`DriverState`](crate::DriverState).

use crate::mac::round_up;
use core::{marker::PhantomData, ptr::NonNull};

/// Marks the end of the captured frames
pub const SENTINEL: u32 = 0xFFFF_FFFF;

/// Size of the length word at the start of every header
const LENGTH_WORD: usize = core::mem::size_of::<u32>();

/// A view of the arena memory, and its geometry
///
/// Both the capture and drain handles hold a `FrameArena` over the same
/// memory. They only ever access disjoint records, as arbitrated by the
/// read and write cursors.
pub struct FrameArena<'a> {
    start: NonNull<u8>,
    capacity: usize,
    width: usize,
    header: usize,
    max_record: usize,
    _memory: PhantomData<&'a [u8]>,
}

// Safety: the capture handle may move into an interrupt handler. The cursor
// protocol keeps the two views from touching the same bytes at the same time.
unsafe impl Send for FrameArena<'_> {}

impl<'a> FrameArena<'a> {
    /// Describe an arena over `capacity` bytes at `start`
    ///
    /// Returns `None` if the arena cannot hold two worst-case records and a
    /// header, or if `width` is not a power of two.
    ///
    /// # Safety
    ///
    /// `start` must point to `capacity` bytes, aligned to `width`, that stay
    /// valid for `'a`. Only the capture and drain views of the same driver
    /// may use the memory.
    pub(crate) unsafe fn new(
        start: NonNull<u8>,
        capacity: usize,
        width: usize,
        max_frame_size: usize,
    ) -> Option<Self> {
        if !width.is_power_of_two() || start.as_ptr() as usize % width != 0 {
            return None;
        }
        let header = round_up(LENGTH_WORD, width);
        let max_record = header + round_up(max_frame_size, width);
        (capacity >= Self::min_capacity(width, max_frame_size)).then_some(FrameArena {
            start,
            capacity,
            width,
            header,
            max_record,
            _memory: PhantomData,
        })
    }

    /// Returns the smallest arena that holds two worst-case records and a header
    ///
    /// `width` must be a power of two.
    pub const fn min_capacity(width: usize, max_frame_size: usize) -> usize {
        let header = round_up(LENGTH_WORD, width);
        let max_record = header + round_up(max_frame_size, width);
        2 * max_record + header
    }

    /// Create another view of the same memory
    ///
    /// # Safety
    ///
    /// Caller must only hand the copy to the other side of the cursor protocol.
    pub(crate) unsafe fn alias(&self) -> Self {
        FrameArena {
            start: self.start,
            capacity: self.capacity,
            width: self.width,
            header: self.header,
            max_record: self.max_record,
            _memory: PhantomData,
        }
    }

    /// Returns the arena capacity, in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the size of a record header, in bytes
    pub fn header_len(&self) -> usize {
        self.header
    }

    /// Returns the size of the largest possible record
    ///
    /// This is also the size of the overflow reservation.
    pub fn max_record_len(&self) -> usize {
        self.max_record
    }

    /// Returns the number of arena bytes occupied by a frame of `len` bytes
    pub fn record_len(&self, len: usize) -> usize {
        self.header + round_up(len, self.width)
    }

    /// Returns the number of bytes from `cursor` to the end of the arena
    ///
    /// When this is smaller than [`max_record_len`](Self::max_record_len),
    /// the cursor is inside the overflow reservation.
    pub fn remaining_from(&self, cursor: usize) -> usize {
        self.capacity.saturating_sub(cursor)
    }

    /// Returns the free bytes from `write` forward to `read`
    ///
    /// An empty arena (`write == read`) returns the capacity.
    pub fn remaining_total(&self, write: usize, read: usize) -> usize {
        if write >= read {
            self.capacity - write + read
        } else {
            read - write
        }
    }

    /// Returns the position where a record at `cursor` actually starts
    ///
    /// Cursors inside the overflow reservation wrap to zero.
    pub fn wrap(&self, cursor: usize) -> usize {
        if self.remaining_from(cursor) < self.max_record {
            0
        } else {
            cursor
        }
    }

    /// Find the start of the next record, given both cursors
    ///
    /// Returns `None` if a worst-case record fits neither at `write` nor at
    /// the start of the arena. A writer that's behind the reader must keep
    /// a header's worth of space, so that a full arena never looks empty.
    pub fn reserve(&self, write: usize, read: usize) -> Option<usize> {
        let fits_before_read = |start: usize| start + self.max_record + self.header <= read;
        if write >= read {
            if self.remaining_from(write) >= self.max_record {
                Some(write)
            } else {
                fits_before_read(0).then_some(0)
            }
        } else {
            fits_before_read(write).then_some(write)
        }
    }

    /// Read the length word at `offset`
    pub(crate) fn read_length(&self, offset: usize) -> u32 {
        let mut word = [0; LENGTH_WORD];
        word.copy_from_slice(self.bytes(offset, LENGTH_WORD));
        u32::from_le_bytes(word)
    }

    /// Write a header, holding `length`, at `offset`
    pub(crate) fn write_header(&mut self, offset: usize, length: u32) {
        let header = self.bytes_mut(offset, self.header);
        header[..LENGTH_WORD].copy_from_slice(&length.to_le_bytes());
        header[LENGTH_WORD..].fill(0);
    }

    /// Write the end-of-frames sentinel at `offset`, if there's room
    pub(crate) fn write_sentinel(&mut self, offset: usize) {
        if self.remaining_from(offset) >= self.header {
            self.write_header(offset, SENTINEL);
        }
    }

    /// Borrow the payload of the record at `offset`
    pub(crate) fn payload(&self, offset: usize, len: usize) -> &[u8] {
        self.bytes(offset + self.header, len)
    }

    /// Mutably borrow the padded payload area of the record at `offset`
    pub(crate) fn payload_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        let padded = round_up(len, self.width);
        self.bytes_mut(offset + self.header, padded)
    }

    fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        assert!(offset + len <= self.capacity, "arena access out of bounds");
        // Safety: in bounds, checked above. The cursor protocol guarantees
        // that the other side isn't writing these bytes.
        unsafe { core::slice::from_raw_parts(self.start.as_ptr().add(offset), len) }
    }

    fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        assert!(offset + len <= self.capacity, "arena access out of bounds");
        // Safety: in bounds, checked above. The cursor protocol guarantees
        // that the other side isn't reading or writing these bytes.
        unsafe { core::slice::from_raw_parts_mut(self.start.as_ptr().add(offset), len) }
    }
}

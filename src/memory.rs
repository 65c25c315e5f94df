//! Static memory for the receive arena and transmit scratch buffer

use core::{
    cell::UnsafeCell,
    ptr::NonNull,
    sync::atomic::{AtomicBool, Ordering},
};

/// Memory for captured frames, or for coalescing outbound frames
///
/// Allocate a `static` object and supply it to
/// [`DriverState::split`](crate::DriverState::split). The memory can only be
/// assigned to one driver; a second assignment fails.
///
/// ```
/// use ft9xx_eth::FrameMemory;
///
/// static RX_MEMORY: FrameMemory<4096> = FrameMemory::new();
/// static TX_MEMORY: FrameMemory<1536> = FrameMemory::new();
/// ```
///
/// The memory is aligned to eight bytes, so any supported transfer width
/// can stream into it.
#[repr(C, align(8))]
pub struct FrameMemory<const SIZE: usize> {
    buffer: UnsafeCell<[u8; SIZE]>,
    taken: AtomicBool,
}

// Safety: the buffer is only reachable through take(), which hands out
// access once.
unsafe impl<const SIZE: usize> Sync for FrameMemory<SIZE> {}

impl<const SIZE: usize> FrameMemory<SIZE> {
    /// Allocate zeroed frame memory
    pub const fn new() -> Self {
        Self {
            buffer: UnsafeCell::new([0; SIZE]),
            taken: AtomicBool::new(false),
        }
    }

    /// Returns the size of this memory, in bytes
    pub const fn size(&self) -> usize {
        SIZE
    }

    /// Acquire the memory
    ///
    /// Returns `None` if the memory was already taken.
    pub(crate) fn take(&self) -> Option<Region<'_>> {
        if self.taken.swap(true, Ordering::SeqCst) {
            return None;
        }
        // Safety: UnsafeCell never returns a null pointer.
        let start = unsafe { NonNull::new_unchecked(self.buffer.get().cast::<u8>()) };
        Some(Region {
            start,
            len: SIZE,
            _memory: core::marker::PhantomData,
        })
    }

    /// Pointer to the memory, for tests that corrupt captured frames
    #[cfg(test)]
    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        self.buffer.get().cast()
    }
}

impl<const SIZE: usize> Default for FrameMemory<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to a taken [`FrameMemory`]
pub(crate) struct Region<'a> {
    start: NonNull<u8>,
    len: usize,
    _memory: core::marker::PhantomData<&'a mut [u8]>,
}

impl<'a> Region<'a> {
    /// Returns the start of the region
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.start
    }

    /// Returns the size of the region, in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Convert the region into a mutable slice
    pub fn into_slice(self) -> &'a mut [u8] {
        // Safety: the region covers the whole buffer of a FrameMemory that
        // was taken exactly once. The PhantomData ties the slice to that
        // memory's lifetime.
        unsafe { core::slice::from_raw_parts_mut(self.start.as_ptr(), self.len) }
    }
}

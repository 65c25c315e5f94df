//! Critical sections over a single interrupt line
//!
//! The main context only needs to exclude the Ethernet interrupt handler,
//! and only for a few instructions: snapshotting the cursors, toggling the
//! receive interrupt, or claiming the transmitter. A [`CriticalSection`]
//! masks one [`InterruptLine`] while it's alive, and restores it on drop.
//! Other interrupts keep running.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

/// An interrupt line that can be masked and unmasked
///
/// [`Nvic`] implements this for Cortex-M parts. On other cores, like the
/// FT900's FT32, implement it over the core's interrupt controller.
pub trait InterruptLine {
    /// Mask the interrupt line
    ///
    /// Returns `true` if the line was unmasked before this call.
    fn mask(&self) -> bool;
    /// Unmask the interrupt line
    fn unmask(&self);
}

impl<L: InterruptLine + ?Sized> InterruptLine for &L {
    fn mask(&self) -> bool {
        (**self).mask()
    }
    fn unmask(&self) {
        (**self).unmask()
    }
}

/// Masks an interrupt line until dropped
///
/// A nested critical section leaves the line masked when it drops; only
/// the outermost section unmasks the line.
#[must_use = "the interrupt line is unmasked when the critical section drops"]
pub struct CriticalSection<'a, L: InterruptLine + ?Sized> {
    line: &'a L,
    restore: bool,
}

impl<'a, L: InterruptLine + ?Sized> CriticalSection<'a, L> {
    /// Mask `line` until the returned guard drops
    pub fn new(line: &'a L) -> Self {
        let restore = line.mask();
        CriticalSection { line, restore }
    }
}

impl<L: InterruptLine + ?Sized> Drop for CriticalSection<'_, L> {
    fn drop(&mut self) {
        if self.restore {
            self.line.unmask();
        }
    }
}

/// An NVIC interrupt line on a Cortex-M processor
///
/// ```no_run
/// use ft9xx_eth::Nvic;
/// # #[derive(Clone, Copy)] struct Irq;
/// # unsafe impl cortex_m::interrupt::InterruptNumber for Irq { fn number(self) -> u16 { 42 } }
///
/// let line = Nvic::new(Irq);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Nvic<I> {
    irq: I,
}

impl<I: InterruptNumber> Nvic<I> {
    /// Use the NVIC to mask and unmask `irq`
    pub const fn new(irq: I) -> Self {
        Nvic { irq }
    }

    /// Returns the interrupt number
    pub fn irq(&self) -> I {
        self.irq
    }
}

impl<I: InterruptNumber> InterruptLine for Nvic<I> {
    fn mask(&self) -> bool {
        let enabled = NVIC::is_enabled(self.irq);
        NVIC::mask(self.irq);
        enabled
    }
    fn unmask(&self) {
        // Safety: the line was unmasked when the critical section started.
        // We're restoring that state, not unmasking a line that someone
        // else chose to keep masked.
        unsafe { NVIC::unmask(self.irq) }
    }
}

#[cfg(test)]
mod tests {
    use super::{CriticalSection, InterruptLine};
    use core::cell::Cell;

    #[derive(Default)]
    struct Line {
        masked: Cell<bool>,
        unmasks: Cell<usize>,
    }

    impl InterruptLine for Line {
        fn mask(&self) -> bool {
            !self.masked.replace(true)
        }
        fn unmask(&self) {
            self.masked.set(false);
            self.unmasks.set(self.unmasks.get() + 1);
        }
    }

    #[test]
    fn masks_while_alive() {
        let line = Line::default();
        {
            let _cs = CriticalSection::new(&line);
            assert!(line.masked.get());
        }
        assert!(!line.masked.get());
        assert_eq!(line.unmasks.get(), 1);
    }

    #[test]
    fn nested_sections_restore_once() {
        let line = Line::default();
        {
            let _outer = CriticalSection::new(&line);
            {
                let _inner = CriticalSection::new(&line);
            }
            assert!(line.masked.get());
        }
        assert!(!line.masked.get());
        assert_eq!(line.unmasks.get(), 1);
    }

    #[test]
    fn keeps_masked_line_masked() {
        let line = Line::default();
        line.masked.set(true);
        {
            let _cs = CriticalSection::new(&line);
        }
        assert!(line.masked.get());
        assert_eq!(line.unmasks.get(), 0);
    }
}

//! A software MAC and interrupt line, for host tests

extern crate std;

use crate::{interrupt::InterruptLine, mac::Interrupts, Mac};
use core::cell::{Cell, RefCell};
use std::{collections::VecDeque, vec::Vec};

/// A MAC with a `W`-byte FIFO
///
/// Receive frames queue up until the capture path pops them. The receive
/// frame interrupt is active while the queue isn't empty; other interrupt
/// sources latch until they're acknowledged.
pub struct SimMac<const W: usize> {
    latched: Cell<Interrupts>,
    enable: Cell<Interrupts>,
    rx: RefCell<VecDeque<(u32, Vec<u8>)>>,
    current: RefCell<Option<Vec<u8>>>,
    tx_enabled: Cell<bool>,
    tx_buffer: RefCell<Vec<u8>>,
    writes: RefCell<Vec<usize>>,
    sent: RefCell<Vec<Vec<u8>>>,
}

impl<const W: usize> SimMac<W> {
    pub fn new() -> Self {
        SimMac {
            latched: Cell::new(Interrupts::empty()),
            enable: Cell::new(Interrupts::BRIDGE),
            rx: RefCell::new(VecDeque::new()),
            current: RefCell::new(None),
            tx_enabled: Cell::new(true),
            tx_buffer: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Queue a well-formed frame
    pub fn push_frame(&self, frame: &[u8]) {
        self.push_raw(frame.len() as u32, frame);
    }

    /// Queue a frame with an arbitrary descriptor
    pub fn push_raw(&self, descriptor: u32, payload: &[u8]) {
        self.rx
            .borrow_mut()
            .push_back((descriptor, payload.to_vec()));
    }

    /// Latch an interrupt source
    pub fn raise(&self, interrupts: Interrupts) {
        self.latched.set(self.latched.get() | interrupts);
    }

    /// Finish the transmission that's in flight
    pub fn complete_transmit(&self, ok: bool) {
        self.raise(if ok {
            Interrupts::TX_EMPTY
        } else {
            Interrupts::TX_ERROR
        });
    }

    pub fn set_transmit_enabled(&self, enabled: bool) {
        self.tx_enabled.set(enabled);
    }

    pub fn rx_enabled(&self) -> bool {
        self.enable.get().contains(Interrupts::RX_FRAME)
    }

    pub fn pending(&self) -> usize {
        self.rx.borrow().len()
    }

    /// Length of every `copy_to_hw` call, in order
    pub fn writes(&self) -> Vec<usize> {
        self.writes.borrow().clone()
    }

    /// Every transmitted frame, as streamed into the FIFO
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }
}

impl<const W: usize> Mac for SimMac<W> {
    const TRANSFER_WIDTH: usize = W;

    fn interrupt_status(&self) -> Interrupts {
        let mut status = self.latched.get();
        status.set(Interrupts::RX_FRAME, !self.rx.borrow().is_empty());
        status
    }
    fn interrupt_enable(&self) -> Interrupts {
        self.enable.get()
    }
    fn set_interrupt_enable(&self, enable: Interrupts) {
        self.enable.set(enable);
    }
    fn acknowledge(&self, serviced: Interrupts) {
        self.latched.set(self.latched.get() - serviced);
    }

    fn pending_frames(&self) -> usize {
        self.rx.borrow().len()
    }
    fn read_descriptor(&self) -> u32 {
        let (descriptor, payload) = self
            .rx
            .borrow_mut()
            .pop_front()
            .expect("no frame to read");
        *self.current.borrow_mut() = Some(payload);
        descriptor
    }
    fn copy_from_hw(&self, dst: &mut [u8]) {
        assert_eq!(dst.len() % W, 0, "unaligned receive transfer");
        let payload = self.current.borrow_mut().take().expect("no current frame");
        let len = payload.len().min(dst.len());
        dst[..len].copy_from_slice(&payload[..len]);
        dst[len..].fill(0);
    }
    fn discard_frame(&self) {
        self.current.borrow_mut().take().expect("no current frame");
    }

    fn is_transmit_enabled(&self) -> bool {
        self.tx_enabled.get()
    }
    fn copy_to_hw(&self, src: &[u8]) {
        assert_eq!(src.len() % W, 0, "unaligned transmit transfer");
        self.writes.borrow_mut().push(src.len());
        self.tx_buffer.borrow_mut().extend_from_slice(src);
    }
    fn start_transmit(&self) {
        let frame = core::mem::take(&mut *self.tx_buffer.borrow_mut());
        self.sent.borrow_mut().push(frame);
    }
}

/// An interrupt line that counts critical sections
#[derive(Default)]
pub struct SimLine {
    masked: Cell<bool>,
    sections: Cell<usize>,
}

impl SimLine {
    pub fn is_masked(&self) -> bool {
        self.masked.get()
    }
    pub fn sections(&self) -> usize {
        self.sections.get()
    }
}

impl InterruptLine for SimLine {
    fn mask(&self) -> bool {
        self.sections.set(self.sections.get() + 1);
        !self.masked.replace(true)
    }
    fn unmask(&self) {
        self.masked.set(false);
    }
}

//! The FT900 Ethernet MAC
//!
//! [`Ft900`] implements [`Mac`] over the FT900 MAC registers. It streams
//! the receive and transmit FIFOs one 32-bit word at a time, through the
//! `ETH_DATA` register.
//!
//! # Frame format
//!
//! Every frame in the receive FIFO starts with a 16-bit length, followed
//! by the frame itself, and the frame's CRC. The length counts the frame,
//! the CRC, and the length field. `Ft900` strips the length and the CRC, so
//! the capture path only ever sees the Ethernet frame.
//!
//! The transmitter expects the same 16-bit length in front of every
//! outbound frame. It's the caller's job to put it there; see
//! [`length_prefix`].

use crate::{
    mac::{Interrupts, Mac},
    ral, Peripherals,
};
use core::sync::atomic::{AtomicU32, Ordering};

/// Address of the FT900 Ethernet MAC registers
pub const ETH_ADDRESS: *const () = 0x0001_0220 as *const ();

/// Bytes in the receive length field
const LENGTH_FIELD: usize = 2;
/// Bytes in the frame check sequence
const CRC: usize = 4;
/// Destination, source and type
const ETHERNET_HEADER: usize = 14;
/// The receive length is an 11-bit field
const RX_LENGTH_MASK: u32 = 0x7FF;

/// Produces the 16-bit length that leads an outbound frame
///
/// `frame_len` is the size of the Ethernet frame, from the destination
/// address through the payload. Stream these two bytes ahead of the frame,
/// typically as the first two bytes of the first segment.
///
/// ```
/// let prefix = ft9xx_eth::ft900::length_prefix(60);
/// assert_eq!(prefix, [48, 0]);
/// ```
pub const fn length_prefix(frame_len: usize) -> [u8; 2] {
    let payload = crate::mac::round_up(frame_len.saturating_sub(ETHERNET_HEADER), 4);
    (payload as u16).to_le_bytes()
}

/// An FT900 Ethernet MAC
///
/// Construct it from a [`Peripherals`] implementation that owns the MAC
/// registers, then [`initialize`](Ft900::initialize) it before splitting
/// the driver state.
pub struct Ft900<P> {
    peripherals: P,
    /// The first FIFO word of the frame being captured.
    head: AtomicU32,
}

impl<P: Peripherals> Ft900<P> {
    /// Create an FT900 MAC that uses the registers owned by `peripherals`
    pub fn new(peripherals: P) -> Self {
        Ft900 {
            peripherals,
            head: AtomicU32::new(0),
        }
    }

    /// Release the registers
    pub fn release(self) -> P {
        self.peripherals
    }

    fn eth(&self) -> &ral::eth::RegisterBlock {
        // Safety: the Peripherals implementation guarantees that the
        // pointer is valid, and that we own the registers.
        unsafe { &*self.peripherals.eth().cast() }
    }

    /// Reset the MAC to a known state
    ///
    /// Resets the receive FIFO, and disables both the receiver and the
    /// transmitter. Bad-CRC frames are discarded, and outbound frames are
    /// padded and get a CRC. The MAC runs in full duplex, neither
    /// promiscuous nor accepting multicast.
    ///
    /// PHY setup isn't handled here.
    pub fn initialize(&self, mac_address: [u8; 6]) {
        let eth = self.eth();
        ral::write_reg!(ral::eth, eth, ETH_INT_ENABLE, 0);
        ral::write_reg!(ral::eth, eth, ETH_RX_CNTL, RESET_FIFO: 1, BAD_CRC: 1);
        ral::write_reg!(ral::eth, eth, ETH_TX_CNTL, 0);

        self.set_full_duplex(true);
        self.set_crc(true);
        self.set_padding(true);
        self.set_promiscuous(false);
        self.accept_multicast(false);
        self.set_mac_address(mac_address);
        debug!("FT900 INITIALIZED");
    }

    /// Clear, then enable, the selected interrupt sources
    ///
    /// Use [`Interrupts::BRIDGE`] to service everything the driver needs.
    pub fn enable_interrupts(&self, interrupts: Interrupts) {
        let eth = self.eth();
        ral::write_reg!(ral::eth, eth, ETH_INT_STATUS, interrupts.bits());
        ral::write_reg!(ral::eth, eth, ETH_INT_ENABLE, interrupts.bits());
    }

    /// Set the station address
    pub fn set_mac_address(&self, mac_address: [u8; 6]) {
        for (register, byte) in self.eth().ETH_ADDR.iter().zip(mac_address) {
            register.write(byte);
        }
    }

    /// Returns the station address
    pub fn mac_address(&self) -> [u8; 6] {
        let mut mac_address = [0; 6];
        for (byte, register) in mac_address.iter_mut().zip(&self.eth().ETH_ADDR) {
            *byte = register.read();
        }
        mac_address
    }

    /// Receive every frame, regardless of its destination
    pub fn set_promiscuous(&self, promiscuous: bool) {
        ral::modify_reg!(ral::eth, self.eth(), ETH_RX_CNTL, RX_MEM_SIZE: 0, PRMS_MODE: promiscuous as u8);
    }

    /// Receive multicast frames
    pub fn accept_multicast(&self, accept: bool) {
        ral::modify_reg!(ral::eth, self.eth(), ETH_RX_CNTL, RX_MEM_SIZE: 0, ACC_MULTI: accept as u8);
    }

    /// Transmit in full duplex mode
    pub fn set_full_duplex(&self, full_duplex: bool) {
        ral::modify_reg!(ral::eth, self.eth(), ETH_TX_CNTL, TX_MEM_SIZE: 0, DUPLEX_MODE: full_duplex as u8);
    }

    /// Append a CRC to outbound frames
    pub fn set_crc(&self, crc: bool) {
        ral::modify_reg!(ral::eth, self.eth(), ETH_TX_CNTL, TX_MEM_SIZE: 0, CRC_ENABLE: crc as u8);
    }

    /// Pad short outbound frames to the minimum frame size
    pub fn set_padding(&self, pad: bool) {
        ral::modify_reg!(ral::eth, self.eth(), ETH_TX_CNTL, TX_MEM_SIZE: 0, PAD_ENABLE: pad as u8);
    }

    /// Enable or disable the receiver
    ///
    /// Disabling the receiver clears pending receive interrupts. Call this
    /// in a [`CriticalSection`](crate::CriticalSection) if the driver is
    /// running.
    pub fn set_receive_enabled(&self, enable: bool) {
        let eth = self.eth();
        if !enable {
            let rx = Interrupts::RX_FRAME | Interrupts::FIFO_OVERFLOW | Interrupts::RX_ERROR;
            ral::write_reg!(ral::eth, eth, ETH_INT_STATUS, rx.bits());
        }
        ral::modify_reg!(ral::eth, eth, ETH_RX_CNTL, RX_MEM_SIZE: 0, RX_ENABLE: enable as u8);
    }

    /// Indicates if the receiver is enabled
    pub fn is_receive_enabled(&self) -> bool {
        ral::read_reg!(ral::eth, self.eth(), ETH_RX_CNTL, RX_ENABLE) != 0
    }

    /// Enable or disable the transmitter
    ///
    /// Disabling the transmitter clears pending transmit interrupts. Call
    /// this in a [`CriticalSection`](crate::CriticalSection) if the driver
    /// is running.
    pub fn set_transmit_enabled(&self, enable: bool) {
        let eth = self.eth();
        if !enable {
            let tx = Interrupts::TX_ERROR | Interrupts::TX_EMPTY;
            ral::write_reg!(ral::eth, eth, ETH_INT_STATUS, tx.bits());
        }
        ral::modify_reg!(ral::eth, eth, ETH_TX_CNTL, TX_MEM_SIZE: 0, TX_ENABLE: enable as u8);
    }

    /// Number of FIFO words that follow the head word of the current frame
    fn remaining_words(&self) -> usize {
        let length = (self.head.load(Ordering::Relaxed) & RX_LENGTH_MASK) as usize;
        length.saturating_sub(1) / 4
    }
}

impl<P: Peripherals> Mac for Ft900<P> {
    const TRANSFER_WIDTH: usize = 4;

    fn interrupt_status(&self) -> Interrupts {
        Interrupts::from_bits_truncate(ral::read_reg!(ral::eth, self.eth(), ETH_INT_STATUS))
    }
    fn interrupt_enable(&self) -> Interrupts {
        Interrupts::from_bits_truncate(ral::read_reg!(ral::eth, self.eth(), ETH_INT_ENABLE))
    }
    fn set_interrupt_enable(&self, enable: Interrupts) {
        ral::write_reg!(ral::eth, self.eth(), ETH_INT_ENABLE, enable.bits());
    }
    fn acknowledge(&self, serviced: Interrupts) {
        ral::write_reg!(ral::eth, self.eth(), ETH_INT_STATUS, serviced.bits());
    }

    fn pending_frames(&self) -> usize {
        ral::read_reg!(ral::eth, self.eth(), ETH_NUM_PKT) as usize
    }

    fn read_descriptor(&self) -> u32 {
        let head = ral::read_reg!(ral::eth, self.eth(), ETH_DATA);
        self.head.store(head, Ordering::Relaxed);
        let length = (head & RX_LENGTH_MASK) as usize;
        // Anything shorter than the length field and the CRC reads as zero,
        // which the capture path discards.
        length.saturating_sub(LENGTH_FIELD + CRC) as u32
    }

    fn copy_from_hw(&self, dst: &mut [u8]) {
        let head = self.head.load(Ordering::Relaxed);
        let frame_len = ((head & RX_LENGTH_MASK) as usize)
            .saturating_sub(LENGTH_FIELD + CRC)
            .min(dst.len());

        // The head word carries the first two frame bytes.
        let mut offset = 0;
        for &byte in &head.to_le_bytes()[LENGTH_FIELD..] {
            if offset < frame_len {
                dst[offset] = byte;
            }
            offset += 1;
        }

        for _ in 0..self.remaining_words() {
            let word = ral::read_reg!(ral::eth, self.eth(), ETH_DATA).to_le_bytes();
            let end = frame_len.min(offset + word.len());
            if offset < end {
                dst[offset..end].copy_from_slice(&word[..end - offset]);
            }
            offset += word.len();
        }

        dst[frame_len..].fill(0);
    }

    fn discard_frame(&self) {
        for _ in 0..self.remaining_words() {
            ral::read_reg!(ral::eth, self.eth(), ETH_DATA);
        }
    }

    fn is_transmit_enabled(&self) -> bool {
        ral::read_reg!(ral::eth, self.eth(), ETH_TX_CNTL, TX_ENABLE) != 0
    }

    fn copy_to_hw(&self, src: &[u8]) {
        let eth = self.eth();
        for word in src.chunks_exact(4) {
            let mut bytes = [0; 4];
            bytes.copy_from_slice(word);
            ral::write_reg!(ral::eth, eth, ETH_DATA, u32::from_le_bytes(bytes));
        }
    }

    fn start_transmit(&self) {
        ral::write_reg!(ral::eth, self.eth(), ETH_TR_REQ, NEXTX: 1);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{length_prefix, Ft900};
    use crate::{ral, Interrupts, Mac, Peripherals};
    use std::boxed::Box;

    struct Registers(&'static ral::eth::RegisterBlock);

    unsafe impl Peripherals for Registers {
        fn eth(&self) -> *const () {
            self.0 as *const _ as _
        }
    }

    fn mac() -> (Ft900<Registers>, &'static ral::eth::RegisterBlock) {
        let regs: &'static ral::eth::RegisterBlock =
            Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        (Ft900::new(Registers(regs)), regs)
    }

    #[test]
    fn initialize() {
        let (mac, regs) = mac();
        regs.ETH_RX_CNTL.write(0xFF);
        regs.ETH_TX_CNTL.write(0xFF);
        regs.ETH_INT_ENABLE.write(0xFF);

        mac.initialize([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(regs.ETH_INT_ENABLE.read(), 0);
        assert_eq!(regs.ETH_RX_CNTL.read(), 0b1_1000);
        assert_eq!(regs.ETH_TX_CNTL.read(), 0b1_0110);
        assert_eq!(mac.mac_address(), [0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert!(!mac.is_receive_enabled());
        assert!(!mac.is_transmit_enabled());
    }

    #[test]
    fn receive_and_transmit_enable() {
        let (mac, regs) = mac();
        mac.set_receive_enabled(true);
        mac.set_transmit_enabled(true);
        assert!(mac.is_receive_enabled());
        assert!(mac.is_transmit_enabled());

        mac.set_promiscuous(true);
        mac.accept_multicast(true);
        assert_eq!(regs.ETH_RX_CNTL.read(), 0b0111);

        regs.ETH_RX_CNTL.write(regs.ETH_RX_CNTL.read() | 0b1100_0000);
        mac.set_receive_enabled(false);
        assert_eq!(regs.ETH_RX_CNTL.read(), 0b0110);
        assert_eq!(regs.ETH_INT_STATUS.read(), 0b1_1001);

        mac.set_transmit_enabled(false);
        assert_eq!(regs.ETH_INT_STATUS.read(), 0b0110);
        assert!(!mac.is_transmit_enabled());
    }

    #[test]
    fn interrupts() {
        let (mac, regs) = mac();
        mac.enable_interrupts(Interrupts::BRIDGE);
        assert_eq!(regs.ETH_INT_ENABLE.read(), 0b1_1111);
        assert_eq!(mac.interrupt_enable(), Interrupts::BRIDGE);

        regs.ETH_INT_STATUS.write(0b10_0101);
        assert_eq!(
            mac.interrupt_status(),
            Interrupts::RX_FRAME | Interrupts::TX_EMPTY | Interrupts::MII_DONE
        );
        mac.acknowledge(Interrupts::RX_FRAME);
        assert_eq!(regs.ETH_INT_STATUS.read(), 1);

        mac.set_interrupt_enable(Interrupts::TX_EMPTY);
        assert_eq!(regs.ETH_INT_ENABLE.read(), 0b100);
    }

    #[test]
    fn descriptor_strips_length_and_crc() {
        let (mac, regs) = mac();
        regs.ETH_NUM_PKT.write(3);
        assert_eq!(mac.pending_frames(), 3);

        // 60 byte frame, 4 byte CRC, 2 byte length
        regs.ETH_DATA.write(0xBBAA_0000 | 66);
        assert_eq!(mac.read_descriptor(), 60);
        // Upper bits beyond the 11-bit length are ignored.
        regs.ETH_DATA.write(0xBBAA_F800 | 66);
        assert_eq!(mac.read_descriptor(), 60);
        regs.ETH_DATA.write(5);
        assert_eq!(mac.read_descriptor(), 0);
    }

    #[test]
    fn copy_from_hw_carries_head_bytes() {
        let (mac, regs) = mac();
        // 8 byte frame; the FIFO holds (14 - 1) & !3 = 12 more bytes.
        let head = 0x2211_0000 | 14;
        regs.ETH_DATA.write(head);
        assert_eq!(mac.read_descriptor(), 8);

        let mut dst = [0xEE; 8];
        mac.copy_from_hw(&mut dst);
        // The register keeps returning the head word.
        assert_eq!(dst, [0x11, 0x22, 14, 0, 0x11, 0x22, 14, 0]);
    }

    #[test]
    fn copy_from_hw_zero_pads() {
        let (mac, regs) = mac();
        // 7 byte frame
        regs.ETH_DATA.write(0x2211_0000 | 13);
        assert_eq!(mac.read_descriptor(), 7);

        let mut dst = [0xEE; 8];
        mac.copy_from_hw(&mut dst);
        assert_eq!(dst, [0x11, 0x22, 13, 0, 0x11, 0x22, 13, 0]);
    }

    #[test]
    fn transmit_streams_words() {
        let (mac, regs) = mac();
        mac.copy_to_hw(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(regs.ETH_DATA.read(), 0x0807_0605);
        mac.start_transmit();
        assert_eq!(regs.ETH_TR_REQ.read(), 1);
    }

    #[test]
    fn length_prefix_is_aligned_payload_length() {
        assert_eq!(length_prefix(60), [48, 0]);
        assert_eq!(length_prefix(61), [48, 0]);
        assert_eq!(length_prefix(63), [52, 0]);
        assert_eq!(length_prefix(1514), [0xDC, 0x05]);
        assert_eq!(length_prefix(10), [0, 0]);
    }
}

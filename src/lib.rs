//! An interrupt-driven Ethernet frame bridge for FT9xx MACs
//!
//! `ft9xx-eth` moves Ethernet frames between a MAC's hardware FIFOs and
//! upper layers, like a TCP/IP stack's network interface or a USB RNDIS
//! bridge.
//!
//! - The MAC's interrupt handler captures received frames into a fixed
//!   arena in RAM. See [`Capture`].
//! - A polled loop drains that arena, oldest frame first, into a
//!   [`FrameSink`]. See [`Drain`].
//! - Outbound frames, described by a chain of segments, are coalesced into
//!   transfer-width writes. See [`Transmit`].
//!
//! All three handles come from one [`DriverState`]. The core is generic
//! over the [`Mac`] trait; [`Ft900`] implements it for the FT900 MAC. To
//! use the FT900 MAC, you must define a safe implementation of
//! [`Peripherals`].
//!
//! The drain and transmit handles mask the MAC's interrupt line through an
//! [`InterruptLine`]. [`Nvic`] covers Cortex-M parts. The FT900's FT32 core
//! has no NVIC, so FT900 users implement `InterruptLine` over the FT32
//! interrupt controller, as in the example.
//!
//! # Example
//!
//! ```ignore
//! use ft9xx_eth::{Config, DriverState, Ft900, FrameMemory, InterruptLine, Interrupts};
//!
//! /// The Ethernet line of the FT32 interrupt controller
//! struct EthLine;
//!
//! impl InterruptLine for EthLine {
//!     fn mask(&self) -> bool {
//!         interrupt_disable(IRQ_ETH)
//!     }
//!     fn unmask(&self) {
//!         interrupt_enable(IRQ_ETH);
//!     }
//! }
//!
//! static STATE: DriverState = DriverState::new();
//! static RX: FrameMemory<4096> = FrameMemory::new();
//! static TX: FrameMemory<1536> = FrameMemory::new();
//!
//! let mac = Ft900::new(peripherals);
//! mac.initialize(MAC_ADDRESS);
//! mac.enable_interrupts(Interrupts::BRIDGE);
//! mac.set_receive_enabled(true);
//! mac.set_transmit_enabled(true);
//!
//! let line = EthLine;
//! let mut parts = STATE.split(&mac, &line, &RX, &TX, Config::default()).unwrap();
//! // Move parts.capture into the interrupt handler...
//!
//! loop {
//!     parts.drain.poll(&mut |frame: &[u8]| netif_input(frame));
//! }
//! ```

#![no_std]

#[cfg(feature = "defmt-03")]
extern crate defmt_03 as defmt;

#[macro_use]
mod log;

mod arena;
mod capture;
mod drain;
mod interrupt;
mod mac;
mod memory;
mod state;
mod stats;
mod transmit;

pub mod ft900;
pub mod ral;

#[cfg(test)]
mod sim;

pub use arena::{FrameArena, SENTINEL};
pub use capture::Capture;
pub use drain::{Drain, FrameSink};
pub use ft900::Ft900;
pub use interrupt::{CriticalSection, InterruptLine, Nvic};
pub use mac::{Interrupts, Mac};
pub use memory::FrameMemory;
pub use state::{Config, DriverState, Error, Parts, DEFAULT_MAX_FRAME_SIZE};
pub use stats::{Snapshot, Statistics};
pub use transmit::{Transmit, TxError, TxStatus};

/// A type that owns the Ethernet MAC registers
///
/// # Safety
///
/// `Peripherals` should only be implemented on a type that owns the
/// Ethernet MAC register block. The pointer returned by `eth` is assumed
/// to be valid, and will be cast to a register definition.
///
/// # Example
///
/// A safe implementation of `Peripherals` for the FT900, which owns the
/// MAC registers at a fixed address.
///
/// ```
/// use ft9xx_eth::{ft900, Peripherals};
///
/// struct Eth {
///     // Private; only one instance exists.
///     _private: (),
/// }
///
/// unsafe impl Peripherals for Eth {
///     fn eth(&self) -> *const () {
///         ft900::ETH_ADDRESS
///     }
/// }
/// ```
pub unsafe trait Peripherals {
    /// Returns the address of the Ethernet MAC registers
    fn eth(&self) -> *const ();
}

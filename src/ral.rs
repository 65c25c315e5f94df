//! FT900 Ethernet MAC registers
//!
//! A RAL-compatible definition of the MAC register block. Use it with the
//! `ral-registers` macros:
//!
//! ```ignore
//! ral::modify_reg!(ral::eth, regs, ETH_RX_CNTL, PRMS_MODE: 1);
//! ```

pub use ral_registers::{modify_reg, read_reg, write_reg, RWRegister};

#[allow(non_snake_case, non_upper_case_globals)]
pub mod eth {
    use super::RWRegister;

    /// The FT900 Ethernet MAC register block
    #[repr(C)]
    pub struct RegisterBlock {
        /// Interrupt status; write one to clear
        pub ETH_INT_STATUS: RWRegister<u8>,
        /// Interrupt enable
        pub ETH_INT_ENABLE: RWRegister<u8>,
        /// Receive control
        pub ETH_RX_CNTL: RWRegister<u8>,
        /// Transmit control
        pub ETH_TX_CNTL: RWRegister<u8>,
        /// Receive / transmit FIFO
        pub ETH_DATA: RWRegister<u32>,
        /// Station address
        pub ETH_ADDR: [RWRegister<u8>; 6],
        pub ETH_THRESHOLD: RWRegister<u8>,
        pub ETH_MNG_CNTL: RWRegister<u8>,
        pub ETH_MNG_DIV: RWRegister<u8>,
        pub ETH_MNG_ADDR: RWRegister<u8>,
        pub ETH_MNG_TX0: RWRegister<u16>,
        pub ETH_MNG_RX0: RWRegister<u16>,
        /// Number of frames in the receive FIFO
        pub ETH_NUM_PKT: RWRegister<u8>,
        /// Transmit request
        pub ETH_TR_REQ: RWRegister<u8>,
    }

    const _: [(); 1] = [(); (core::mem::size_of::<RegisterBlock>() == 24) as usize];

    macro_rules! field {
        ($name:ident, $offset:expr, $mask:expr) => {
            pub mod $name {
                pub const offset: u8 = $offset;
                pub const mask: u8 = $mask << offset;
                pub mod RW {}
                pub mod R {}
                pub mod W {}
            }
        };
    }

    pub mod ETH_INT_STATUS {
        field!(RX_INT, 0, 1);
        field!(TX_ERR, 1, 1);
        field!(TX_EMPTY, 2, 1);
        field!(FIFO_OV, 3, 1);
        field!(RX_ERR, 4, 1);
        field!(MD_INT, 5, 1);
    }

    pub mod ETH_INT_ENABLE {
        pub use super::ETH_INT_STATUS::*;
    }

    pub mod ETH_RX_CNTL {
        field!(RX_ENABLE, 0, 1);
        field!(ACC_MULTI, 1, 1);
        field!(PRMS_MODE, 2, 1);
        field!(BAD_CRC, 3, 1);
        field!(RESET_FIFO, 4, 1);
        field!(RX_MEM_SIZE, 6, 0b11);
    }

    pub mod ETH_TX_CNTL {
        field!(TX_ENABLE, 0, 1);
        field!(PAD_ENABLE, 1, 1);
        field!(CRC_ENABLE, 2, 1);
        field!(DUPLEX_MODE, 4, 1);
        field!(TX_MEM_SIZE, 6, 0b11);
    }

    pub mod ETH_TR_REQ {
        field!(NEXTX, 0, 1);
    }

    pub mod ETH_DATA {}
    pub mod ETH_NUM_PKT {}
}

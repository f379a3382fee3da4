//! C8/C9: byte-stuffing dialects and STX/ETX framing with CRC-16/CCITT.

pub mod crc;
pub mod deframer;
pub mod framer;
pub mod stuffing;

pub use crc::Crc16Ccitt;
pub use deframer::{FrameEvent, StxEtxDeframer};
pub use framer::StxEtxFramer;
pub use stuffing::{Dialect, Stuffer, Unstuffer};

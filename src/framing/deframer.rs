//! C9 (decode side): recovers framed messages from a raw byte stream
//! delimited by `STX`/`ETX`, verifying the trailing CRC-16/CCITT.
//!
//! The unstuffed payload is buffered two bytes behind the unstuffer's
//! output: once the rolling history is full, the oldest byte is handed to
//! the caller as a payload byte and folded into the running CRC, while the
//! newest byte takes its place. This way the final two unstuffed bytes —
//! the CRC itself — are never emitted as payload, without the deframer
//! needing to know in advance how long the frame is.

use crate::error::RuntimeError;

use super::crc::Crc16Ccitt;
use super::stuffing::{Dialect, Unstuffer};

const STX: u8 = 0x02;
const ETX: u8 = 0x03;

/// One decoded event from `StxEtxDeframer::push`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// A payload byte, in order.
    Payload(u8),
    /// The frame just completed with a verified CRC. `consumed` is the
    /// number of input bytes fed since the previous `Complete`/`Error`
    /// (or since construction), including the framing bytes themselves.
    Complete { consumed: usize },
    /// The frame was malformed; no more `Payload` events belong to it.
    Error(RuntimeError),
}

/// Streaming STX/ETX decoder. Feed it raw wire bytes one at a time (or in
/// bulk via `push_all`); it reports payload bytes and frame boundaries
/// through the callback passed to `push`/`push_all`.
pub struct StxEtxDeframer {
    unstuffer: Unstuffer,
    crc: Crc16Ccitt,
    history: [u8; 2],
    history_len: u8,
    stx_found: bool,
    consumed: usize,
}

impl StxEtxDeframer {
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            unstuffer: Unstuffer::new(dialect),
            crc: Crc16Ccitt::new(),
            history: [0; 2],
            history_len: 0,
            stx_found: false,
            consumed: 0,
        }
    }

    fn reset_frame_state(&mut self) {
        self.crc = Crc16Ccitt::new();
        self.history_len = 0;
        self.unstuffer.reset();
    }

    /// Feeds the unstuffer's output into the 2-byte rolling history,
    /// releasing the oldest byte as a payload byte once the history is
    /// full.
    fn push_unstuffed(&mut self, byte: u8, emit: &mut impl FnMut(FrameEvent)) {
        if self.history_len == 2 {
            let oldest = self.history[0];
            self.history[0] = self.history[1];
            self.history[1] = byte;
            self.crc.update(oldest);
            emit(FrameEvent::Payload(oldest));
        } else {
            self.history[self.history_len as usize] = byte;
            self.history_len += 1;
        }
    }

    pub fn push(&mut self, byte: u8, mut emit: impl FnMut(FrameEvent)) {
        self.consumed += 1;

        if !self.stx_found {
            if byte == STX {
                self.stx_found = true;
                self.reset_frame_state();
            }
            return;
        }

        if byte == ETX {
            self.stx_found = false;
            if self.unstuffer.needs_more_data() {
                crate::rt_warn!("frame ended mid escape sequence");
                emit(FrameEvent::Error(RuntimeError::FrameBadByteStuffing));
            } else if self.history_len != 2 {
                crate::rt_warn!("frame shorter than the trailing crc");
                emit(FrameEvent::Error(RuntimeError::FrameBadFraming));
            } else {
                let crc = self.crc.checksum();
                let lsb = (crc & 0x00FF) as u8;
                let msb = (crc >> 8) as u8;
                if lsb != self.history[0] || msb != self.history[1] {
                    crate::rt_warn!("frame crc mismatch", crc);
                    emit(FrameEvent::Error(RuntimeError::FrameBadCrc));
                } else {
                    let consumed = self.consumed;
                    self.consumed = 0;
                    emit(FrameEvent::Complete { consumed });
                }
            }
            return;
        }

        if byte == STX {
            crate::rt_warn!("unexpected stx mid frame, resynchronizing");
            emit(FrameEvent::Error(RuntimeError::FrameBadFraming));
            self.stx_found = true;
            self.reset_frame_state();
            return;
        }

        if let Some(unstuffed) = self.unstuffer.feed(byte) {
            self.push_unstuffed(unstuffed, &mut emit);
        }
    }

    pub fn push_all(&mut self, bytes: &[u8], mut emit: impl FnMut(FrameEvent)) {
        for &byte in bytes {
            self.push(byte, &mut emit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::framer::StxEtxFramer;
    use alloc::vec::Vec;

    fn frame(dialect: Dialect, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut framer = StxEtxFramer::new(dialect, |b| out.push(b));
            framer.push_all(payload);
        }
        out
    }

    #[test]
    fn round_trips_a_payload_with_reserved_bytes() {
        let payload = [0x02, 0x03, 0x04, 0xAA, 0x00];
        let wire = frame(Dialect::Default, &payload);

        let mut deframer = StxEtxDeframer::new(Dialect::Default);
        let mut decoded = Vec::new();
        let mut completed = false;
        deframer.push_all(&wire, |event| match event {
            FrameEvent::Payload(b) => decoded.push(b),
            FrameEvent::Complete { .. } => completed = true,
            FrameEvent::Error(_) => panic!("unexpected decode error"),
        });

        assert!(completed);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn corrupted_crc_is_reported() {
        let payload = [0x10, 0x20];
        let mut wire = frame(Dialect::Default, &payload);
        let last = wire.len() - 2;
        wire[last] ^= 0xFF;

        let mut deframer = StxEtxDeframer::new(Dialect::Default);
        let mut saw_bad_crc = false;
        deframer.push_all(&wire, |event| {
            if let FrameEvent::Error(RuntimeError::FrameBadCrc) = event {
                saw_bad_crc = true;
            }
        });
        assert!(saw_bad_crc);
    }

    #[test]
    fn unexpected_stx_mid_frame_reports_bad_framing_and_resyncs() {
        let mut deframer = StxEtxDeframer::new(Dialect::Default);
        let mut errors = Vec::new();
        deframer.push_all(&[0x02, 0x10, 0x02], |event| {
            if let FrameEvent::Error(e) = event {
                errors.push(e);
            }
        });
        assert_eq!(errors, vec![RuntimeError::FrameBadFraming]);
    }

    #[test]
    fn legacy_dialect_round_trips() {
        let payload = [0x00, 0x10, 0x11, 0x02, 0x03];
        let wire = frame(Dialect::Legacy, &payload);

        let mut deframer = StxEtxDeframer::new(Dialect::Legacy);
        let mut decoded = Vec::new();
        deframer.push_all(&wire, |event| {
            if let FrameEvent::Payload(b) = event {
                decoded.push(b);
            }
        });
        assert_eq!(decoded, payload);
    }
}

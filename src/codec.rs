use std::{cell::RefCell, rc::Rc};

use ntex_bytes::BytesMut;
use ntex_codec::{Decoder, Encoder};

use crate::frame::{self, Frame, FrameError, FrameSize, Head, HEADER_LEN};
use crate::hpack;

/// A sans-io HTTP/2 frame codec.
///
/// One `Codec` serves one connection: it owns the HPACK table for each
/// direction and the negotiated frame-size limits. Decoding pulls complete
/// frames out of a receive buffer; encoding serializes typed frames into a
/// send buffer. The transport and the stream state machine live elsewhere.
#[derive(Clone, Debug)]
pub struct Codec(Rc<RefCell<CodecInner>>);

#[derive(Debug)]
struct CodecInner {
    // encoder state
    send_table: hpack::Table,
    send_max_frame_size: FrameSize,

    // decoder state
    recv_table: hpack::Table,
    recv_max_frame_size: FrameSize,
    state: DecodeState,
}

#[derive(Debug, Copy, Clone)]
enum DecodeState {
    Head,
    Payload(Head),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncoderError {
    #[error("Max size exceeded")]
    MaxSizeExceeded,
}

impl Default for Codec {
    #[inline]
    /// Returns a new `Codec` with the default max frame size
    fn default() -> Self {
        Codec(Rc::new(RefCell::new(CodecInner {
            send_table: hpack::Table::new(),
            send_max_frame_size: frame::DEFAULT_MAX_FRAME_SIZE,

            recv_table: hpack::Table::new(),
            recv_max_frame_size: frame::DEFAULT_MAX_FRAME_SIZE,
            state: DecodeState::Head,
        })))
    }
}

impl Codec {
    /// Updates the max received frame size.
    ///
    /// The change takes effect the next time a frame is decoded. In other
    /// words, if a frame is currently in process of being decoded with a frame
    /// size greater than `val` but less than the max frame size in effect
    /// before calling this function, then the frame will be allowed.
    #[inline]
    pub fn set_recv_frame_size(&self, val: usize) {
        assert!(
            frame::DEFAULT_MAX_FRAME_SIZE as usize <= val
                && val <= frame::MAX_MAX_FRAME_SIZE as usize
        );
        self.0.borrow_mut().recv_max_frame_size = val as FrameSize;
    }

    /// Local max frame size.
    pub fn recv_frame_size(&self) -> u32 {
        self.0.borrow().recv_max_frame_size
    }

    /// Set the peer's max frame size.
    pub fn set_send_frame_size(&self, val: usize) {
        assert!(val <= frame::MAX_MAX_FRAME_SIZE as usize);
        self.0.borrow_mut().send_max_frame_size = val as FrameSize;
    }

    /// Remote max frame size.
    pub fn send_frame_size(&self) -> u32 {
        self.0.borrow().send_max_frame_size
    }

    /// Set the header table capacity used when compressing outgoing header
    /// blocks.
    pub fn set_send_header_table_size(&self, val: usize) {
        self.0.borrow_mut().send_table.set_capacity(val);
    }

    /// Set the header table capacity used when decompressing incoming header
    /// blocks.
    pub fn set_recv_header_table_size(&self, val: usize) {
        self.0.borrow_mut().recv_table.set_capacity(val);
    }
}

impl Decoder for Codec {
    type Item = Frame;
    type Error = FrameError;

    /// Decodes a frame.
    ///
    /// Returns `None` until a full frame (header plus announced payload) is
    /// buffered. An `UnknownKind` error leaves the codec in a clean state:
    /// the offending frame has been consumed and decoding may continue.
    fn decode(&self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let mut inner = self.0.borrow_mut();

        let head = match inner.state {
            DecodeState::Head => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let head = Head::parse(src)?;
                if head.length() > inner.recv_max_frame_size {
                    proto_err!(conn: "frame size {} over max {}", head.length(), inner.recv_max_frame_size);
                    return Err(FrameError::MaxFrameSize);
                }

                let _ = src.split_to(HEADER_LEN);

                // Ensure the buffer has room for the announced payload
                src.reserve(head.length() as usize);
                inner.state = DecodeState::Payload(head);
                head
            }
            DecodeState::Payload(head) => head,
        };

        if src.len() < head.length() as usize {
            return Ok(None);
        }

        let payload = src.split_to(head.length() as usize);
        inner.state = DecodeState::Head;

        log::trace!("decoding {:?} frame, payload len {}", head.kind(), payload.len());

        let CodecInner {
            ref mut recv_table, ..
        } = *inner;

        Frame::load(head, payload, recv_table)
            .map(Some)
            .map_err(|e| {
                if e.is_fatal() {
                    proto_err!(conn: "failed to load {} frame; err={:?}", head.kind(), e);
                }
                e
            })
    }
}

impl Encoder for Codec {
    type Item = Frame;
    type Error = EncoderError;

    fn encode(&self, item: Frame, dst: &mut BytesMut) -> Result<(), EncoderError> {
        let mut inner = self.0.borrow_mut();

        // Ensure that outgoing DATA payloads fit the peer's max frame size.
        // Header blocks are encoded as supplied; splitting an oversized block
        // into CONTINUATION frames is the caller's business.
        if let Frame::Data(ref v) = item {
            if v.payload().len() > inner.send_max_frame_size as usize {
                return Err(EncoderError::MaxSizeExceeded);
            }
        }

        let CodecInner {
            ref mut send_table, ..
        } = *inner;

        item.encode(send_table, dst);
        Ok(())
    }
}

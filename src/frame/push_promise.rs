use std::fmt;

use ntex_bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{util, Frame, FrameError, Head, Kind, StreamId};
use crate::hpack::{self, HeaderField};

/// Push promise frame
///
/// The PUSH_PROMISE frame is used to notify the peer endpoint in advance of
/// streams the sender intends to initiate. It carries the 31-bit identifier
/// of the promised stream together with a header block fragment.
#[derive(Clone)]
pub struct PushPromise {
    /// The ID of the stream this frame was sent on.
    stream_id: StreamId,

    /// The stream the sender promises to open.
    promised_id: StreamId,

    /// The decoded header fields
    fields: Vec<HeaderField>,

    /// The header block fragment as it appeared (or will appear) on the wire
    fragment: Bytes,

    pad_length: u8,

    flags: PushPromiseFlags,
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct PushPromiseFlags(u8);

const END_HEADERS: u8 = 0x4;
const PADDED: u8 = 0x8;
const ALL: u8 = END_HEADERS | PADDED;

impl PushPromise {
    /// Creates a new PUSH_PROMISE frame carrying a header list.
    ///
    /// The promised stream must be a non-zero, server-initiated stream.
    pub fn new(stream_id: StreamId, promised_id: StreamId, fields: Vec<HeaderField>) -> Self {
        assert!(!stream_id.is_zero());
        assert!(promised_id.is_server_initiated());

        PushPromise {
            stream_id,
            promised_id,
            fields,
            fragment: Bytes::new(),
            pad_length: 0,
            flags: PushPromiseFlags::default(),
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn promised_id(&self) -> StreamId {
        self.promised_id
    }

    pub fn is_end_headers(&self) -> bool {
        self.flags.is_end_headers()
    }

    pub fn set_end_headers(&mut self) {
        self.flags.set_end_headers();
    }

    pub fn clear_end_headers(&mut self) {
        self.flags.clear_end_headers();
    }

    pub fn is_padded(&self) -> bool {
        self.flags.is_padded()
    }

    pub fn pad_length(&self) -> u8 {
        self.pad_length
    }

    /// Pads the frame with `pad_length` fill octets and sets the `PADDED`
    /// flag.
    pub fn set_pad_length(&mut self, pad_length: u8) {
        self.pad_length = pad_length;
        self.flags.set_padded();
    }

    pub fn clear_padded(&mut self) {
        self.pad_length = 0;
        self.flags.clear_padded();
    }

    /// The decoded header list.
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<HeaderField> {
        self.fields
    }

    /// The raw header block fragment.
    pub fn fragment(&self) -> &Bytes {
        &self.fragment
    }

    pub(crate) fn load(head: Head, src: &mut BytesMut) -> Result<Self, FrameError> {
        let flags = PushPromiseFlags::load(head.flag());

        if head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        let pad = if flags.is_padded() {
            if src.is_empty() {
                return Err(FrameError::TooMuchPadding);
            }
            let pad = src[0] as usize;
            let _ = src.split_to(1);
            pad
        } else {
            0
        };

        if src.len() < 4 {
            return Err(FrameError::InvalidPayloadLength);
        }

        // The reserved bit ahead of the promised stream ID is dropped on read
        let (promised_id, _) = StreamId::parse(&src[..4]);
        let _ = src.split_to(4);

        // PUSH_PROMISE frames MUST reference a stream the sender is allowed
        // to open: an even-numbered, non-zero identifier.
        if !promised_id.is_server_initiated() {
            return Err(FrameError::InvalidPromisedStreamId);
        }

        if pad > 0 {
            if pad > src.len() {
                return Err(FrameError::TooMuchPadding);
            }
            src.truncate(src.len() - pad);
        }

        Ok(PushPromise {
            flags,
            promised_id,
            stream_id: head.stream_id(),
            fields: Vec::new(),
            fragment: src.split().freeze(),
            pad_length: pad as u8,
        })
    }

    /// Decode the retained header block fragment against `table`.
    pub fn load_hpack(&mut self, table: &mut hpack::Table) -> Result<(), FrameError> {
        self.fields = table.decode(&self.fragment)?;
        Ok(())
    }

    pub fn encode(self, table: &mut hpack::Table, dst: &mut BytesMut) {
        let fragment = if self.fields.is_empty() {
            self.fragment.clone()
        } else {
            table.encode(&self.fields)
        };

        let mut payload_len = 4 + fragment.len();
        if self.flags.is_padded() {
            payload_len += 1 + self.pad_length as usize;
        }

        let promised_id: u32 = self.promised_id.into();

        self.head().encode(payload_len, dst);
        if self.flags.is_padded() {
            dst.put_u8(self.pad_length);
        }
        dst.put_u32(promised_id);
        dst.extend_from_slice(&fragment);
        if self.flags.is_padded() {
            dst.extend_from_slice(&[0u8; 255][..self.pad_length as usize]);
        }
    }

    fn head(&self) -> Head {
        Head::new(Kind::PushPromise, self.flags.into(), self.stream_id)
    }
}

/// Equality is over the semantic content: the decoded header list when
/// either side carries one, the raw fragment otherwise.
impl PartialEq for PushPromise {
    fn eq(&self, other: &PushPromise) -> bool {
        self.stream_id == other.stream_id
            && self.promised_id == other.promised_id
            && self.pad_length == other.pad_length
            && self.flags == other.flags
            && if self.fields.is_empty() && other.fields.is_empty() {
                self.fragment == other.fragment
            } else {
                self.fields == other.fields
            }
    }
}

impl Eq for PushPromise {}

impl From<PushPromise> for Frame {
    fn from(src: PushPromise) -> Self {
        Frame::PushPromise(src)
    }
}

impl fmt::Debug for PushPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushPromise")
            .field("stream_id", &self.stream_id)
            .field("promised_id", &self.promised_id)
            .field("flags", &self.flags)
            .field("fields", &self.fields.len())
            .finish()
    }
}

// ===== impl PushPromiseFlags =====

impl PushPromiseFlags {
    fn load(bits: u8) -> PushPromiseFlags {
        PushPromiseFlags(bits & ALL)
    }

    fn is_end_headers(&self) -> bool {
        self.0 & END_HEADERS == END_HEADERS
    }

    fn set_end_headers(&mut self) {
        self.0 |= END_HEADERS;
    }

    fn clear_end_headers(&mut self) {
        self.0 &= !END_HEADERS;
    }

    fn is_padded(&self) -> bool {
        self.0 & PADDED == PADDED
    }

    fn set_padded(&mut self) {
        self.0 |= PADDED;
    }

    fn clear_padded(&mut self) {
        self.0 &= !PADDED;
    }
}

impl Default for PushPromiseFlags {
    /// Returns a `PushPromiseFlags` value with `END_HEADERS` set.
    fn default() -> Self {
        PushPromiseFlags(END_HEADERS)
    }
}

impl From<PushPromiseFlags> for u8 {
    fn from(src: PushPromiseFlags) -> u8 {
        src.0
    }
}

impl fmt::Debug for PushPromiseFlags {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.is_end_headers(), "END_HEADERS")
            .flag_if(self.is_padded(), "PADDED")
            .finish()
    }
}

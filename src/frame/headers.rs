use std::fmt;

use ntex_bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{util, Frame, FrameError, Head, Kind, StreamDependency, StreamId};
use crate::hpack::{self, HeaderField};

/// Headers frame
///
/// The HEADERS frame is used to open a stream, and additionally carries a
/// header block fragment. The decoded header list and the raw fragment are
/// both kept on the record, so a frame can be re-serialized without paying
/// for another compression pass.
#[derive(Clone)]
pub struct Headers {
    /// The ID of the stream with which this frame is associated.
    stream_id: StreamId,

    /// The stream dependency, present when the PRIORITY flag is set.
    priority: Option<StreamDependency>,

    /// The decoded header fields
    fields: Vec<HeaderField>,

    /// The header block fragment as it appeared (or will appear) on the wire
    fragment: Bytes,

    pad_length: u8,

    /// The associated flags
    flags: HeadersFlag,
}

#[derive(Copy, Clone, Eq, PartialEq)]
pub struct HeadersFlag(u8);

const END_STREAM: u8 = 0x1;
const END_HEADERS: u8 = 0x4;
const PADDED: u8 = 0x8;
const PRIORITY: u8 = 0x20;
const ALL: u8 = END_STREAM | END_HEADERS | PADDED | PRIORITY;

// ===== impl Headers =====

impl Headers {
    /// Create a new HEADERS frame carrying a header list.
    ///
    /// The list is compressed against the connection's table when the frame
    /// is encoded.
    pub fn new(stream_id: StreamId, fields: Vec<HeaderField>) -> Self {
        assert!(!stream_id.is_zero());

        Headers {
            stream_id,
            fields,
            priority: None,
            fragment: Bytes::new(),
            pad_length: 0,
            flags: HeadersFlag::default(),
        }
    }

    /// Create a HEADERS frame from an already compressed header block
    /// fragment.
    ///
    /// The fragment is written to the wire untouched; no compression state
    /// is consulted.
    pub fn from_fragment(stream_id: StreamId, fragment: Bytes) -> Self {
        assert!(!stream_id.is_zero());

        Headers {
            stream_id,
            fragment,
            priority: None,
            fields: Vec::new(),
            pad_length: 0,
            flags: HeadersFlag::default(),
        }
    }

    /// Loads the header frame but doesn't actually do HPACK decoding.
    ///
    /// HPACK decoding is done in the `load_hpack` step.
    pub(crate) fn load(head: Head, src: &mut BytesMut) -> Result<Self, FrameError> {
        let flags = HeadersFlag::load(head.flag());
        log::trace!("loading headers; flags={:?}", flags);

        if head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        // Read the padding length
        let pad = if flags.is_padded() {
            if src.is_empty() {
                return Err(FrameError::TooMuchPadding);
            }
            let pad = src[0] as usize;

            // Drop the padding length octet
            let _ = src.split_to(1);
            pad
        } else {
            0
        };

        // Read the stream dependency
        let priority = if flags.is_priority() {
            if src.len() < 5 {
                return Err(FrameError::InvalidPayloadLength);
            }
            let dependency = StreamDependency::load(&src[..5])?;

            // A stream cannot depend on itself. An endpoint MUST treat this
            // as a stream error (Section 5.4.2) of type PROTOCOL_ERROR.
            if dependency.dependency_id() == head.stream_id() {
                return Err(FrameError::InvalidDependencyId);
            }

            let _ = src.split_to(5);
            Some(dependency)
        } else {
            None
        };

        if pad > 0 {
            if pad > src.len() {
                return Err(FrameError::TooMuchPadding);
            }
            src.truncate(src.len() - pad);
        }

        Ok(Headers {
            flags,
            priority,
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

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
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

    pub fn is_end_stream(&self) -> bool {
        self.flags.is_end_stream()
    }

    pub fn set_end_stream(&mut self) {
        self.flags.set_end_stream()
    }

    pub fn clear_end_stream(&mut self) {
        self.flags.clear_end_stream()
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

    /// The stream dependency, when the frame carries one.
    pub fn priority(&self) -> Option<&StreamDependency> {
        self.priority.as_ref()
    }

    /// Attach a stream dependency and set the `PRIORITY` flag.
    pub fn set_priority(&mut self, dependency: StreamDependency) {
        self.priority = Some(dependency);
        self.flags.set_priority();
    }

    pub fn clear_priority(&mut self) {
        self.priority = None;
        self.flags.clear_priority();
    }

    /// The decoded header list.
    ///
    /// Empty until `load_hpack` has run for frames received off the wire
    /// without END_HEADERS.
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

    pub fn encode(self, table: &mut hpack::Table, dst: &mut BytesMut) {
        let fragment = if self.fields.is_empty() {
            self.fragment.clone()
        } else {
            table.encode(&self.fields)
        };

        let mut payload_len = fragment.len();
        if self.flags.is_padded() {
            payload_len += 1 + self.pad_length as usize;
        }
        if self.priority.is_some() {
            payload_len += 5;
        }

        self.head().encode(payload_len, dst);

        if self.flags.is_padded() {
            dst.put_u8(self.pad_length);
        }
        if let Some(ref dependency) = self.priority {
            dependency.encode(dst);
        }
        dst.extend_from_slice(&fragment);
        if self.flags.is_padded() {
            dst.extend_from_slice(&[0u8; 255][..self.pad_length as usize]);
        }
    }

    fn head(&self) -> Head {
        Head::new(Kind::Headers, self.flags.into(), self.stream_id)
    }
}

/// Equality is over the semantic content: the decoded header list when
/// either side carries one, the raw fragment otherwise.
impl PartialEq for Headers {
    fn eq(&self, other: &Headers) -> bool {
        self.stream_id == other.stream_id
            && self.priority == other.priority
            && self.pad_length == other.pad_length
            && self.flags == other.flags
            && if self.fields.is_empty() && other.fields.is_empty() {
                self.fragment == other.fragment
            } else {
                self.fields == other.fields
            }
    }
}

impl Eq for Headers {}

impl From<Headers> for Frame {
    fn from(src: Headers) -> Self {
        Frame::Headers(src)
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("Headers");
        builder
            .field("stream_id", &self.stream_id)
            .field("flags", &self.flags)
            .field("fields", &self.fields.len());

        if let Some(ref priority) = self.priority {
            builder.field("priority", priority);
        }

        // fragment bytes purposefully not included
        builder.finish()
    }
}

// ===== impl HeadersFlag =====

impl HeadersFlag {
    pub fn load(bits: u8) -> HeadersFlag {
        HeadersFlag(bits & ALL)
    }

    pub fn is_end_stream(&self) -> bool {
        self.0 & END_STREAM == END_STREAM
    }

    pub fn set_end_stream(&mut self) {
        self.0 |= END_STREAM;
    }

    pub fn clear_end_stream(&mut self) {
        self.0 &= !END_STREAM;
    }

    pub fn is_end_headers(&self) -> bool {
        self.0 & END_HEADERS == END_HEADERS
    }

    pub fn set_end_headers(&mut self) {
        self.0 |= END_HEADERS;
    }

    pub fn clear_end_headers(&mut self) {
        self.0 &= !END_HEADERS;
    }

    pub fn is_padded(&self) -> bool {
        self.0 & PADDED == PADDED
    }

    pub fn set_padded(&mut self) {
        self.0 |= PADDED;
    }

    pub fn clear_padded(&mut self) {
        self.0 &= !PADDED;
    }

    pub fn is_priority(&self) -> bool {
        self.0 & PRIORITY == PRIORITY
    }

    pub fn set_priority(&mut self) {
        self.0 |= PRIORITY;
    }

    pub fn clear_priority(&mut self) {
        self.0 &= !PRIORITY;
    }
}

impl Default for HeadersFlag {
    /// Returns a `HeadersFlag` value with `END_HEADERS` set.
    fn default() -> Self {
        HeadersFlag(END_HEADERS)
    }
}

impl From<HeadersFlag> for u8 {
    fn from(src: HeadersFlag) -> u8 {
        src.0
    }
}

impl fmt::Debug for HeadersFlag {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.is_end_headers(), "END_HEADERS")
            .flag_if(self.is_end_stream(), "END_STREAM")
            .flag_if(self.is_padded(), "PADDED")
            .flag_if(self.is_priority(), "PRIORITY")
            .finish()
    }
}

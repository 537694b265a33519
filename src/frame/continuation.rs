use std::fmt;

use ntex_bytes::{Bytes, BytesMut};

use crate::frame::{util, Frame, FrameError, Head, Kind, StreamId};
use crate::hpack::{self, HeaderField};

/// Continuation frame
///
/// The CONTINUATION frame continues a sequence of header block fragments.
/// Sequencing relative to the preceding HEADERS or PUSH_PROMISE frame is the
/// stream layer's responsibility; the record carries the raw fragment and is
/// delivered as-is, so the caller can reassemble the logical header block and
/// decode it through the connection's table once complete.
#[derive(Clone)]
pub struct Continuation {
    stream_id: StreamId,

    /// The decoded header fields
    fields: Vec<HeaderField>,

    /// The header block fragment as it appeared (or will appear) on the wire
    fragment: Bytes,

    flags: ContinuationFlags,
}

#[derive(Default, Copy, Clone, Eq, PartialEq)]
struct ContinuationFlags(u8);

const END_HEADERS: u8 = 0x4;
const ALL: u8 = END_HEADERS;

impl Continuation {
    /// Creates a new CONTINUATION frame from a compressed fragment.
    pub fn new(stream_id: StreamId, fragment: Bytes) -> Self {
        assert!(!stream_id.is_zero());

        Continuation {
            stream_id,
            fragment,
            fields: Vec::new(),
            flags: ContinuationFlags::default(),
        }
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

    /// The decoded header list; empty until `load_hpack` has run.
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// The raw header block fragment.
    pub fn fragment(&self) -> &Bytes {
        &self.fragment
    }

    pub(crate) fn load(head: Head, fragment: Bytes) -> Result<Self, FrameError> {
        if head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        Ok(Continuation {
            fragment,
            stream_id: head.stream_id(),
            fields: Vec::new(),
            flags: ContinuationFlags::load(head.flag()),
        })
    }

    /// Decode the retained fragment against `table`.
    ///
    /// Only valid when the fragment is a complete header block on its own;
    /// fragments belonging to a longer block must be reassembled first.
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

        let head = Head::new(Kind::Continuation, self.flags.into(), self.stream_id);
        head.encode(fragment.len(), dst);
        dst.extend_from_slice(&fragment);
    }
}

/// Equality is over the semantic content: the decoded header list when
/// either side carries one, the raw fragment otherwise.
impl PartialEq for Continuation {
    fn eq(&self, other: &Continuation) -> bool {
        self.stream_id == other.stream_id
            && self.flags == other.flags
            && if self.fields.is_empty() && other.fields.is_empty() {
                self.fragment == other.fragment
            } else {
                self.fields == other.fields
            }
    }
}

impl Eq for Continuation {}

impl From<Continuation> for Frame {
    fn from(src: Continuation) -> Self {
        Frame::Continuation(src)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("stream_id", &self.stream_id)
            .field("flags", &self.flags)
            .field("fragment_len", &self.fragment.len())
            .finish()
    }
}

// ===== impl ContinuationFlags =====

impl ContinuationFlags {
    fn load(bits: u8) -> ContinuationFlags {
        ContinuationFlags(bits & ALL)
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
}

impl From<ContinuationFlags> for u8 {
    fn from(src: ContinuationFlags) -> u8 {
        src.0
    }
}

impl fmt::Debug for ContinuationFlags {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.is_end_headers(), "END_HEADERS")
            .finish()
    }
}

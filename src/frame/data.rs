use ntex_bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{util, Frame, FrameError, Head, Kind, StreamId};

/// Data frame
///
/// Data frames convey arbitrary, variable-length sequences of octets associated
/// with a stream. One or more DATA frames are used, for instance, to carry HTTP
/// request or response payloads.
#[derive(Clone, Eq, PartialEq)]
pub struct Data {
    stream_id: StreamId,
    data: Bytes,
    pad_length: u8,
    flags: DataFlags,
}

#[derive(Default, Copy, Clone, Eq, PartialEq)]
struct DataFlags(u8);

const END_STREAM: u8 = 0x1;
const PADDED: u8 = 0x8;
const ALL: u8 = END_STREAM | PADDED;

impl Data {
    /// Creates a new DATA frame.
    pub fn new(stream_id: StreamId, payload: Bytes) -> Self {
        assert!(!stream_id.is_zero());

        Data {
            stream_id,
            data: payload,
            pad_length: 0,
            flags: DataFlags::default(),
        }
    }

    /// Returns the stream identifier that this frame is associated with.
    ///
    /// This cannot be a zero stream identifier.
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Gets the value of the `END_STREAM` flag for this frame.
    ///
    /// If true, this frame is the last that the endpoint will send for the
    /// identified stream.
    pub fn is_end_stream(&self) -> bool {
        self.flags.is_end_stream()
    }

    /// Sets the value for the `END_STREAM` flag on this frame.
    pub fn set_end_stream(&mut self) {
        self.flags.set_end_stream();
    }

    /// Clears the `END_STREAM` flag on this frame.
    pub fn clear_end_stream(&mut self) {
        self.flags.clear_end_stream();
    }

    /// Returns whether the `PADDED` flag is set on this frame.
    pub fn is_padded(&self) -> bool {
        self.flags.is_padded()
    }

    /// The number of padding octets carried by this frame.
    ///
    /// Zero both for unpadded frames and for padded frames whose pad length
    /// octet is 0.
    pub fn pad_length(&self) -> u8 {
        self.pad_length
    }

    /// Pads the frame with `pad_length` fill octets and sets the `PADDED`
    /// flag.
    pub fn set_pad_length(&mut self, pad_length: u8) {
        self.pad_length = pad_length;
        self.flags.set_padded();
    }

    /// Clears the `PADDED` flag; the frame is encoded without padding.
    pub fn clear_padded(&mut self) {
        self.pad_length = 0;
        self.flags.clear_padded();
    }

    /// Returns a reference to this frame's payload.
    ///
    /// This does **not** include any padding that might have been originally
    /// included.
    pub fn payload(&self) -> &Bytes {
        &self.data
    }

    /// Consumes `self` and returns the frame's payload.
    pub fn into_payload(self) -> Bytes {
        self.data
    }

    pub(crate) fn head(&self) -> Head {
        Head::new(Kind::Data, self.flags.into(), self.stream_id)
    }

    pub(crate) fn load(head: Head, mut data: Bytes) -> Result<Self, FrameError> {
        let flags = DataFlags::load(head.flag());

        // The stream identifier must not be zero
        if head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        let pad_length = if flags.is_padded() {
            util::strip_padding(&mut data)?
        } else {
            0
        };

        Ok(Data {
            data,
            flags,
            pad_length,
            stream_id: head.stream_id(),
        })
    }

    /// Encode the data frame into the `dst` buffer.
    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        let mut len = self.data.len();
        if self.flags.is_padded() {
            len += 1 + self.pad_length as usize;
        }

        // Encode the frame head to the buffer
        self.head().encode(len, dst);

        // Encode payload; padding octets are zero fill
        if self.flags.is_padded() {
            dst.put_u8(self.pad_length);
        }
        dst.extend_from_slice(&self.data);
        if self.flags.is_padded() {
            dst.extend_from_slice(&[0u8; 255][..self.pad_length as usize]);
        }
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Self {
        Frame::Data(src)
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut f = fmt.debug_struct("Data");
        f.field("stream_id", &self.stream_id);
        f.field("data_len", &self.data.len());
        if !self.flags.is_empty() {
            f.field("flags", &self.flags);
        }
        // `data` bytes purposefully excluded
        f.finish()
    }
}

// ===== impl DataFlags =====

impl DataFlags {
    fn load(bits: u8) -> DataFlags {
        DataFlags(bits & ALL)
    }

    fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn is_end_stream(&self) -> bool {
        self.0 & END_STREAM == END_STREAM
    }

    fn set_end_stream(&mut self) {
        self.0 |= END_STREAM
    }

    fn clear_end_stream(&mut self) {
        self.0 &= !END_STREAM
    }

    fn is_padded(&self) -> bool {
        self.0 & PADDED == PADDED
    }

    fn set_padded(&mut self) {
        self.0 |= PADDED
    }

    fn clear_padded(&mut self) {
        self.0 &= !PADDED
    }
}

impl From<DataFlags> for u8 {
    fn from(src: DataFlags) -> u8 {
        src.0
    }
}

impl std::fmt::Debug for DataFlags {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.is_end_stream(), "END_STREAM")
            .flag_if(self.is_padded(), "PADDED")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_restore_after_set_and_clear() {
        let mut frame = Data::new(StreamId::from(1), Bytes::from_static(b"ok"));
        let original: u8 = frame.flags.into();

        frame.set_end_stream();
        assert!(frame.is_end_stream());
        frame.clear_end_stream();

        frame.set_pad_length(4);
        assert!(frame.is_padded());
        frame.clear_padded();

        let bits: u8 = frame.flags.into();
        assert_eq!(bits, original);
    }
}

use ntex_bytes::BufMut;

use crate::frame::{Frame, FrameError, Head, Kind, StreamId};

const EXCLUSIVE_MASK: u32 = 1 << 31;

/// Priority frame
///
/// The PRIORITY frame specifies the sender-advised priority of a stream. It
/// can be sent in any stream state, including idle or closed streams.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Priority {
    stream_id: StreamId,
    dependency: StreamDependency,
}

/// The stream dependency carried by a PRIORITY frame, or by a HEADERS frame
/// with the PRIORITY flag set: a 31-bit dependency stream, an exclusivity
/// bit, and a raw 8-bit weight (semantic weight is the raw value plus one).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StreamDependency {
    /// The ID of the stream dependency target
    dependency_id: StreamId,

    /// The weight for the stream. The value exposed (and set) here is always
    /// in the range [0, 255], instead of [1, 256] (as defined in section 5.3.2)
    /// so that the value fits into a `u8`.
    weight: u8,

    /// True if the stream dependency is exclusive.
    is_exclusive: bool,
}

impl Priority {
    pub fn new(stream_id: StreamId, dependency: StreamDependency) -> Self {
        Priority {
            stream_id,
            dependency,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn dependency(&self) -> &StreamDependency {
        &self.dependency
    }

    pub(crate) fn load(head: Head, payload: &[u8]) -> Result<Self, FrameError> {
        if head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        let dependency = StreamDependency::load(payload)?;

        // A stream cannot depend on itself. An endpoint MUST treat this as a
        // stream error (Section 5.4.2) of type PROTOCOL_ERROR.
        if dependency.dependency_id() == head.stream_id() {
            return Err(FrameError::InvalidDependencyId);
        }

        Ok(Priority {
            dependency,
            stream_id: head.stream_id(),
        })
    }

    pub(crate) fn encode<B: BufMut>(&self, dst: &mut B) {
        log::trace!("encoding PRIORITY; id={:?}", self.stream_id);
        let head = Head::new(Kind::Priority, 0, self.stream_id);
        head.encode(5, dst);
        self.dependency.encode(dst);
    }
}

impl From<Priority> for Frame {
    fn from(src: Priority) -> Self {
        Frame::Priority(src)
    }
}

// ===== impl StreamDependency =====

impl StreamDependency {
    pub fn new(dependency_id: StreamId, weight: u8, is_exclusive: bool) -> Self {
        StreamDependency {
            dependency_id,
            weight,
            is_exclusive,
        }
    }

    pub fn dependency_id(&self) -> StreamId {
        self.dependency_id
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }

    pub fn is_exclusive(&self) -> bool {
        self.is_exclusive
    }

    pub(crate) fn load(src: &[u8]) -> Result<Self, FrameError> {
        if src.len() != 5 {
            return Err(FrameError::InvalidPayloadLength);
        }

        // The most significant bit of the dependency stream is the
        // exclusivity flag.
        let (dependency_id, is_exclusive) = StreamId::parse(src);

        Ok(StreamDependency {
            dependency_id,
            is_exclusive,
            weight: src[4],
        })
    }

    pub(crate) fn encode<B: BufMut>(&self, dst: &mut B) {
        let dependency_id: u32 = self.dependency_id.into();

        dst.put_u32(if self.is_exclusive {
            dependency_id | EXCLUSIVE_MASK
        } else {
            dependency_id
        });
        dst.put_u8(self.weight);
    }
}

#[cfg(test)]
mod tests {
    use ntex_bytes::BytesMut;

    use super::*;

    #[test]
    fn dependency_round_trip() {
        let dep = StreamDependency::load(&[0x80, 0, 0, 0xb, 15]).unwrap();
        assert_eq!(dep.dependency_id(), 11);
        assert_eq!(dep.weight(), 15);
        assert!(dep.is_exclusive());

        let mut buf = BytesMut::new();
        dep.encode(&mut buf);
        assert_eq!(&buf[..], &[0x80, 0, 0, 0xb, 15]);
    }

    #[test]
    fn self_dependency_is_rejected() {
        let head = Head::new(Kind::Priority, 0, StreamId::from(3));
        assert_eq!(
            Priority::load(head, &[0, 0, 0, 3, 0]),
            Err(FrameError::InvalidDependencyId)
        );
    }
}

use ntex_bytes::BufMut;

use crate::frame::{self, FrameError, Head, Kind, StreamId, WindowSize};

const SIZE_INCREMENT_MASK: u32 = 1 << 31;

/// Window update frame
///
/// The WINDOW_UPDATE frame is used to implement flow control. It applies to
/// the connection when sent with stream identifier 0, to a single stream
/// otherwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowUpdate {
    stream_id: StreamId,
    size_increment: WindowSize,
}

impl WindowUpdate {
    pub fn new(stream_id: StreamId, size_increment: WindowSize) -> WindowUpdate {
        WindowUpdate {
            stream_id,
            size_increment,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn size_increment(&self) -> WindowSize {
        self.size_increment
    }

    /// Builds a `WindowUpdate` frame from a raw frame.
    pub(crate) fn load(head: Head, payload: &[u8]) -> Result<WindowUpdate, FrameError> {
        debug_assert_eq!(head.kind(), frame::Kind::WindowUpdate);
        if payload.len() != 4 {
            return Err(FrameError::BadFrameSize);
        }

        // Clear the most significant bit, as that is reserved and MUST be ignored
        // when received.
        let size_increment = unpack_octets_4!(payload, 0, u32) & !SIZE_INCREMENT_MASK;

        // A receiver MUST treat the receipt of a WINDOW_UPDATE frame with a
        // flow-control window increment of 0 as a stream error (Section
        // 5.4.2) of type PROTOCOL_ERROR.
        if size_increment == 0 {
            return Err(FrameError::InvalidWindowUpdateValue);
        }

        Ok(WindowUpdate {
            stream_id: head.stream_id(),
            size_increment,
        })
    }

    pub(crate) fn encode<B: BufMut>(&self, dst: &mut B) {
        log::trace!(
            "encoding WINDOW_UPDATE; id={:?}, inc={}",
            self.stream_id,
            self.size_increment
        );
        let head = Head::new(Kind::WindowUpdate, 0, self.stream_id);
        head.encode(4, dst);
        dst.put_u32(self.size_increment);
    }
}

impl From<WindowUpdate> for frame::Frame {
    fn from(src: WindowUpdate) -> Self {
        frame::Frame::WindowUpdate(src)
    }
}

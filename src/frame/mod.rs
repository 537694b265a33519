use std::fmt;

use ntex_bytes::BytesMut;

use crate::hpack;

/// A helper macro that unpacks a sequence of 4 bytes found in the buffer with
/// the given identifier, starting at the given offset, into the given integer
/// type. Obviously, the integer type should be able to support at least 4
/// bytes.
///
/// # Examples
///
/// ```ignore
/// # // We ignore this doctest because the macro is not exported.
/// let buf: [u8; 4] = [0, 0, 0, 1];
/// assert_eq!(1u32, unpack_octets_4!(buf, 0, u32));
/// ```
macro_rules! unpack_octets_4 {
    ($buf:expr, $offset:expr, $tip:ty) => {
        (($buf[$offset + 0] as $tip) << 24)
            | (($buf[$offset + 1] as $tip) << 16)
            | (($buf[$offset + 2] as $tip) << 8)
            | (($buf[$offset + 3] as $tip) << 0)
    };
}


mod continuation;
mod data;
mod go_away;
mod head;
mod headers;
mod ping;
mod priority;
mod push_promise;
mod reason;
mod reset;
mod settings;
mod stream_id;
mod util;
mod window_update;

pub use self::continuation::Continuation;
pub use self::data::Data;
pub use self::go_away::GoAway;
pub use self::head::{Head, Kind};
pub use self::headers::Headers;
pub use self::ping::Ping;
pub use self::priority::{Priority, StreamDependency};
pub use self::push_promise::PushPromise;
pub use self::reason::Reason;
pub use self::reset::Reset;
pub use self::settings::{Setting, SettingId, Settings};
pub use self::stream_id::StreamId;
pub use self::window_update::WindowUpdate;

// Re-export some constants
pub use self::settings::{
    DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE, DEFAULT_SETTINGS_HEADER_TABLE_SIZE,
    MAX_INITIAL_WINDOW_SIZE, MAX_MAX_FRAME_SIZE,
};

pub type FrameSize = u32;
pub type WindowSize = u32;

pub const HEADER_LEN: usize = 9;

/// A decoded frame: a frame header plus one of the ten typed payloads.
pub enum Frame {
    Data(Data),
    Headers(Headers),
    Priority(Priority),
    Reset(Reset),
    Settings(Settings),
    PushPromise(PushPromise),
    Ping(Ping),
    GoAway(GoAway),
    WindowUpdate(WindowUpdate),
    Continuation(Continuation),
}

impl Frame {
    /// Builds a typed frame from a parsed header and its payload bytes.
    ///
    /// HEADERS and PUSH_PROMISE frames that carry a complete header block
    /// (END_HEADERS set) are decoded against `table` here; fragments of a
    /// longer block are delivered raw for the caller to reassemble.
    pub fn load(head: Head, mut bytes: BytesMut, table: &mut hpack::Table) -> Result<Frame, FrameError> {
        let frame = match head.kind() {
            Kind::Data => Data::load(head, bytes.freeze())?.into(),
            Kind::Headers => {
                let mut frame = Headers::load(head, &mut bytes)?;
                if frame.is_end_headers() {
                    frame.load_hpack(table)?;
                }
                frame.into()
            }
            Kind::Priority => Priority::load(head, &bytes)?.into(),
            Kind::Reset => Reset::load(head, &bytes)?.into(),
            Kind::Settings => Settings::load(head, &bytes)?.into(),
            Kind::PushPromise => {
                let mut frame = PushPromise::load(head, &mut bytes)?;
                if frame.is_end_headers() {
                    frame.load_hpack(table)?;
                }
                frame.into()
            }
            Kind::Ping => Ping::load(head, &bytes)?.into(),
            Kind::GoAway => GoAway::load(head, &bytes)?.into(),
            Kind::WindowUpdate => WindowUpdate::load(head, &bytes)?.into(),
            Kind::Continuation => Continuation::load(head, bytes.freeze())?.into(),
            Kind::Unknown(byte) => return Err(FrameError::UnknownKind(byte)),
        };

        Ok(frame)
    }

    /// Serializes the frame, header first, into `dst`.
    ///
    /// Header-bearing frames re-encode their header list against `table`;
    /// the payload length field is recomputed from the serialized payload.
    pub fn encode(self, table: &mut hpack::Table, dst: &mut BytesMut) {
        match self {
            Frame::Data(v) => v.encode(dst),
            Frame::Headers(v) => v.encode(table, dst),
            Frame::Priority(v) => v.encode(dst),
            Frame::Reset(v) => v.encode(dst),
            Frame::Settings(v) => v.encode(dst),
            Frame::PushPromise(v) => v.encode(table, dst),
            Frame::Ping(v) => v.encode(dst),
            Frame::GoAway(v) => v.encode(dst),
            Frame::WindowUpdate(v) => v.encode(dst),
            Frame::Continuation(v) => v.encode(table, dst),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Frame::*;

        match *self {
            Data(ref frame) => fmt::Debug::fmt(frame, fmt),
            Headers(ref frame) => fmt::Debug::fmt(frame, fmt),
            Priority(ref frame) => fmt::Debug::fmt(frame, fmt),
            Reset(ref frame) => fmt::Debug::fmt(frame, fmt),
            Settings(ref frame) => fmt::Debug::fmt(frame, fmt),
            PushPromise(ref frame) => fmt::Debug::fmt(frame, fmt),
            Ping(ref frame) => fmt::Debug::fmt(frame, fmt),
            GoAway(ref frame) => fmt::Debug::fmt(frame, fmt),
            WindowUpdate(ref frame) => fmt::Debug::fmt(frame, fmt),
            Continuation(ref frame) => fmt::Debug::fmt(frame, fmt),
        }
    }
}

/// Errors that can occur during parsing an HTTP/2 frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Fewer than 9 octets were available for the frame header.
    #[error("A full 9-octet frame header was not available")]
    MalformedHeader,

    /// The payload length was not the fixed size required by the frame type.
    #[error("The payload length was not the fixed size required by the frame type")]
    BadFrameSize,

    /// Frame size exceeded
    #[error("Frame size exceeded")]
    MaxFrameSize,

    /// The padding length was larger than the frame-header-specified
    /// length of the payload.
    #[error("The padding length was larger than the frame-header-specified length of the payload")]
    TooMuchPadding,

    /// An invalid setting value was provided
    #[error("An invalid setting value was provided")]
    InvalidSettingValue,

    /// An invalid window update value
    #[error("An invalid window update value")]
    InvalidWindowUpdateValue,

    /// The payload length specified by the frame header was not the
    /// value necessary for the specific frame type.
    #[error(
        "The payload length specified by the frame header was not the value necessary for the specific frame type"
    )]
    InvalidPayloadLength,

    /// Received a payload with an ACK settings frame
    #[error("Received a payload with an ACK settings frame")]
    InvalidPayloadAckSettings,

    /// An invalid stream identifier was provided.
    ///
    /// This is returned if a SETTINGS or PING frame is received with a stream
    /// identifier other than zero, or a stream frame with stream zero.
    #[error("An invalid stream identifier was provided")]
    InvalidStreamId,

    /// A PUSH_PROMISE frame promised a stream the sender may not open.
    #[error("An invalid promised stream identifier was provided")]
    InvalidPromisedStreamId,

    /// An invalid stream dependency ID was provided
    ///
    /// This is returned if a HEADERS or PRIORITY frame is received with an
    /// invalid stream identifier.
    #[error("An invalid stream dependency ID was provided")]
    InvalidDependencyId,

    /// A frame type outside the defined range 0x0..=0x9.
    ///
    /// The only non-fatal error kind: the payload has already been consumed,
    /// so the caller is free to keep reading frames.
    #[error("Unknown frame type {0:#x}")]
    UnknownKind(u8),

    /// Failed to perform HPACK decoding
    #[error("{0}")]
    Hpack(#[from] hpack::HpackError),
}

impl FrameError {
    /// Whether the connection can survive this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FrameError::UnknownKind(_))
    }

    /// The error code a GOAWAY built from this error should carry.
    pub fn reason(&self) -> Reason {
        match self {
            FrameError::BadFrameSize
            | FrameError::MaxFrameSize
            | FrameError::InvalidPayloadLength => Reason::FRAME_SIZE_ERROR,
            FrameError::Hpack(_) => Reason::COMPRESSION_ERROR,
            _ => Reason::PROTOCOL_ERROR,
        }
    }
}

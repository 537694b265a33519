//! Blocking transport shim.
//!
//! Wraps a byte-oriented descriptor with read-exactly-N / write-all
//! semantics around the frame codec. A read of zero octets at a frame
//! boundary is a clean close; anywhere else it is a truncated frame.

use std::io::{self, Read, Write};

use ntex_bytes::BytesMut;

use crate::codec::EncoderError;
use crate::frame::{self, Frame, FrameError, FrameSize, Head, HEADER_LEN};
use crate::hpack;

/// A frame-oriented wrapper over a blocking transport.
///
/// The HPACK table is not owned here: the caller passes the per-direction
/// table into every receive and send call, so two `FrameIo` halves of a
/// duplex connection can share nothing.
#[derive(Debug)]
pub struct FrameIo<T> {
    io: T,
    recv_max_frame_size: FrameSize,
    send_max_frame_size: FrameSize,
}

/// Errors surfaced by [`FrameIo::recv_frame`].
#[derive(thiserror::Error, Debug)]
pub enum RecvError {
    /// The peer closed the transport at a frame boundary.
    #[error("Connection closed")]
    Closed,

    /// The transport ended in the middle of a frame; no partial frame is
    /// delivered.
    #[error("Connection closed mid-frame")]
    Truncated,

    /// A frame failed to decode. The header fields parsed so far are
    /// retained so the caller can build a compliant GOAWAY.
    #[error("{error}")]
    Frame {
        head: Option<Head>,
        error: FrameError,
    },

    /// Transport failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors surfaced by [`FrameIo::send_frame`].
#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("{0}")]
    Encoder(#[from] EncoderError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RecvError {
    /// The frame header accompanying the failure, when one was parsed.
    pub fn head(&self) -> Option<Head> {
        match self {
            RecvError::Frame { head, .. } => *head,
            _ => None,
        }
    }

    /// Whether the connection can survive this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            RecvError::Frame { error, .. } => error.is_fatal(),
            _ => true,
        }
    }
}

impl<T> FrameIo<T> {
    pub fn new(io: T) -> FrameIo<T> {
        FrameIo {
            io,
            recv_max_frame_size: frame::DEFAULT_MAX_FRAME_SIZE,
            send_max_frame_size: frame::DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Updates the max frame size accepted from the peer.
    pub fn set_recv_frame_size(&mut self, val: usize) {
        assert!(
            frame::DEFAULT_MAX_FRAME_SIZE as usize <= val
                && val <= frame::MAX_MAX_FRAME_SIZE as usize
        );
        self.recv_max_frame_size = val as FrameSize;
    }

    /// Updates the max frame size the peer accepts.
    pub fn set_send_frame_size(&mut self, val: usize) {
        assert!(val <= frame::MAX_MAX_FRAME_SIZE as usize);
        self.send_max_frame_size = val as FrameSize;
    }

    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.io
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read> FrameIo<T> {
    /// Reads the next frame off the transport, in wire order.
    ///
    /// Blocks until the 9-octet header and the announced payload have both
    /// arrived. On an `UnknownKind` error the payload has been discarded
    /// already, so the caller may simply call `recv_frame` again.
    pub fn recv_frame(&mut self, table: &mut hpack::Table) -> Result<Frame, RecvError> {
        let mut header = [0u8; HEADER_LEN];

        // The first octet decides between a clean close and a torn frame.
        let n = self.io.read(&mut header)?;
        if n == 0 {
            return Err(RecvError::Closed);
        }
        if n < header.len() {
            self.io
                .read_exact(&mut header[n..])
                .map_err(eof_is_truncation)?;
        }

        let head = match Head::parse(&header) {
            Ok(head) => head,
            Err(error) => return Err(RecvError::Frame { head: None, error }),
        };

        if head.length() > self.recv_max_frame_size {
            proto_err!(conn: "frame size {} over max {}", head.length(), self.recv_max_frame_size);
            return Err(RecvError::Frame {
                head: Some(head),
                error: FrameError::MaxFrameSize,
            });
        }

        let mut payload = BytesMut::with_capacity(head.length() as usize);
        payload.resize(head.length() as usize, 0);
        self.io.read_exact(&mut payload).map_err(eof_is_truncation)?;

        log::trace!("received {} frame, payload len {}", head.kind(), payload.len());

        Frame::load(head, payload, table).map_err(|error| RecvError::Frame {
            head: Some(head),
            error,
        })
    }
}

impl<T: Write> FrameIo<T> {
    /// Serializes `frame` and writes it out, returning the octet count.
    ///
    /// The frame is serialized to a complete in-memory buffer before the
    /// first transport write, so a transport failure can never leave a
    /// partial frame on the wire. Partial writes are retried until the
    /// buffer is flushed or the transport reports a fatal error.
    pub fn send_frame(
        &mut self,
        frame: Frame,
        table: &mut hpack::Table,
    ) -> Result<usize, SendError> {
        if let Frame::Data(ref v) = frame {
            if v.payload().len() > self.send_max_frame_size as usize {
                return Err(SendError::Encoder(EncoderError::MaxSizeExceeded));
            }
        }

        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        frame.encode(table, &mut buf);

        self.io.write_all(&buf)?;
        self.io.flush()?;
        Ok(buf.len())
    }
}

fn eof_is_truncation(err: io::Error) -> RecvError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        RecvError::Truncated
    } else {
        RecvError::Io(err)
    }
}

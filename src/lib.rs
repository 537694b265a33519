//! An HTTP/2 frame codec.
//!
//! This library implements the framing layer of the [HTTP/2] specification:
//! it converts a byte stream into typed frame records and back. All ten
//! frame types are covered, including their padding, priority and
//! reserved-bit rules, and the header-compression binding that threads a
//! shared per-direction HPACK table through every HEADERS, PUSH_PROMISE and
//! CONTINUATION frame in strict wire order.
//!
//! Everything above framing is deliberately absent. The stream state
//! machine, flow-control accounting, SETTINGS application and HTTP
//! semantics belong to the caller; this crate reports what arrived and
//! serializes what it is told, bit-exactly.
//!
//! # Layout
//!
//! The typed records live in [`frame`], one module per frame type. Two
//! entry points drive them:
//!
//! * [`Codec`] is a sans-io codec over byte buffers, implementing the
//!   `ntex-codec` `Decoder`/`Encoder` pair. It owns the HPACK tables and
//!   frame-size limits for one connection.
//! * [`FrameIo`] is a blocking shim over any `std::io::Read`/`Write`
//!   transport with `recv_frame`/`send_frame` calls that take the
//!   per-direction [`hpack::Table`] explicitly.
//!
//! # Concurrency model
//!
//! Single connection, single-threaded. Each connection direction owns one
//! HPACK table; the caller guarantees serial access. Nothing here locks,
//! and frames are never reordered.
//!
//! [HTTP/2]: https://httpwg.org/specs/rfc7540.html

#![deny(rust_2018_idioms)]

macro_rules! proto_err {
    (conn: $($msg:tt)+) => {
        log::debug!("connection error PROTOCOL_ERROR -- {};", format_args!($($msg)+))
    };
    (stream: $($msg:tt)+) => {
        log::debug!("stream error PROTOCOL_ERROR -- {};", format_args!($($msg)+))
    };
}

mod codec;
mod io;

pub mod frame;
pub mod hpack;

pub use self::codec::{Codec, EncoderError};
pub use self::io::{FrameIo, RecvError, SendError};

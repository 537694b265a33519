use std::fmt;

use ntex_bytes::Bytes;

use crate::frame::FrameError;

/// Strip padding from the payload of a PADDED frame.
///
/// The first octet is the pad length; that many octets are dropped from the
/// tail. A pad length that swallows the whole payload is malformed, but a
/// padded frame carrying zero content octets is legal.
pub fn strip_padding(payload: &mut Bytes) -> Result<u8, FrameError> {
    let payload_len = payload.len();
    if payload_len == 0 {
        // If this is the case, the frame is invalid as no padding length can be
        // extracted, even though the frame should be padded.
        return Err(FrameError::TooMuchPadding);
    }

    let pad_len = payload[0] as usize;

    if pad_len >= payload_len {
        // This is invalid: the padding length MUST be less than the length of
        // the payload data.
        return Err(FrameError::TooMuchPadding);
    }

    // Take off the padding
    payload.truncate(payload_len - pad_len);

    // Take off the size
    let _ = payload.split_to(1);

    Ok(pad_len as u8)
}

pub(super) fn debug_flags<'a, 'f: 'a>(
    fmt: &'a mut fmt::Formatter<'f>,
    bits: u8,
) -> DebugFlags<'a, 'f> {
    let result = write!(fmt, "({bits:#x}");

    DebugFlags {
        fmt,
        result,
        started: false,
    }
}

pub(super) struct DebugFlags<'a, 'f> {
    fmt: &'a mut fmt::Formatter<'f>,
    result: fmt::Result,
    started: bool,
}

impl<'a, 'f> DebugFlags<'a, 'f> {
    pub(super) fn flag_if(&mut self, enabled: bool, name: &str) -> &mut Self {
        if enabled {
            self.result = self.result.and_then(|()| {
                let sep = if !self.started { ": " } else { " | " };
                self.started = true;

                write!(self.fmt, "{sep}{name}")
            });
        }

        self
    }

    pub(super) fn finish(&mut self) -> fmt::Result {
        self.result.and_then(|()| write!(self.fmt, ")"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_may_cover_all_content_octets() {
        // pad length 4 leaves zero content octets, which is allowed
        let mut payload = Bytes::from_static(&[4, 0, 0, 0, 0]);
        assert_eq!(strip_padding(&mut payload), Ok(4));
        assert!(payload.is_empty());
    }

    #[test]
    fn padding_may_not_exceed_payload() {
        let mut payload = Bytes::from_static(&[5, 0, 0, 0, 0]);
        assert_eq!(strip_padding(&mut payload), Err(FrameError::TooMuchPadding));

        let mut payload = Bytes::new();
        assert_eq!(strip_padding(&mut payload), Err(FrameError::TooMuchPadding));
    }
}

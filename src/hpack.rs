//! Binding to the HPACK header-compression engine.
//!
//! Each connection direction owns one [`Table`]: the dynamic compression
//! state shared by every HEADERS, PUSH_PROMISE and CONTINUATION frame on
//! that direction. The table is handed by `&mut` reference into each
//! encode/decode call, which keeps per-connection instances trivial and
//! makes the wire-order constraint explicit: whatever operation holds the
//! reference is the one mutating the state.

use std::fmt;

use ntex_bytes::Bytes;

use crate::frame::DEFAULT_SETTINGS_HEADER_TABLE_SIZE;

/// A single header-field representation: an opaque name/value octet pair.
///
/// No HTTP semantics are attached; pseudo-header fields travel through
/// unchanged, the way they came off the wire.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct HeaderField {
    name: Bytes,
    value: Bytes,
}

impl HeaderField {
    pub fn new<N, V>(name: N, value: V) -> HeaderField
    where
        Bytes: From<N> + From<V>,
    {
        HeaderField {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {:?}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}

/// The compression state for one connection direction.
///
/// Wraps the engine's encoder and decoder halves behind the three
/// operations the codec relies on: encode a header list, decode a header
/// block, adjust the dynamic table capacity.
pub struct Table {
    encoder: fluke_hpack::Encoder<'static>,
    decoder: fluke_hpack::Decoder<'static>,
    capacity: usize,
}

impl Table {
    pub fn new() -> Table {
        Table::with_capacity(DEFAULT_SETTINGS_HEADER_TABLE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Table {
        let mut encoder = fluke_hpack::Encoder::new();
        let mut decoder = fluke_hpack::Decoder::new();
        encoder.set_max_table_size(capacity);
        decoder.set_max_table_size(capacity);

        Table {
            encoder,
            decoder,
            capacity,
        }
    }

    /// The current dynamic table capacity, in octets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adjusts the dynamic table capacity, e.g. after the peer acknowledged
    /// a SETTINGS_HEADER_TABLE_SIZE change.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.encoder.set_max_table_size(capacity);
        self.decoder.set_max_table_size(capacity);
    }

    /// Compresses a header list into a header block, mutating the dynamic
    /// table as a side effect.
    pub fn encode(&mut self, fields: &[HeaderField]) -> Bytes {
        let block = self
            .encoder
            .encode(fields.iter().map(|field| (&field.name[..], &field.value[..])));
        Bytes::from(block)
    }

    /// Decompresses a complete header block into a header list, mutating
    /// the dynamic table as a side effect.
    pub fn decode(&mut self, src: &[u8]) -> Result<Vec<HeaderField>, HpackError> {
        let fields = self.decoder.decode(src).map_err(HpackError::Decoder)?;

        Ok(fields
            .into_iter()
            .map(|(name, value)| HeaderField {
                name: Bytes::from(name),
                value: Bytes::from(value),
            })
            .collect())
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Errors propagated from the compression engine.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum HpackError {
    #[error("Failed to perform HPACK decoding: {0:?}")]
    Decoder(fluke_hpack::decoder::DecoderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_tables_round_trip() {
        let mut egress = Table::new();
        let mut ingress = Table::new();

        let fields = vec![
            HeaderField::new(":method", "GET"),
            HeaderField::new("x-request-id", "0123456789"),
        ];

        // a second block over the same fields exercises the dynamic table
        let first = egress.encode(&fields);
        let second = egress.encode(&fields);

        assert_eq!(ingress.decode(&first).unwrap(), fields);
        assert_eq!(ingress.decode(&second).unwrap(), fields);
    }

    #[test]
    fn static_table_status_200() {
        let mut table = Table::new();
        let fields = table.decode(&[0x88]).unwrap();

        assert_eq!(fields, vec![HeaderField::new(":status", "200")]);
    }
}

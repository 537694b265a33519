use std::fmt;

use ntex_bytes::{BufMut, BytesMut};

use crate::frame::{Frame, FrameError, FrameSize, Head, Kind, StreamId, WindowSize};

const ACK_FLAG: u8 = 0x1;

pub const DEFAULT_SETTINGS_HEADER_TABLE_SIZE: usize = 4_096;
pub const DEFAULT_INITIAL_WINDOW_SIZE: WindowSize = 65_535;
pub const DEFAULT_MAX_FRAME_SIZE: FrameSize = 16_384;
pub const MAX_INITIAL_WINDOW_SIZE: WindowSize = (1 << 31) - 1;
pub const MAX_MAX_FRAME_SIZE: FrameSize = (1 << 24) - 1;

/// Settings frame
///
/// The SETTINGS frame conveys configuration parameters that affect how
/// endpoints communicate. The codec parses and serializes the parameter
/// list; applying it is the connection's business.
///
/// Entries are kept in wire order, duplicates included. Parameters with
/// identifiers this crate does not know are preserved, never dropped.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Settings {
    ack: bool,
    entries: Vec<Setting>,
}

/// A single `(identifier, value)` parameter, exactly as it sits on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Setting {
    pub id: u16,
    pub value: u32,
}

/// Identifiers of the parameters defined by RFC 7540 Section 6.5.2.
///
/// The discriminants are the on-wire identifiers; note that they start at
/// 0x1, not 0.
#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SettingId {
    HeaderTableSize = 0x1,
    EnablePush = 0x2,
    MaxConcurrentStreams = 0x3,
    InitialWindowSize = 0x4,
    MaxFrameSize = 0x5,
    MaxHeaderListSize = 0x6,
}

// ===== impl Settings =====

impl Settings {
    /// Returns a SETTINGS frame acknowledging the peer's parameters.
    pub fn ack() -> Settings {
        Settings {
            ack: true,
            entries: Vec::new(),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.ack
    }

    pub fn set_ack(&mut self) {
        self.ack = true;
    }

    pub fn clear_ack(&mut self) {
        self.ack = false;
    }

    /// Appends a parameter with a defined identifier.
    pub fn push(&mut self, id: SettingId, value: u32) {
        self.entries.push(Setting {
            id: id as u16,
            value,
        });
    }

    /// Appends a parameter by raw identifier, known or not.
    pub fn push_raw(&mut self, id: u16, value: u32) {
        self.entries.push(Setting { id, value });
    }

    /// The parameters in wire order.
    pub fn entries(&self) -> &[Setting] {
        &self.entries
    }

    /// Resolves a defined parameter; when an identifier occurs more than
    /// once, the later entry wins.
    pub fn get(&self, id: SettingId) -> Option<u32> {
        self.entries
            .iter()
            .rev()
            .find(|setting| setting.id == id as u16)
            .map(|setting| setting.value)
    }

    pub fn header_table_size(&self) -> Option<u32> {
        self.get(SettingId::HeaderTableSize)
    }

    pub fn enable_push(&self) -> Option<u32> {
        self.get(SettingId::EnablePush)
    }

    pub fn max_concurrent_streams(&self) -> Option<u32> {
        self.get(SettingId::MaxConcurrentStreams)
    }

    pub fn initial_window_size(&self) -> Option<u32> {
        self.get(SettingId::InitialWindowSize)
    }

    pub fn max_frame_size(&self) -> Option<u32> {
        self.get(SettingId::MaxFrameSize)
    }

    pub fn max_header_list_size(&self) -> Option<u32> {
        self.get(SettingId::MaxHeaderListSize)
    }

    pub(crate) fn load(head: Head, payload: &[u8]) -> Result<Settings, FrameError> {
        debug_assert_eq!(head.kind(), Kind::Settings);

        // SETTINGS frames always apply to a connection, never a single
        // stream.
        if !head.stream_id().is_zero() {
            return Err(FrameError::InvalidStreamId);
        }

        if head.flag() & ACK_FLAG == ACK_FLAG {
            return if payload.is_empty() {
                Ok(Settings::ack())
            } else {
                // Receipt of a SETTINGS frame with the ACK flag set and a
                // length field value other than 0 MUST be treated as a
                // connection error (Section 5.4.1).
                Err(FrameError::InvalidPayloadAckSettings)
            };
        }

        // A SETTINGS frame with a length other than a multiple of 6 octets
        // MUST be treated as a connection error.
        if payload.len() % 6 != 0 {
            return Err(FrameError::InvalidPayloadLength);
        }

        let mut settings = Settings::default();
        for raw in payload.chunks(6) {
            let id = ((raw[0] as u16) << 8) | (raw[1] as u16);
            let value = unpack_octets_4!(raw, 2, u32);

            match SettingId::from_wire(id) {
                Some(SettingId::EnablePush) if value > 1 => {
                    return Err(FrameError::InvalidSettingValue);
                }
                Some(SettingId::InitialWindowSize) if value > MAX_INITIAL_WINDOW_SIZE => {
                    return Err(FrameError::InvalidSettingValue);
                }
                Some(SettingId::MaxFrameSize)
                    if !(DEFAULT_MAX_FRAME_SIZE..=MAX_MAX_FRAME_SIZE).contains(&value) =>
                {
                    return Err(FrameError::InvalidSettingValue);
                }
                _ => {}
            }

            settings.entries.push(Setting { id, value });
        }

        Ok(settings)
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        let head = Head::new(
            Kind::Settings,
            if self.ack { ACK_FLAG } else { 0 },
            StreamId::zero(),
        );
        let payload_len = self.entries.len() * 6;
        log::trace!("encoding SETTINGS; ack={} len={}", self.ack, payload_len);

        head.encode(payload_len, dst);
        for setting in &self.entries {
            dst.put_u16(setting.id);
            dst.put_u32(setting.value);
        }
    }
}

impl From<Settings> for Frame {
    fn from(src: Settings) -> Self {
        Frame::Settings(src)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("Settings");
        if self.ack {
            builder.field("ack", &self.ack);
        }
        for setting in &self.entries {
            match SettingId::from_wire(setting.id) {
                Some(id) => builder.field(&format!("{id:?}"), &setting.value),
                None => builder.field(&format!("Unknown({:#x})", setting.id), &setting.value),
            };
        }
        builder.finish()
    }
}

// ===== impl SettingId =====

impl SettingId {
    pub fn from_wire(id: u16) -> Option<SettingId> {
        match id {
            0x1 => Some(SettingId::HeaderTableSize),
            0x2 => Some(SettingId::EnablePush),
            0x3 => Some(SettingId::MaxConcurrentStreams),
            0x4 => Some(SettingId::InitialWindowSize),
            0x5 => Some(SettingId::MaxFrameSize),
            0x6 => Some(SettingId::MaxHeaderListSize),
            _ => None,
        }
    }
}

use h2_codec::frame::{self, FrameError, SettingId, StreamDependency, StreamId};
use h2_codec::hpack::HeaderField;
use h2_codec::Codec;
use ntex_bytes::BytesMut;
use ntex_codec::{Decoder, Encoder};

#[macro_export]
macro_rules! decode_frame {
    ($type: ident, $bytes: ident) => {{
        use h2_codec::frame::Frame;

        match Codec::default().decode(&mut $bytes) {
            Ok(Some(Frame::$type(frame))) => frame,
            frame => panic!("unexpected frame; actual={:?}", frame),
        }
    }};
}

#[macro_export]
macro_rules! decode_err {
    ($bytes: ident, $type: expr) => {{
        match Codec::default().decode(&mut $bytes) {
            Err(e) => assert_eq!(e, $type),
            frame => panic!("expected error; actual={:?}", frame),
        }
    }};
}

// ===== DATA =====

#[test]
fn read_data_no_padding() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 0, 0, 0, 0, 0, 1]);
    buf.extend_from_slice(b"hello");

    let data = decode_frame!(Data, buf);
    assert_eq!(data.stream_id(), 1);
    assert_eq!(data.payload(), &b"hello"[..]);
    assert!(!data.is_end_stream());
    assert!(!data.is_padded());
}

#[test]
fn read_data_empty_payload() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 1]);

    let data = decode_frame!(Data, buf);
    assert_eq!(data.stream_id(), 1);
    assert_eq!(data.payload(), &b""[..]);
    assert!(!data.is_end_stream());
}

#[test]
fn read_data_end_stream() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 0, 1, 0, 0, 0, 1]);
    buf.extend_from_slice(b"hello");

    let data = decode_frame!(Data, buf);
    assert_eq!(data.stream_id(), 1);
    assert_eq!(data.payload(), &b"hello"[..]);
    assert!(data.is_end_stream());
}

#[test]
fn read_data_padding() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 16, 0, 0x8, 0, 0, 0, 1]);
    buf.extend_from_slice(&[5]); // Pad length
    buf.extend_from_slice(b"helloworld"); // Data
    buf.extend_from_slice(b"\0\0\0\0\0"); // Padding

    let data = decode_frame!(Data, buf);
    assert_eq!(data.stream_id(), 1);
    assert_eq!(data.payload(), &b"helloworld"[..]);
    assert_eq!(data.pad_length(), 5);
    assert!(data.is_padded());
}

#[test]
fn read_data_stream_id_zero() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 0, 0, 0, 0, 0, 0]);
    buf.extend_from_slice(b"hello"); // Data

    decode_err!(buf, FrameError::InvalidStreamId);
}

#[test]
fn data_padding_round_trips_bit_exactly() {
    let wire = [0, 0, 5, 0, 0x8, 0, 0, 0, 1, 2, 0x41, 0x42, 0, 0];

    let mut buf = BytesMut::new();
    buf.extend_from_slice(&wire);

    let data = decode_frame!(Data, buf);
    assert_eq!(data.payload(), &b"AB"[..]);
    assert_eq!(data.pad_length(), 2);

    // padding fill octets are zeros, so the encoded bytes match exactly
    let mut out = BytesMut::new();
    Codec::default().encode(data.into(), &mut out).unwrap();
    assert_eq!(&out[..], &wire[..]);
}

#[test]
fn data_padding_is_semantically_transparent() {
    let mut padded = BytesMut::new();
    padded.extend_from_slice(&[0, 0, 7, 0, 0x8, 0, 0, 0, 1, 4, 0x41, 0x42, 0, 0, 0, 0]);

    let mut plain = BytesMut::new();
    plain.extend_from_slice(&[0, 0, 2, 0, 0, 0, 0, 0, 1, 0x41, 0x42]);

    let padded = decode_frame!(Data, padded);
    let plain = decode_frame!(Data, plain);

    assert_eq!(padded.payload(), plain.payload());
    assert_eq!(padded.stream_id(), plain.stream_id());
    assert_ne!(padded.pad_length(), plain.pad_length());
}

// ===== HEADERS =====

#[test]
fn read_headers_with_priority_and_padding() {
    let _ = env_logger::try_init();

    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[
        0, 0, 7, 1, 0x2c, 0, 0, 0, 1, // head, END_HEADERS | PADDED | PRIORITY
        0, // pad length
        0x80, 0, 0, 0xb, // exclusive, dependency stream 11
        15,   // weight
        0x88, // HPACK :status="200"
    ]);

    let headers = decode_frame!(Headers, buf);
    assert_eq!(headers.stream_id(), 1);
    assert!(headers.is_end_headers());
    assert!(headers.is_padded());
    assert_eq!(headers.pad_length(), 0);

    let priority = headers.priority().expect("priority block");
    assert_eq!(priority.dependency_id(), 11);
    assert_eq!(priority.weight(), 15);
    assert!(priority.is_exclusive());

    assert_eq!(headers.fields(), &[HeaderField::new(":status", "200")]);
}

#[test]
fn headers_padding_is_semantically_transparent() {
    let mut padded = BytesMut::new();
    padded.extend_from_slice(&[
        0, 0, 10, 1, 0x2c, 0, 0, 0, 1, // head
        3, // pad length
        0, 0, 0, 0xb, 15,   // dependency
        0x88, // fragment
        0, 0, 0, // padding
    ]);

    let mut plain = BytesMut::new();
    plain.extend_from_slice(&[
        0, 0, 6, 1, 0x24, 0, 0, 0, 1, // head, END_HEADERS | PRIORITY
        0, 0, 0, 0xb, 15, 0x88,
    ]);

    let padded = decode_frame!(Headers, padded);
    let plain = decode_frame!(Headers, plain);

    assert_eq!(padded.fields(), plain.fields());
    assert_eq!(padded.priority(), plain.priority());
    assert_ne!(padded.pad_length(), plain.pad_length());
}

#[test]
fn headers_self_dependency_is_rejected() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[
        0, 0, 6, 1, 0x24, 0, 0, 0, 1, // head, END_HEADERS | PRIORITY
        0, 0, 0, 1, 15, 0x88,
    ]);

    decode_err!(buf, FrameError::InvalidDependencyId);
}

#[test]
fn headers_round_trip_through_mirrored_tables() {
    let fields = vec![
        HeaderField::new(":method", "GET"),
        HeaderField::new(":path", "/index.html"),
        HeaderField::new("x-request-id", "f00f"),
    ];

    let mut frame = frame::Headers::new(StreamId::from(1), fields);
    frame.set_end_stream();
    frame.set_priority(StreamDependency::new(StreamId::zero(), 31, false));

    let expected = frame.clone();

    let mut wire = BytesMut::new();
    Codec::default().encode(frame.into(), &mut wire).unwrap();

    let decoded = decode_frame!(Headers, wire);
    assert_eq!(decoded, expected);
}

#[test]
fn headers_without_end_headers_are_delivered_raw() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 1, 1, 0, 0, 0, 0, 1, 0x88]);

    let headers = decode_frame!(Headers, buf);
    assert!(!headers.is_end_headers());
    assert!(headers.fields().is_empty());
    assert_eq!(headers.fragment(), &[0x88u8][..]);
}

// ===== PRIORITY =====

#[test]
fn read_priority() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 2, 0, 0, 0, 0, 3, 0, 0, 0, 1, 200]);

    let priority = decode_frame!(Priority, buf);
    assert_eq!(priority.stream_id(), 3);
    assert_eq!(priority.dependency().dependency_id(), 1);
    assert_eq!(priority.dependency().weight(), 200);
    assert!(!priority.dependency().is_exclusive());
}

#[test]
fn priority_with_wrong_length() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 2, 0, 0, 0, 0, 3, 0, 0, 0, 1]);

    decode_err!(buf, FrameError::InvalidPayloadLength);
}

// ===== RST_STREAM =====

#[test]
fn read_reset() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 3, 0, 0, 0, 0, 3, 0, 0, 0, 8]);

    let reset = decode_frame!(Reset, buf);
    assert_eq!(reset.stream_id(), 3);
    assert_eq!(reset.reason(), frame::Reason::CANCEL);
}

#[test]
fn unknown_error_codes_pass_through() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 3, 0, 0, 0, 0, 3, 0xde, 0xad, 0xbe, 0xef]);

    let reset = decode_frame!(Reset, buf);
    assert_eq!(u32::from(reset.reason()), 0xdead_beef);
}

// ===== SETTINGS =====

#[test]
fn read_settings_ack() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 0, 4, 1, 0, 0, 0, 0]);

    let settings = decode_frame!(Settings, buf);
    assert!(settings.is_ack());
    assert!(settings.entries().is_empty());

    // re-encoding is bit-exact
    let mut out = BytesMut::new();
    Codec::default().encode(settings.into(), &mut out).unwrap();
    assert_eq!(&out[..], &[0, 0, 0, 4, 1, 0, 0, 0, 0]);
}

#[test]
fn read_settings_entries_in_wire_order() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 18, 4, 0, 0, 0, 0, 0]);
    buf.extend_from_slice(&[0, 3, 0, 0, 0, 100]); // MAX_CONCURRENT_STREAMS = 100
    buf.extend_from_slice(&[0x99, 0, 0, 0, 0, 1]); // unknown identifier
    buf.extend_from_slice(&[0, 3, 0, 0, 0, 200]); // MAX_CONCURRENT_STREAMS = 200

    let settings = decode_frame!(Settings, buf);
    assert_eq!(settings.entries().len(), 3);
    assert_eq!(settings.max_concurrent_streams(), Some(200));
    assert_eq!(settings.entries()[1].id, 0x9900);

    let mut out = BytesMut::new();
    Codec::default().encode(settings.into(), &mut out).unwrap();
    assert_eq!(out.len(), 9 + 18);
}

#[test]
fn settings_length_not_multiple_of_six() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 4, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]);

    decode_err!(buf, FrameError::InvalidPayloadLength);
}

#[test]
fn settings_ack_with_payload() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 6, 4, 1, 0, 0, 0, 0, 0, 3, 0, 0, 0, 100]);

    decode_err!(buf, FrameError::InvalidPayloadAckSettings);
}

#[test]
fn settings_on_nonzero_stream() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 0, 1]);

    decode_err!(buf, FrameError::InvalidStreamId);
}

#[test]
fn settings_enable_push_out_of_range() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 6, 4, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 2]);

    decode_err!(buf, FrameError::InvalidSettingValue);
}

#[test]
fn settings_encode_uses_wire_identifiers() {
    let mut settings = frame::Settings::default();
    settings.push(SettingId::HeaderTableSize, 4096);

    let mut out = BytesMut::new();
    Codec::default().encode(settings.into(), &mut out).unwrap();

    // SETTINGS_HEADER_TABLE_SIZE is identifier 0x1 on the wire
    assert_eq!(&out[9..11], &[0, 1]);
}

// ===== PUSH_PROMISE =====

#[test]
fn read_push_promise() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[
        0, 0, 0x5, 0x5, 0x4, 0, 0, 0, 0x1, // stream id
        0, 0, 0, 0x2,  // promised id
        0x82, // HPACK :method="GET"
    ]);

    let pp = decode_frame!(PushPromise, buf);
    assert_eq!(pp.stream_id(), 1);
    assert_eq!(pp.promised_id(), 2);
    assert!(pp.is_end_headers());
    assert_eq!(pp.fields(), &[HeaderField::new(":method", "GET")]);
}

#[test]
fn push_promise_must_promise_server_stream() {
    // an odd promised stream ID is not one the server may open
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 5, 4, 0, 0, 0, 1, 0, 0, 0, 3, 0x82]);

    decode_err!(buf, FrameError::InvalidPromisedStreamId);
}

// ===== PING =====

#[test]
fn read_ping() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[
        0, 0, 8, 6, 0, 0, 0, 0, 0, 0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 1,
    ]);

    let ping = decode_frame!(Ping, buf);
    assert!(!ping.is_ack());
    assert_eq!(ping.payload(), &[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 1]);
}

#[test]
fn ping_with_wrong_length() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 7, 6, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]);

    decode_err!(buf, FrameError::BadFrameSize);
}

// ===== GOAWAY =====

#[test]
fn read_goaway_with_debug_data() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[
        // head
        0, 0, 22, 7, 0, 0, 0, 0, 0, // last_stream_id
        0, 0, 0, 1, // error_code
        0, 0, 0, 11,
    ]);
    // debug_data
    buf.extend_from_slice(b"too_many_pings");

    let go_away = decode_frame!(GoAway, buf);
    assert_eq!(go_away.reason(), frame::Reason::ENHANCE_YOUR_CALM);
    assert_eq!(go_away.last_stream_id(), 1);
    assert_eq!(&**go_away.data(), b"too_many_pings");
}

#[test]
fn read_goaway_with_minimum_payload() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 8, 7, 0, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0]);

    let go_away = decode_frame!(GoAway, buf);
    assert_eq!(go_away.reason(), frame::Reason::NO_ERROR);
    assert_eq!(go_away.last_stream_id(), 5);
    assert!(go_away.data().is_empty());
}

#[test]
fn goaway_shorter_than_eight_octets() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 7, 7, 0, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0]);

    decode_err!(buf, FrameError::BadFrameSize);
}

// ===== WINDOW_UPDATE =====

#[test]
fn read_window_update() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 8, 0, 0, 0, 0, 3, 0, 1, 0, 0]);

    let update = decode_frame!(WindowUpdate, buf);
    assert_eq!(update.stream_id(), 3);
    assert_eq!(update.size_increment(), 65_536);
}

#[test]
fn window_update_with_zero_increment() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    decode_err!(buf, FrameError::InvalidWindowUpdateValue);
}

#[test]
fn window_update_reserved_bit_is_ignored() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 4, 8, 0, 0x80, 0, 0, 3, 0x80, 0, 0, 1]);

    let update = decode_frame!(WindowUpdate, buf);
    assert_eq!(update.stream_id(), 3);
    assert_eq!(update.size_increment(), 1);
}

// ===== CONTINUATION =====

#[test]
fn read_continuation() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 1, 9, 4, 0, 0, 0, 1, 0x88]);

    let continuation = decode_frame!(Continuation, buf);
    assert_eq!(continuation.stream_id(), 1);
    assert!(continuation.is_end_headers());
    // fragments are delivered raw; the caller reassembles the block
    assert!(continuation.fields().is_empty());
    assert_eq!(continuation.fragment(), &[0x88u8][..]);
}

// ===== frame size limits =====

#[test]
fn max_frame_size_boundary() {
    let _ = env_logger::try_init();

    // exactly 16384 octets of payload is accepted
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0x40, 0, 0, 0, 0, 0, 0, 1]);
    buf.extend_from_slice(&vec![0; 16_384]);

    let data = decode_frame!(Data, buf);
    assert_eq!(data.payload().len(), 16_384);

    // one more is not
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0x40, 1, 0, 0, 0, 0, 0, 1]);
    buf.extend_from_slice(&vec![0; 16_385]);

    decode_err!(buf, FrameError::MaxFrameSize);
}

#[test]
fn update_max_frame_len_at_rest() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 5, 0, 0, 0, 0, 0, 1]);
    buf.extend_from_slice(b"hello");
    buf.extend_from_slice(&[0, 0x41, 0, 0, 0, 0, 0, 0, 1]);
    buf.extend_from_slice(&vec![0; 16_640]);

    let codec = Codec::default();
    codec.set_recv_frame_size(16_640);
    assert_eq!(codec.recv_frame_size(), 16_640);

    match codec.decode(&mut buf) {
        Ok(Some(frame::Frame::Data(data))) => assert_eq!(data.payload(), &b"hello"[..]),
        frame => panic!("unexpected frame; actual={frame:?}"),
    }
    match codec.decode(&mut buf) {
        Ok(Some(frame::Frame::Data(data))) => assert_eq!(data.payload().len(), 16_640),
        frame => panic!("unexpected frame; actual={frame:?}"),
    }
}

// ===== unknown frame types =====

#[test]
fn unknown_frame_type_is_skippable() {
    let codec = Codec::default();

    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0, 0, 3, 0xa, 0, 0, 0, 0, 1, 1, 2, 3]);
    buf.extend_from_slice(&[0, 0, 8, 6, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);

    match codec.decode(&mut buf) {
        Err(e) => {
            assert_eq!(e, FrameError::UnknownKind(0xa));
            assert!(!e.is_fatal());
        }
        frame => panic!("expected error; actual={frame:?}"),
    }

    // the unknown frame was consumed; the stream continues
    match codec.decode(&mut buf) {
        Ok(Some(frame::Frame::Ping(ping))) => {
            assert_eq!(ping.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        }
        frame => panic!("unexpected frame; actual={frame:?}"),
    }
}

// ===== reserved bit =====

#[test]
fn reserved_header_bit_is_ignored() {
    let mut with = BytesMut::new();
    with.extend_from_slice(&[0, 0, 2, 0, 0, 0x80, 0, 0, 1, 0x41, 0x42]);

    let mut without = BytesMut::new();
    without.extend_from_slice(&[0, 0, 2, 0, 0, 0, 0, 0, 1, 0x41, 0x42]);

    let with = decode_frame!(Data, with);
    let without = decode_frame!(Data, without);

    assert_eq!(with, without);
    assert_eq!(with.stream_id(), 1);
}

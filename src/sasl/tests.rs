use std::io::{Cursor, Read, Write};

use super::{auth_external, say_hello, uid_ascii_hex, HELLO};
use crate::encoder::Encoder;
use crate::header::{encode_header, FieldValue, Header, HeaderField};
use crate::protocol::{FieldCode, MessageType};

/// A scripted peer: reads come from a canned reply, writes are recorded.
struct Script {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl Script {
    fn replying(reply: &[u8]) -> Self {
        Self {
            input: Cursor::new(reply.to_vec()),
            output: Vec::new(),
        }
    }
}

impl Read for Script {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Script {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn renders_uid_as_ascii_decimal_hex() {
    assert_eq!(uid_ascii_hex(&mut [0; 32], 1000), b"31303030");
    assert_eq!(uid_ascii_hex(&mut [0; 32], 0), b"30");
    assert_eq!(uid_ascii_hex(&mut [0; 32], u32::MAX), b"34323934393637323935");
}

#[test]
fn authenticates_with_the_effective_uid() {
    let mut peer = Script::replying(b"OK bde8d2222a9e966420ee8c1a63e972b4\r\n");

    auth_external(&mut peer).unwrap();

    let uid = unsafe { libc::geteuid() };
    let mut hex = [0; 32];
    let hex = uid_ascii_hex(&mut hex, uid as u32);

    let mut want = vec![0];
    want.extend_from_slice(b"AUTH EXTERNAL ");
    want.extend_from_slice(hex);
    want.extend_from_slice(b"\r\nBEGIN\r\n");

    assert_eq!(peer.output, want);
}

#[test]
fn rejected_auth_is_an_error() {
    let mut peer = Script::replying(b"REJECTED EXTERNAL\r\n");

    let err = auth_external(&mut peer).unwrap_err();
    assert!(err.to_string().contains("dbus auth failed"));
}

#[test]
fn hello_is_the_canonical_method_call() {
    let mut header = Header::new(MessageType::METHOD_CALL, 1);
    header.fields = vec![
        HeaderField::new(FieldCode::MEMBER, FieldValue::Str("Hello")),
        HeaderField::new(FieldCode::INTERFACE, FieldValue::Str("org.freedesktop.DBus")),
        HeaderField::new(
            FieldCode::PATH,
            FieldValue::ObjectPath("/org/freedesktop/DBus"),
        ),
        HeaderField::new(
            FieldCode::DESTINATION,
            FieldValue::Str("org.freedesktop.DBus"),
        ),
    ];

    let mut enc = Encoder::new();
    encode_header(&mut enc, &header).unwrap();

    assert_eq!(enc.bytes(), HELLO);
}

#[test]
fn hello_reply_bytes_are_discarded() {
    let mut peer = Script::replying(b":1.388");

    say_hello(&mut peer).unwrap();
    assert_eq!(peer.output, HELLO);
}

#[test]
fn missing_hello_reply_is_an_error() {
    let mut peer = Script::replying(b"");

    let err = say_hello(&mut peer).unwrap_err();
    assert!(err.to_string().contains("dbus hello failed"));
}


use std::io::{Read, Write};
use std::str::from_utf8;

use crate::convert::StrConverter;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::header::{decode_header, encode_header, FieldValue, Header, HeaderField};
use crate::protocol::{FieldCode, MessageType, BODY_LEN_OFFSET};

const DESTINATION: &str = "org.freedesktop.systemd1";
const MANAGER_PATH: &str = "/org/freedesktop/systemd1";
const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
const SERVICE_INTERFACE: &str = "org.freedesktop.systemd1.Service";
const UNIT_PATH_PREFIX: &str = "/org/freedesktop/systemd1/unit/";

/// A currently loaded systemd unit.
///
/// Note that units may be known by multiple names at the same time, and
/// hence there might be more unit names loaded than actual units behind
/// them.
///
/// The record handed to the `list_units` callback is reused on every
/// iteration and its strings are batched in a buffer that is recycled when
/// the call returns, so none of the borrowed fields may be retained; copy
/// them first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unit<'a> {
    /// The primary unit name.
    pub name: &'a str,
    /// The human readable description.
    pub description: &'a str,
    /// The load state, i.e., whether the unit file has been loaded
    /// successfully.
    pub load_state: &'a str,
    /// The active state, i.e., whether the unit is currently started or
    /// not.
    pub active_state: &'a str,
    /// The sub state, a more fine-grained version of the active state that
    /// is specific to the unit type.
    pub sub_state: &'a str,
    /// A unit that is being followed in its state by this unit, if there is
    /// any, otherwise the empty string.
    pub followed: &'a str,
    /// The unit object path.
    pub path: &'a str,
    /// The numeric job ID if there is a job queued for the unit, 0
    /// otherwise.
    pub job_id: u32,
    /// The job type.
    pub job_type: &'a str,
    /// The job object path.
    pub job_path: &'a str,
}

impl Unit<'_> {
    /// Whether the unit is a service.
    pub fn is_service(&self) -> bool {
        self.name.ends_with(".service")
    }
}

/// Encoder of the supported method calls.
///
/// The encode buffer and the object path scratch are owned and reused
/// across requests.
pub(crate) struct MessageEncoder {
    enc: Encoder,
    /// Scratch for the escaped unit object path.
    path: Vec<u8>,
}

impl MessageEncoder {
    pub(crate) fn new() -> Self {
        Self {
            enc: Encoder::new(),
            path: Vec::new(),
        }
    }

    /// Encode a method call to `org.freedesktop.systemd1.Manager.ListUnits`
    /// and write it to `conn`.
    pub(crate) fn encode_list_units<W: Write>(&mut self, conn: &mut W, serial: u32) -> Result<()> {
        self.enc.reset();

        let mut header = Header::new(MessageType::METHOD_CALL, serial);
        header.fields = vec![
            HeaderField::new(FieldCode::MEMBER, FieldValue::Str("ListUnits")),
            HeaderField::new(FieldCode::INTERFACE, FieldValue::Str(MANAGER_INTERFACE)),
            HeaderField::new(FieldCode::PATH, FieldValue::ObjectPath(MANAGER_PATH)),
            HeaderField::new(FieldCode::DESTINATION, FieldValue::Str(DESTINATION)),
        ];

        encode_header(&mut self.enc, &header)?;

        conn.write_all(self.enc.bytes())?;
        Ok(())
    }

    /// Encode a method call to `org.freedesktop.DBus.Properties.Get`
    /// requesting the `MainPID` property of `service` and write it to
    /// `conn`.
    ///
    /// The body length in the prologue is rewritten once the body has been
    /// serialized.
    pub(crate) fn encode_main_pid<W: Write>(
        &mut self,
        conn: &mut W,
        service: &str,
        serial: u32,
    ) -> Result<()> {
        self.enc.reset();

        self.path.clear();
        self.path.extend_from_slice(UNIT_PATH_PREFIX.as_bytes());
        escape_bus_label(service, &mut self.path);
        let object_path = from_utf8(&self.path)?;

        let mut header = Header::new(MessageType::METHOD_CALL, serial);
        header.fields = vec![
            HeaderField::new(FieldCode::PATH, FieldValue::ObjectPath(object_path)),
            HeaderField::new(FieldCode::DESTINATION, FieldValue::Str(DESTINATION)),
            HeaderField::new(FieldCode::MEMBER, FieldValue::Str("Get")),
            HeaderField::new(FieldCode::INTERFACE, FieldValue::Str(PROPERTIES_INTERFACE)),
            HeaderField::new(FieldCode::SIGNATURE, FieldValue::Signature("ss")),
        ];

        encode_header(&mut self.enc, &header)?;

        // Body signature "ss": the property interface and name.
        let body_start = self.enc.offset();
        self.enc.string(SERVICE_INTERFACE);
        self.enc.string("MainPID");

        let body_len = self.enc.offset() - body_start;
        self.enc.uint32_at(body_len, BODY_LEN_OFFSET)?;

        conn.write_all(self.enc.bytes())?;
        Ok(())
    }
}

/// Decoder of the supported method replies.
pub(crate) struct MessageDecoder {
    dec: Decoder,
}

impl MessageDecoder {
    pub(crate) fn new() -> Self {
        Self {
            dec: Decoder::new(),
        }
    }

    /// Decode a reply from the systemd `ListUnits` method, invoking `f`
    /// once per unit that passes `predicate`.
    ///
    /// The returned value is the reply serial when the header fields were
    /// parsed (`skip_fields` is false).
    ///
    /// The `Unit` handed to `f` is reused on every invocation and must not
    /// be retained.
    pub(crate) fn decode_list_units<R, F>(
        &mut self,
        src: &mut R,
        conv: &StrConverter,
        skip_fields: bool,
        predicate: Option<&dyn Fn(&Unit<'_>) -> bool>,
        f: &mut F,
    ) -> Result<Option<u32>>
    where
        R: Read,
        F: FnMut(&Unit<'_>),
    {
        self.dec.reset();

        let mut header = Header::new(MessageType::METHOD_CALL, 0);
        decode_header(&mut self.dec, src, conv, &mut header, skip_fields)?;
        let reply_serial = header.reply_serial();

        // Read the body under a limit so the end of the unit array shows up
        // as end-of-stream. The body begins on an 8-byte boundary, so the
        // running offset stays correct across the wrap.
        let mut body = src.take(u64::from(header.body_len));

        // The body signature is a(ssssssouso). The leading array length in
        // bytes is redundant here: the units announce their own end when
        // the limited reader runs dry.
        self.dec.uint32(&mut body)?;

        let mut unit = Unit::default();

        loop {
            match decode_unit(&mut self.dec, &mut body, conv, &mut unit) {
                Ok(()) => {
                    if predicate.map_or(true, |accept| accept(&unit)) {
                        f(&unit);
                    }
                }
                Err(err) if err.is_eof() => break,
                Err(err) => return Err(err),
            }
        }

        Ok(reply_serial)
    }

    /// Decode a `MainPID` property reply from the
    /// `org.freedesktop.DBus.Properties.Get` method.
    ///
    /// Returns the PID and the reply serial when the header fields were
    /// parsed. A stopped service reports a PID of zero.
    pub(crate) fn decode_main_pid<R: Read>(
        &mut self,
        src: &mut R,
        conv: &StrConverter,
        skip_fields: bool,
    ) -> Result<(u32, Option<u32>)> {
        self.dec.reset();

        let mut header = Header::new(MessageType::METHOD_CALL, 0);
        decode_header(&mut self.dec, src, conv, &mut header, skip_fields)?;
        let reply_serial = header.reply_serial();

        let mut body = src.take(u64::from(header.body_len));

        // Discard the signature of the variant, which is known to be "u".
        self.dec.signature(&mut body)?;

        let pid = self.dec.uint32(&mut body)?;
        Ok((pid, reply_serial))
    }
}

/// Decode one `(ssssssouso)` struct of the unit array.
fn decode_unit<'a, R: Read>(
    dec: &mut Decoder,
    src: &mut R,
    conv: &'a StrConverter,
    unit: &mut Unit<'a>,
) -> Result<()> {
    // Structs are aligned to an 8-byte boundary regardless of the
    // alignment of their contents.
    dec.align(src, 8)?;

    unit.name = conv.convert(from_utf8(dec.string(src)?)?);
    unit.description = conv.convert(from_utf8(dec.string(src)?)?);
    unit.load_state = conv.convert(from_utf8(dec.string(src)?)?);
    unit.active_state = conv.convert(from_utf8(dec.string(src)?)?);
    unit.sub_state = conv.convert(from_utf8(dec.string(src)?)?);
    unit.followed = conv.convert(from_utf8(dec.string(src)?)?);
    unit.path = conv.convert(from_utf8(dec.string(src)?)?);
    unit.job_id = dec.uint32(src)?;
    unit.job_type = conv.convert(from_utf8(dec.string(src)?)?);
    unit.job_path = conv.convert(from_utf8(dec.string(src)?)?);

    Ok(())
}

/// Escape a unit name so it can appear as an object path segment.
///
/// Alphanumerics pass through, except for a leading digit; everything else
/// becomes `_` followed by the lower-case hex of the byte. The empty name
/// escapes to a single `_`.
pub(crate) fn escape_bus_label(label: &str, out: &mut Vec<u8>) {
    const HEX: [u8; 16] = *b"0123456789abcdef";

    if label.is_empty() {
        out.push(b'_');
        return;
    }

    for (i, &b) in label.as_bytes().iter().enumerate() {
        let passthrough = b.is_ascii_alphabetic() || (b.is_ascii_digit() && i != 0);

        if passthrough {
            out.push(b);
        } else {
            out.push(b'_');
            out.push(HEX[usize::from(b >> 4)]);
            out.push(HEX[usize::from(b & 0xf)]);
        }
    }
}

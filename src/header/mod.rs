
use std::io::Read;
use std::str::from_utf8;

use crate::convert::StrConverter;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{ErrorKind, Result};
use crate::protocol::{
    next_offset, Endianness, FieldCode, Flags, MessageType, FIELDS_LEN_OFFSET, MAX_MESSAGE_SIZE,
    PROLOGUE_SIZE,
};

/// A message header: the fixed 16-byte prologue and the header fields
/// array.
///
/// The signature of the header is `yyyyuua(yv)`, that is BYTE, BYTE, BYTE,
/// BYTE, UINT32, UINT32, ARRAY of STRUCT of (BYTE, VARIANT).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header<'a> {
    /// Endianness flag; ASCII `l` for little-endian or ASCII `B` for
    /// big-endian. Both header and body are in this endianness.
    pub(crate) byte_order: Endianness,
    pub(crate) message_type: MessageType,
    /// Bitwise OR of message flags.
    pub(crate) flags: Flags,
    /// Major protocol version of the sending application.
    pub(crate) proto: u8,
    /// Length in bytes of the message body, starting from the end of the
    /// header. The header ends after its alignment padding to an
    /// 8-boundary.
    pub(crate) body_len: u32,
    /// The serial of this message, used as a cookie by the sender to
    /// identify the reply corresponding to this request. Must not be zero.
    pub(crate) serial: u32,
    /// Length of the header fields array in bytes, excluding the padding
    /// at the end. On encode this is only a hint: the actual length is
    /// rewritten into the prologue after the array is serialized.
    pub(crate) fields_len: u32,
    /// Header fields, if a caller chose to decode them. The order of the
    /// fields in the message is preserved.
    pub(crate) fields: Vec<HeaderField<'a>>,
}

impl<'a> Header<'a> {
    pub(crate) fn new(message_type: MessageType, serial: u32) -> Self {
        Self {
            byte_order: Endianness::LITTLE,
            message_type,
            flags: Flags::EMPTY,
            proto: 1,
            body_len: 0,
            serial,
            fields_len: 0,
            fields: Vec::new(),
        }
    }

    /// Total length of the header including the padding at the end, which
    /// aligns the body to an 8-byte boundary.
    pub(crate) fn len(&self) -> u32 {
        let (aligned, _) = next_offset(PROLOGUE_SIZE + self.fields_len, 8);
        aligned
    }

    /// The REPLY_SERIAL field value, if the fields were decoded and the
    /// reply carries one.
    pub(crate) fn reply_serial(&self) -> Option<u32> {
        self.fields.iter().find_map(|f| match f {
            HeaderField {
                code: FieldCode::REPLY_SERIAL,
                value: FieldValue::U32(serial),
            } => Some(*serial),
            _ => None,
        })
    }
}

/// A single header field: a 1-byte code and a variant holding the value.
///
/// Variants are marshalled as the SIGNATURE of the contents, which must be
/// a single complete type, followed by the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderField<'a> {
    pub(crate) code: FieldCode,
    pub(crate) value: FieldValue<'a>,
}

impl<'a> HeaderField<'a> {
    pub(crate) fn new(code: FieldCode, value: FieldValue<'a>) -> Self {
        Self { code, value }
    }
}

/// Value of a header field variant.
///
/// Only the single-character signatures `u`, `s`, `o`, and `g` can appear
/// in a header field; container arms are deliberately absent and decoding
/// one is a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldValue<'a> {
    /// UINT32, signature `u`.
    U32(u32),
    /// STRING, signature `s`.
    Str(&'a str),
    /// OBJECT_PATH, signature `o`. Encoded identically to STRING.
    ObjectPath(&'a str),
    /// SIGNATURE, signature `g`.
    Signature(&'a str),
}

/// Decode a message header from `src` into `header`.
///
/// The string converter `conv` reduces allocations when decoding header
/// fields. A caller that already knows the body signature can skip the
/// fields with `skip_fields`; the bytes are still consumed. All fields of
/// `header` are overwritten.
pub(crate) fn decode_header<'a, R: Read>(
    dec: &mut Decoder,
    src: &mut R,
    conv: &'a StrConverter,
    header: &mut Header<'a>,
    skip_fields: bool,
) -> Result<()> {
    // The fixed portion of the message header (16 bytes).
    let b = dec.read_n(src, PROLOGUE_SIZE)?;

    let byte_order = Endianness(b[0]);
    header.byte_order = byte_order;
    header.message_type = MessageType(b[1]);
    header.flags = Flags(b[2]);
    header.proto = b[3];
    header.body_len = byte_order.u32_from([b[4], b[5], b[6], b[7]]);
    header.serial = byte_order.u32_from([b[8], b[9], b[10], b[11]]);
    header.fields_len = byte_order.u32_from([b[12], b[13], b[14], b[15]]);

    dec.set_order(byte_order);

    if header.body_len > MAX_MESSAGE_SIZE {
        return Err(ErrorKind::BodyTooLong(header.body_len).into());
    }

    // Clean the fields from a previous header use.
    header.fields.clear();

    if skip_fields {
        dec.read_n(src, header.fields_len)?;
    } else {
        let fields_end = dec.offset() + header.fields_len;

        while dec.offset() < fields_end {
            let field = decode_field(dec, src, conv)?;
            header.fields.push(field);
        }
    }

    // The length of the header must be a multiple of 8, allowing the body
    // to begin on an 8-byte boundary. Discard the padding.
    dec.align(src, 8)?;

    Ok(())
}

/// Decode one `(yv)` struct of the header fields array.
fn decode_field<'a, R: Read>(
    dec: &mut Decoder,
    src: &mut R,
    conv: &'a StrConverter,
) -> Result<HeaderField<'a>> {
    // Structs are aligned to an 8-byte boundary.
    dec.align(src, 8)?;

    let code = FieldCode(dec.byte(src)?);

    let sig = dec.signature(src)?;

    let &[ch] = sig else {
        return Err(ErrorKind::ContainerNotSupported(sig.into()).into());
    };

    let value = match ch {
        b'u' => FieldValue::U32(dec.uint32(src)?),
        b's' => {
            let s = from_utf8(dec.string(src)?)?;
            FieldValue::Str(conv.convert(s))
        }
        b'o' => {
            let s = from_utf8(dec.string(src)?)?;
            FieldValue::ObjectPath(conv.convert(s))
        }
        b'g' => {
            let s = from_utf8(dec.signature(src)?)?;
            FieldValue::Signature(conv.convert(s))
        }
        ch => return Err(ErrorKind::UnknownType(ch).into()),
    };

    Ok(HeaderField::new(code, value))
}

/// Encode the message header into `enc`.
///
/// The fields length in the prologue is rewritten once the array has been
/// serialized, and the header is padded so the body starts on an 8-byte
/// boundary.
pub(crate) fn encode_header(enc: &mut Encoder, header: &Header<'_>) -> Result<()> {
    if header.body_len > MAX_MESSAGE_SIZE {
        return Err(ErrorKind::BodyTooLong(header.body_len).into());
    }

    enc.set_order(header.byte_order);

    // The fixed portion of the message header (16 bytes).
    enc.byte(header.byte_order.0);
    enc.byte(header.message_type.0);
    enc.byte(header.flags.0);
    enc.byte(header.proto);
    enc.uint32(header.body_len);
    enc.uint32(header.serial);
    // A hint; overwritten below once the array is encoded.
    enc.uint32(header.fields_len);

    let fields_start = enc.offset();

    for field in &header.fields {
        encode_field(enc, field);
    }

    let fields_len = enc.offset() - fields_start;
    enc.uint32_at(fields_len, FIELDS_LEN_OFFSET)?;

    enc.align(8);

    Ok(())
}

fn encode_field(enc: &mut Encoder, field: &HeaderField<'_>) {
    enc.align(8);
    enc.byte(field.code.0);

    match field.value {
        FieldValue::U32(value) => {
            enc.signature("u");
            enc.uint32(value);
        }
        FieldValue::Str(s) => {
            enc.signature("s");
            enc.string(s);
        }
        FieldValue::ObjectPath(s) => {
            enc.signature("o");
            enc.string(s);
        }
        FieldValue::Signature(s) => {
            enc.signature("g");
            enc.signature(s);
        }
    }
}

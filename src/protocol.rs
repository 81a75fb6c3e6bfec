//! Low level details of the D-Bus wire format.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};

/// The maximum length of a message in bytes (128 MiB), including the
/// header, its alignment padding, and the body.
pub(crate) const MAX_MESSAGE_SIZE: u32 = 1u32 << 27;

/// The length of the fixed part of a message header, from the beginning of
/// the message until the header fields array.
pub(crate) const PROLOGUE_SIZE: u32 = 16;

/// Offset of the header fields length in the prologue. It is rewritten
/// after the fields array has been encoded.
pub(crate) const FIELDS_LEN_OFFSET: u32 = 12;

/// Offset of the body length in the prologue. It is rewritten after the
/// body has been encoded.
pub(crate) const BODY_LEN_OFFSET: u32 = 4;

macro_rules! raw_enum {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, PartialEq, Eq)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match *self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)*
                    _ => f.write_str("INVALID"),
                }
            }
        }
    }
}

macro_rules! raw_set {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Default, Clone, Copy, PartialEq, Eq)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_set();
                let mut this = *self;

                $(
                    if this & Self::$variant {
                        f.entry(&stringify!($variant));
                        this = this ^ Self::$variant;
                    }
                )*

                if this.0 != 0 {
                    f.entry(&this.0);
                }

                f.finish()
            }
        }
    }
}

raw_enum! {
    /// The endianness of a message. The selected order governs both the
    /// header and the body of that one message.
    #[repr(u8)]
    pub enum Endianness {
        /// Little endian.
        LITTLE = b'l',
        /// Big endian.
        BIG = b'B',
    }
}

impl Endianness {
    /// Decode four bytes with this byte order.
    #[inline]
    pub(crate) fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::BIG => u32::from_be_bytes(bytes),
            _ => u32::from_le_bytes(bytes),
        }
    }

    /// Encode `value` with this byte order.
    #[inline]
    pub(crate) fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::BIG => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }
}

raw_enum! {
    /// The type of a message.
    #[repr(u8)]
    pub enum MessageType {
        /// Method call. This message type may prompt a reply.
        METHOD_CALL = 1,
        /// Method reply with returned data.
        METHOD_RETURN = 2,
        /// Error reply. If the first argument exists and is a string, it is
        /// an error message.
        ERROR = 3,
        /// Signal emission.
        SIGNAL = 4,
    }
}

raw_set! {
    /// Flags inside of a D-Bus message.
    ///
    /// # Examples
    ///
    /// ```
    /// use systemd_client::protocol::Flags;
    ///
    /// let flags = Flags::EMPTY | Flags::NO_REPLY_EXPECTED;
    /// assert!(flags & Flags::NO_REPLY_EXPECTED);
    /// assert!(!(flags & Flags::NO_AUTO_START));
    /// ```
    #[repr(u8)]
    pub enum Flags {
        /// An empty set of flags.
        EMPTY = 0,
        /// This message does not expect a method return or error reply.
        NO_REPLY_EXPECTED = 1,
        /// The bus must not launch an owner for the destination name in
        /// response to this message.
        NO_AUTO_START = 2,
    }
}

impl BitOr<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Flags) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd<Flags> for Flags {
    type Output = bool;

    #[inline]
    fn bitand(self, rhs: Flags) -> Self::Output {
        self.0 & rhs.0 != 0
    }
}

impl BitXor<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Flags) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

raw_enum! {
    /// Code of a header field. The array at the end of a message header
    /// contains fields, where each field is a 1-byte code followed by a
    /// variant holding the field value.
    #[repr(u8)]
    pub enum FieldCode {
        /// The object to send a call to, or the object a signal is emitted
        /// from. Controlled by the message sender.
        PATH = 1,
        /// The interface to invoke a method call on. Optional for method
        /// calls, required for signals.
        INTERFACE = 2,
        /// The member, either the method name or signal name.
        MEMBER = 3,
        /// The name of the error that occurred, for errors.
        ERROR_NAME = 4,
        /// The serial number of the message this message is a reply to.
        REPLY_SERIAL = 5,
        /// The name of the connection this message is intended for.
        DESTINATION = 6,
        /// Unique name of the sending connection. On a message bus this
        /// field is controlled by the bus itself.
        SENDER = 7,
        /// The signature of the message body. If omitted, the body must be
        /// 0-length.
        SIGNATURE = 8,
        /// The number of Unix file descriptors that accompany the message.
        UNIX_FDS = 9,
    }
}

/// Compute the next offset aligned to `align` and the padding to get
/// there. `align` must be a power of two.
#[inline]
pub(crate) fn next_offset(current: u32, align: u32) -> (u32, u32) {
    let mask = align - 1;
    let padding = (align - (current & mask)) & mask;
    (current + padding, padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn endianness_round_trips_u32() {
        let value = 0x12345678;
        assert_eq!(Endianness::LITTLE.u32_bytes(value), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(Endianness::BIG.u32_bytes(value), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(
            Endianness::LITTLE.u32_from(Endianness::LITTLE.u32_bytes(value)),
            value
        );
        assert_eq!(
            Endianness::BIG.u32_from(Endianness::BIG.u32_bytes(value)),
            value
        );
    }

    #[test]
    fn next_offset_when_aligned() {
        for align in [1, 2, 4, 8] {
            assert_eq!(next_offset(0, align), (0, 0));
            assert_eq!(next_offset(align * 3, align), (align * 3, 0));
        }
    }

    proptest! {
        #[test]
        fn next_offset_reaches_boundary(
            offset in 0u32..8,
            align in prop::sample::select(vec![1u32, 2, 4, 8]),
        ) {
            let (next, padding) = next_offset(offset, align);
            prop_assert_eq!(next, offset.div_ceil(align) * align);
            prop_assert_eq!(padding, next - offset);
        }
    }
}

use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::protocol::MAX_MESSAGE_SIZE;

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
///
/// Every error is fatal to the call that produced it. The client does not
/// resynchronise the stream after a failure, so a caller observing an error
/// should assume the connection is in an indeterminate state and drop it.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    /// Test if the error marks the end of the underlying stream. The
    /// streaming decoder uses this to tell body exhaustion apart from a
    /// genuine failure.
    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        matches!(&self.kind, ErrorKind::Io(error) if error.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        Self::new(ErrorKind::Io(error))
    }
}

impl From<Utf8Error> for Error {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8(error))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(error) => error.fmt(f),
            ErrorKind::Utf8(error) => error.fmt(f),
            ErrorKind::InvalidAddress => write!(f, "dbus address not found"),
            ErrorKind::AuthFailed(detail) => write!(f, "dbus auth failed: {detail}"),
            ErrorKind::HelloFailed => write!(f, "dbus hello failed"),
            ErrorKind::BodyTooLong(length) => {
                write!(
                    f,
                    "message exceeded the maximum length: {length}/{MAX_MESSAGE_SIZE} bytes"
                )
            }
            ErrorKind::ContainerNotSupported(sig) => {
                write!(f, "container type is not supported: {}", sig.escape_ascii())
            }
            ErrorKind::UnknownType(sig) => write!(f, "unknown type: {}", sig.escape_ascii()),
            ErrorKind::Busy => write!(f, "must be called serially"),
            ErrorKind::SerialMismatch { want, got } => {
                write!(f, "message reply serial mismatch: want {want} got {got}")
            }
            ErrorKind::OffsetOutOfBounds(at) => {
                write!(f, "offset {at} is out of the encoded message bounds")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Utf8(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    /// A short read or write during the handshake or a message transfer.
    Io(io::Error),
    /// A decoded string was not valid UTF-8.
    Utf8(Utf8Error),
    /// The bus address does not start with `unix:path=`.
    InvalidAddress,
    /// The EXTERNAL authentication handshake failed.
    AuthFailed(&'static str),
    /// The canonical Hello exchange failed.
    HelloFailed,
    /// Body length in a message prologue exceeded 128 MiB.
    BodyTooLong(u32),
    /// A header variant carried a multi-character signature. Container
    /// types never appear in the supported calls.
    ContainerNotSupported(Box<[u8]>),
    /// A header variant signature character outside of `u`, `s`, `o`, `g`.
    UnknownType(u8),
    /// Another call is already in progress on this client.
    Busy,
    /// Reply serial verification was enabled and the values differ.
    SerialMismatch { want: u32, got: u32 },
    /// A late-bound length rewrite landed outside the encoded message.
    OffsetOutOfBounds(u32),
}

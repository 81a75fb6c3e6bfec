//! The authentication handshake which D-Bus performs before switching to
//! the binary protocol.
//!
//! The protocol is line-based, where each line ends with `\r\n`:
//!
//! ```text
//! client: AUTH EXTERNAL 31303030
//! server: OK bde8d2222a9e966420ee8c1a63e972b4
//! client: BEGIN
//! ```
//!
//! The client here is authenticating as Unix uid 1000, where `31303030` is
//! ASCII decimal `1000` represented in hex. The transport-level
//! credentials corroborate the claim on the server side.

#[cfg(test)]
mod tests;

use std::io::{Read, Write};

use crate::error::{ErrorKind, Result};

/// A method call to `org.freedesktop.DBus.Hello` which registers the
/// connection on the bus. Every connection must send it before any other
/// call, and the bus replies with the connection's unique name, which this
/// client has no use for.
#[rustfmt::skip]
pub(crate) const HELLO: [u8; 128] = [
    // little endian, method call, no flags, protocol 1
    b'l', 1, 0, 1,
    // body length = 0
    0, 0, 0, 0,
    // serial = 1
    1, 0, 0, 0,
    // header fields array length = 109
    109, 0, 0, 0,
    // MEMBER (s) = "Hello"
    3, 1, b's', 0, 5, 0, 0, 0,
    b'H', b'e', b'l', b'l', b'o', 0, 0, 0,
    // INTERFACE (s) = "org.freedesktop.DBus"
    2, 1, b's', 0, 20, 0, 0, 0,
    b'o', b'r', b'g', b'.', b'f', b'r', b'e', b'e',
    b'd', b'e', b's', b'k', b't', b'o', b'p', b'.',
    b'D', b'B', b'u', b's', 0, 0, 0, 0,
    // PATH (o) = "/org/freedesktop/DBus"
    1, 1, b'o', 0, 21, 0, 0, 0,
    b'/', b'o', b'r', b'g', b'/', b'f', b'r', b'e',
    b'e', b'd', b'e', b's', b'k', b't', b'o', b'p',
    b'/', b'D', b'B', b'u', b's', 0, 0, 0,
    // DESTINATION (s) = "org.freedesktop.DBus"
    6, 1, b's', 0, 20, 0, 0, 0,
    b'o', b'r', b'g', b'.', b'f', b'r', b'e', b'e',
    b'd', b'e', b's', b'k', b't', b'o', b'p', b'.',
    b'D', b'B', b'u', b's', 0, 0, 0, 0,
];

/// Authenticate the connection as the current effective user with the
/// EXTERNAL mechanism.
pub(crate) fn auth_external<S: Read + Write>(stream: &mut S) -> Result<()> {
    // A single null byte is required before the first command.
    if stream.write_all(&[0]).is_err() {
        return Err(ErrorKind::AuthFailed("send null failed").into());
    }

    // SAFETY: geteuid never fails.
    let uid = unsafe { libc::geteuid() };

    let mut buf = [0; 32];
    let uid = uid_ascii_hex(&mut buf, uid as u32);

    let mut line = Vec::with_capacity(64);
    line.extend_from_slice(b"AUTH EXTERNAL ");
    line.extend_from_slice(uid);
    line.extend_from_slice(b"\r\n");

    if stream.write_all(&line).is_err() {
        return Err(ErrorKind::AuthFailed("send AUTH EXTERNAL failed").into());
    }

    let mut reply = [0; 4096];
    let n = match stream.read(&mut reply) {
        Ok(n) => n,
        Err(_) => return Err(ErrorKind::AuthFailed("read auth reply failed").into()),
    };

    if !reply[..n].starts_with(b"OK") {
        return Err(ErrorKind::AuthFailed("expected OK").into());
    }

    if stream.write_all(b"BEGIN\r\n").is_err() {
        return Err(ErrorKind::AuthFailed("send BEGIN failed").into());
    }

    Ok(())
}

/// Register the connection on the bus with the canonical [`HELLO`] call.
/// The reply carries the connection name and is discarded after checking
/// that the bus produced one.
pub(crate) fn say_hello<S: Read + Write>(stream: &mut S) -> Result<()> {
    if stream.write_all(&HELLO).is_err() {
        return Err(ErrorKind::HelloFailed.into());
    }

    let mut reply = [0; 4096];
    match stream.read(&mut reply) {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(ErrorKind::HelloFailed.into()),
    }
}

/// Render a uid as the lower-case hex encoding of its ASCII decimal form,
/// e.g., `1000` becomes `31303030`.
fn uid_ascii_hex(buf: &mut [u8; 32], mut uid: u32) -> &[u8] {
    const HEX: [u8; 16] = *b"0123456789abcdef";

    let mut n = 0;

    loop {
        let digit = (uid % 10) as u8 + b'0';
        // Nibbles land reversed; the slice is flipped as a whole below.
        buf[n] = HEX[usize::from(digit & 0xf)];
        buf[n + 1] = HEX[usize::from(digit >> 4)];
        n += 2;

        uid /= 10;

        if uid == 0 {
            break;
        }
    }

    buf[..n].reverse();
    &buf[..n]
}

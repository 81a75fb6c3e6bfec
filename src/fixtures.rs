//! Messages captured from a live bus, shared between the test suites. Any
//! change to the codecs must keep these byte-for-byte reproducible.

/// A method call to `org.freedesktop.systemd1.Manager.ListUnits`, serial 2.
pub(crate) const LIST_UNITS_REQUEST: [u8; 168] = [
    108, 1, 0, 1, 0, 0, 0, 0, 2, 0, 0, 0,
    145, 0, 0, 0, 3, 1, 115, 0, 9, 0, 0, 0,
    76, 105, 115, 116, 85, 110, 105, 116, 115, 0, 0, 0,
    0, 0, 0, 0, 2, 1, 115, 0, 32, 0, 0, 0,
    111, 114, 103, 46, 102, 114, 101, 101, 100, 101, 115, 107,
    116, 111, 112, 46, 115, 121, 115, 116, 101, 109, 100, 49,
    46, 77, 97, 110, 97, 103, 101, 114, 0, 0, 0, 0,
    0, 0, 0, 0, 1, 1, 111, 0, 25, 0, 0, 0,
    47, 111, 114, 103, 47, 102, 114, 101, 101, 100, 101, 115,
    107, 116, 111, 112, 47, 115, 121, 115, 116, 101, 109, 100,
    49, 0, 0, 0, 0, 0, 0, 0, 6, 1, 115, 0,
    24, 0, 0, 0, 111, 114, 103, 46, 102, 114, 101, 101,
    100, 101, 115, 107, 116, 111, 112, 46, 115, 121, 115, 116,
    101, 109, 100, 49, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// A method call to `org.freedesktop.DBus.Properties.Get` requesting the
/// `MainPID` property of `dbus.service`, serial 3. Header is 176 bytes,
/// body is 52.
pub(crate) const MAIN_PID_REQUEST: [u8; 228] = [
    108, 1, 0, 1, 52, 0, 0, 0, 3, 0, 0, 0,
    160, 0, 0, 0, 1, 1, 111, 0, 45, 0, 0, 0,
    47, 111, 114, 103, 47, 102, 114, 101, 101, 100, 101, 115,
    107, 116, 111, 112, 47, 115, 121, 115, 116, 101, 109, 100,
    49, 47, 117, 110, 105, 116, 47, 100, 98, 117, 115, 95,
    50, 101, 115, 101, 114, 118, 105, 99, 101, 0, 0, 0,
    6, 1, 115, 0, 24, 0, 0, 0, 111, 114, 103, 46,
    102, 114, 101, 101, 100, 101, 115, 107, 116, 111, 112, 46,
    115, 121, 115, 116, 101, 109, 100, 49, 0, 0, 0, 0,
    0, 0, 0, 0, 3, 1, 115, 0, 3, 0, 0, 0,
    71, 101, 116, 0, 0, 0, 0, 0, 2, 1, 115, 0,
    31, 0, 0, 0, 111, 114, 103, 46, 102, 114, 101, 101,
    100, 101, 115, 107, 116, 111, 112, 46, 68, 66, 117, 115,
    46, 80, 114, 111, 112, 101, 114, 116, 105, 101, 115, 0,
    8, 1, 103, 0, 2, 115, 115, 0, 32, 0, 0, 0,
    111, 114, 103, 46, 102, 114, 101, 101, 100, 101, 115, 107,
    116, 111, 112, 46, 115, 121, 115, 116, 101, 109, 100, 49,
    46, 83, 101, 114, 118, 105, 99, 101, 0, 0, 0, 0,
    7, 0, 0, 0, 77, 97, 105, 110, 80, 73, 68, 0,
];

/// The reply to [`MAIN_PID_REQUEST`]: the main PID of `dbus.service` was
/// 2862.
#[rustfmt::skip]
pub(crate) const MAIN_PID_REPLY: [u8; 72] = [
    // yyyyuu fixed prologue: little endian, method reply,
    // NO_REPLY_EXPECTED, protocol 1
    b'l', 2, 1, 1,
    // body length = 8
    8, 0, 0, 0,
    // serial = 2263
    215, 8, 0, 0,
    // header fields array length = 45
    45, 0, 0, 0,
    // REPLY_SERIAL (u) = 3
    5, 1, b'u', 0, 3, 0, 0, 0,
    // DESTINATION (s) = ":1.388"
    6, 1, b's', 0, 6, 0, 0, 0,
    b':', b'1', b'.', b'3', b'8', b'8', 0, 0,
    // SIGNATURE (g) = "v"
    8, 1, b'g', 0, 1, b'v', 0, 0,
    // SENDER (s) = ":1.0", then 3 bytes of header padding
    7, 1, b's', 0, 4, 0, 0, 0,
    b':', b'1', b'.', b'0', 0, 0, 0, 0,
    // body: the variant's signature "u", a pad byte, MainPID = 2862
    1, b'u', 0, 0, 46, 11, 0, 0,
];

/// Header of a 35 KB `ListUnits` reply that carried 157 units. Only the
/// header portion is kept; bodies for the streaming decoder are generated
/// in the message tests.
#[rustfmt::skip]
pub(crate) const LIST_UNITS_REPLY_HEADER: [u8; 80] = [
    // little endian, method reply, NO_REPLY_EXPECTED, protocol 1
    b'l', 2, 1, 1,
    // body length = 35714
    130, 139, 0, 0,
    // serial = 1758
    222, 6, 0, 0,
    // header fields array length = 61
    61, 0, 0, 0,
    // REPLY_SERIAL (u) = 2
    5, 1, b'u', 0, 2, 0, 0, 0,
    // DESTINATION (s) = ":1.388"
    6, 1, b's', 0, 6, 0, 0, 0,
    b':', b'1', b'.', b'3', b'8', b'8', 0, 0,
    // SIGNATURE (g) = "a(ssssssouso)"
    8, 1, b'g', 0, 13,
    b'a', b'(', b's', b's', b's', b's', b's', b's',
    b'o', b'u', b's', b'o', b')', 0,
    // struct padding to the 8-byte boundary
    0, 0, 0, 0, 0,
    // SENDER (s) = ":1.0"
    7, 1, b's', 0, 4, 0, 0, 0,
    b':', b'1', b'.', b'0', 0,
    // header padding to the 8-byte boundary
    0, 0, 0,
];

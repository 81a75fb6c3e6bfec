
use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::sync::Mutex;

use crate::client_builder::ClientBuilder;
use crate::convert::StrConverter;
use crate::error::{ErrorKind, Result};
use crate::message::{MessageDecoder, MessageEncoder, Unit};

/// Client accessing systemd over D-Bus.
///
/// A connection receives messages serially, so a client must not be used
/// for more than one call at a time: every operation takes a non-blocking
/// single-owner gate and fails immediately with a "must be called serially"
/// error when another call is in progress. In particular, no operation may
/// be invoked from inside the [`Client::list_units`] callback; waiting on
/// the gate there instead of failing would deadlock the connection.
///
/// Dropping the client closes the connection.
pub struct Client {
    state: Mutex<ClientState>,
}

pub(crate) struct ClientState {
    /// Buffered reads from the connection reduce the count of read
    /// syscalls; decoding a 35 KB reply takes a dozen reads through a 4 KB
    /// buffer instead of thousands of one-primitive reads. Writes go
    /// directly to the underlying stream.
    conn: BufReader<UnixStream>,
    enc: MessageEncoder,
    dec: MessageDecoder,
    conv: StrConverter,
    /// The serial of the last message, used as a cookie to identify the
    /// reply corresponding to a request. Never zero once bumped.
    serial: u32,
    serial_check: bool,
}

impl ClientState {
    /// The next message serial. It wraps around past `u32::MAX` skipping
    /// zero, which the protocol reserves as invalid.
    fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);

        if self.serial == 0 {
            self.serial += 1;
        }

        self.serial
    }
}

impl Client {
    /// Connect to the system bus with the default configuration and
    /// authenticate as the current effective user.
    ///
    /// The address is taken from the `DBUS_SYSTEM_BUS_ADDRESS` environment
    /// variable, falling back to the well-known
    /// `unix:path=/var/run/dbus/system_bus_socket`.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().connect()
    }

    /// A builder to override the defaults, e.g., the bus address or buffer
    /// sizes.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        conn: BufReader<UnixStream>,
        conv: StrConverter,
        serial_check: bool,
    ) -> Self {
        Self {
            state: Mutex::new(ClientState {
                conn,
                enc: MessageEncoder::new(),
                dec: MessageDecoder::new(),
                conv,
                serial: 0,
                serial_check,
            }),
        }
    }

    /// Fetch the currently loaded systemd units, invoking `f` once per
    /// unit that passes `predicate`. A `None` predicate accepts every
    /// unit.
    ///
    /// The `Unit` handed to the callback is reused on every invocation and
    /// its strings are only valid for the duration of the call; copy what
    /// must be retained.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn main() -> systemd_client::Result<()> {
    /// let client = systemd_client::Client::new()?;
    ///
    /// client.list_units(None, |unit| {
    ///     println!("{} {}", unit.name, unit.active_state);
    /// })?;
    /// # Ok(()) }
    /// ```
    pub fn list_units<F>(&self, predicate: Option<&dyn Fn(&Unit<'_>) -> bool>, mut f: F) -> Result<()>
    where
        F: FnMut(&Unit<'_>),
    {
        let Ok(mut state) = self.state.try_lock() else {
            return Err(ErrorKind::Busy.into());
        };
        let state = &mut *state;

        let serial = state.next_serial();
        state.conv.reset();

        let mut writer = state.conn.get_ref();
        state.enc.encode_list_units(&mut writer, serial)?;

        let reply_serial = state.dec.decode_list_units(
            &mut state.conn,
            &state.conv,
            !state.serial_check,
            predicate,
            &mut f,
        )?;

        if state.serial_check {
            verify_serial(serial, reply_serial)?;
        }

        Ok(())
    }

    /// Fetch the main PID of a service, e.g., `dbus.service`. An inactive
    /// service reports a PID of zero.
    ///
    /// This must not be called from inside the [`Client::list_units`]
    /// callback; the call gate refuses re-entry.
    pub fn main_pid(&self, service: &str) -> Result<u32> {
        let Ok(mut state) = self.state.try_lock() else {
            return Err(ErrorKind::Busy.into());
        };
        let state = &mut *state;

        let serial = state.next_serial();
        state.conv.reset();

        let mut writer = state.conn.get_ref();
        state.enc.encode_main_pid(&mut writer, service, serial)?;

        let (pid, reply_serial) =
            state
                .dec
                .decode_main_pid(&mut state.conn, &state.conv, !state.serial_check)?;

        if state.serial_check {
            verify_serial(serial, reply_serial)?;
        }

        Ok(pid)
    }
}

/// Check that the reply pairs with the request that was just sent. A reply
/// without a REPLY_SERIAL field counts as serial zero, which no request
/// can carry.
fn verify_serial(want: u32, got: Option<u32>) -> Result<()> {
    let got = got.unwrap_or(0);

    if want != got {
        return Err(ErrorKind::SerialMismatch { want, got }.into());
    }

    Ok(())
}

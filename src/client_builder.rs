use std::env;
use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::client::Client;
use crate::convert::{StrConverter, DEFAULT_CONVERTER_SIZE};
use crate::error::{ErrorKind, Result};
use crate::sasl;

const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// Default size in bytes of the buffer for reading from a connection.
///
/// Buffering reduces the count of read syscalls: ListUnits makes a dozen
/// reads when decoding a 35 KB message through a 4 KB buffer, and
/// thousands without one.
pub(crate) const DEFAULT_READ_SIZE: usize = 4096;

/// Builder of a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use systemd_client::ClientBuilder;
///
/// # fn main() -> systemd_client::Result<()> {
/// let client = ClientBuilder::new()
///     .address("unix:path=/run/dbus/system_bus_socket")
///     .serial_check(true)
///     .connect()?;
/// # Ok(()) }
/// ```
pub struct ClientBuilder {
    read_size: usize,
    converter_size: usize,
    serial_check: bool,
    address: Option<String>,
    connection: Option<UnixStream>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Construct a new client builder with the default configuration.
    pub fn new() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            converter_size: DEFAULT_CONVERTER_SIZE,
            serial_check: false,
            address: None,
            connection: None,
            timeout: None,
        }
    }

    /// Size of the buffer for reading from the connection. The bigger the
    /// buffer, the fewer read syscalls are made.
    pub fn connection_read_size(&mut self, size: usize) -> &mut Self {
        self.read_size = size;
        self
    }

    /// Capacity of the buffer batching decoded strings to reduce
    /// allocations.
    pub fn string_converter_size(&mut self, size: usize) -> &mut Self {
        self.converter_size = size;
        self
    }

    /// Verify that the reply serial matches the serial sent with the
    /// request.
    ///
    /// This requires decoding of the reply header fields, which incurs a
    /// few extra allocations per call. There shouldn't be any
    /// request/reply mishmash to begin with, because the client guarantees
    /// that the underlying connection is accessed sequentially.
    pub fn serial_check(&mut self, enable: bool) -> &mut Self {
        self.serial_check = enable;
        self
    }

    /// Bus address to connect to, e.g.,
    /// `unix:path=/run/user/1000/bus`. Overrides the
    /// `DBUS_SYSTEM_BUS_ADDRESS` environment variable.
    pub fn address(&mut self, address: &str) -> &mut Self {
        self.address = Some(address.to_string());
        self
    }

    /// Use an already established connection instead of resolving and
    /// dialing an address. The handshake is still performed on it.
    pub fn connection(&mut self, connection: UnixStream) -> &mut Self {
        self.connection = Some(connection);
        self
    }

    /// Read/write deadline applied to every socket operation. There is no
    /// recovery from an elapsed deadline: the connection is poisoned and
    /// the client should be dropped.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Dial the bus (unless a connection was supplied), perform the
    /// authentication handshake, and register on the bus.
    pub fn connect(&mut self) -> Result<Client> {
        let mut stream = match self.connection.take() {
            Some(stream) => stream,
            None => {
                let address = match &self.address {
                    Some(address) => address.clone(),
                    None => env::var(ENV_SYSTEM_BUS)
                        .unwrap_or_else(|_| DEFAULT_SYSTEM_BUS.to_string()),
                };

                dial(&address)?
            }
        };

        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        sasl::auth_external(&mut stream)?;
        sasl::say_hello(&mut stream)?;

        Ok(Client::from_parts(
            BufReader::with_capacity(self.read_size, stream),
            StrConverter::new(self.converter_size),
            self.serial_check,
        ))
    }
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Connect to the bus over a Unix domain socket. The only address form
/// recognised is `unix:path=<path>`.
fn dial(address: &str) -> Result<UnixStream> {
    let Some(path) = address.strip_prefix("unix:path=") else {
        return Err(ErrorKind::InvalidAddress.into());
    };

    Ok(UnixStream::connect(path)?)
}

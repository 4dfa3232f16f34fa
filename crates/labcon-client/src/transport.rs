//! Socket transport helpers for the lab controller client.
//!
//! Connections are wrapped in a uniform [`Connection`] type so request
//! handling stays transport agnostic.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use labcon_config::SocketEndpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::errors::ClientError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on waiting for the reply line.
pub(crate) const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn set_timeouts(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

pub(crate) fn connect(endpoint: &SocketEndpoint) -> Result<Connection, ClientError> {
    let connection_error = |source| ClientError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    let connection = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address =
                resolve_tcp_address(host, *port).map_err(|source| ClientError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
                .map(Connection::Tcp)
                .map_err(connection_error)?
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str()).map_err(connection_error)?
            }

            #[cfg(not(unix))]
            {
                let _ = path;
                return Err(ClientError::UnsupportedUnixTransport(endpoint.to_string()));
            }
        }
    };
    connection
        .set_timeouts(REPLY_TIMEOUT)
        .map_err(connection_error)?;
    Ok(connection)
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream: UnixStream = socket.into();
    Ok(Connection::Unix(stream))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn refused_connections_name_the_endpoint() {
        // Bind then drop to find a port nobody listens on.
        let port = TcpListener::bind(("127.0.0.1", 0))
            .and_then(|listener| listener.local_addr())
            .expect("ephemeral port")
            .port();
        let endpoint = SocketEndpoint::tcp("127.0.0.1", port);
        let Err(error) = connect(&endpoint) else {
            panic!("connection should be refused");
        };
        assert!(matches!(error, ClientError::Connect { .. }), "{error}");
        assert!(error.to_string().contains(&endpoint.to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn missing_unix_socket_is_a_connect_error() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("absent.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf-8 path"));
        assert!(matches!(
            connect(&endpoint),
            Err(ClientError::Connect { .. })
        ));
    }
}

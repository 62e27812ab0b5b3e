//! Dialing side.

use std::io::ErrorKind;
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use super::{Connector, Role};
use crate::config::NetConfig;
use crate::error::{NetError, NetResult};

/// Dials the host once per [`Connector::connect`] call.
pub struct GuestConnector {
    host_addr: SocketAddr,
    connect_timeout: Duration,
    /// Clone of the dialed stream, kept to shut it down.
    active: Option<TcpStream>,
}

impl GuestConnector {
    /// Creates a guest dialing `host` on the configured port.
    #[must_use]
    pub fn new(host: IpAddr, config: &NetConfig) -> Self {
        Self {
            host_addr: SocketAddr::new(host, config.port),
            connect_timeout: config.connect_timeout(),
            active: None,
        }
    }

    /// Address dialed.
    #[must_use]
    pub const fn host_addr(&self) -> SocketAddr {
        self.host_addr
    }
}

impl Connector for GuestConnector {
    fn connect(&mut self) -> NetResult<TcpStream> {
        self.disconnect();

        tracing::info!("Dialing host {}", self.host_addr);
        match TcpStream::connect_timeout(&self.host_addr, self.connect_timeout) {
            Ok(stream) => {
                self.active = Some(stream.try_clone()?);
                tracing::info!("Connected to host {}", self.host_addr);
                Ok(stream)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                tracing::warn!("Host {} did not answer", self.host_addr);
                Err(NetError::ConnectTimeout {
                    addr: self.host_addr,
                    timeout: self.connect_timeout,
                })
            }
            Err(e) => {
                tracing::warn!("Could not reach host {}: {}", self.host_addr, e);
                Err(e.into())
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.active.take() {
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!("Guest connector released its stream");
        }
    }

    fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    fn role(&self) -> Role {
        Role::Guest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    #[test]
    fn test_refused_leaves_disconnected() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let config = NetConfig {
            connect_timeout_ms: 500,
            ..NetConfig::default().with_port(port)
        };
        let mut guest = GuestConnector::new(IpAddr::V4(Ipv4Addr::LOCALHOST), &config);

        assert!(guest.connect().is_err());
        assert!(!guest.is_connected());
        guest.disconnect();
    }

    #[test]
    fn test_dials_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = NetConfig::default().with_port(listener.local_addr().unwrap().port());
        let mut guest = GuestConnector::new(IpAddr::V4(Ipv4Addr::LOCALHOST), &config);

        let stream = guest.connect().unwrap();
        assert!(guest.is_connected());
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());

        guest.disconnect();
        assert!(!guest.is_connected());
    }
}

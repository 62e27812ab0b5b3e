//! Listening side.

use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use super::{Connector, Role};
use crate::config::NetConfig;
use crate::error::{NetError, NetResult};

/// Accept polling interval.
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Accepts exactly one guest per [`Connector::connect`] call.
///
/// The listener only lives for the duration of the call.
pub struct HostConnector {
    bind_addr: SocketAddr,
    accept_timeout: Duration,
    /// Clone of the accepted stream, kept to shut it down.
    active: Option<TcpStream>,
}

impl HostConnector {
    /// Creates a host listening on `config.bind_addr()`.
    #[must_use]
    pub fn new(config: &NetConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            accept_timeout: config.accept_timeout(),
            active: None,
        }
    }

    /// Address the host listens on.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    fn accept_one(&self, listener: &TcpListener) -> NetResult<TcpStream> {
        listener.set_nonblocking(true)?;
        let deadline = Instant::now() + self.accept_timeout;

        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    tracing::info!("Accepted guest {}", addr);
                    stream.set_nonblocking(false)?;
                    return Ok(stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                    if Instant::now() >= deadline {
                        return Err(NetError::AcceptTimeout(self.accept_timeout));
                    }
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Connector for HostConnector {
    fn connect(&mut self) -> NetResult<TcpStream> {
        self.disconnect();

        tracing::info!("Waiting for a guest on {}", self.bind_addr);
        let listener = TcpListener::bind(self.bind_addr)?;
        let result = self.accept_one(&listener);
        drop(listener);

        match result {
            Ok(stream) => {
                self.active = Some(stream.try_clone()?);
                Ok(stream)
            }
            Err(e) => {
                tracing::warn!("No guest connected: {}", e);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.active.take() {
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!("Host connector released its stream");
        }
    }

    fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    fn role(&self) -> Role {
        Role::Host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_times_out_cleanly() {
        let config = NetConfig {
            accept_timeout_ms: 50,
            ..NetConfig::default().with_port(53141)
        };
        let mut host = HostConnector::new(&config);

        let started = Instant::now();
        assert!(matches!(host.connect(), Err(NetError::AcceptTimeout(_))));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(!host.is_connected());

        // The listener is gone: the port can be bound again right away.
        assert!(TcpListener::bind(config.bind_addr()).is_ok());
    }

    #[test]
    fn test_accepts_one_guest() {
        let config = NetConfig {
            accept_timeout_ms: 2000,
            ..NetConfig::default().with_port(53142)
        };
        let mut host = HostConnector::new(&config);
        let dialer = thread::spawn(|| {
            for _ in 0..100 {
                if let Ok(stream) = TcpStream::connect(("127.0.0.1", 53142)) {
                    return Some(stream);
                }
                thread::sleep(Duration::from_millis(10));
            }
            None
        });

        let stream = host.connect().unwrap();
        assert!(host.is_connected());
        assert!(dialer.join().unwrap().is_some());
        assert_eq!(stream.local_addr().unwrap().port(), 53142);

        host.disconnect();
        host.disconnect();
        assert!(!host.is_connected());
    }
}

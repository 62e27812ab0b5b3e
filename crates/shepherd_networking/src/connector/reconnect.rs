//! Bounded reconnection.

use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use super::Connector;
use crate::error::{NetError, NetResult};

/// How hard to try before giving up on the peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Connection attempts before giving up.
    pub max_attempts: u32,
    /// Pause between two failed attempts.
    pub retry_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 3000,
        }
    }
}

impl ReconnectPolicy {
    /// Pause between two failed attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Tears the old stream down and tries to establish a new one.
///
/// `on_attempt(n, max)` runs before each attempt (1-based), e.g. to show
/// "reconnecting 2/5".
///
/// # Errors
///
/// Returns [`NetError::ReconnectExhausted`] when every attempt failed.
pub fn reconnect(
    connector: &mut dyn Connector,
    policy: &ReconnectPolicy,
    mut on_attempt: impl FnMut(u32, u32),
) -> NetResult<TcpStream> {
    connector.disconnect();

    for attempt in 1..=policy.max_attempts {
        on_attempt(attempt, policy.max_attempts);
        tracing::info!("Reconnection attempt {}/{}", attempt, policy.max_attempts);

        match connector.connect() {
            Ok(stream) => {
                tracing::info!("Reconnected as {} on attempt {}", connector.role(), attempt);
                return Ok(stream);
            }
            Err(e) => {
                tracing::warn!("Reconnection attempt {} failed: {}", attempt, e);
                if attempt < policy.max_attempts {
                    thread::sleep(policy.retry_delay());
                }
            }
        }
    }

    tracing::error!("Giving up after {} reconnection attempts", policy.max_attempts);
    Err(NetError::ReconnectExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Role;
    use std::net::TcpListener;

    /// Fails a fixed number of times, then dials a local listener.
    struct Flaky {
        failures_left: u32,
        listener: TcpListener,
        disconnects: u32,
        connected: bool,
    }

    impl Connector for Flaky {
        fn connect(&mut self) -> NetResult<TcpStream> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(NetError::NotConnected);
            }
            let stream = TcpStream::connect(self.listener.local_addr()?)?;
            self.connected = true;
            Ok(stream)
        }

        fn disconnect(&mut self) {
            self.disconnects += 1;
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn role(&self) -> Role {
            Role::Guest
        }
    }

    fn flaky(failures: u32) -> Flaky {
        Flaky {
            failures_left: failures,
            listener: TcpListener::bind("127.0.0.1:0").unwrap(),
            disconnects: 0,
            connected: false,
        }
    }

    const FAST: ReconnectPolicy = ReconnectPolicy {
        max_attempts: 5,
        retry_delay_ms: 1,
    };

    #[test]
    fn test_succeeds_after_failures() {
        let mut connector = flaky(2);
        let mut attempts = Vec::new();

        let result = reconnect(&mut connector, &FAST, |n, max| attempts.push((n, max)));

        assert!(result.is_ok());
        assert_eq!(attempts, vec![(1, 5), (2, 5), (3, 5)]);
        assert_eq!(connector.disconnects, 1);
        assert!(connector.is_connected());
    }

    #[test]
    fn test_gives_up() {
        let mut connector = flaky(10);
        let mut count = 0;

        let result = reconnect(&mut connector, &FAST, |_, _| count += 1);

        assert!(matches!(result, Err(NetError::ReconnectExhausted { attempts: 5 })));
        assert_eq!(count, 5);
        assert!(!connector.is_connected());
    }
}

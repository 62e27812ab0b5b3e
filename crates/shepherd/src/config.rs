//! # Session Configuration
//!
//! One TOML file configures a peer. Every table and field is optional:
//!
//! ```toml
//! countdown_secs = 5
//! guest_decision_timeout_ms = 10000
//!
//! [net]
//! port = 53127
//!
//! [game_loop]
//! target_fps = 60
//!
//! [reconnect]
//! max_attempts = 5
//! retry_delay_ms = 3000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use shepherd_core::{CoreError, DisplayContext, LoopConfig};
use shepherd_networking::{NetConfig, ReconnectPolicy};

use crate::error::SessionResult;

/// Everything a session needs to know up front.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sockets and framing.
    pub net: NetConfig,
    /// Simulation rate and input buffering.
    pub game_loop: LoopConfig,
    /// How hard to try to get the peer back.
    pub reconnect: ReconnectPolicy,
    /// Playfield geometry.
    pub display: DisplayContext,
    /// How long the guest waits for the host's post-game decision.
    pub guest_decision_timeout_ms: u64,
    /// Pause between the end of a game and the host's decision prompt.
    pub end_dialog_delay_ms: u64,
    /// Delay between the host's announcement and the start of play.
    pub countdown_secs: u64,
    /// Fixed flock seed, for reproducible games.
    pub flock_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            net: NetConfig::default(),
            game_loop: LoopConfig::default(),
            reconnect: ReconnectPolicy::default(),
            display: DisplayContext::default(),
            guest_decision_timeout_ms: 10_000,
            end_dialog_delay_ms: 3_000,
            countdown_secs: 5,
            flock_seed: None,
        }
    }
}

impl SessionConfig {
    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Toml`](crate::SessionError::Toml) for
    /// malformed input and
    /// [`SessionError::Config`](crate::SessionError::Config) for values out
    /// of range.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::from_toml_str`], plus
    /// [`SessionError::Io`](crate::SessionError::Io) if the file cannot be
    /// read.
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::info!("Loading session config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an invalid loop config, a
    /// zero buffer size or a policy with no attempts.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.game_loop.validate()?;
        if self.net.read_buffer_size == 0 {
            return Err(CoreError::InvalidConfig("net.read_buffer_size must be positive".into()));
        }
        if self.reconnect.max_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "reconnect.max_attempts must be positive".into(),
            ));
        }
        if self.display.scale_x <= 0.0 || self.display.scale_y <= 0.0 {
            return Err(CoreError::InvalidConfig("display scale must be positive".into()));
        }
        Ok(())
    }

    /// Guest wait for the post-game decision.
    #[must_use]
    pub const fn guest_decision_timeout(&self) -> Duration {
        Duration::from_millis(self.guest_decision_timeout_ms)
    }

    /// Pause before the host's decision prompt.
    #[must_use]
    pub const fn end_dialog_delay(&self) -> Duration {
        Duration::from_millis(self.end_dialog_delay_ms)
    }

    /// Delay between announcement and play.
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }
}

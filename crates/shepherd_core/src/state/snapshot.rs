//! # Session Snapshots
//!
//! The envelope the host application persists across process suspension:
//! the active state id plus that state's typed snapshot. Serialized as JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::StateId;
use crate::error::SnapshotError;

/// Saved state machine position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSession<S> {
    /// State that was active when saved.
    pub current_state: StateId,
    /// That state's own snapshot, if it saves one.
    pub payload: Option<S>,
}

impl<S> SavedSession<S> {
    /// A session positioned at `state` with no payload.
    #[must_use]
    pub const fn at(state: StateId) -> Self {
        Self {
            current_state: state,
            payload: None,
        }
    }
}

impl<S: Serialize> SavedSession<S> {
    /// Encodes the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if the payload cannot be
    /// serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<S: DeserializeOwned> SavedSession<S> {
    /// Decodes an envelope produced by [`SavedSession::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Empty`] for empty input and
    /// [`SnapshotError::Malformed`] for anything that does not parse.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.is_empty() {
            return Err(SnapshotError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum Payload {
        Score { points: u32 },
    }

    #[test]
    fn test_envelope_roundtrip() {
        let saved = SavedSession {
            current_state: StateId(3),
            payload: Some(Payload::Score { points: 7 }),
        };
        let bytes = saved.to_bytes().unwrap();
        let restored: SavedSession<Payload> = SavedSession::from_bytes(&bytes).unwrap();
        assert_eq!(restored, saved);
    }

    #[test]
    fn test_state_id_is_a_bare_number() {
        let saved: SavedSession<Payload> = SavedSession::at(StateId(2));
        let text = String::from_utf8(saved.to_bytes().unwrap()).unwrap();
        assert_eq!(text, r#"{"current_state":2,"payload":null}"#);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            SavedSession::<Payload>::from_bytes(b""),
            Err(SnapshotError::Empty)
        ));
        assert!(matches!(
            SavedSession::<Payload>::from_bytes(b"{not json"),
            Err(SnapshotError::Malformed(_))
        ));
    }
}

//! # Messages
//!
//! The unit moved through the transport queues.

/// An opaque payload, or the shutdown sentinel.
///
/// The sentinel (`payload == None`) tells a worker to stop. It is distinct
/// from an empty payload, which is a valid message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    payload: Option<Vec<u8>>,
}

impl Message {
    /// Wraps a payload.
    #[must_use]
    pub const fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    /// The shutdown sentinel.
    #[must_use]
    pub const fn end() -> Self {
        Self { payload: None }
    }

    /// Returns true for the shutdown sentinel.
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.payload.is_none()
    }

    /// The payload, `None` for the sentinel.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Takes the payload out.
    #[must_use]
    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_not_the_sentinel() {
        let empty = Message::new(Vec::new());
        assert!(!empty.is_end());
        assert_eq!(empty.payload(), Some(&[][..]));

        let end = Message::end();
        assert!(end.is_end());
        assert_eq!(end.into_payload(), None);
    }
}

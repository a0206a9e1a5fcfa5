//! Room identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::random_code;

/// Prefix of generated room codes.
pub const ROOM_CODE_PREFIX: &str = "WATCH-";

/// Maximum accepted room id length.
pub const MAX_ROOM_ID_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomIdError {
    #[error("Room code cannot be empty")]
    Empty,
    #[error("Room code is longer than 64 characters")]
    TooLong,
    #[error("Room code contains control characters")]
    ControlCharacters,
}

/// A named real-time synchronization group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Validate a room code typed or pasted by a user.
    pub fn parse(code: &str) -> Result<Self, RoomIdError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RoomIdError::Empty);
        }
        if code.chars().count() > MAX_ROOM_ID_LENGTH {
            return Err(RoomIdError::TooLong);
        }
        if code.chars().any(char::is_control) {
            return Err(RoomIdError::ControlCharacters);
        }
        Ok(Self(code.to_string()))
    }

    /// Generate a fresh shareable code, e.g. `WATCH-3F9A1C`.
    pub fn generate() -> Self {
        Self(format!("{}{}", ROOM_CODE_PREFIX, random_code(6)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_room_code() {
        let room = RoomId::generate();
        assert!(room.as_str().starts_with("WATCH-"));
        assert_eq!(room.as_str().len(), 12);
        assert_eq!(RoomId::parse(room.as_str()).unwrap(), room);
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(RoomId::parse("  WATCH-ABC  ").unwrap().as_str(), "WATCH-ABC");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(RoomId::parse(" "), Err(RoomIdError::Empty));
        assert_eq!(RoomId::parse(&"x".repeat(65)), Err(RoomIdError::TooLong));
        assert_eq!(RoomId::parse("a\u{7}b"), Err(RoomIdError::ControlCharacters));
    }
}

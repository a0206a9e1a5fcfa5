//! Dashboard access codes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::room::ROOM_CODE_PREFIX;
use crate::utils::random_code;

/// One-time dashboard access code (`POST /api/auth/reset`).
///
/// Shown to the operator exactly once; never persisted by clients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccessCodeResponse {
    pub code: String,
}

impl AccessCodeResponse {
    pub fn generate() -> Self {
        Self {
            code: format!("{}{}", ROOM_CODE_PREFIX, random_code(6)),
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for AccessCodeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCodeResponse")
            .field("code", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_code_is_redacted_in_debug() {
        let code = AccessCodeResponse::generate();
        assert_eq!(code.code.len(), 12);
        assert!(code.code.starts_with("WATCH-"));
        assert!(!format!("{:?}", code).contains(&code.code));
    }
}

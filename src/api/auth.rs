use super::types::EntityId;
use std::fmt;

/// Bearer credential for one logged-in account.
///
/// Never mutated: a re-login produces a new `Session` that replaces the old one.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user_id: Option<EntityId>,
    username: String,
}

impl Session {
    pub fn new(token: String, user_id: Option<EntityId>, username: &str) -> Self {
        Self {
            token,
            user_id,
            username: username.to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> Option<&EntityId> {
        self.user_id.as_ref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// First 20 chars of the token, for logs.
    pub fn token_preview(&self) -> &str {
        match self.token.char_indices().nth(20) {
            Some((idx, _)) => &self.token[..idx],
            None => &self.token,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("token", &format_args!("{}...", self.token_preview()))
            .finish()
    }
}

use std::fmt;

/// Credentials of a signed-in user, issued by the backend platform.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
}

impl AuthSession {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

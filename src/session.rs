use tower_sessions::Session;

use crate::AppResult;

/// Session keys written by the product's auth layer at sign-in.
pub const USER_ID: &str = "user_id";
pub const USER_NAME: &str = "user_name";

/// Display-name fallback for connections with no resolvable name.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Identity attached to a connection when the socket is accepted.
/// Immutable for the connection's lifetime as far as the chat core goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_USER)
    }
}

/// Read the identity the auth layer attached to this session, if any.
pub async fn identity(session: &Session) -> AppResult<Option<Identity>> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };
    let name = session.get::<String>(USER_NAME).await?;

    Ok(Some(Identity { user_id, name }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_sentinel() {
        let named = Identity { user_id: "u1".to_owned(), name: Some("Alice".to_owned()) };
        assert_eq!(named.display_name(), "Alice");

        let anonymous = Identity { user_id: "u2".to_owned(), name: None };
        assert_eq!(anonymous.display_name(), UNKNOWN_USER);
    }
}

//! User identity and session context
//!
//! The session context is an explicit object handed to the functions that
//! need it; there is no ambient singleton user state.

use serde::{Deserialize, Serialize};

/// An authenticated user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: i64,
    pub login_id: String,
}

/// One entry of the reference list of known users: a numeric id rendered as
/// `value` plus a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserValue {
    pub value: String,
    pub label: String,
}

/// Explicit per-request context: who is authenticated, and the reference
/// list used to resolve typed-in user names to ids.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub current_user: Option<UserAccount>,
    pub users: Vec<UserValue>,
}

impl SessionContext {
    /// Resolve a display name (or an id rendered as text) against the known
    /// users list. Matches either the label or the value.
    pub fn lookup_user_id(&self, name: &str) -> Option<i64> {
        self.users
            .iter()
            .find(|u| u.label == name || u.value == name)
            .and_then(|u| u.value.trim().parse::<i64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_label_or_value() {
        let ctx = SessionContext {
            current_user: None,
            users: vec![
                UserValue {
                    value: "7".to_string(),
                    label: "J. Smith".to_string(),
                },
                UserValue {
                    value: "9".to_string(),
                    label: "A. Jones".to_string(),
                },
            ],
        };
        assert_eq!(ctx.lookup_user_id("J. Smith"), Some(7));
        assert_eq!(ctx.lookup_user_id("9"), Some(9));
        assert_eq!(ctx.lookup_user_id("unknown"), None);
    }
}

//! What the session remembers about the logged-in user.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId};

use super::User;

/// Identity of the logged-in user, stored in the session at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    pub const CURRENT_USER: &str = "bazaar.user";
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a registered identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdentityId(pub i64);

impl IdentityId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IdentityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A registered account: email, one-way secret hash and admin flag.
///
/// Identities are created by registration and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub secret_hash: String,
    pub is_admin: bool,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("secret_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_hash() {
        let identity = Identity {
            id: IdentityId(7),
            email: "a@x.com".into(),
            secret_hash: "$argon2id$v=19$secret".into(),
            is_admin: false,
        };

        let rendered = format!("{identity:?}");
        assert!(rendered.contains("a@x.com"));
        assert!(!rendered.contains("argon2id"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Identifier of a client application (tenant). Zero is never a valid id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ApplicationId(pub i32);

impl ApplicationId {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ApplicationId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// A client application sharing the identity store. Each application signs
/// the tokens minted for it with its own secret.
#[derive(Clone)]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    secret: Zeroizing<String>,
}

impl Application {
    pub fn new(
        id: ApplicationId,
        name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

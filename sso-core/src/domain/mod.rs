//! Records the authentication core reads and writes.

mod application;
mod identity;

pub use application::{Application, ApplicationId};
pub use identity::{Identity, IdentityId};

//! Provider identifiers, consent permission sets, and bearer credential models.

pub mod credential;
pub mod id;
pub mod permission;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use permission::*;
pub use secret::*;

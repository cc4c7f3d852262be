//! Service-account credential model: scopes, redacted secrets, the per-call credential, the
//! cached access-token record, and assertion signers.

pub mod credential;
pub mod scope;
pub mod secret;
pub mod signer;
pub mod token;

pub use credential::*;
pub use scope::*;
pub use secret::*;
pub use signer::*;
pub use token::*;

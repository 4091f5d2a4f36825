//! Credential verification and token issuance.
//!
//! Passwords are checked with argon2, tokens are HS256-signed JWTs carrying
//! the claim set in [`Claims`].

mod claims;
pub mod handlers;
mod password;
mod service;
mod token;

pub use claims::Claims;
pub use password::PasswordHasher;
pub use service::TokenIssuanceService;
pub use token::{TokenConfig, TokenPair, TokenSigner, TOKEN_SCOPE, TOKEN_TYPE};

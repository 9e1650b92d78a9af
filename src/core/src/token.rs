//! Token issuer
//!
//! Components:
//! - `types`: request, grant and response types plus role/token-type parsing.
//! - `access_token`: the version "006" token format.
//! - `signer`: the `TokenSigner` capability and its access-token implementation.
//! - `issuer`: request validation and expiry resolution.

pub mod access_token;
pub mod issuer;
pub mod signer;
pub mod types;

pub use issuer::TokenIssuer;
pub use signer::{AccessTokenSigner, TokenSigner};
pub use types::*;

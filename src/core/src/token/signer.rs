use super::access_token::{AccessToken, Privilege, TOKEN_TTL_SECS};
use super::types::{Role, TokenGrant};
use crate::configuration::AppCredentials;
use crate::error_handling::types::TokenError;
use rand::Rng;

/// Capability that turns a validated grant into a signed token string.
///
/// Kept behind a trait so the issuer and the HTTP routes can be exercised
/// with a deterministic stub.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, credentials: &AppCredentials, grant: &TokenGrant) -> Result<String, TokenError>;
}

/// Signs version "006" access tokens.
#[derive(Debug, Clone, Default)]
pub struct AccessTokenSigner {
    fixed_salt: Option<u32>,
}

impl AccessTokenSigner {
    pub fn new() -> Self {
        Self { fixed_salt: None }
    }

    /// A signer whose output only depends on its inputs.
    pub fn with_salt(salt: u32) -> Self {
        Self {
            fixed_salt: Some(salt),
        }
    }

    fn privileges(role: Role) -> &'static [Privilege] {
        match role {
            Role::Publisher => &[
                Privilege::JoinChannel,
                Privilege::PublishAudioStream,
                Privilege::PublishVideoStream,
                Privilege::PublishDataStream,
            ],
            Role::Subscriber => &[Privilege::JoinChannel],
        }
    }
}

impl TokenSigner for AccessTokenSigner {
    fn sign(&self, credentials: &AppCredentials, grant: &TokenGrant) -> Result<String, TokenError> {
        let salt = self
            .fixed_salt
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..=99_999_999));
        let mut token = AccessToken::new(
            &credentials.app_id,
            &grant.channel,
            &grant.identity.as_signed_string(),
            salt,
            grant.issued_at.saturating_add(TOKEN_TTL_SECS),
        );
        for privilege in Self::privileges(grant.role) {
            token.add_privilege(*privilege, grant.privilege_expire);
        }
        token.build(&credentials.app_certificate)
    }
}

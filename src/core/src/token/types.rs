use serde::Serialize;

/// Role granted inside a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May publish audio, video and data streams.
    Publisher,
    /// Receive-only participant, called `audience` on the wire.
    Subscriber,
}

impl Role {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "publisher" => Some(Role::Publisher),
            "audience" => Some(Role::Subscriber),
            _ => None,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "audience",
        }
    }
}

/// How the participant is identified inside the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    UidBased,
    AccountBased,
}

impl TokenType {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "uid" => Some(TokenType::UidBased),
            "userAccount" => Some(TokenType::AccountBased),
            _ => None,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            TokenType::UidBased => "uid",
            TokenType::AccountBased => "userAccount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Uid(u32),
    Account(String),
}

impl Identity {
    /// String form that is hashed and signed. Uid 0 means "any user" and is
    /// encoded as the empty string.
    pub fn as_signed_string(&self) -> String {
        match self {
            Identity::Uid(0) => String::new(),
            Identity::Uid(uid) => uid.to_string(),
            Identity::Account(account) => account.clone(),
        }
    }
}

/// Token request exactly as received over HTTP, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRequest {
    pub channel: String,
    pub uid: String,
    pub role: String,
    pub token_type: String,
    pub expiry: Option<String>,
}

/// A validated request, ready to hand to a [`super::signer::TokenSigner`].
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub channel: String,
    pub identity: Identity,
    pub role: Role,
    /// Absolute Unix time (seconds) at which the granted privileges lapse.
    pub privilege_expire: u32,
    /// Unix time (seconds) of issuance.
    pub issued_at: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub channel_name: String,
    pub uid: String,
    #[serde(rename = "appid")]
    pub app_id: String,
}

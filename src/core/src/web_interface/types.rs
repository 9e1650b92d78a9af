use serde::{Deserialize, Serialize};

/// Error payload shared by every route.
#[derive(Serialize, Debug, PartialEq)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Body of `GET /`.
#[derive(Serialize, Debug, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
}

/// Query string of the token route.
#[derive(Deserialize, Debug, Default)]
pub struct TokenQuery {
    pub expiry: Option<String>,
}

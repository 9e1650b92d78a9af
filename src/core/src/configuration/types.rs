use serde::Serialize;
use std::fmt;

pub(crate) const REDACTED: &str = "<redacted>";

/// Debug stand-in for an optional secret: shows whether it is set, not its value.
pub(crate) fn redact_option(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

/// Application identity used to sign tokens.
#[derive(PartialEq, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_certificate: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_certificate", &REDACTED)
            .finish()
    }
}

/// Customer key/secret pair for the recording REST API.
#[derive(PartialEq, Clone)]
pub struct CustomerCredentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for CustomerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerCredentials")
            .field("key", &self.key)
            .field("secret", &REDACTED)
            .finish()
    }
}

/// Third-party object storage the recordings are uploaded to.
///
/// Serialized as-is into the `storageConfig` block of every start request.
#[derive(Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    pub vendor: i64,
    pub region: i64,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("vendor", &self.vendor)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &REDACTED)
            .finish()
    }
}

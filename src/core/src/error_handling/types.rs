use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    MissingValue(String),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::MissingValue(key) => write!(f, "Missing configuration value: {}", key),
            ConfigError::InvalidValue(key, reason) => {
                write!(f, "Invalid configuration value for {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

/// Failures of the token path. The `Display` text of the first four
/// variants is what callers see in the `{error}` body.
#[derive(Debug, PartialEq)]
pub enum TokenError {
    MissingChannel,
    MissingUid,
    InvalidRole,
    InvalidTokenType,
    InvalidExpiry(String),
    InvalidUid(String),
    SigningFailed(String),
    Malformed(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::MissingChannel => write!(f, "channel is required"),
            TokenError::MissingUid => write!(f, "uid is required"),
            TokenError::InvalidRole => write!(f, "role is incorrect"),
            TokenError::InvalidTokenType => write!(f, "token type is invalid"),
            TokenError::InvalidExpiry(raw) => write!(f, "expiry is invalid: {}", raw),
            TokenError::InvalidUid(raw) => {
                write!(f, "uid must be a 32-bit unsigned integer: {}", raw)
            }
            TokenError::SigningFailed(e) => write!(f, "token signing failed: {}", e),
            TokenError::Malformed(e) => write!(f, "malformed token: {}", e),
        }
    }
}

impl std::error::Error for TokenError {}

impl TokenError {
    /// Whether the failure was caused by the caller's input rather than the signer.
    pub fn is_validation(&self) -> bool {
        !matches!(self, TokenError::SigningFailed(_) | TokenError::Malformed(_))
    }
}

#[derive(Debug)]
pub enum RecordingError {
    Transport(String),
    Timeout,
    ClientBuild(String),
    InvalidPayload(String),
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::Transport(e) => write!(f, "Recording API transport error: {}", e),
            RecordingError::Timeout => write!(f, "Recording API request timed out"),
            RecordingError::ClientBuild(e) => write!(f, "Unable to build HTTP client: {}", e),
            RecordingError::InvalidPayload(e) => write!(f, "Unable to encode request body: {}", e),
        }
    }
}

impl std::error::Error for RecordingError {}

impl From<reqwest::Error> for RecordingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecordingError::Timeout
        } else {
            RecordingError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RecordingError {
    fn from(err: serde_json::Error) -> Self {
        RecordingError::InvalidPayload(err.to_string())
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    RecordingError(RecordingError),
    WebError(WebError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::RecordingError(e) => write!(f, "Recording error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web server error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<RecordingError> for ControllerError {
    fn from(err: RecordingError) -> Self {
        ControllerError::RecordingError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}

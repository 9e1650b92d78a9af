use serde::{Deserialize, Deserializer, Serialize};

/// Which recording flavour a route drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingKind {
    /// Renders a web page through the web-recorder extension.
    WebRecorder,
    /// Mixes the selected participants' streams into a single output.
    Composite,
}

impl RecordingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingKind::WebRecorder => "web-recorder",
            RecordingKind::Composite => "composite",
        }
    }
}

/// Participant identifier as found in request bodies. Clients send either a
/// JSON string or a number; the remote API always wants a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Uid(text),
            Raw::Number(number) => Uid(number.to_string()),
        })
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Uid(value.to_string())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AcquireRequest {
    pub channel: String,
    pub uid: Uid,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub resource: String,
    pub mode: String,
    #[serde(default)]
    pub url: Option<String>,
    pub channel: String,
    pub uid: Uid,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub subscribe_video_uids: Option<Vec<Uid>>,
    #[serde(default)]
    pub subscribe_audio_uids: Option<Vec<Uid>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StopRequest {
    pub resource: String,
    pub sid: String,
    pub mode: String,
    pub channel: String,
    pub uid: Uid,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub resource: String,
    pub sid: String,
    pub mode: String,
}

/// Status and body of a remote call, passed back to the caller untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

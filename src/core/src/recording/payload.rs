//! Outbound request bodies and paths for the cloud-recording REST API.
//!
//! All recording parameters that are not taken from the caller are fixed
//! here: resource lifetime, web-recorder rendering, composite transcoding,
//! output file types.

use super::types::*;
use crate::configuration::StorageConfig;
use serde::Serialize;
use urlencoding::encode;

pub const RESOURCE_EXPIRED_HOUR: u32 = 24;
pub const WEB_RECORDER_SCENE: u32 = 1;
pub const COMPOSITE_SCENE: u32 = 0;
pub const AV_FILE_TYPES: [&str; 2] = ["hls", "mp4"];
pub const ALL_STREAMS: &str = "#allstream#";

const ERROR_ABORT: &str = "error_abort";
const WEB_RECORDER_SERVICE: &str = "web_recorder_service";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcquireBody {
    pub cname: String,
    pub uid: Uid,
    pub client_request: AcquireClientRequest,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcquireClientRequest {
    pub resource_expired_hour: u32,
    pub scene: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
    pub cname: String,
    pub uid: Uid,
    pub client_request: StartClientRequest,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartClientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_service_config: Option<ExtensionServiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_config: Option<RecordingConfig>,
    pub recording_file_config: RecordingFileConfig,
    pub storage_config: StorageConfig,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionServiceConfig {
    pub error_handle_policy: &'static str,
    pub extension_services: Vec<ExtensionService>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionService {
    pub service_name: &'static str,
    pub error_handle_policy: &'static str,
    pub service_param: WebRecorderParam,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebRecorderParam {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub audio_profile: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub max_recording_hour: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingConfig {
    pub max_idle_time: u32,
    pub stream_types: u32,
    pub channel_type: u32,
    pub video_stream_type: u32,
    pub transcoding_config: TranscodingConfig,
    pub subscribe_video_uids: Vec<Uid>,
    pub subscribe_audio_uids: Vec<Uid>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscodingConfig {
    pub height: u32,
    pub width: u32,
    pub bitrate: u32,
    pub fps: u32,
    pub mixed_video_layout: u32,
    pub background_color: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingFileConfig {
    pub av_file_type: Vec<&'static str>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StopBody {
    pub cname: String,
    pub uid: Uid,
    pub client_request: EmptyClientRequest,
}

/// Serializes as `{}`.
#[derive(Debug, Serialize, PartialEq)]
pub struct EmptyClientRequest {}

pub fn acquire_body(request: &AcquireRequest, kind: RecordingKind) -> AcquireBody {
    AcquireBody {
        cname: request.channel.clone(),
        uid: request.uid.clone(),
        client_request: AcquireClientRequest {
            resource_expired_hour: RESOURCE_EXPIRED_HOUR,
            scene: match kind {
                RecordingKind::WebRecorder => WEB_RECORDER_SCENE,
                RecordingKind::Composite => COMPOSITE_SCENE,
            },
        },
    }
}

pub fn start_body(request: &StartRequest, kind: RecordingKind, storage: &StorageConfig) -> StartBody {
    let (extension_service_config, recording_config) = match kind {
        RecordingKind::WebRecorder => (Some(web_recorder_config(request)), None),
        RecordingKind::Composite => (None, Some(composite_config(request))),
    };

    StartBody {
        cname: request.channel.clone(),
        uid: request.uid.clone(),
        client_request: StartClientRequest {
            token: request.token.clone().filter(|t| !t.is_empty()),
            extension_service_config,
            recording_config,
            recording_file_config: RecordingFileConfig {
                av_file_type: AV_FILE_TYPES.to_vec(),
            },
            storage_config: storage.clone(),
        },
    }
}

pub fn stop_body(request: &StopRequest) -> StopBody {
    StopBody {
        cname: request.channel.clone(),
        uid: request.uid.clone(),
        client_request: EmptyClientRequest {},
    }
}

fn web_recorder_config(request: &StartRequest) -> ExtensionServiceConfig {
    ExtensionServiceConfig {
        error_handle_policy: ERROR_ABORT,
        extension_services: vec![ExtensionService {
            service_name: WEB_RECORDER_SERVICE,
            error_handle_policy: ERROR_ABORT,
            service_param: WebRecorderParam {
                url: request.url.clone(),
                audio_profile: 0,
                video_width: 1280,
                video_height: 720,
                max_recording_hour: 3,
            },
        }],
    }
}

fn composite_config(request: &StartRequest) -> RecordingConfig {
    let all_streams = || vec![Uid::from(ALL_STREAMS)];
    RecordingConfig {
        max_idle_time: 30,
        stream_types: 2,
        channel_type: 0,
        video_stream_type: 0,
        transcoding_config: TranscodingConfig {
            height: 640,
            width: 360,
            bitrate: 500,
            fps: 15,
            mixed_video_layout: 1,
            background_color: "#FF0000",
        },
        subscribe_video_uids: request
            .subscribe_video_uids
            .clone()
            .filter(|uids| !uids.is_empty())
            .unwrap_or_else(all_streams),
        subscribe_audio_uids: request
            .subscribe_audio_uids
            .clone()
            .filter(|uids| !uids.is_empty())
            .unwrap_or_else(all_streams),
    }
}

pub fn acquire_path() -> String {
    "/acquire".to_string()
}

pub fn start_path(resource: &str, mode: &str) -> String {
    format!(
        "/resourceid/{}/mode/{}/start",
        encode(resource),
        encode(mode)
    )
}

pub fn stop_path(resource: &str, sid: &str, mode: &str) -> String {
    format!(
        "/resourceid/{}/sid/{}/mode/{}/stop",
        encode(resource),
        encode(sid),
        encode(mode)
    )
}

pub fn query_path(resource: &str, sid: &str, mode: &str) -> String {
    format!(
        "/resourceid/{}/sid/{}/mode/{}/query",
        encode(resource),
        encode(sid),
        encode(mode)
    )
}

use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    CACHE_CONTROL, EXPIRES, PRAGMA,
};
use warp::http::{Method, StatusCode};
use warp::reply::Response;
use warp::{reply, Filter, Rejection, Reply};

use super::types::{ApiError, ServiceInfo, TokenQuery};
use crate::error_handling::types::{RecordingError, TokenError};
use crate::recording::{
    AcquireRequest, QueryRequest, RecordingKind, RecordingProxy, RemoteResponse, StartRequest,
    StopRequest,
};
use crate::token::{TokenIssuer, TokenRequest, TokenResponse};

const BODY_LIMIT: u64 = 64 * 1024;

/// Every route of the service, with error recovery and CORS applied.
pub fn all_routes(
    issuer: Arc<TokenIssuer>,
    proxy: Arc<RecordingProxy>,
    service_name: String,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    preflight_route()
        .or(service_info_route(service_name))
        .or(token_route(issuer))
        .or(recording_routes(proxy))
        .recover(handle_rejection)
        .with(warp::reply::with::header("access-control-allow-origin", "*"))
}

/// The recording routes, web-recorder and composite flavours.
pub fn recording_routes(
    proxy: Arc<RecordingProxy>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let acquire = recording_route("acquire", proxy.clone(), |proxy, body: AcquireRequest| async move {
        proxy.acquire(&body, RecordingKind::WebRecorder).await
    });
    let start = recording_route("start", proxy.clone(), |proxy, body: StartRequest| async move {
        proxy.start(&body, RecordingKind::WebRecorder).await
    });
    let stop = recording_route("stop", proxy.clone(), |proxy, body: StopRequest| async move {
        proxy.stop(&body).await
    });
    let query = recording_route("query", proxy.clone(), |proxy, body: QueryRequest| async move {
        proxy.query(&body).await
    });
    let acquire_composite = recording_route(
        "acquire-composite-recording",
        proxy.clone(),
        |proxy, body: AcquireRequest| async move {
            proxy.acquire(&body, RecordingKind::Composite).await
        },
    );
    let start_composite = recording_route(
        "start-composite-recording",
        proxy.clone(),
        |proxy, body: StartRequest| async move {
            proxy.start(&body, RecordingKind::Composite).await
        },
    );
    let stop_composite = recording_route(
        "stop-composite-recording",
        proxy,
        |proxy, body: StopRequest| async move { proxy.stop(&body).await },
    );

    acquire
        .or(start)
        .unify()
        .or(stop)
        .unify()
        .or(query)
        .unify()
        .or(acquire_composite)
        .unify()
        .or(start_composite)
        .unify()
        .or(stop_composite)
        .unify()
        .with(warp::reply::with::headers(no_cache_headers()))
}

/// OPTIONS on any path
///
/// Other methods are rejected as not found rather than with `warp::options()`'s
/// method-not-allowed, which would otherwise outrank every 404.
pub fn preflight_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::method()
        .and_then(|method: Method| async move {
            if method == Method::OPTIONS {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
        .map(|| {
            let mut response = StatusCode::NO_CONTENT.into_response();
            let headers = response.headers_mut();
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, OPTIONS"),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, Authorization"),
            );
            response
        })
}

/// GET /
pub fn service_info_route(
    service_name: String,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).map(move || {
        reply::json(&ServiceInfo {
            name: service_name.clone(),
        })
    })
}

/// GET /rtc/:channel/:role/:tokentype/:uid?expiry=N
pub fn token_route(
    issuer: Arc<TokenIssuer>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("rtc" / String / String / String / String)
        .and(warp::get())
        .and(warp::query::<TokenQuery>())
        .map(
            move |channel: String, role: String, token_type: String, uid: String, query: TokenQuery| {
                let request = TokenRequest {
                    channel: decode_segment(&channel),
                    uid: decode_segment(&uid),
                    role: decode_segment(&role),
                    token_type: decode_segment(&token_type),
                    expiry: query.expiry,
                };
                token_reply(issuer.issue(&request))
            },
        )
        .with(warp::reply::with::headers(no_cache_headers()))
}

fn recording_route<T, F, Fut>(
    name: &'static str,
    proxy: Arc<RecordingProxy>,
    call: F,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(Arc<RecordingProxy>, T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<RemoteResponse, RecordingError>> + Send,
{
    warp::path(name)
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json::<T>())
        .and_then(move |body: T| {
            let proxy = proxy.clone();
            let call = call.clone();
            async move { Ok::<_, Rejection>(remote_reply(call(proxy, body).await)) }
        })
}

fn token_reply(result: Result<TokenResponse, TokenError>) -> Response {
    match result {
        Ok(token) => reply::with_status(reply::json(&token), StatusCode::OK).into_response(),
        Err(e) => {
            let status = if e.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            reply::with_status(reply::json(&ApiError::new(e.to_string())), status).into_response()
        }
    }
}

/// Remote answers keep their status and body; local failures become 502/504.
fn remote_reply(result: Result<RemoteResponse, RecordingError>) -> Response {
    match result {
        Ok(remote) => {
            let status = StatusCode::from_u16(remote.status).unwrap_or(StatusCode::BAD_GATEWAY);
            reply::with_status(reply::json(&remote.body), status).into_response()
        }
        Err(e) => {
            let status = match e {
                RecordingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                RecordingError::InvalidPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            };
            reply::with_status(reply::json(&ApiError::new(e.to_string())), status).into_response()
        }
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("private, no-cache, no-store, must-revalidate"),
    );
    headers.insert(EXPIRES, HeaderValue::from_static("-1"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "content-length header is required".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "content-type must be application/json".to_string(),
        )
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid query string".to_string())
    } else {
        (StatusCode::BAD_REQUEST, "bad request".to_string())
    };
    Ok(reply::with_status(reply::json(&ApiError::new(message)), status).into_response())
}

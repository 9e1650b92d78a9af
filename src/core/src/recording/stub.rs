//! Scripted [`RecordingApi`] for tests.

use super::client::{ApiFuture, RecordingApi};
use super::types::RemoteResponse;
use crate::error_handling::types::RecordingError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Post(String, Value),
    Get(String),
}

/// Answers calls from a queue of scripted outcomes and records every call.
/// Once the queue is empty it answers `200 {}`.
#[derive(Default)]
pub struct StubRecordingApi {
    calls: Mutex<Vec<Call>>,
    outcomes: Mutex<VecDeque<Result<RemoteResponse, RecordingError>>>,
}

impl StubRecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(RemoteResponse { status, body }));
    }

    pub fn fail(&self, error: RecordingError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: Call) -> ApiFuture {
        self.calls.lock().unwrap().push(call);
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(RemoteResponse {
            status: 200,
            body: Value::Object(Default::default()),
        }));
        Box::pin(async move { outcome })
    }
}

impl RecordingApi for StubRecordingApi {
    fn post(&self, path: &str, body: Value) -> ApiFuture {
        self.answer(Call::Post(path.to_string(), body))
    }

    fn get(&self, path: &str) -> ApiFuture {
        self.answer(Call::Get(path.to_string()))
    }
}

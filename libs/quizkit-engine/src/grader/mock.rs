//! Scripted grader for tests and offline hosts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{GradeError, GradeRequest, GradeResponse, SemanticGrader};

/// Returns a fixed response (or failure) and records what it was asked.
pub struct MockGrader {
    response: Option<GradeResponse>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GradeRequest>>,
}

impl MockGrader {
    /// A grader that always answers with `response`.
    pub fn answering(response: GradeResponse) -> Self {
        Self {
            response: Some(response),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A grader that always fails with a network error.
    pub fn failing() -> Self {
        Self {
            response: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GradeRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SemanticGrader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn grade(&self, request: &GradeRequest) -> Result<GradeResponse, GradeError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        self.response
            .clone()
            .ok_or_else(|| GradeError::Network("mock grader offline".to_string()))
    }
}

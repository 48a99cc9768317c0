//! Scripted oracle for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::oracle::Oracle;
use crate::request::{CallKind, OracleRequest};
use crate::response::OracleResponse;

/// One scripted outcome for a mock invocation.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this text.
    Respond(String),
    /// Return an empty payload.
    Empty,
    /// Fail with a provider error carrying this message.
    Fail(String),
}

impl MockOutcome {
    /// Scripts a successful response carrying a JSON-encoded value.
    pub fn json<T: Serialize>(value: &T) -> Self {
        Self::Respond(serde_json::to_string(value).expect("mock payload must serialize"))
    }
}

/// A recorded mock invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub kind: CallKind,
    pub stage: Option<u32>,
}

/// An [`Oracle`] that replays scripted outcomes keyed by call site.
///
/// Outcomes enqueued for the same `(kind, stage)` key are consumed in order,
/// one per invocation, which makes retry sequences easy to stage. Every
/// invocation is recorded so tests can assert on call counts and ordering.
#[derive(Debug, Default)]
pub struct MockOracle {
    script: Mutex<HashMap<(CallKind, Option<u32>), VecDeque<MockOutcome>>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an outcome for the given call site.
    pub fn enqueue(&self, kind: CallKind, stage: Option<u32>, outcome: MockOutcome) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .entry((kind, stage))
            .or_default()
            .push_back(outcome);
    }

    /// Returns all invocations recorded so far, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .expect("mock invocation lock poisoned")
            .clone()
    }

    /// Returns how many times the given call site was invoked.
    pub fn call_count(&self, kind: CallKind, stage: Option<u32>) -> usize {
        self.invocations()
            .iter()
            .filter(|inv| inv.kind == kind && inv.stage == stage)
            .count()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn invoke(&self, request: &OracleRequest) -> Result<OracleResponse> {
        let key = (request.kind, request.stage);
        self.invocations
            .lock()
            .expect("mock invocation lock poisoned")
            .push(Invocation {
                kind: request.kind,
                stage: request.stage,
            });

        let outcome = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match outcome {
            Some(MockOutcome::Respond(text)) => Ok(OracleResponse::new(text)),
            Some(MockOutcome::Empty) => Ok(OracleResponse::new("")),
            Some(MockOutcome::Fail(message)) => Err(Error::provider("mock", message)),
            None => Err(Error::provider(
                "mock",
                format!("no scripted outcome for {:?} stage {:?}", key.0, key.1),
            )),
        }
    }
}

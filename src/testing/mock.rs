//! Mock objects and fake implementations for testing
//!
//! Every mock records into a shared [`CallLog`] so a test can check which
//! collaborators a flow touched and in what order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::ceremony::{
    AssertionResponse, AttestationResponse, BrokerError, CeremonyError, CeremonyOptions,
    CeremonyTransport, CredentialBroker, Endpoint, LocationError, StatusSink,
};
use crate::location::{Location, LocationProvider};

use super::fixtures::TestFixtures;

/// One interaction with a collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// Location was requested
    Location,
    /// JSON was posted to an endpoint
    Post { endpoint: Endpoint, body: Value },
    /// Broker was asked to create a credential from these options
    CreateCredential(Value),
    /// Broker was asked for an assertion over these options
    GetAssertion(Value),
}

/// Ordered record of collaborator calls, shared between mocks
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// All calls so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bodies posted to `endpoint`, in order
    #[must_use]
    pub fn posts_to(&self, endpoint: Endpoint) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Post {
                    endpoint: target,
                    body,
                } if target == endpoint => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Number of network requests of any kind
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Post { .. }))
            .count()
    }

    /// Number of broker invocations of either kind
    #[must_use]
    pub fn broker_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    RecordedCall::CreateCredential(_) | RecordedCall::GetAssertion(_)
                )
            })
            .count()
    }

    /// Index of the first call matching `predicate`
    pub fn position(&self, predicate: impl Fn(&RecordedCall) -> bool) -> Option<usize> {
        self.calls().iter().position(predicate)
    }
}

/// Transport answering from per-endpoint scripts
///
/// Each endpoint has a queue of replies consumed one per request. A request
/// to an endpoint with an empty queue fails with a transport error.
pub struct MockTransport {
    log: CallLog,
    replies: Mutex<HashMap<Endpoint, VecDeque<Result<Value, CeremonyError>>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            replies: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the script of `endpoint` with a single reply
    #[must_use]
    pub fn with_reply(self, endpoint: Endpoint, reply: Value) -> Self {
        self.with_script(endpoint, vec![Ok(reply)])
    }

    /// Replace the script of `endpoint` with a single transport failure
    #[must_use]
    pub fn with_failure(self, endpoint: Endpoint, error: CeremonyError) -> Self {
        self.with_script(endpoint, vec![Err(error)])
    }

    /// Replace the script of `endpoint`
    #[must_use]
    pub fn with_script(
        self,
        endpoint: Endpoint,
        script: Vec<Result<Value, CeremonyError>>,
    ) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, script.into());
        self
    }
}

#[async_trait]
impl CeremonyTransport for MockTransport {
    async fn post_json(&self, endpoint: Endpoint, body: &Value) -> Result<Value, CeremonyError> {
        self.log.record(RecordedCall::Post {
            endpoint,
            body: body.clone(),
        });
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(CeremonyError::TransportFailure(format!(
                    "no scripted reply for {endpoint}"
                )))
            })
    }
}

/// Broker returning fixed credentials or a fixed rejection
pub struct MockBroker {
    log: CallLog,
    attestation: Result<AttestationResponse, BrokerError>,
    assertion: Result<AssertionResponse, BrokerError>,
}

impl MockBroker {
    /// Broker that succeeds with the fixture credentials
    #[must_use]
    pub fn succeeding(log: CallLog) -> Self {
        Self {
            log,
            attestation: Ok(AttestationResponse::new(TestFixtures::attestation())),
            assertion: Ok(AssertionResponse::new(TestFixtures::assertion())),
        }
    }

    /// Broker that rejects both operations with `error`
    #[must_use]
    pub fn rejecting(log: CallLog, error: &BrokerError) -> Self {
        Self {
            log,
            attestation: Err(error.clone()),
            assertion: Err(error.clone()),
        }
    }

    #[must_use]
    pub fn with_attestation(mut self, credential: Value) -> Self {
        self.attestation = Ok(AttestationResponse::new(credential));
        self
    }

    #[must_use]
    pub fn with_assertion(mut self, credential: Value) -> Self {
        self.assertion = Ok(AssertionResponse::new(credential));
        self
    }
}

#[async_trait]
impl CredentialBroker for MockBroker {
    async fn create_credential(
        &self,
        options: &CeremonyOptions,
    ) -> Result<AttestationResponse, BrokerError> {
        self.log
            .record(RecordedCall::CreateCredential(options.as_json().clone()));
        self.attestation.clone()
    }

    async fn get_assertion(
        &self,
        options: &CeremonyOptions,
    ) -> Result<AssertionResponse, BrokerError> {
        self.log
            .record(RecordedCall::GetAssertion(options.as_json().clone()));
        self.assertion.clone()
    }
}

/// Location provider with a fixed answer
pub struct MockLocationProvider {
    log: CallLog,
    result: Result<Location, LocationError>,
}

impl MockLocationProvider {
    #[must_use]
    pub fn new(log: CallLog, result: Result<Location, LocationError>) -> Self {
        Self { log, result }
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn current_location(&self) -> Result<Location, LocationError> {
        self.log.record(RecordedCall::Location);
        self.result.clone()
    }
}

/// Status sink keeping every published line
#[derive(Default)]
pub struct RecordingStatusSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingStatusSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recently published line
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.messages().pop()
    }
}

impl StatusSink for RecordingStatusSink {
    fn publish(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

//! Fluent builder wiring mocks into a [`CeremonyClient`]
//!
//! By default every collaborator succeeds: the transport answers both flows
//! with fixture options and a verified reply for [`TEST_USERNAME`], the broker
//! returns fixture credentials and the location is the office.

use std::sync::Arc;

use serde_json::Value;

use super::constants::TEST_USERNAME;
use super::fixtures::TestFixtures;
use super::mock::{CallLog, MockBroker, MockLocationProvider, MockTransport, RecordingStatusSink};
use crate::ceremony::{BrokerError, CeremonyClient, CeremonyError, Endpoint, LocationError};
use crate::location::{Geofence, Location};

/// Builder for a mock-backed client
pub struct TestHarness {
    log: CallLog,
    transport: MockTransport,
    broker: MockBroker,
    location: Result<Location, LocationError>,
    geofence: Option<Geofence>,
}

/// A built client together with the handles tests inspect
pub struct BuiltHarness {
    pub client: CeremonyClient,
    pub log: CallLog,
    pub status: Arc<RecordingStatusSink>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    #[must_use]
    pub fn new() -> Self {
        let log = CallLog::new();
        let transport = MockTransport::new(log.clone())
            .with_reply(Endpoint::RegisterStart, TestFixtures::registration_options())
            .with_reply(
                Endpoint::RegisterFinish,
                TestFixtures::verified_reply(TEST_USERNAME),
            )
            .with_reply(Endpoint::LoginStart, TestFixtures::login_options())
            .with_reply(
                Endpoint::LoginFinish,
                TestFixtures::verified_reply(TEST_USERNAME),
            );
        Self {
            broker: MockBroker::succeeding(log.clone()),
            log,
            transport,
            location: Ok(TestFixtures::office_location()),
            geofence: None,
        }
    }

    /// Script a single reply for `endpoint`
    #[must_use]
    pub fn with_reply(mut self, endpoint: Endpoint, reply: Value) -> Self {
        self.transport = self.transport.with_reply(endpoint, reply);
        self
    }

    /// Script several replies for `endpoint`, consumed in order
    #[must_use]
    pub fn with_replies(mut self, endpoint: Endpoint, replies: Vec<Value>) -> Self {
        self.transport = self
            .transport
            .with_script(endpoint, replies.into_iter().map(Ok).collect());
        self
    }

    /// Make requests to `endpoint` fail at the transport level
    #[must_use]
    pub fn with_transport_failure(mut self, endpoint: Endpoint, message: &str) -> Self {
        self.transport = self.transport.with_failure(
            endpoint,
            CeremonyError::TransportFailure(message.to_string()),
        );
        self
    }

    /// Make the broker reject both operations
    #[must_use]
    pub fn with_broker_error(mut self, error: &BrokerError) -> Self {
        self.broker = MockBroker::rejecting(self.log.clone(), error);
        self
    }

    #[must_use]
    pub fn with_attestation(mut self, credential: Value) -> Self {
        self.broker = self.broker.with_attestation(credential);
        self
    }

    #[must_use]
    pub fn with_assertion(mut self, credential: Value) -> Self {
        self.broker = self.broker.with_assertion(credential);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Result<Location, LocationError>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_geofence(mut self, geofence: Geofence) -> Self {
        self.geofence = Some(geofence);
        self
    }

    #[must_use]
    pub fn build(self) -> BuiltHarness {
        let status = Arc::new(RecordingStatusSink::new());
        let client = CeremonyClient::new(
            Arc::new(self.transport),
            Arc::new(self.broker),
            Arc::new(MockLocationProvider::new(self.log.clone(), self.location)),
            status.clone(),
        )
        .with_geofence(self.geofence);

        BuiltHarness {
            client,
            log: self.log,
            status,
        }
    }
}

//! Testing utilities for clockin
//!
//! Mocks for every collaborator of [`CeremonyClient`](crate::CeremonyClient)
//! sharing one [`CallLog`](mock::CallLog), so tests can assert both what was
//! called and in which order.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built ceremony payloads and server replies
//! - [`mock`] - Mock transport, broker, location provider and status sink
//! - [`harness`] - Builder wiring the mocks into a client
//!
//! ## Usage
//!
//! ```ignore
//! use clockin::testing::TestHarness;
//!
//! # async fn example() {
//! let harness = TestHarness::new().build();
//! let outcome = harness.client.login("alice").await.unwrap();
//! assert_eq!(outcome.username, "alice");
//! assert_eq!(harness.status.messages(), vec!["Successfully clocked in alice!"]);
//! # }
//! ```

pub mod fixtures;
pub mod harness;
pub mod mock;

pub use fixtures::TestFixtures;
pub use harness::{BuiltHarness, TestHarness};
pub use mock::{
    CallLog, MockBroker, MockLocationProvider, MockTransport, RecordedCall, RecordingStatusSink,
};

/// Common test constants
pub mod constants {
    /// Default test username
    pub const TEST_USERNAME: &str = "alice";

    /// Office coordinates used by the default geofence
    pub const OFFICE_LATITUDE: f64 = 37.7749;
    pub const OFFICE_LONGITUDE: f64 = -122.4194;

    /// Challenge embedded in fixture options
    pub const TEST_CHALLENGE: &str = "dGVzdC1jaGFsbGVuZ2UtMTIzNDU2Nzg5MA";

    /// Credential id embedded in fixture credentials
    pub const TEST_CREDENTIAL_ID: &str = "Y3JlZGVudGlhbC0xMjM0";
}

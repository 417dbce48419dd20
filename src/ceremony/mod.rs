//! Passkey ceremony orchestration
//!
//! This module drives the two `WebAuthn` ceremonies a clock-in terminal needs:
//! registering a passkey and clocking in with it. The relying party, the
//! platform authenticator and the location source are reached through traits.

mod broker;
mod errors;
mod flow;
mod status;
mod transport;
mod types;

pub use broker::CredentialBroker;
pub use errors::{BrokerError, CeremonyError, LocationError};
pub use flow::{CeremonyClient, FlowResult, FlowStage, StageTracker};
pub use status::{FnStatusSink, LatestStatus, LogStatusSink, StatusSink};
pub use transport::{CeremonyTransport, HttpTransport};
pub use types::{
    AssertionResponse, AttestationResponse, CeremonyOptions, CeremonyOutcome, CeremonyRequest,
    Endpoint, FlowKind, LoginFinishRequest, ServerReply, Verified,
};

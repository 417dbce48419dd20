//! Flow orchestration for registration and clock-in
//!
//! [`CeremonyClient`] sequences the relying-party round-trips and the platform
//! broker call for each flow. Every step's failure short-circuits the rest of
//! the chain; nothing is retried. Each invocation publishes exactly one status
//! line and returns the typed result to the caller.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use super::broker::CredentialBroker;
use super::errors::CeremonyError;
use super::status::StatusSink;
use super::transport::{CeremonyTransport, HttpTransport};
use super::types::{
    CeremonyOptions, CeremonyOutcome, CeremonyRequest, FlowKind, LoginFinishRequest, ServerReply,
    Verified,
};
use crate::location::{Geofence, LocationProvider};
use crate::settings::ClientSettings;
use crate::utils::logging::LoggingHelper;

/// How a flow ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowResult {
    Success,
    Failure,
}

/// Position of a flow invocation in its chain
///
/// Transitions only move forward. Registration skips `AwaitingPrecondition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    AwaitingPrecondition,
    AwaitingOptions,
    AwaitingCredential,
    AwaitingVerification,
    Done(FlowResult),
}

impl FlowStage {
    fn rank(self) -> u8 {
        match self {
            FlowStage::Idle => 0,
            FlowStage::AwaitingPrecondition => 1,
            FlowStage::AwaitingOptions => 2,
            FlowStage::AwaitingCredential => 3,
            FlowStage::AwaitingVerification => 4,
            FlowStage::Done(_) => 5,
        }
    }

    /// Whether `next` is a legal successor of this stage
    #[must_use]
    pub fn can_advance_to(self, next: FlowStage) -> bool {
        next.rank() > self.rank()
    }

    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, FlowStage::Done(_))
    }
}

/// Tracks and logs the stage of one flow invocation
#[derive(Debug)]
pub struct StageTracker {
    kind: FlowKind,
    stage: FlowStage,
}

impl StageTracker {
    #[must_use]
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            stage: FlowStage::Idle,
        }
    }

    #[must_use]
    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    /// Move to `next`
    ///
    /// Backward moves are a programming error: they trip a debug assertion and
    /// are ignored in release builds.
    pub fn advance(&mut self, next: FlowStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal {} transition {:?} -> {:?}",
            self.kind.name(),
            self.stage,
            next
        );
        if !self.stage.can_advance_to(next) {
            return;
        }
        LoggingHelper::log_stage_transition(self.kind, self.stage, next);
        self.stage = next;
    }

    /// Move to `Done` unless already there
    pub fn finish(&mut self, result: FlowResult) {
        if !self.stage.is_done() {
            self.advance(FlowStage::Done(result));
        }
    }
}

/// Drives registration and clock-in ceremonies against a relying party
///
/// Holds only shared collaborators, so one client can serve concurrent
/// invocations; each runs its own independent chain.
pub struct CeremonyClient {
    transport: Arc<dyn CeremonyTransport>,
    broker: Arc<dyn CredentialBroker>,
    location: Arc<dyn LocationProvider>,
    status: Arc<dyn StatusSink>,
    geofence: Option<Geofence>,
}

impl CeremonyClient {
    /// Create a client from its collaborators, with no geofence
    #[must_use]
    pub fn new(
        transport: Arc<dyn CeremonyTransport>,
        broker: Arc<dyn CredentialBroker>,
        location: Arc<dyn LocationProvider>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            transport,
            broker,
            location,
            status,
            geofence: None,
        }
    }

    /// Create a client talking HTTP to the server described by `settings`
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL, an endpoint path or the geofence
    /// settings are invalid.
    pub fn from_settings(
        settings: &ClientSettings,
        broker: Arc<dyn CredentialBroker>,
        location: Arc<dyn LocationProvider>,
        status: Arc<dyn StatusSink>,
    ) -> anyhow::Result<Self> {
        let transport =
            HttpTransport::from_settings(&settings.server).context("Failed to build transport")?;
        let geofence =
            Geofence::from_settings(&settings.geofence).context("Invalid geofence settings")?;
        Ok(Self::new(Arc::new(transport), broker, location, status).with_geofence(geofence))
    }

    /// Refuse clock-ins from outside `geofence` before contacting the server
    #[must_use]
    pub fn with_geofence(mut self, geofence: Option<Geofence>) -> Self {
        self.geofence = geofence;
        self
    }

    /// Register a new passkey for `username`
    ///
    /// # Errors
    ///
    /// - [`CeremonyError::EmptyInput`] for a blank username (no request is sent)
    /// - [`CeremonyError::ServerRejected`] if either endpoint replies with `error`
    /// - [`CeremonyError::CredentialCreationFailed`] if the broker refuses
    /// - [`CeremonyError::TransportFailure`] on network or JSON failures
    pub async fn register(&self, username: &str) -> Result<CeremonyOutcome, CeremonyError> {
        let mut stages = StageTracker::new(FlowKind::Registration);
        let result = self.run_registration(username, &mut stages).await;
        self.settle(FlowKind::Registration, &mut stages, result)
    }

    /// Clock in `username` with a passkey assertion and the current location
    ///
    /// # Errors
    ///
    /// - [`CeremonyError::EmptyInput`] for a blank username (no request is sent)
    /// - [`CeremonyError::LocationUnsupported`] / [`CeremonyError::LocationUnavailable`]
    ///   when no location could be acquired (no request is sent)
    /// - [`CeremonyError::OutsideGeofence`] when a geofence is set and violated
    /// - [`CeremonyError::ServerRejected`] if either endpoint replies with `error`
    /// - [`CeremonyError::CredentialAssertionFailed`] if the broker refuses
    /// - [`CeremonyError::TransportFailure`] on network or JSON failures
    pub async fn login(&self, username: &str) -> Result<CeremonyOutcome, CeremonyError> {
        let mut stages = StageTracker::new(FlowKind::Login);
        let result = self.run_login(username, &mut stages).await;
        self.settle(FlowKind::Login, &mut stages, result)
    }

    async fn run_registration(
        &self,
        username: &str,
        stages: &mut StageTracker,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        let request = CeremonyRequest::new(username)?;

        stages.advance(FlowStage::AwaitingOptions);
        let options = self.request_options(FlowKind::Registration, &request).await?;

        stages.advance(FlowStage::AwaitingCredential);
        let credential = self
            .broker
            .create_credential(&options)
            .await
            .map_err(|e| CeremonyError::CredentialCreationFailed(e.to_string()))?;

        stages.advance(FlowStage::AwaitingVerification);
        let body = serde_json::to_value(&credential)?;
        let verified = self.verify(FlowKind::Registration, &body).await?;

        Ok(CeremonyOutcome::new(FlowKind::Registration, verified))
    }

    async fn run_login(
        &self,
        username: &str,
        stages: &mut StageTracker,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        let request = CeremonyRequest::new(username)?;

        stages.advance(FlowStage::AwaitingPrecondition);
        let location = self.location.current_location().await.map_err(|e| {
            LoggingHelper::log_location_failure(&e);
            CeremonyError::from(e)
        })?;
        if let Some(geofence) = &self.geofence {
            geofence.check(&location)?;
        }

        stages.advance(FlowStage::AwaitingOptions);
        let options = self.request_options(FlowKind::Login, &request).await?;

        stages.advance(FlowStage::AwaitingCredential);
        let credential = self
            .broker
            .get_assertion(&options)
            .await
            .map_err(|e| CeremonyError::CredentialAssertionFailed(e.to_string()))?;

        stages.advance(FlowStage::AwaitingVerification);
        let body = serde_json::to_value(LoginFinishRequest {
            credential: &credential,
            location: &location,
        })?;
        let verified = self.verify(FlowKind::Login, &body).await?;

        Ok(CeremonyOutcome::new(FlowKind::Login, verified))
    }

    /// `start` round-trip: username in, ceremony options out
    async fn request_options(
        &self,
        kind: FlowKind,
        request: &CeremonyRequest,
    ) -> Result<CeremonyOptions, CeremonyError> {
        let body = serde_json::to_value(request)?;
        let reply = self.transport.post_json(kind.start_endpoint(), &body).await?;
        let accepted = ServerReply::from_json(reply).into_accepted()?;
        let options = CeremonyOptions::from_reply(accepted)?;
        LoggingHelper::log_options_received(kind, &options);
        Ok(options)
    }

    /// `finish` round-trip: credential in, verified username out
    async fn verify(&self, kind: FlowKind, body: &Value) -> Result<Verified, CeremonyError> {
        let reply = self.transport.post_json(kind.finish_endpoint(), body).await?;
        let accepted = ServerReply::from_json(reply).into_accepted()?;
        Verified::from_reply(accepted)
    }

    /// Publish the single status line and close the stage tracker
    fn settle(
        &self,
        kind: FlowKind,
        stages: &mut StageTracker,
        result: Result<CeremonyOutcome, CeremonyError>,
    ) -> Result<CeremonyOutcome, CeremonyError> {
        match &result {
            Ok(outcome) => {
                stages.finish(FlowResult::Success);
                LoggingHelper::log_flow_success(outcome);
                self.status.publish(&outcome.status_message());
            }
            Err(error) => {
                LoggingHelper::log_flow_failure(kind, stages.stage(), error);
                stages.finish(FlowResult::Failure);
                self.status.publish(&error.status_message());
            }
        }
        result
    }
}

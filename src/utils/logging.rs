// Centralized logging utilities to keep ceremony log lines consistent
use log::{debug, info, warn};
use url::Url;

use crate::ceremony::{
    CeremonyError, CeremonyOptions, CeremonyOutcome, Endpoint, FlowKind, FlowStage, LocationError,
};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a stage transition of a flow invocation
    pub fn log_stage_transition(kind: FlowKind, from: FlowStage, to: FlowStage) {
        debug!("{} flow: {:?} -> {:?}", kind.name(), from, to);
    }

    /// Log an outgoing relying-party request
    pub fn log_request(endpoint: Endpoint, url: &Url) {
        debug!("🔄 POST {} ({})", endpoint, url);
    }

    /// Log a relying-party reply; the status code is informational only
    pub fn log_response(endpoint: Endpoint, status: u16, body_len: usize) {
        debug!("Reply from {}: HTTP {} ({} bytes)", endpoint, status, body_len);
    }

    /// Log receipt of ceremony options without dumping the payload
    pub fn log_options_received(kind: FlowKind, options: &CeremonyOptions) {
        debug!(
            "Received {} ceremony options (challenge {})",
            kind.name(),
            if options.challenge().is_some() {
                "present"
            } else {
                "missing"
            }
        );
    }

    /// Log why location acquisition failed
    pub fn log_location_failure(error: &LocationError) {
        warn!("Location acquisition failed: {}", error);
    }

    /// Log a completed flow
    pub fn log_flow_success(outcome: &CeremonyOutcome) {
        info!(
            "✅ {} succeeded for {} at {}",
            outcome.kind.name(),
            outcome.username,
            outcome.completed_at.to_rfc3339()
        );
    }

    /// Log a failed flow with the stage it failed in
    pub fn log_flow_failure(kind: FlowKind, stage: FlowStage, error: &CeremonyError) {
        warn!(
            "❌ {} failed while {:?}: {} ({})",
            kind.name(),
            stage,
            error,
            error.kind()
        );
    }
}

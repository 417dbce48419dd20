//! Platform credential broker seam
//!
//! The broker turns ceremony options into a signed credential. In a browser
//! this is `navigator.credentials`; natively it is an authenticator library.
//! Neither is implemented here.

use async_trait::async_trait;

use super::errors::BrokerError;
use super::types::{AssertionResponse, AttestationResponse, CeremonyOptions};

/// Creates and asserts `WebAuthn` credentials on behalf of the user
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Create a new credential from registration options
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] on user cancellation, timeout or when no
    /// authenticator supports the options.
    async fn create_credential(
        &self,
        options: &CeremonyOptions,
    ) -> Result<AttestationResponse, BrokerError>;

    /// Sign the challenge in authentication options
    ///
    /// # Errors
    ///
    /// Same failure modes as [`create_credential`](Self::create_credential).
    async fn get_assertion(
        &self,
        options: &CeremonyOptions,
    ) -> Result<AssertionResponse, BrokerError>;
}

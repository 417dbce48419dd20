//! Test fixtures providing pre-built ceremony payloads
//!
//! Options mirror what a Python `webauthn` relying party emits, credentials
//! mirror what a browser returns. Contents are opaque to the client, so only
//! their shape matters.

use serde_json::{json, Value};

use super::constants::{
    OFFICE_LATITUDE, OFFICE_LONGITUDE, TEST_CHALLENGE, TEST_CREDENTIAL_ID,
};
use crate::location::Location;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Registration options as a bare `PublicKeyCredentialCreationOptions`
    #[must_use]
    pub fn registration_options() -> Value {
        json!({
            "rp": {"name": "Attendance System", "id": "localhost"},
            "user": {
                "id": "NmQ4ZjJhNGUtNGNhMS00YjVmLWE1NjEtN2Q1ZjJiYjE4ZTll",
                "name": "alice",
                "displayName": "alice"
            },
            "challenge": TEST_CHALLENGE,
            "pubKeyCredParams": [
                {"type": "public-key", "alg": -7},
                {"type": "public-key", "alg": -257}
            ],
            "timeout": 60000,
            "excludeCredentials": [],
            "authenticatorSelection": {
                "residentKey": "preferred",
                "requireResidentKey": false,
                "userVerification": "preferred"
            },
            "attestation": "none"
        })
    }

    /// Authentication options as a bare `PublicKeyCredentialRequestOptions`
    #[must_use]
    pub fn login_options() -> Value {
        json!({
            "challenge": TEST_CHALLENGE,
            "timeout": 60000,
            "rpId": "localhost",
            "allowCredentials": [{"id": TEST_CREDENTIAL_ID, "type": "public-key"}],
            "userVerification": "preferred"
        })
    }

    /// Options serialised to a JSON string, the way `options_to_json` replies
    #[must_use]
    pub fn string_encoded(options: &Value) -> Value {
        Value::String(options.to_string())
    }

    /// Attestation credential as returned by the platform
    #[must_use]
    pub fn attestation() -> Value {
        json!({
            "id": TEST_CREDENTIAL_ID,
            "rawId": TEST_CREDENTIAL_ID,
            "response": {
                "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uY3JlYXRlIn0",
                "attestationObject": "o2NmbXRkbm9uZWdhdHRTdG10oGhhdXRoRGF0YVg"
            },
            "type": "public-key",
            "clientExtensionResults": {},
            "authenticatorAttachment": "platform"
        })
    }

    /// Assertion credential as returned by the platform
    #[must_use]
    pub fn assertion() -> Value {
        json!({
            "id": TEST_CREDENTIAL_ID,
            "rawId": TEST_CREDENTIAL_ID,
            "response": {
                "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0",
                "authenticatorData": "SZYN5YgOjGh0NBcPZHZgW4_krrmihjLHmVzzuoMdl2MFAAAAAQ",
                "signature": "MEUCIQDzc2lnbmF0dXJl",
                "userHandle": "NmQ4ZjJhNGUtNGNhMS00YjVmLWE1NjEtN2Q1ZjJiYjE4ZTll"
            },
            "type": "public-key",
            "clientExtensionResults": {}
        })
    }

    /// Successful `finish` reply
    #[must_use]
    pub fn verified_reply(username: &str) -> Value {
        json!({"success": true, "username": username})
    }

    /// Rejecting reply of any endpoint
    #[must_use]
    pub fn error_reply(message: &str) -> Value {
        json!({"error": message})
    }

    /// The office itself
    ///
    /// # Panics
    ///
    /// Never; the constants are valid coordinates.
    #[must_use]
    pub fn office_location() -> Location {
        Location::new(OFFICE_LATITUDE, OFFICE_LONGITUDE).expect("office coordinates are valid")
    }

    /// A point roughly 1.1 km north of the office
    ///
    /// # Panics
    ///
    /// Never; the coordinates are valid.
    #[must_use]
    pub fn remote_location() -> Location {
        Location::new(OFFICE_LATITUDE + 0.01, OFFICE_LONGITUDE).expect("coordinates are valid")
    }
}

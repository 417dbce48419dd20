//! Ceremony data types for `clockin`
//!
//! Request bodies, opaque ceremony payloads and the discriminated server reply.
//! Options and credentials are carried as raw JSON so that nothing the server
//! or the platform produced is altered in transit; typed `webauthn-rs-proto`
//! views are available for broker implementations that want them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use webauthn_rs_proto::{
    CreationChallengeResponse, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse,
};

use super::errors::CeremonyError;
use crate::location::Location;

/// Which of the two ceremonies a flow runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Registration,
    Login,
}

impl FlowKind {
    /// Endpoint that issues ceremony options for this flow
    #[must_use]
    pub fn start_endpoint(self) -> Endpoint {
        match self {
            FlowKind::Registration => Endpoint::RegisterStart,
            FlowKind::Login => Endpoint::LoginStart,
        }
    }

    /// Endpoint that verifies the credential for this flow
    #[must_use]
    pub fn finish_endpoint(self) -> Endpoint {
        match self {
            FlowKind::Registration => Endpoint::RegisterFinish,
            FlowKind::Login => Endpoint::LoginFinish,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FlowKind::Registration => "registration",
            FlowKind::Login => "login",
        }
    }
}

/// Relying-party endpoints the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RegisterStart,
    RegisterFinish,
    LoginStart,
    LoginFinish,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::RegisterStart,
        Endpoint::RegisterFinish,
        Endpoint::LoginStart,
        Endpoint::LoginFinish,
    ];

    /// Path used when settings do not override it
    #[must_use]
    pub fn default_path(self) -> &'static str {
        match self {
            Endpoint::RegisterStart => "/register/start",
            Endpoint::RegisterFinish => "/register/finish",
            Endpoint::LoginStart => "/login/start",
            Endpoint::LoginFinish => "/login/finish",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_path())
    }
}

/// Body of both `start` requests
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CeremonyRequest {
    pub username: String,
}

impl CeremonyRequest {
    /// Build a start request, rejecting empty or whitespace-only usernames
    ///
    /// The username is sent exactly as given; only the emptiness check trims.
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::EmptyInput`] if the username has no
    /// non-whitespace characters.
    pub fn new(username: &str) -> Result<Self, CeremonyError> {
        if username.trim().is_empty() {
            return Err(CeremonyError::EmptyInput);
        }
        Ok(Self {
            username: username.to_string(),
        })
    }
}

/// Ceremony options issued by a `start` endpoint
///
/// Opaque to this crate: the challenge, relying-party and credential lists
/// belong to the server and the platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct CeremonyOptions(Value);

impl CeremonyOptions {
    /// Wrap options the caller already holds as JSON
    #[must_use]
    pub fn new(options: Value) -> Self {
        Self(options)
    }

    /// Accept the accepted body of a `start` reply
    ///
    /// Some relying parties serialise the options to a JSON string and send
    /// that string as the body. Such a string is decoded once; objects are
    /// taken as they are.
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::TransportFailure`] if the reply is neither an
    /// object nor a string holding one.
    pub fn from_reply(reply: Value) -> Result<Self, CeremonyError> {
        match reply {
            Value::Object(_) => Ok(Self(reply)),
            Value::String(encoded) => match serde_json::from_str::<Value>(&encoded)? {
                decoded @ Value::Object(_) => Ok(Self(decoded)),
                _ => Err(Self::not_an_object()),
            },
            _ => Err(Self::not_an_object()),
        }
    }

    fn not_an_object() -> CeremonyError {
        CeremonyError::TransportFailure("Ceremony options must be a JSON object".to_string())
    }

    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Challenge string, looked up either at the top level or under `publicKey`
    #[must_use]
    pub fn challenge(&self) -> Option<&str> {
        self.public_key_object()
            .get("challenge")
            .and_then(Value::as_str)
    }

    /// Typed view for credential creation
    ///
    /// Accepts both the bare `PublicKeyCredentialCreationOptions` shape and the
    /// `{"publicKey": ...}` wrapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the options do not match the `WebAuthn` structure.
    pub fn creation_options(&self) -> Result<CreationChallengeResponse, serde_json::Error> {
        self.typed_view()
    }

    /// Typed view for credential assertion
    ///
    /// # Errors
    ///
    /// Returns an error if the options do not match the `WebAuthn` structure.
    pub fn request_options(&self) -> Result<RequestChallengeResponse, serde_json::Error> {
        self.typed_view()
    }

    fn public_key_object(&self) -> &Value {
        self.0.get("publicKey").unwrap_or(&self.0)
    }

    fn typed_view<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.0.get("publicKey").is_some() {
            return serde_json::from_value(self.0.clone());
        }
        let mut wrapper = Map::new();
        wrapper.insert("publicKey".to_string(), self.0.clone());
        serde_json::from_value(Value::Object(wrapper))
    }
}

/// Attestation produced by the platform during registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct AttestationResponse(Value);

impl AttestationResponse {
    #[must_use]
    pub fn new(credential: Value) -> Self {
        Self(credential)
    }

    /// Wrap a typed credential built by a `webauthn-rs-proto` based broker
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be serialised.
    pub fn from_typed(credential: &RegisterPublicKeyCredential) -> Result<Self, serde_json::Error> {
        serde_json::to_value(credential).map(Self)
    }

    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Typed view of the attestation
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the `WebAuthn` structure.
    pub fn registration_credential(
        &self,
    ) -> Result<RegisterPublicKeyCredential, serde_json::Error> {
        serde_json::from_value(self.0.clone())
    }
}

/// Assertion produced by the platform during login
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct AssertionResponse(Value);

impl AssertionResponse {
    #[must_use]
    pub fn new(credential: Value) -> Self {
        Self(credential)
    }

    /// Wrap a typed credential built by a `webauthn-rs-proto` based broker
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be serialised.
    pub fn from_typed(credential: &PublicKeyCredential) -> Result<Self, serde_json::Error> {
        serde_json::to_value(credential).map(Self)
    }

    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Typed view of the assertion
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the `WebAuthn` structure.
    pub fn authentication_credential(&self) -> Result<PublicKeyCredential, serde_json::Error> {
        serde_json::from_value(self.0.clone())
    }
}

/// Body of `POST /login/finish`
#[derive(Serialize, Debug)]
pub struct LoginFinishRequest<'a> {
    pub credential: &'a AssertionResponse,
    pub location: &'a Location,
}

/// Reply of any relying-party endpoint
///
/// A reply carrying an `error` field is a rejection whatever else it holds;
/// everything else is accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerReply {
    Rejected { error: String },
    Accepted(Value),
}

impl ServerReply {
    /// Classify a parsed reply body
    ///
    /// A string `error` is the rejection message as is. Any other `error`
    /// value is reported as its JSON text.
    #[must_use]
    pub fn from_json(body: Value) -> Self {
        match body.get("error") {
            Some(Value::String(message)) => ServerReply::Rejected {
                error: message.clone(),
            },
            Some(other) => ServerReply::Rejected {
                error: other.to_string(),
            },
            None => ServerReply::Accepted(body),
        }
    }

    /// Accepted body, or [`CeremonyError::ServerRejected`] with the server's message
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::ServerRejected`] for rejections.
    pub fn into_accepted(self) -> Result<Value, CeremonyError> {
        match self {
            ServerReply::Rejected { error } => Err(CeremonyError::ServerRejected(error)),
            ServerReply::Accepted(body) => Ok(body),
        }
    }
}

/// Accepted reply of a `finish` endpoint
///
/// Extra fields such as `success` are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub username: String,
}

impl Verified {
    /// Parse the accepted body of a `finish` reply
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::TransportFailure`] if the body has no username.
    pub fn from_reply(body: Value) -> Result<Self, CeremonyError> {
        serde_json::from_value(body).map_err(|e| {
            CeremonyError::TransportFailure(format!("Unexpected verification reply: {e}"))
        })
    }
}

/// Successful end of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CeremonyOutcome {
    pub kind: FlowKind,
    pub username: String,
    pub completed_at: DateTime<Utc>,
}

impl CeremonyOutcome {
    #[must_use]
    pub fn new(kind: FlowKind, verified: Verified) -> Self {
        Self {
            kind,
            username: verified.username,
            completed_at: Utc::now(),
        }
    }

    /// Status line shown to the user
    #[must_use]
    pub fn status_message(&self) -> String {
        match self.kind {
            FlowKind::Registration => format!("Successfully registered {}!", self.username),
            FlowKind::Login => format!("Successfully clocked in {}!", self.username),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::constants::TEST_CREDENTIAL_ID;
    use crate::testing::TestFixtures;
    use serde_json::json;

    #[test]
    fn test_ceremony_request_rejects_blank_usernames() {
        for blank in ["", " ", "\t\n", "   \r\n "] {
            assert_eq!(CeremonyRequest::new(blank), Err(CeremonyError::EmptyInput));
        }
    }

    #[test]
    fn test_ceremony_request_keeps_username_verbatim() {
        let request = CeremonyRequest::new(" alice ").unwrap();
        assert_eq!(request.username, " alice ");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"username": " alice "})
        );
    }

    #[test]
    fn test_options_object_taken_as_is() {
        let body = json!({"challenge": "abc", "rp": {"id": "localhost"}, "extra": [1, 2]});
        let options = CeremonyOptions::from_reply(body.clone()).unwrap();
        assert_eq!(options.as_json(), &body);
        assert_eq!(options.challenge(), Some("abc"));
    }

    #[test]
    fn test_options_string_decoded_once() {
        let inner = json!({"challenge": "xyz", "rpId": "localhost"});
        let body = Value::String(inner.to_string());
        let options = CeremonyOptions::from_reply(body).unwrap();
        assert_eq!(options.into_json(), inner);
    }

    #[test]
    fn test_options_rejects_non_objects() {
        for body in [json!(null), json!(42), json!([1]), json!("\"nested\""), json!("not json")] {
            assert!(matches!(
                CeremonyOptions::from_reply(body),
                Err(CeremonyError::TransportFailure(_))
            ));
        }
    }

    #[test]
    fn test_challenge_under_public_key_wrapper() {
        let options = CeremonyOptions::new(json!({"publicKey": {"challenge": "wrapped"}}));
        assert_eq!(options.challenge(), Some("wrapped"));
    }

    #[test]
    fn test_typed_creation_options_bare_and_wrapped() {
        let bare = CeremonyOptions::new(TestFixtures::registration_options());
        let typed = bare.creation_options().unwrap();
        assert_eq!(typed.public_key.rp.id, "localhost");
        assert_eq!(typed.public_key.user.name, "alice");
        assert_eq!(typed.public_key.pub_key_cred_params.len(), 2);

        let wrapped = CeremonyOptions::new(
            json!({"publicKey": TestFixtures::registration_options()}),
        );
        let typed_wrapped = wrapped.creation_options().unwrap();
        assert_eq!(typed_wrapped.public_key.challenge, typed.public_key.challenge);
    }

    #[test]
    fn test_typed_request_options_bare_and_wrapped() {
        let bare = CeremonyOptions::new(TestFixtures::login_options());
        let typed = bare.request_options().unwrap();
        assert_eq!(typed.public_key.rp_id, "localhost");
        assert_eq!(typed.public_key.allow_credentials.len(), 1);

        let wrapped = CeremonyOptions::new(json!({"publicKey": TestFixtures::login_options()}));
        let typed_wrapped = wrapped.request_options().unwrap();
        assert_eq!(typed_wrapped.public_key.challenge, typed.public_key.challenge);
    }

    #[test]
    fn test_typed_view_rejects_foreign_shape() {
        let options = CeremonyOptions::new(json!({"challenge": 7}));
        assert!(options.creation_options().is_err());
        assert!(options.request_options().is_err());
    }

    #[test]
    fn test_attestation_typed_round_trip() {
        let attestation = AttestationResponse::new(TestFixtures::attestation());
        let typed = attestation.registration_credential().unwrap();
        assert_eq!(typed.id, TEST_CREDENTIAL_ID);

        let rewrapped = AttestationResponse::from_typed(&typed).unwrap();
        assert_eq!(rewrapped.as_json()["id"], TEST_CREDENTIAL_ID);
        assert_eq!(rewrapped.as_json()["type"], "public-key");
        let reparsed = rewrapped.registration_credential().unwrap();
        assert_eq!(reparsed.id, typed.id);
        assert_eq!(reparsed.raw_id, typed.raw_id);
    }

    #[test]
    fn test_assertion_typed_round_trip() {
        let assertion = AssertionResponse::new(TestFixtures::assertion());
        let typed = assertion.authentication_credential().unwrap();
        assert_eq!(typed.id, TEST_CREDENTIAL_ID);
        assert_eq!(typed.type_, "public-key");

        let rewrapped = AssertionResponse::from_typed(&typed).unwrap();
        let reparsed = rewrapped.authentication_credential().unwrap();
        assert_eq!(reparsed.id, typed.id);
        assert_eq!(reparsed.raw_id, typed.raw_id);
        assert_eq!(reparsed.type_, typed.type_);
    }

    #[test]
    fn test_server_reply_error_field_wins() {
        let reply = ServerReply::from_json(json!({"error": "user not found", "username": "bob"}));
        assert_eq!(
            reply.into_accepted(),
            Err(CeremonyError::ServerRejected("user not found".to_string()))
        );
    }

    #[test]
    fn test_server_reply_non_string_error_still_rejects() {
        let reply = ServerReply::from_json(json!({"error": {"message": "user not found"}}));
        assert_eq!(
            reply.into_accepted(),
            Err(CeremonyError::ServerRejected(
                r#"{"message":"user not found"}"#.to_string()
            ))
        );

        for (body, message) in [
            (json!({"error": 404}), "404"),
            (json!({"error": null, "success": true}), "null"),
        ] {
            assert_eq!(
                ServerReply::from_json(body).into_accepted(),
                Err(CeremonyError::ServerRejected(message.to_string()))
            );
        }
    }

    #[test]
    fn test_server_reply_accepts_everything_else() {
        let body = json!({"success": true, "username": "alice"});
        let reply = ServerReply::from_json(body.clone());
        assert_eq!(reply.into_accepted(), Ok(body));

        let string_body = json!("{\"challenge\":\"c\"}");
        let reply = ServerReply::from_json(string_body.clone());
        assert_eq!(reply.into_accepted(), Ok(string_body));
    }

    #[test]
    fn test_verified_ignores_extra_fields() {
        let verified = Verified::from_reply(json!({"success": true, "username": "alice"})).unwrap();
        assert_eq!(verified.username, "alice");
        assert!(Verified::from_reply(json!({"success": true})).is_err());
    }

    #[test]
    fn test_outcome_status_messages() {
        let verified = Verified {
            username: "alice".to_string(),
        };
        assert_eq!(
            CeremonyOutcome::new(FlowKind::Registration, verified.clone()).status_message(),
            "Successfully registered alice!"
        );
        assert_eq!(
            CeremonyOutcome::new(FlowKind::Login, verified).status_message(),
            "Successfully clocked in alice!"
        );
    }

    #[test]
    fn test_login_finish_body_shape() {
        let credential = AssertionResponse::new(json!({"id": "cred-1", "type": "public-key"}));
        let location = Location::new(37.7749, -122.4194).unwrap();
        let body = serde_json::to_value(LoginFinishRequest {
            credential: &credential,
            location: &location,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "credential": {"id": "cred-1", "type": "public-key"},
                "location": {"latitude": 37.7749, "longitude": -122.4194}
            })
        );
    }
}

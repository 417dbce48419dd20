#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Typed client for passkey registration and location-bound clock-in.
//!
//! [`CeremonyClient`] runs the two `WebAuthn` ceremonies against a relying
//! party: `register` (start, create credential, finish) and `login`
//! (acquire location, start, get assertion, finish with location).

/// Version of the clockin library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ceremony;
pub mod location;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use ceremony::{
    CeremonyClient, CeremonyError, CeremonyOutcome, CredentialBroker, FlowKind, HttpTransport,
    StatusSink,
};
pub use location::{Location, LocationProvider};
pub use settings::ClientSettings;

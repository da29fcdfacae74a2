//! Long-term validation building blocks for advanced electronic
//! signatures.
//!
//! When a signature is validated long after it was produced, the
//! question is no longer "is the trust path sound now?" but "until
//! when can the trust path still be defended?".  The control-time
//! sliding procedure (clause 9.2.2 of the ETSI signature-validation
//! standard) answers it: starting from the current time, it walks a
//! certificate chain from the trust anchor down to the signing
//! certificate, consults the revocation evidence, proof-of-existence
//! records, trust-service status information, and the algorithm
//! expiration catalogue of the validation policy, and slides the
//! *control-time* backward whenever the evidence forces it.  The
//! resulting instant is what past-signature validation and archival
//! timestamp verification compare signature times against.
//!
//! This crate contains the procedure itself and its immediate
//! collaborator interfaces:
//!
//!   - [`sliding::ControlTimeSliding`], the state machine, producing a
//!     [`sliding::Conclusion`];
//!   - [`policy::ValidationPolicy`], the revocation-freshness bound and
//!     the algorithm expiration catalogue;
//!   - [`diagnostic`], read-only views over the certificates and
//!     revocation data extracted by a diagnostic-data loader;
//!   - [`poe::PoeStore`], the proof-of-existence oracle;
//!   - [`report`], the structured trace of every constraint evaluated.
//!
//! A few things are deliberately *not* here.  The crate does not
//! verify signatures, does not fetch revocation data, does not parse
//! certificates, and does not serialize reports; it consumes views
//! prepared by a loader and returns a structured trace for an external
//! emitter.  Validation outcomes are domain values
//! ([`types::Indication`]); only programming errors (an empty chain, a
//! malformed policy document) travel through [`Result`].

#![warn(missing_docs)]

#[macro_use] extern crate lazy_static;

#[cfg(test)]
#[macro_use] extern crate quickcheck;

pub mod diagnostic;
pub mod fmt;
pub mod poe;
pub mod policy;
pub mod report;
pub mod sliding;
pub mod types;

pub use sliding::{Conclusion, ControlTimeSliding};
pub use types::CertificateId;

/// Crate result specialization.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Errors returned by this crate.
///
/// Domain outcomes of the validation processes are not errors; they
/// are reported through [`sliding::Conclusion`].  This enum covers
/// conditions that indicate a caller bug or unusable input.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unsupported or unrecognized algorithm identifier.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Malformed validation policy document.
    #[error("Malformed policy: {0}")]
    MalformedPolicy(String),
}

/// Returns a timestamp for the tests.
///
/// 2020-06-01T00:00:00Z.  Scenario times in the test suites are
/// offsets from this instant.
#[cfg(test)]
pub(crate) fn frozen_time() -> std::time::SystemTime {
    std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_590_969_600)
}

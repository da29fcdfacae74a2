//! Proof-of-existence lookups.
//!
//! A POE asserts that an object existed at a given instant, typically
//! because a trusted timestamp, a previously validated signature, or
//! explicit archive evidence covers it.  The extraction of POEs from
//! such sources happens before validation runs; the processes here
//! only ever ask one question, through [`PoeStore`].

use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

use crate::types::CertificateId;

/// A source of proofs of existence.
///
/// Within a single validation run the store is treated as a pure
/// function of `(id, at)` and may be queried any number of times.
/// Implementations that are shared across threads must document their
/// own synchronization contract; the shipped [`PoeSet`] is immutable
/// during lookups and safe to share.
pub trait PoeStore: fmt::Debug {
    /// Returns whether a proof exists that the certificate existed at
    /// or before `at`.
    fn has_certificate_poe(&self, id: &CertificateId, at: SystemTime) -> bool;
}

/// An in-memory proof-of-existence store.
///
/// Populated by the caller before validation; each certificate maps to
/// the instants at which proofs of its existence were established.
#[derive(Debug, Clone, Default)]
pub struct PoeSet {
    proofs: HashMap<CertificateId, Vec<SystemTime>>,
}

impl PoeSet {
    /// Returns an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a proof that the certificate existed at `at`.
    pub fn add_certificate_poe<I>(&mut self, id: I, at: SystemTime)
        where I: Into<CertificateId>
    {
        self.proofs.entry(id.into()).or_default().push(at);
    }
}

impl PoeStore for PoeSet {
    fn has_certificate_poe(&self, id: &CertificateId, at: SystemTime) -> bool {
        self.proofs.get(id)
            .map(|proofs| proofs.iter().any(|&t| t <= at))
            .unwrap_or(false)
    }
}

/// A store without any proofs.
///
/// Stands in when no POE extraction has run; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPoe;

impl PoeStore for NoPoe {
    fn has_certificate_poe(&self, _: &CertificateId, _: SystemTime) -> bool {
        false
    }
}

//! Read-only views over diagnostic data.
//!
//! The diagnostic-data loader digests the raw validation material
//! (certificates, CRLs, OCSP responses, trusted-list entries) into the
//! flat records defined here.  The validation processes only read
//! them; nothing in this crate parses or mutates the underlying
//! objects.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::CertificateId;

/// View over the revocation data attached to a certificate.
///
/// Covers both CRL- and OCSP-derived status information; by the time
/// it reaches the validation processes, the distinction has been
/// flattened away.
#[derive(Debug, Clone, PartialEq)]
pub struct RevocationView {
    issuing_time: SystemTime,
    digest_algorithm: Option<String>,
    encryption_algorithm: Option<String>,
    key_length: Option<u32>,
    revoked: bool,
    revocation_date: Option<SystemTime>,
    expired_certs_on_crl: Option<SystemTime>,
}

impl RevocationView {
    /// Returns a new view for revocation data issued at
    /// `issuing_time`, not marking the certificate revoked.
    pub fn new(issuing_time: SystemTime) -> Self {
        RevocationView {
            issuing_time,
            digest_algorithm: None,
            encryption_algorithm: None,
            key_length: None,
            revoked: false,
            revocation_date: None,
            expired_certs_on_crl: None,
        }
    }

    /// Sets the algorithms the revocation data is signed with.
    ///
    /// The identifiers are kept raw; canonicalization happens at
    /// lookup time.
    pub fn set_signature_algorithms<L>(mut self, digest: &str,
                                       encryption: &str, key_length: L)
        -> Self
        where L: Into<Option<u32>>
    {
        self.digest_algorithm = Some(digest.into());
        self.encryption_algorithm = Some(encryption.into());
        self.key_length = key_length.into();
        self
    }

    /// Marks the subject certificate revoked at `date`.
    pub fn set_revoked(mut self, date: SystemTime) -> Self {
        self.revoked = true;
        self.revocation_date = Some(date);
        self
    }

    /// Records the `expiredCertsOnCRL` date advertised by the issuing
    /// CA: the CRL keeps expired certificates listed from that date
    /// on.
    pub fn set_expired_certs_on_crl(mut self, date: SystemTime) -> Self {
        self.expired_certs_on_crl = Some(date);
        self
    }

    /// Returns when the revocation data was issued.
    pub fn issuing_time(&self) -> SystemTime {
        self.issuing_time
    }

    /// Returns the raw digest algorithm identifier.
    pub fn digest_algorithm(&self) -> Option<&str> {
        self.digest_algorithm.as_deref()
    }

    /// Returns the raw encryption algorithm identifier.
    pub fn encryption_algorithm(&self) -> Option<&str> {
        self.encryption_algorithm.as_deref()
    }

    /// Returns the signing key length in bits.
    pub fn key_length(&self) -> Option<u32> {
        self.key_length
    }

    /// Returns whether the data marks the subject certificate revoked.
    pub fn revoked(&self) -> bool {
        self.revoked
    }

    /// Returns when the subject certificate was revoked.
    pub fn revocation_date(&self) -> Option<SystemTime> {
        self.revocation_date
    }

    /// Returns the `expiredCertsOnCRL` date, if advertised.
    pub fn expired_certs_on_crl(&self) -> Option<SystemTime> {
        self.expired_certs_on_crl
    }
}

/// View over one certificate of the diagnostic data.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateView {
    id: CertificateId,
    trusted: bool,
    not_before: SystemTime,
    not_after: SystemTime,
    service_status: Option<String>,
    service_end_date: Option<SystemTime>,
    digest_algorithm: Option<String>,
    encryption_algorithm: Option<String>,
    key_length: Option<u32>,
    revocation: Option<RevocationView>,
}

impl CertificateView {
    /// Returns a new untrusted view valid between `not_before` and
    /// `not_after`.
    pub fn new<I>(id: I, not_before: SystemTime, not_after: SystemTime)
        -> Self
        where I: Into<CertificateId>
    {
        CertificateView {
            id: id.into(),
            trusted: false,
            not_before,
            not_after,
            service_status: None,
            service_end_date: None,
            digest_algorithm: None,
            encryption_algorithm: None,
            key_length: None,
            revocation: None,
        }
    }

    /// Marks the certificate as a trust anchor.
    pub fn set_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }

    /// Sets the raw status URI of the trust service that issued the
    /// certificate.
    pub fn set_service_status(mut self, status: &str) -> Self {
        self.service_status = Some(status.into());
        self
    }

    /// Sets the end date of the issuing trust service's current
    /// status.
    pub fn set_service_end_date(mut self, date: SystemTime) -> Self {
        self.service_end_date = Some(date);
        self
    }

    /// Sets the algorithms the certificate is signed with.
    ///
    /// The identifiers are kept raw; canonicalization happens at
    /// lookup time.
    pub fn set_signature_algorithms<L>(mut self, digest: &str,
                                       encryption: &str, key_length: L)
        -> Self
        where L: Into<Option<u32>>
    {
        self.digest_algorithm = Some(digest.into());
        self.encryption_algorithm = Some(encryption.into());
        self.key_length = key_length.into();
        self
    }

    /// Attaches revocation data.
    pub fn set_revocation(mut self, revocation: RevocationView) -> Self {
        self.revocation = Some(revocation);
        self
    }

    /// Returns the certificate's id.
    pub fn id(&self) -> &CertificateId {
        &self.id
    }

    /// Returns whether the certificate is a trust anchor.
    pub fn trusted(&self) -> bool {
        self.trusted
    }

    /// Returns the start of the validity range.
    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    /// Returns the end of the validity range.
    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Returns the raw status URI of the issuing trust service.
    pub fn service_status(&self) -> Option<&str> {
        self.service_status.as_deref()
    }

    /// Returns the end date of the issuing trust service's status.
    pub fn service_end_date(&self) -> Option<SystemTime> {
        self.service_end_date
    }

    /// Returns the raw digest algorithm identifier.
    pub fn digest_algorithm(&self) -> Option<&str> {
        self.digest_algorithm.as_deref()
    }

    /// Returns the raw encryption algorithm identifier.
    pub fn encryption_algorithm(&self) -> Option<&str> {
        self.encryption_algorithm.as_deref()
    }

    /// Returns the signing key length in bits.
    pub fn key_length(&self) -> Option<u32> {
        self.key_length
    }

    /// Returns the attached revocation data.
    pub fn revocation(&self) -> Option<&RevocationView> {
        self.revocation.as_ref()
    }

    /// Returns whether the revocation data marks the certificate
    /// revoked.
    pub fn revoked(&self) -> bool {
        self.revocation.as_ref().map(|r| r.revoked()).unwrap_or(false)
    }

    /// Returns when the certificate was revoked.
    pub fn revocation_date(&self) -> Option<SystemTime> {
        self.revocation.as_ref().and_then(|r| r.revocation_date())
    }
}

lazy_static! {
    // Returned for ids absent from the store.  A well-formed chain
    // never contains such an id.
    static ref UNKNOWN_CERTIFICATE: CertificateView =
        CertificateView::new("unknown", UNIX_EPOCH, UNIX_EPOCH);
}

/// The set of certificate views extracted by the diagnostic-data
/// loader.
///
/// Created once per validation, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticData {
    certificates: HashMap<CertificateId, CertificateView>,
}

impl DiagnosticData {
    /// Returns an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `certificate`, replacing any previous view with the same
    /// id.
    pub fn insert(&mut self, certificate: CertificateView) {
        self.certificates.insert(certificate.id().clone(), certificate);
    }

    /// Looks up a certificate view.
    ///
    /// Never fails: ids the loader did not produce yield a sentinel
    /// untrusted view without revocation data.
    pub fn certificate(&self, id: &CertificateId) -> &CertificateView {
        self.certificates.get(id).unwrap_or(&UNKNOWN_CERTIFICATE)
    }

    /// Iterates over all certificate views, in no particular order.
    pub fn certificates(&self) -> impl Iterator<Item = &CertificateView> {
        self.certificates.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::frozen_time;

    #[test]
    fn views_are_read_back_as_built() {
        let now = frozen_time();
        let year = Duration::from_secs(365 * 24 * 3600);

        let revocation = RevocationView::new(now - Duration::from_secs(3600))
            .set_signature_algorithms("SHA256", "RSA", 2048)
            .set_revoked(now - 2 * year);
        let certificate = CertificateView::new("ee", now - year, now + year)
            .set_signature_algorithms("SHA-256", "rsa", 2048)
            .set_revocation(revocation.clone());

        assert_eq!(certificate.id().as_str(), "ee");
        assert!(!certificate.trusted());
        assert_eq!(certificate.digest_algorithm(), Some("SHA-256"));
        assert_eq!(certificate.key_length(), Some(2048));
        assert_eq!(certificate.revocation(), Some(&revocation));
        assert!(certificate.revoked());
        assert_eq!(certificate.revocation_date(), Some(now - 2 * year));
    }

    #[test]
    fn revocation_defaults() {
        let r = RevocationView::new(frozen_time());
        assert!(!r.revoked());
        assert_eq!(r.revocation_date(), None);
        assert_eq!(r.expired_certs_on_crl(), None);
        assert_eq!(r.digest_algorithm(), None);
    }

    #[test]
    fn unknown_ids_yield_the_sentinel() {
        let mut data = DiagnosticData::new();
        data.insert(CertificateView::new("known", UNIX_EPOCH, UNIX_EPOCH));

        let ghost = data.certificate(&CertificateId::from("ghost"));
        assert!(!ghost.trusted());
        assert!(ghost.revocation().is_none());

        assert_eq!(data.certificate(&CertificateId::from("known")).id(),
                   &CertificateId::from("known"));
    }
}

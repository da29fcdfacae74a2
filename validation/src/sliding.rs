//! Control-time sliding.
//!
//! The procedure determines the latest instant (the *control-time*)
//! at which a certificate chain can still be considered sound, given
//! the available revocation evidence and proofs of existence.  It
//! starts at the current time and walks the chain from the trust
//! anchor down to the signing certificate.  For every certificate that
//! is not itself trusted, the revocation information must exist, must
//! have been issued within the certificate's validity range, must
//! predate the current control-time, and a proof of existence of the
//! certificate must be available at that control-time.  Failing any of
//! those, the run ends `Indeterminate`/`NO_POE`.  Otherwise the
//! control-time slides backward: to the revocation date when the
//! certificate is revoked, to the issuance of stale revocation data,
//! and to the expiration of any algorithm involved that the policy no
//! longer considers reliable.
//!
//! The control-time never moves forward.  Every check is recorded in a
//! [`report::Fragment`](crate::report::Fragment), in evaluation order,
//! so downstream processes can audit how the final value came about.

use std::time::SystemTime;

use tracing::{debug, warn};

use crate::diagnostic::{CertificateView, DiagnosticData, RevocationView};
use crate::poe::PoeStore;
use crate::policy::ValidationPolicy;
use crate::report::{ConstraintHandle, Fragment, Info, MessageTag, Status};
use crate::types::{
    CertificateId,
    DigestAlgorithm,
    EncryptionAlgorithm,
    Indication,
    SubIndication,
    TrustServiceStatus,
};
use crate::Error;
use crate::Result;

/// The result of a control-time sliding run.
///
/// The trace and the outcome are always consistent: an
/// [`Indication::Indeterminate`] conclusion carries a trace whose last
/// constraint is the failed one, and a [`Indication::Valid`]
/// conclusion carries a trace without failed constraints.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Conclusion {
    indication: Indication,
    sub_indication: Option<SubIndication>,
    control_time: SystemTime,
    fragment: Fragment,
}

impl Conclusion {
    fn valid(control_time: SystemTime, fragment: Fragment) -> Self {
        Conclusion {
            indication: Indication::Valid,
            sub_indication: None,
            control_time,
            fragment,
        }
    }

    fn indeterminate(sub_indication: SubIndication,
                     control_time: SystemTime, fragment: Fragment)
        -> Self
    {
        Conclusion {
            indication: Indication::Indeterminate,
            sub_indication: Some(sub_indication),
            control_time,
            fragment,
        }
    }

    /// Returns the main status indication.
    pub fn indication(&self) -> Indication {
        self.indication
    }

    /// Returns the reason code refining a non-`Valid` indication.
    pub fn sub_indication(&self) -> Option<SubIndication> {
        self.sub_indication
    }

    /// Returns the control-time the run arrived at.
    ///
    /// Never later than the instant the run started from.
    pub fn control_time(&self) -> SystemTime {
        self.control_time
    }

    /// Returns the trace of evaluated constraints.
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }
}

/// One control-time sliding run over a certificate chain.
///
/// The collaborators are borrowed for the duration of the run and only
/// ever read; the produced [`Conclusion`] is owned by the caller.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use esig_validation::diagnostic::{CertificateView, DiagnosticData,
///                                   RevocationView};
/// use esig_validation::poe::PoeSet;
/// use esig_validation::policy::StandardPolicy;
/// use esig_validation::types::Indication;
/// use esig_validation::{CertificateId, ControlTimeSliding};
///
/// # fn main() -> esig_validation::Result<()> {
/// let now = SystemTime::now();
/// let hour = Duration::from_secs(3600);
/// let year = Duration::from_secs(365 * 24 * 3600);
///
/// let mut data = DiagnosticData::new();
/// data.insert(CertificateView::new("root", now - year, now + year)
///     .set_trusted(true));
/// data.insert(CertificateView::new("signer", now - year, now + year)
///     .set_signature_algorithms("SHA256", "RSA", 2048)
///     .set_revocation(RevocationView::new(now - hour)
///         .set_signature_algorithms("SHA256", "RSA", 2048)));
///
/// let mut poe = PoeSet::new();
/// poe.add_certificate_poe("signer", now - hour);
///
/// let policy = StandardPolicy::new();
/// let chain = [CertificateId::from("signer"),
///              CertificateId::from("root")];
/// let conclusion = ControlTimeSliding::new(&policy, &data, &poe, &chain)
///     .run(now)?;
/// assert_eq!(conclusion.indication(), Indication::Valid);
/// assert_eq!(conclusion.control_time(), now);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct ControlTimeSliding<'a> {
    policy: &'a dyn ValidationPolicy,
    data: &'a DiagnosticData,
    poe: &'a dyn PoeStore,
    chain: &'a [CertificateId],
}

impl<'a> ControlTimeSliding<'a> {
    /// Returns a new run over `chain`.
    ///
    /// The chain's first element must be the signing certificate, its
    /// last element a trust anchor.
    pub fn new(policy: &'a dyn ValidationPolicy,
               data: &'a DiagnosticData,
               poe: &'a dyn PoeStore,
               chain: &'a [CertificateId])
        -> Self
    {
        ControlTimeSliding { policy, data, poe, chain }
    }

    /// Executes the procedure.
    ///
    /// If `now` is `None`, the current time is used.  On success the
    /// conclusion's control-time is at most `now`, and its trace
    /// records each constraint evaluated, in order.  An empty chain is
    /// a caller bug and returns an error rather than a conclusion.
    pub fn run<T>(&self, now: T) -> Result<Conclusion>
        where T: Into<Option<SystemTime>>
    {
        let now = now.into().unwrap_or_else(SystemTime::now);
        let signing_id = self.chain.first()
            .ok_or_else(|| Error::InvalidArgument(
                "empty certificate chain".into()))?;

        let mut fragment = Fragment::new();
        let mut control_time = now;

        // Trust anchor first.
        for id in self.chain.iter().rev() {
            let certificate = self.data.certificate(id);
            fragment.open_certificate(id);

            if certificate.trusted() {
                continue;
            }

            if id == signing_id {
                control_time = self.check_trust_service_status(
                    certificate, control_time, &mut fragment);
            }

            // Revocation information must exist.
            let constraint = fragment.add_constraint(MessageTag::Drie);
            let revocation = match certificate.revocation() {
                Some(revocation) => {
                    fragment.set_status(constraint, Status::Ok);
                    revocation
                }
                None => {
                    fragment.set_status(constraint, Status::Ko);
                    return Ok(Conclusion::indeterminate(
                        SubIndication::NoPoe, control_time, fragment));
                }
            };

            // ... issued while the certificate was valid.
            let constraint = fragment.add_constraint(MessageTag::Icneaidorsi);
            if !revocation_in_scope(certificate, revocation) {
                fragment.set_status(constraint, Status::Ko);
                return Ok(Conclusion::indeterminate(
                    SubIndication::NoPoe, control_time, fragment));
            }
            fragment.set_status(constraint, Status::Ok);

            // ... and strictly before control-time.
            let constraint = fragment.add_constraint(MessageTag::Iidorsibct);
            if revocation.issuing_time() >= control_time {
                fragment.set_status(constraint, Status::Ko);
                fragment.add_info(constraint, Info::ControlTime(control_time));
                return Ok(Conclusion::indeterminate(
                    SubIndication::NoPoe, control_time, fragment));
            }
            fragment.set_status(constraint, Status::Ok);

            // The certificate must provably have existed at
            // control-time.
            let constraint = fragment.add_constraint(MessageTag::Dsopcpoeoc);
            if !self.poe.has_certificate_poe(id, control_time)
                || revocation.issuing_time() > control_time
            {
                fragment.set_status(constraint, Status::Ko);
                return Ok(Conclusion::indeterminate(
                    SubIndication::NoPoe, control_time, fragment));
            }
            fragment.set_status(constraint, Status::Ok);

            // Slide.
            let constraint = fragment.add_constraint(MessageTag::Sct);
            fragment.set_status(constraint, Status::Ok);
            fragment.add_info(constraint, Info::ControlTime(control_time));

            if revocation.revoked() {
                if let Some(date) = revocation.revocation_date() {
                    control_time = slide(control_time, date);
                    fragment.add_info(constraint, Info::RevocationTime(date));
                    debug!(certificate = %id,
                           control_time = %crate::fmt::date(control_time),
                           "certificate revoked, control-time slid to the \
                            revocation date");
                }
            } else {
                let age = control_time
                    .duration_since(revocation.issuing_time())
                    .unwrap_or_default();
                if age > self.policy.revocation_freshness() {
                    control_time = slide(control_time,
                                         revocation.issuing_time());
                    fragment.add_info(constraint,
                                      Info::StaleRevocation(id.clone()));
                    debug!(certificate = %id,
                           control_time = %crate::fmt::date(control_time),
                           "stale revocation information, control-time slid \
                            to its issuance");
                }
            }

            control_time = self.check_algorithms(
                certificate, revocation, control_time,
                &mut fragment, constraint);
        }

        Ok(Conclusion::valid(control_time, fragment))
    }

    /// Evaluates the trust-service status of an untrusted anchor.
    ///
    /// A status outside supervision and accreditation closes the
    /// window at the service's end date.
    fn check_trust_service_status(&self, certificate: &CertificateView,
                                  control_time: SystemTime,
                                  fragment: &mut Fragment)
        -> SystemTime
    {
        let constraint = fragment.add_constraint(MessageTag::Witss);
        fragment.set_status(constraint, Status::Ok);
        let status = certificate.service_status().unwrap_or("");
        fragment.add_info(constraint,
                          Info::TrustedServiceStatus(status.into()));

        match TrustServiceStatus::classify(status) {
            TrustServiceStatus::UnderSupervision
            | TrustServiceStatus::SupervisionInCessation
            | TrustServiceStatus::Accredited => control_time,
            TrustServiceStatus::Other if status.is_empty() => {
                warn!(certificate = %certificate.id(),
                      "trust service status of the anchor is not known");
                control_time
            }
            TrustServiceStatus::Other => {
                match certificate.service_end_date() {
                    Some(end) => {
                        let control_time = slide(control_time, end);
                        fragment.add_info(constraint,
                                          Info::ControlTime(control_time));
                        debug!(certificate = %certificate.id(), status,
                               control_time = %crate::fmt::date(control_time),
                               "anchor service status not acceptable, \
                                control-time slid to the service end date");
                        control_time
                    }
                    None => {
                        warn!(certificate = %certificate.id(), status,
                              "anchor service status not acceptable and no \
                               service end date is known");
                        control_time
                    }
                }
            }
        }
    }

    /// Slides past the expiration of every unreliable algorithm
    /// involved: the certificate's signature first, then the
    /// revocation data's.
    fn check_algorithms(&self, certificate: &CertificateView,
                        revocation: &RevocationView,
                        mut control_time: SystemTime,
                        fragment: &mut Fragment,
                        constraint: ConstraintHandle)
        -> SystemTime
    {
        let expirations = [
            (self.digest_expiration(certificate.digest_algorithm()),
             false),
            (self.encryption_expiration(certificate.encryption_algorithm(),
                                        certificate.key_length()),
             false),
            (self.digest_expiration(revocation.digest_algorithm()),
             true),
            (self.encryption_expiration(revocation.encryption_algorithm(),
                                        revocation.key_length()),
             true),
        ];

        for (expiration, on_revocation_data) in expirations {
            if let Some(expiration) = expiration {
                if control_time > expiration {
                    control_time = slide(control_time, expiration);
                    fragment.add_info(constraint, if on_revocation_data {
                        Info::RevocationAlgorithmExpiration(expiration)
                    } else {
                        Info::CertificateAlgorithmExpiration(expiration)
                    });
                    debug!(certificate = %certificate.id(),
                           control_time = %crate::fmt::date(control_time),
                           "algorithm no longer reliable, control-time slid \
                            to its expiration");
                }
            }
        }

        control_time
    }

    fn digest_expiration(&self, raw: Option<&str>) -> Option<SystemTime> {
        let algo = raw?.parse::<DigestAlgorithm>().ok()?;
        self.policy.digest_algorithm_expiration(algo)
    }

    fn encryption_expiration(&self, raw: Option<&str>,
                             key_length: Option<u32>)
        -> Option<SystemTime>
    {
        let algo = raw?.parse::<EncryptionAlgorithm>().ok()?;
        self.policy.encryption_algorithm_expiration(algo, key_length)
    }
}

/// Returns whether the revocation data was issued within the
/// certificate's validity range.
///
/// `expiredCertsOnCRL` widens the upper bound: revocation data issued
/// after the certificate expired still covers it when the CRL keeps
/// expired certificates listed from a date no later than `notAfter`.
fn revocation_in_scope(certificate: &CertificateView,
                       revocation: &RevocationView)
    -> bool
{
    let issued = revocation.issuing_time();
    if issued < certificate.not_before() {
        return false;
    }
    if issued > certificate.not_after() {
        return match revocation.expired_certs_on_crl() {
            Some(threshold) => threshold <= certificate.not_after(),
            None => false,
        };
    }
    true
}

// Control-time only moves backward.
fn slide(control_time: SystemTime, to: SystemTime) -> SystemTime {
    control_time.min(to)
}

//! Vocabulary types shared by the validation processes.
//!
//! The stringly-typed material of the diagnostic data (status URIs,
//! algorithm identifiers) is converted into the sums defined here at
//! the edges, so the engine itself only ever matches on enums.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};

/// Identifies a certificate within a set of diagnostic data.
///
/// Ids are opaque: the diagnostic-data loader derives them (typically
/// from a digest of the encoded certificate), and the validation
/// processes only compare and display them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CertificateId(String);

impl CertificateId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CertificateId {
    fn from(id: &str) -> Self {
        CertificateId(id.into())
    }
}

impl From<String> for CertificateId {
    fn from(id: String) -> Self {
        CertificateId(id)
    }
}

/// The main status indication of a validation process.
///
/// See [`SubIndication`] for the refinement attached to non-`Valid`
/// outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Indication {
    /// The process succeeded.
    Valid,
    /// The available evidence does not allow a positive or a negative
    /// conclusion.
    Indeterminate,
    /// The process established that the signature cannot be valid.
    ///
    /// Control-time sliding never produces this on its own; it is
    /// reserved for the sibling constraint checks that share this
    /// type.
    Failed,
}

impl fmt::Display for Indication {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Indication::Valid => "VALID",
            Indication::Indeterminate => "INDETERMINATE",
            Indication::Failed => "FAILED",
        })
    }
}

/// Refines an [`Indication`] with the standardized reason code.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubIndication {
    /// No proof of existence is available for some element of the
    /// trust path at the required time.
    NoPoe,
    /// A constraint on the signature itself failed.
    SigConstraintsFailure,
    /// No usable certificate chain could be established.
    NoCertificateChainFound,
    /// The best-signature-time falls outside the signing certificate's
    /// validity range.
    OutOfBoundsNoPoe,
    /// Cryptographic material is no longer considered reliable and no
    /// proof of existence predates the weakness.
    CryptoConstraintsFailureNoPoe,
    /// Fresh revocation information is expected to become available.
    TryLater,
}

impl fmt::Display for SubIndication {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SubIndication::NoPoe => "NO_POE",
            SubIndication::SigConstraintsFailure => "SIG_CONSTRAINTS_FAILURE",
            SubIndication::NoCertificateChainFound => "NO_CERTIFICATE_CHAIN_FOUND",
            SubIndication::OutOfBoundsNoPoe => "OUT_OF_BOUNDS_NO_POE",
            SubIndication::CryptoConstraintsFailureNoPoe =>
                "CRYPTO_CONSTRAINTS_FAILURE_NO_POE",
            SubIndication::TryLater => "TRY_LATER",
        })
    }
}

/// Service status URI of a supervised service, Directive 1999/93/EC
/// trusted-list namespace.
pub const SERVICE_STATUS_UNDER_SUPERVISION: &str =
    "http://uri.etsi.org/TrstSvc/eSigDir-1999-93-EC-TrustedList/Svcstatus/undersupervision";

/// Service status URI of a supervised service, TS 119 612 trusted-list
/// namespace.
pub const SERVICE_STATUS_UNDER_SUPERVISION_119612: &str =
    "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/undersupervision";

/// Service status URI of a service whose supervision is being ceased,
/// Directive 1999/93/EC trusted-list namespace.
pub const SERVICE_STATUS_SUPERVISION_IN_CESSATION: &str =
    "http://uri.etsi.org/TrstSvc/eSigDir-1999-93-EC-TrustedList/Svcstatus/supervisionincessation";

/// Service status URI of a service whose supervision is being ceased,
/// TS 119 612 trusted-list namespace.
pub const SERVICE_STATUS_SUPERVISION_IN_CESSATION_119612: &str =
    "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/supervisionincessation";

/// Service status URI of an accredited service, Directive 1999/93/EC
/// trusted-list namespace.
pub const SERVICE_STATUS_ACCREDITED: &str =
    "http://uri.etsi.org/TrstSvc/eSigDir-1999-93-EC-TrustedList/Svcstatus/accredited";

/// Service status URI of an accredited service, TS 119 612 trusted-list
/// namespace.
pub const SERVICE_STATUS_ACCREDITED_119612: &str =
    "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/accredited";

/// Operational status classes of a trust service.
///
/// Trusted lists carry the status as a URI; [`classify`] maps the
/// closed set of recognized URIs (the historical Directive 1999/93/EC
/// namespace and the current TS 119 612 namespace) to these classes.
/// Everything else, including an absent or empty status, is
/// [`Other`].
///
/// [`classify`]: TrustServiceStatus::classify
/// [`Other`]: TrustServiceStatus::Other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrustServiceStatus {
    /// The service operates under supervision.
    UnderSupervision,
    /// The supervision of the service is in the process of being
    /// ceased.
    SupervisionInCessation,
    /// The service is accredited.
    Accredited,
    /// Any other, unrecognized, or missing status.
    Other,
}

impl TrustServiceStatus {
    /// Classifies a status URI.
    ///
    /// Matching is exact; the URIs are case-sensitive identifiers.
    pub fn classify(uri: &str) -> Self {
        match uri {
            SERVICE_STATUS_UNDER_SUPERVISION
            | SERVICE_STATUS_UNDER_SUPERVISION_119612 =>
                TrustServiceStatus::UnderSupervision,
            SERVICE_STATUS_SUPERVISION_IN_CESSATION
            | SERVICE_STATUS_SUPERVISION_IN_CESSATION_119612 =>
                TrustServiceStatus::SupervisionInCessation,
            SERVICE_STATUS_ACCREDITED
            | SERVICE_STATUS_ACCREDITED_119612 =>
                TrustServiceStatus::Accredited,
            _ => TrustServiceStatus::Other,
        }
    }
}

/// Digest algorithms used to sign certificates and revocation data.
///
/// Parsing accepts the canonical name, common aliases, and the dotted
/// ASN.1 OID; `Display` produces the canonical form used as the key of
/// the policy's expiration catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DigestAlgorithm {
    /// MD5.
    Md5,
    /// RIPEMD-160.
    Ripemd160,
    /// SHA-1.
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Ripemd160 => "RIPEMD160",
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        })
    }
}

impl FromStr for DigestAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MD5" | "1.2.840.113549.2.5" => Ok(DigestAlgorithm::Md5),
            "RIPEMD160" | "RIPEMD-160" | "1.3.36.3.2.1" =>
                Ok(DigestAlgorithm::Ripemd160),
            "SHA1" | "SHA-1" | "1.3.14.3.2.26" => Ok(DigestAlgorithm::Sha1),
            "SHA224" | "SHA-224" | "2.16.840.1.101.3.4.2.4" =>
                Ok(DigestAlgorithm::Sha224),
            "SHA256" | "SHA-256" | "2.16.840.1.101.3.4.2.1" =>
                Ok(DigestAlgorithm::Sha256),
            "SHA384" | "SHA-384" | "2.16.840.1.101.3.4.2.2" =>
                Ok(DigestAlgorithm::Sha384),
            "SHA512" | "SHA-512" | "2.16.840.1.101.3.4.2.3" =>
                Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(s.into()).into()),
        }
    }
}

/// Encryption algorithms used to sign certificates and revocation
/// data.
///
/// Same parsing and canonicalization contract as
/// [`DigestAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EncryptionAlgorithm {
    /// RSA.
    Rsa,
    /// DSA.
    Dsa,
    /// ECDSA.
    Ecdsa,
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EncryptionAlgorithm::Rsa => "RSA",
            EncryptionAlgorithm::Dsa => "DSA",
            EncryptionAlgorithm::Ecdsa => "ECDSA",
        })
    }
}

impl FromStr for EncryptionAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RSA" | "1.2.840.113549.1.1.1" => Ok(EncryptionAlgorithm::Rsa),
            "DSA" | "1.2.840.10040.4.1" => Ok(EncryptionAlgorithm::Dsa),
            "ECDSA" | "EC" | "1.2.840.10045.2.1" =>
                Ok(EncryptionAlgorithm::Ecdsa),
            _ => Err(Error::UnsupportedAlgorithm(s.into()).into()),
        }
    }
}

#[cfg(test)]
impl Arbitrary for DigestAlgorithm {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[
            DigestAlgorithm::Md5,
            DigestAlgorithm::Ripemd160,
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha224,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ]).unwrap()
    }
}

#[cfg(test)]
impl Arbitrary for EncryptionAlgorithm {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[
            EncryptionAlgorithm::Rsa,
            EncryptionAlgorithm::Dsa,
            EncryptionAlgorithm::Ecdsa,
        ]).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognized_uris() {
        use TrustServiceStatus::*;

        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_UNDER_SUPERVISION), UnderSupervision);
        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_UNDER_SUPERVISION_119612), UnderSupervision);
        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_SUPERVISION_IN_CESSATION), SupervisionInCessation);
        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_SUPERVISION_IN_CESSATION_119612),
            SupervisionInCessation);
        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_ACCREDITED), Accredited);
        assert_eq!(TrustServiceStatus::classify(
            SERVICE_STATUS_ACCREDITED_119612), Accredited);
    }

    #[test]
    fn classify_everything_else_as_other() {
        assert_eq!(TrustServiceStatus::classify(""),
                   TrustServiceStatus::Other);
        assert_eq!(TrustServiceStatus::classify(
            "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/withdrawn"),
            TrustServiceStatus::Other);
        // No case folding.
        assert_eq!(TrustServiceStatus::classify(
            &SERVICE_STATUS_ACCREDITED_119612.to_uppercase()),
            TrustServiceStatus::Other);
    }

    #[test]
    fn canonicalize_digest_algorithms() {
        assert_eq!("SHA-256".parse::<DigestAlgorithm>().unwrap(),
                   DigestAlgorithm::Sha256);
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(),
                   DigestAlgorithm::Sha256);
        assert_eq!("2.16.840.1.101.3.4.2.1".parse::<DigestAlgorithm>().unwrap(),
                   DigestAlgorithm::Sha256);
        assert_eq!(" SHA1 ".parse::<DigestAlgorithm>().unwrap(),
                   DigestAlgorithm::Sha1);
        assert!("WHIRLPOOL".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn canonicalize_encryption_algorithms() {
        assert_eq!("rsa".parse::<EncryptionAlgorithm>().unwrap(),
                   EncryptionAlgorithm::Rsa);
        assert_eq!("1.2.840.10045.2.1".parse::<EncryptionAlgorithm>().unwrap(),
                   EncryptionAlgorithm::Ecdsa);
        assert_eq!("EC".parse::<EncryptionAlgorithm>().unwrap(),
                   EncryptionAlgorithm::Ecdsa);
        assert!("GOST".parse::<EncryptionAlgorithm>().is_err());
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(Indication::Indeterminate.to_string(), "INDETERMINATE");
        assert_eq!(SubIndication::NoPoe.to_string(), "NO_POE");
    }

    quickcheck! {
        fn digest_canonical_form_roundtrips(algo: DigestAlgorithm) -> bool {
            algo.to_string().parse::<DigestAlgorithm>().unwrap() == algo
        }

        fn encryption_canonical_form_roundtrips(algo: EncryptionAlgorithm)
            -> bool
        {
            algo.to_string().parse::<EncryptionAlgorithm>().unwrap() == algo
        }
    }
}

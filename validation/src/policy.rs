//! Validation policy: revocation freshness and algorithm reliability.
//!
//! Long-term validation cannot treat all cryptographic evidence as
//! forever trustworthy.  An algorithm that was fine when a certificate
//! was signed may since have become breakable, and revocation
//! information ages: the older it is relative to the time under
//! consideration, the less it says about that time.  The
//! [`ValidationPolicy`] trait captures the two knobs the control-time
//! sliding process consults: the maximum acceptable age of revocation
//! data, and the expiration catalogue mapping algorithms (and, for
//! encryption algorithms, key lengths) to the instant they stop being
//! reliable.
//!
//! [`StandardPolicy`] ships sensible cutoffs and can be adjusted
//! programmatically or loaded from a TOML document.  Whatever the
//! source, a policy must be *idempotent*: queried twice with the same
//! arguments during a run, it must answer the same.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::types::{DigestAlgorithm, EncryptionAlgorithm};
use crate::Error;
use crate::Result;

/// A policy for long-term validation decisions.
pub trait ValidationPolicy: fmt::Debug {
    /// Returns the maximum acceptable age of revocation status
    /// information, measured between its issuance and the current
    /// control-time.
    fn revocation_freshness(&self) -> Duration;

    /// Returns the instant at which the digest algorithm stops being
    /// reliable, if the policy knows one.
    fn digest_algorithm_expiration(&self, algo: DigestAlgorithm)
        -> Option<SystemTime>;

    /// Returns the instant at which the encryption algorithm, used
    /// with the given key length, stops being reliable.
    ///
    /// A `None` key length queries the algorithm without a length
    /// qualifier.
    fn encryption_algorithm_expiration(&self, algo: EncryptionAlgorithm,
                                       key_length: Option<u32>)
        -> Option<SystemTime>;
}

// Seconds since the epoch at midnight UTC, January 1 of the named
// year (August 1 for Y2004_08).
const Y1997: u64 = 852_076_800;
const Y2004_08: u64 = 1_091_318_400;
const Y2010: u64 = 1_262_304_000;
const Y2012: u64 = 1_325_376_000;
const Y2013: u64 = 1_356_998_400;
const Y2014: u64 = 1_388_534_400;

/// Default expiration catalogue, keyed by canonical algorithm form.
///
/// MD5 falls with the practical collisions of August 2004.  SHA-1 and
/// the structurally similar RIPEMD-160 fall with the 2013 NIST
/// disallowance of SHA-1 for digital signatures.  Small RSA/DSA moduli
/// track the public factoring records (512 bits long gone, 768 bits
/// factored in 2010) with a margin for 1024-bit keys; 160-bit curves
/// follow the comparable-strength estimate.
const DEFAULT_EXPIRATIONS: &[(&str, u64)] = &[
    ("MD5", Y2004_08),
    ("RIPEMD160", Y2013),
    ("SHA1", Y2013),
    ("DSA512", Y1997),
    ("DSA768", Y2010),
    ("DSA1024", Y2014),
    ("RSA512", Y1997),
    ("RSA768", Y2010),
    ("RSA1024", Y2014),
    ("ECDSA160", Y2012),
];

const DEFAULT_FRESHNESS: Duration = Duration::from_secs(24 * 60 * 60);

/// The standard validation policy.
///
/// Expiration entries are keyed by the canonical form the
/// [`types`](crate::types) parsers produce: the bare name for digest
/// algorithms (`"SHA1"`), the name with the key length appended for
/// encryption algorithms (`"RSA1024"`).  An algorithm without an entry
/// never expires.
#[derive(Debug, Clone)]
pub struct StandardPolicy {
    freshness: Duration,
    expirations: HashMap<String, SystemTime>,
}

impl Default for StandardPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardPolicy {
    /// Instantiates a new `StandardPolicy` with the default
    /// parameters: a 24-hour freshness bound and the default
    /// expiration catalogue.
    pub fn new() -> Self {
        let expirations = DEFAULT_EXPIRATIONS.iter()
            .map(|&(algo, secs)| {
                (algo.to_string(), UNIX_EPOCH + Duration::from_secs(secs))
            })
            .collect();
        StandardPolicy {
            freshness: DEFAULT_FRESHNESS,
            expirations,
        }
    }

    /// Sets the maximum acceptable age of revocation status
    /// information.
    pub fn set_revocation_freshness(&mut self, freshness: Duration) {
        self.freshness = freshness;
    }

    /// Considers `algo` unreliable starting at `cutoff`.
    ///
    /// `algo` is a canonical catalogue key.  A cutoff of `None` means
    /// the algorithm has no known weakness and removes any entry.
    pub fn reject_algorithm_at<C>(&mut self, algo: &str, cutoff: C)
        where C: Into<Option<SystemTime>>
    {
        match cutoff.into() {
            Some(t) => self.expirations.insert(algo.to_string(), t),
            None => self.expirations.remove(algo),
        };
    }

    /// Always considers `algo` reliable.
    pub fn accept_algorithm(&mut self, algo: &str) {
        self.expirations.remove(algo);
    }

    /// Returns the configured cutoff for a canonical catalogue key.
    pub fn algorithm_cutoff(&self, algo: &str) -> Option<SystemTime> {
        self.expirations.get(algo).copied()
    }

    /// Loads a policy from a TOML document.
    ///
    /// The document fully defines the policy; the default catalogue
    /// does not apply.
    ///
    /// ```text
    /// max-revocation-freshness = 86400
    ///
    /// [algorithm-expirations]
    /// SHA1 = "2013-01-01"
    /// RSA1024 = "2014-01-01"
    /// ```
    pub fn from_toml(doc: &str) -> Result<StandardPolicy> {
        let config: PolicyConfig = toml::from_str(doc)
            .map_err(|e| Error::MalformedPolicy(e.to_string()))?;

        let mut policy = StandardPolicy {
            freshness:
                Duration::from_secs(config.max_revocation_freshness),
            expirations: HashMap::new(),
        };
        for (algo, date) in &config.algorithm_expirations {
            let cutoff = crate::fmt::parse_date(date)
                .map_err(|e| Error::MalformedPolicy(
                    format!("algorithm {:?}: {}", algo, e)))?;
            policy.expirations.insert(algo.clone(), cutoff);
        }
        Ok(policy)
    }
}

impl ValidationPolicy for StandardPolicy {
    fn revocation_freshness(&self) -> Duration {
        self.freshness
    }

    fn digest_algorithm_expiration(&self, algo: DigestAlgorithm)
        -> Option<SystemTime>
    {
        self.algorithm_cutoff(&algo.to_string())
    }

    fn encryption_algorithm_expiration(&self, algo: EncryptionAlgorithm,
                                       key_length: Option<u32>)
        -> Option<SystemTime>
    {
        let key = match key_length {
            Some(bits) => format!("{}{}", algo, bits),
            None => algo.to_string(),
        };
        self.algorithm_cutoff(&key)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyConfig {
    #[serde(rename = "max-revocation-freshness")]
    max_revocation_freshness: u64,
    #[serde(rename = "algorithm-expirations", default)]
    algorithm_expirations: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::parse_date;
    use crate::frozen_time;

    #[test]
    fn default_catalogue() {
        let p = StandardPolicy::new();

        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha1),
                   Some(parse_date("2013-01-01").unwrap()));
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Md5),
                   Some(parse_date("2004-08-01").unwrap()));
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha256),
                   None);
        assert_eq!(p.revocation_freshness(),
                   Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn encryption_lookup_appends_the_key_length() {
        let p = StandardPolicy::new();

        assert_eq!(p.encryption_algorithm_expiration(
            EncryptionAlgorithm::Rsa, Some(1024)),
            Some(parse_date("2014-01-01").unwrap()));
        assert_eq!(p.encryption_algorithm_expiration(
            EncryptionAlgorithm::Rsa, Some(2048)), None);
        // Without a key length, only a bare entry matches.
        assert_eq!(p.encryption_algorithm_expiration(
            EncryptionAlgorithm::Rsa, None), None);
    }

    #[test]
    fn adjusting_the_catalogue() {
        let mut p = StandardPolicy::new();

        p.accept_algorithm("SHA1");
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha1),
                   None);

        p.reject_algorithm_at("SHA256", frozen_time());
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha256),
                   Some(frozen_time()));

        p.reject_algorithm_at("SHA256", None);
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha256),
                   None);

        p.reject_algorithm_at("DSA2048", frozen_time());
        assert_eq!(p.encryption_algorithm_expiration(
            EncryptionAlgorithm::Dsa, Some(2048)), Some(frozen_time()));
    }

    #[test]
    fn load_from_toml() {
        let p = StandardPolicy::from_toml(r#"
            max-revocation-freshness = 3600

            [algorithm-expirations]
            SHA1 = "2009-01-01"
            RSA1024 = "2010-03-01"
        "#).unwrap();

        assert_eq!(p.revocation_freshness(), Duration::from_secs(3600));
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Sha1),
                   Some(parse_date("2009-01-01").unwrap()));
        assert_eq!(p.encryption_algorithm_expiration(
            EncryptionAlgorithm::Rsa, Some(1024)),
            Some(parse_date("2010-03-01").unwrap()));
        // The document replaces the default catalogue.
        assert_eq!(p.digest_algorithm_expiration(DigestAlgorithm::Md5),
                   None);
    }

    #[test]
    fn reject_malformed_toml() {
        assert!(StandardPolicy::from_toml("").is_err());
        assert!(StandardPolicy::from_toml(r#"
            max-revocation-freshness = 3600
            unexpected = true
        "#).is_err());
        assert!(StandardPolicy::from_toml(r#"
            max-revocation-freshness = 3600

            [algorithm-expirations]
            SHA1 = "first of January"
        "#).is_err());
    }

    #[test]
    fn usable_as_a_trait_object() {
        let standard = StandardPolicy::new();
        let p: &dyn ValidationPolicy = &standard;
        assert_eq!(p.revocation_freshness(), DEFAULT_FRESHNESS);
    }
}

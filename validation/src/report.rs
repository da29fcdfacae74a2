//! The validation report fragment.
//!
//! Alongside its numeric result, control-time sliding produces an
//! auditable trace: one [`Constraint`] per check evaluated, grouped
//! under the certificate it was evaluated for, in evaluation order.
//! The tree built here is the data model only; rendering it as XML or
//! JSON is the job of an external emitter (the types implement
//! [`serde::Serialize`] for that purpose).
//!
//! Appending is the only mutation.  Sibling order is the observable
//! trace order and consumers rely on it.

use std::fmt;
use std::time::SystemTime;

use serde::{Serialize, Serializer};

use crate::types::CertificateId;

/// Identifies a constraint check of the control-time sliding process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// What is the trust service status of the trust anchor?
    Witss,
    /// Does revocation information exist for the certificate?
    Drie,
    /// Is the certificate not expired at the issuance date of the
    /// revocation status information?
    Icneaidorsi,
    /// Is the issuance date of the revocation status information
    /// before control-time?
    Iidorsibct,
    /// Does the set of POEs contain a proof of existence of the
    /// certificate at control-time?
    Dsopcpoeoc,
    /// Sliding of the control-time.
    Sct,
}

impl MessageTag {
    /// Returns the stable identifier recorded in serialized reports.
    pub fn id(&self) -> &'static str {
        match self {
            MessageTag::Witss => "CTS_WITSS",
            MessageTag::Drie => "CTS_DRIE",
            MessageTag::Icneaidorsi => "CTS_ICNEAIDORSI",
            MessageTag::Iidorsibct => "CTS_IIDORSIBCT",
            MessageTag::Dsopcpoeoc => "CTS_DSOPCPOEOC",
            MessageTag::Sct => "CTS_SCT",
        }
    }

    /// Returns the check's description.
    pub fn message(&self) -> &'static str {
        match self {
            MessageTag::Witss =>
                "What is the trusted service status?",
            MessageTag::Drie =>
                "Does the revocation information exist for the certificate?",
            MessageTag::Icneaidorsi =>
                "Is the certificate not expired at the issuance date of the \
                 revocation status information?",
            MessageTag::Iidorsibct =>
                "Is the issuance date of the revocation status information \
                 before control-time?",
            MessageTag::Dsopcpoeoc =>
                "Does the set of POEs contain a proof of existence of the \
                 certificate?",
            MessageTag::Sct =>
                "Sliding of the control-time.",
        }
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for MessageTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.serialize_str(self.id())
    }
}

/// Outcome of a single constraint evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// The check passed.
    Ok,
    /// The check failed.
    Ko,
}

/// A typed attribute attached to a constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Info {
    /// Control-time at the point the attribute was recorded.
    ControlTime(SystemTime),
    /// Issuance time of the revocation status information.
    RevocationIssuingTime(SystemTime),
    /// Time at which the certificate was revoked.
    RevocationTime(SystemTime),
    /// Expiration of an algorithm used to sign the certificate.
    CertificateAlgorithmExpiration(SystemTime),
    /// Expiration of an algorithm used to sign the revocation data.
    RevocationAlgorithmExpiration(SystemTime),
    /// Raw trust-service status of the trust anchor.
    TrustedServiceStatus(String),
    /// Certificate the surrounding constraint refers to.
    CertificateId(CertificateId),
    /// The certificate's revocation information was older than the
    /// freshness bound.
    StaleRevocation(CertificateId),
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let date = crate::fmt::date;
        match self {
            Info::ControlTime(t) =>
                write!(f, "control-time: {}", date(*t)),
            Info::RevocationIssuingTime(t) =>
                write!(f, "revocation issued: {}", date(*t)),
            Info::RevocationTime(t) =>
                write!(f, "revoked: {}", date(*t)),
            Info::CertificateAlgorithmExpiration(t) =>
                write!(f, "certificate algorithm expired: {}", date(*t)),
            Info::RevocationAlgorithmExpiration(t) =>
                write!(f, "revocation algorithm expired: {}", date(*t)),
            Info::TrustedServiceStatus(s) =>
                write!(f, "trusted service status: {:?}", s),
            Info::CertificateId(id) =>
                write!(f, "certificate: {}", id),
            Info::StaleRevocation(id) =>
                write!(f, "stale revocation information for {}", id),
        }
    }
}

/// A single constraint evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    tag: MessageTag,
    status: Option<Status>,
    infos: Vec<Info>,
}

impl Constraint {
    /// Returns the constraint's tag.
    pub fn tag(&self) -> MessageTag {
        self.tag
    }

    /// Returns the recorded outcome, if one was set.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Returns the attached attributes, in recording order.
    pub fn infos(&self) -> &[Info] {
        &self.infos
    }
}

/// The per-certificate constraint container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRecord {
    id: CertificateId,
    constraints: Vec<Constraint>,
}

impl CertificateRecord {
    /// Returns the certificate this container belongs to.
    pub fn id(&self) -> &CertificateId {
        &self.id
    }

    /// Returns the evaluated constraints, in evaluation order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Addresses a constraint within a [`Fragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintHandle {
    certificate: usize,
    constraint: usize,
}

/// The report fragment of one control-time sliding run.
///
/// A root container (`control-time-sliding-data` in serialized
/// reports) holding one [`CertificateRecord`] per processed chain
/// element, in processing order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename = "control-time-sliding-data")]
pub struct Fragment {
    certificates: Vec<CertificateRecord>,
}

impl Fragment {
    /// Returns an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a container for `id`.
    ///
    /// Subsequent [`add_constraint`](Fragment::add_constraint) calls
    /// append to it.
    pub fn open_certificate(&mut self, id: &CertificateId) {
        self.certificates.push(CertificateRecord {
            id: id.clone(),
            constraints: Vec::new(),
        });
    }

    /// Appends a constraint to the open certificate container and
    /// returns a handle to it.
    ///
    /// # Panics
    ///
    /// Panics if no certificate container has been opened.
    pub fn add_constraint(&mut self, tag: MessageTag) -> ConstraintHandle {
        let certificate = self.certificates.len().checked_sub(1)
            .expect("no open certificate container");
        let constraints = &mut self.certificates[certificate].constraints;
        constraints.push(Constraint {
            tag,
            status: None,
            infos: Vec::new(),
        });
        ConstraintHandle {
            certificate,
            constraint: constraints.len() - 1,
        }
    }

    /// Records the outcome of the constraint behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this fragment.
    pub fn set_status(&mut self, handle: ConstraintHandle, status: Status) {
        self.constraint_mut(handle).status = Some(status);
    }

    /// Appends a typed attribute to the constraint behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this fragment.
    pub fn add_info(&mut self, handle: ConstraintHandle, info: Info) {
        self.constraint_mut(handle).infos.push(info);
    }

    fn constraint_mut(&mut self, handle: ConstraintHandle) -> &mut Constraint {
        &mut self.certificates[handle.certificate]
            .constraints[handle.constraint]
    }

    /// Returns the certificate containers, in processing order.
    pub fn certificates(&self) -> &[CertificateRecord] {
        &self.certificates
    }

    /// Iterates over all constraints, in trace order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.certificates.iter().flat_map(|c| c.constraints.iter())
    }

    /// Returns the last recorded constraint.
    pub fn last_constraint(&self) -> Option<&Constraint> {
        self.certificates.iter().rev()
            .find_map(|c| c.constraints.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let mut fragment = Fragment::new();

        fragment.open_certificate(&CertificateId::from("root"));
        fragment.open_certificate(&CertificateId::from("ee"));
        let drie = fragment.add_constraint(MessageTag::Drie);
        fragment.set_status(drie, Status::Ok);
        let sct = fragment.add_constraint(MessageTag::Sct);
        fragment.set_status(sct, Status::Ok);
        fragment.add_info(sct, Info::TrustedServiceStatus("s".into()));
        fragment.add_info(sct, Info::CertificateId("ee".into()));

        let certificates = fragment.certificates();
        assert_eq!(certificates.len(), 2);
        assert_eq!(certificates[0].id(), &CertificateId::from("root"));
        assert!(certificates[0].constraints().is_empty());

        let tags: Vec<_> = fragment.constraints().map(|c| c.tag()).collect();
        assert_eq!(tags, [MessageTag::Drie, MessageTag::Sct]);

        let last = fragment.last_constraint().unwrap();
        assert_eq!(last.tag(), MessageTag::Sct);
        assert_eq!(last.infos().len(), 2);
        assert_eq!(last.infos()[0],
                   Info::TrustedServiceStatus("s".into()));
    }

    #[test]
    fn status_can_be_set_later() {
        let mut fragment = Fragment::new();
        fragment.open_certificate(&CertificateId::from("ee"));

        let handle = fragment.add_constraint(MessageTag::Drie);
        assert_eq!(fragment.last_constraint().unwrap().status(), None);

        fragment.set_status(handle, Status::Ko);
        assert_eq!(fragment.last_constraint().unwrap().status(),
                   Some(Status::Ko));
    }

    #[test]
    #[should_panic(expected = "no open certificate container")]
    fn constraints_need_an_open_container() {
        Fragment::new().add_constraint(MessageTag::Drie);
    }

    #[test]
    fn tags_serialize_as_their_ids() {
        let mut fragment = Fragment::new();
        fragment.open_certificate(&CertificateId::from("ee"));
        let handle = fragment.add_constraint(MessageTag::Dsopcpoeoc);
        fragment.set_status(handle, Status::Ko);

        let json = serde_json::to_string(&fragment).unwrap();
        assert!(json.contains("\"CTS_DSOPCPOEOC\""), "{}", json);
        assert!(json.contains("\"Ko\""), "{}", json);
    }

    #[test]
    fn display() {
        assert_eq!(MessageTag::Sct.to_string(), "CTS_SCT");
        assert_eq!(
            Info::StaleRevocation("ca".into()).to_string(),
            "stale revocation information for ca");
        assert_eq!(
            Info::ControlTime(crate::frozen_time()).to_string(),
            "control-time: 2020-06-01T00:00:00Z");
    }
}

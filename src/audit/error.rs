use thiserror::Error;

/// Errors raised before any check runs. Individual checks never fail; they
/// report their outcome through [`crate::audit::CheckResult`].
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }
}

/// A DNS query that could not complete (timeout, SERVFAIL, network failure).
///
/// "No records of this type" is not a fault; the lookup adapter maps it to an
/// empty record set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("DNS query for {name} failed: {detail}")]
pub struct DnsFault {
    pub name: String,
    pub detail: String,
}

impl DnsFault {
    pub(crate) fn new(name: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            detail: detail.to_string(),
        }
    }
}

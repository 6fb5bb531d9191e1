#![forbid(unsafe_code)]
//! mailaudit_lib — audit of a domain's email-authentication DNS posture

pub mod audit;
pub use audit::{
    AuditError, AuditOptions, CheckName, CheckResult, CheckStatus, DnsFault, DomainReport, MxHost,
    ProviderProfile, SpfQualifier, SpfTerm, SpfTermKind, audit_domain, audit_domain_with_options,
    provider_profile,
};

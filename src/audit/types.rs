use std::fmt;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::error::DnsFault;
use super::spf::SpfTerm;

#[cfg_attr(
    feature = "with-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Error,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckName {
    #[cfg_attr(feature = "with-serde", serde(rename = "SPF"))]
    Spf,
    #[cfg_attr(feature = "with-serde", serde(rename = "DMARC"))]
    Dmarc,
    #[cfg_attr(feature = "with-serde", serde(rename = "DKIM"))]
    Dkim,
    #[cfg_attr(feature = "with-serde", serde(rename = "MX"))]
    Mx,
    #[cfg_attr(feature = "with-serde", serde(rename = "BIMI"))]
    Bimi,
    #[cfg_attr(feature = "with-serde", serde(rename = "MTA-STS"))]
    MtaSts,
}

impl CheckName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spf => "SPF",
            Self::Dmarc => "DMARC",
            Self::Dkim => "DKIM",
            Self::Mx => "MX",
            Self::Bimi => "BIMI",
            Self::MtaSts => "MTA-STS",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One MX host as published, resolver order preserved.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub priority: u16,
    pub exchange: String,
}

impl MxHost {
    pub fn new(priority: u16, exchange: impl Into<String>) -> Self {
        Self {
            priority,
            exchange: exchange.into(),
        }
    }
}

/// Uniform outcome of a single mechanism check.
///
/// `status` and the optional fields are mutually consistent: `error` means
/// the DNS query itself failed (`error` field set), `fail` means resolution
/// succeeded but no valid record was found, `pass` means a record satisfied
/// the mechanism's validity rule.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: CheckName,
    pub status: CheckStatus,
    pub info: String,
    /// Raw matched DNS value, where a single record is the subject.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub record: Option<String>,
    /// Full MX record set.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub records: Option<Vec<MxHost>>,
    /// Parsed SPF terms; empty when the record was not parsed.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub mechanisms: Option<Vec<SpfTerm>>,
    /// Ordered policy violations.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub warnings: Option<Vec<String>>,
    /// DMARC `p=` value.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub policy: Option<String>,
    /// Whether the DMARC record carries an `rua=` reporting address.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rua: Option<bool>,
    /// DKIM selector that yielded the key.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub selector: Option<String>,
    /// Resolution-fault detail, set exactly when `status` is `error`.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl CheckResult {
    fn bare(name: CheckName, status: CheckStatus, info: String) -> Self {
        Self {
            name,
            status,
            info,
            record: None,
            records: None,
            mechanisms: None,
            warnings: None,
            policy: None,
            rua: None,
            selector: None,
            error: None,
        }
    }

    pub(crate) fn pass(name: CheckName, info: impl Into<String>) -> Self {
        Self::bare(name, CheckStatus::Pass, info.into())
    }

    pub(crate) fn fail(name: CheckName, info: impl Into<String>) -> Self {
        Self::bare(name, CheckStatus::Fail, info.into())
    }

    pub(crate) fn error(name: CheckName, fault: &DnsFault) -> Self {
        let mut result = Self::bare(name, CheckStatus::Error, "DNS query failed.".to_string());
        result.error = Some(fault.to_string());
        result
    }
}

/// Report for one domain: one entry per mechanism, fixed shape.
#[cfg_attr(
    feature = "with-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: String,
    pub spf: CheckResult,
    pub dmarc: CheckResult,
    pub dkim: CheckResult,
    pub mx: CheckResult,
    pub bimi: CheckResult,
    pub mta_sts: CheckResult,
}

impl DomainReport {
    pub fn checks(&self) -> [&CheckResult; 6] {
        [
            &self.spf,
            &self.dmarc,
            &self.dkim,
            &self.mx,
            &self.bimi,
            &self.mta_sts,
        ]
    }

    pub fn all_pass(&self) -> bool {
        self.checks()
            .iter()
            .all(|check| check.status == CheckStatus::Pass)
    }
}

/// Configuration knobs for [`crate::audit::audit_domain_with_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOptions {
    provider: Option<String>,
    timeout_ms: u64,
    attempts: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            provider: None,
            timeout_ms: 5_000,
            attempts: 2,
        }
    }
}

impl AuditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, key: impl Into<String>) -> Self {
        let normalized = key.into().trim().to_ascii_lowercase();
        self.provider = (!normalized.is_empty()).then_some(normalized);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Per-query deadline as a [`Duration`]. A zero timeout keeps the
    /// resolver's own default.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

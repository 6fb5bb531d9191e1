//! DNS posture checks for a mail domain.
//!
//! The public entry point is [`audit_domain`], which resolves the published
//! SPF, DMARC, DKIM, MX, BIMI and MTA-STS records for a domain and returns a
//! [`DomainReport`] with one uniformly-shaped [`CheckResult`] per mechanism.
//! Checks never raise past their boundary: a failed DNS query degrades to an
//! `error`-status result, an absent or non-compliant record to `fail`.

mod dkim;
mod dmarc;
mod error;
mod mx;
mod providers;
mod resolver;
mod spf;
mod txt;
mod types;

pub use error::{AuditError, DnsFault};
pub use providers::{ProviderProfile, provider_profile};
pub use spf::{SpfQualifier, SpfTerm, SpfTermKind};
pub use types::{AuditOptions, CheckName, CheckResult, CheckStatus, DomainReport, MxHost};

use resolver::{DnsClient, build_resolver, fqdn, normalize_domain};
use tracing::debug;

pub async fn audit_domain(
    domain: &str,
    provider: Option<&str>,
) -> Result<DomainReport, AuditError> {
    let mut options = AuditOptions::default();
    if let Some(key) = provider {
        options = options.with_provider(key);
    }
    audit_domain_with_options(domain, &options).await
}

pub async fn audit_domain_with_options(
    domain: &str,
    options: &AuditOptions,
) -> Result<DomainReport, AuditError> {
    let ascii = normalize_domain(domain)?;
    let resolver = build_resolver(options)?;
    Ok(audit_with_client(&resolver, &ascii, options).await)
}

pub(crate) async fn audit_with_client<C>(
    client: &C,
    ascii_domain: &str,
    options: &AuditOptions,
) -> DomainReport
where
    C: DnsClient + Sync,
{
    let profile = providers::profile_or_generic(options.provider());
    debug!(domain = ascii_domain, provider = profile.name, "running checks");

    let bimi_name = fqdn("default._bimi", ascii_domain);
    let mta_sts_name = fqdn("_mta-sts", ascii_domain);

    // Every lookup is independent; the report is bounded by the slowest
    // single DNS round trip, not their sum.
    let (spf, dmarc, dkim, mx, bimi, mta_sts) = tokio::join!(
        spf::check(client, ascii_domain),
        dmarc::check(client, ascii_domain),
        dkim::probe(client, ascii_domain, profile),
        mx::check(client, ascii_domain),
        txt::check(client, CheckName::Bimi, &bimi_name, |record| {
            record.starts_with("v=BIMI1")
        }),
        txt::check(client, CheckName::MtaSts, &mta_sts_name, |record| {
            record.starts_with("v=STS1")
        }),
    );

    DomainReport {
        domain: ascii_domain.to_string(),
        spf,
        dmarc,
        dkim,
        mx,
        bimi,
        mta_sts,
    }
}

#[cfg(test)]
mod tests;

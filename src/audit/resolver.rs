use async_trait::async_trait;
use trust_dns_resolver::{
    TokioAsyncResolver,
    error::{ResolveError, ResolveErrorKind},
    lookup::TxtLookup,
    system_conf::read_system_conf,
};

use super::error::{AuditError, DnsFault};
use super::types::{AuditOptions, MxHost};

pub(crate) fn normalize_domain(domain: &str) -> Result<String, AuditError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(AuditError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(AuditError::idna)
}

pub(crate) fn fqdn(label: &str, domain: &str) -> String {
    let trimmed = label.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        domain.to_string()
    } else {
        format!("{}.{}", trimmed.to_ascii_lowercase(), domain)
    }
}

/// Seam between the checks and the system resolver.
///
/// Both lookups classify "no records of this type exist" (`NoRecordsFound`)
/// as an empty set; `Err` is reserved for queries that could not complete.
/// No retries happen at this layer beyond the resolver's own attempts.
#[async_trait]
pub(crate) trait DnsClient {
    /// TXT records at `name`, each record's segments flattened into one
    /// logical string.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsFault>;

    /// MX records for `name`, resolver-provided order preserved.
    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsFault>;
}

pub(crate) fn build_resolver(options: &AuditOptions) -> Result<TokioAsyncResolver, AuditError> {
    let (config, mut opts) = read_system_conf().map_err(AuditError::resolver_init)?;
    if let Some(timeout) = options.timeout() {
        opts.timeout = timeout;
    }
    opts.attempts = options.attempts();
    Ok(TokioAsyncResolver::tokio(config, opts))
}

#[async_trait]
impl DnsClient for TokioAsyncResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsFault> {
        match self.txt_lookup(name).await {
            Ok(lookup) => Ok(collect_txt_records(&lookup)),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(DnsFault::new(name, err)),
        }
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsFault> {
        match self.mx_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| MxHost::new(mx.preference(), normalize_exchange(mx.exchange().to_utf8())))
                .collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(DnsFault::new(name, err)),
        }
    }
}

fn collect_txt_records(lookup: &TxtLookup) -> Vec<String> {
    let mut records = Vec::new();
    for txt in lookup.iter() {
        let mut record = String::new();
        for piece in txt.txt_data().iter() {
            record.push_str(&String::from_utf8_lossy(piece.as_ref()));
        }
        records.push(record);
    }
    records
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

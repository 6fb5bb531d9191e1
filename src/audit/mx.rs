use tracing::warn;

use super::resolver::DnsClient;
use super::types::{CheckName, CheckResult, MxHost};

pub(crate) async fn check<C>(client: &C, domain: &str) -> CheckResult
where
    C: DnsClient + Sync,
{
    match client.lookup_mx(domain).await {
        Ok(records) => evaluate(&records),
        Err(fault) => {
            warn!(domain, %fault, "MX lookup failed");
            CheckResult::error(CheckName::Mx, &fault)
        }
    }
}

pub(crate) fn evaluate(records: &[MxHost]) -> CheckResult {
    if records.is_empty() {
        return CheckResult::fail(CheckName::Mx, "No MX records found.");
    }
    let mut result = CheckResult::pass(CheckName::Mx, format!("{} record(s) found.", records.len()));
    result.records = Some(records.to_vec());
    result
}

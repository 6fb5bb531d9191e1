use tracing::warn;

use super::resolver::{DnsClient, fqdn};
use super::types::{CheckName, CheckResult};

pub(crate) async fn check<C>(client: &C, domain: &str) -> CheckResult
where
    C: DnsClient + Sync,
{
    let name = fqdn("_dmarc", domain);
    match client.lookup_txt(&name).await {
        Ok(records) => evaluate(&records),
        Err(fault) => {
            warn!(query = %name, %fault, "DMARC TXT lookup failed");
            CheckResult::error(CheckName::Dmarc, &fault)
        }
    }
}

pub(crate) fn evaluate(records: &[String]) -> CheckResult {
    let record = records
        .iter()
        .map(|record| record.trim())
        .find(|trimmed| trimmed.starts_with("v=DMARC1"));
    let Some(record) = record else {
        return CheckResult::fail(CheckName::Dmarc, "No DMARC record found.");
    };

    // A record without a policy is non-compliant even though it exists; the
    // raw record and reporting-address flag are still reported.
    let mut result = match policy_value(record) {
        Some(policy) => {
            let mut result =
                CheckResult::pass(CheckName::Dmarc, format!("Policy is set to \"{policy}\"."));
            result.policy = Some(policy);
            result
        }
        None => CheckResult::fail(
            CheckName::Dmarc,
            "DMARC record found, but required \"p\" (policy) tag is missing.",
        ),
    };
    result.record = Some(record.to_string());
    result.rua = Some(record.contains("rua="));
    result
}

/// Value of the `p=` tag: the text between `p=` and the next `;`.
fn policy_value(record: &str) -> Option<String> {
    record.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("p=")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

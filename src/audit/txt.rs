use tracing::warn;

use super::resolver::DnsClient;
use super::types::{CheckName, CheckResult};

/// Parametrized TXT-record check: fetch `query` and pass on the first record
/// satisfying `predicate`. Used for BIMI and MTA-STS.
pub(crate) async fn check<C, P>(client: &C, name: CheckName, query: &str, predicate: P) -> CheckResult
where
    C: DnsClient + Sync,
    P: Fn(&str) -> bool,
{
    match client.lookup_txt(query).await {
        Ok(records) => evaluate(name, &records, predicate),
        Err(fault) => {
            warn!(check = name.as_str(), query, %fault, "TXT lookup failed");
            CheckResult::error(name, &fault)
        }
    }
}

pub(crate) fn evaluate<P>(name: CheckName, records: &[String], predicate: P) -> CheckResult
where
    P: Fn(&str) -> bool,
{
    let matched = records
        .iter()
        .map(|record| record.trim())
        .find(|trimmed| predicate(trimmed));
    match matched {
        Some(record) => {
            let mut result = CheckResult::pass(name, "Valid record found.");
            result.record = Some(record.to_string());
            result
        }
        None => CheckResult::fail(name, "Record not found."),
    }
}

use tracing::warn;

use super::providers::ProviderProfile;
use super::resolver::{DnsClient, fqdn};
use super::types::{CheckName, CheckResult};

/// Probe the profile's candidate selectors in order and stop at the first
/// published key. Selector order encodes likelihood.
///
/// A failed lookup for one selector must not end the scan of the remaining
/// candidates; faults are logged and the scan continues.
pub(crate) async fn probe<C>(client: &C, domain: &str, profile: &ProviderProfile) -> CheckResult
where
    C: DnsClient + Sync,
{
    for selector in profile.selectors {
        let name = fqdn(&format!("{selector}._domainkey"), domain);
        match client.lookup_txt(&name).await {
            Ok(records) => {
                let record = records
                    .iter()
                    .map(|record| record.trim())
                    .find(|trimmed| trimmed.starts_with("v=DKIM1"));
                if let Some(record) = record {
                    let mut result = CheckResult::pass(
                        CheckName::Dkim,
                        format!("Key found with selector: '{selector}'."),
                    );
                    result.selector = Some(selector.to_string());
                    result.record = Some(record.to_string());
                    return result;
                }
            }
            Err(fault) => warn!(%selector, %fault, "DKIM selector lookup failed"),
        }
    }
    CheckResult::fail(CheckName::Dkim, "No DKIM key found for known selectors.")
}

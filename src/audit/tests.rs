use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::DnsFault;
use super::providers;
use super::resolver::{DnsClient, fqdn, normalize_domain, normalize_exchange};
use super::spf::{SpfQualifier, SpfTermKind};
use super::types::{AuditOptions, CheckName, CheckStatus, MxHost};
use super::{AuditError, audit_with_client, dkim, dmarc, mx, spf, txt};

#[derive(Default)]
struct StubClient {
    txt: HashMap<String, Result<Vec<String>, DnsFault>>,
    mx: HashMap<String, Result<Vec<MxHost>, DnsFault>>,
    queried: Mutex<Vec<String>>,
}

impl StubClient {
    fn new() -> Self {
        Self::default()
    }

    fn txt_records<I, S>(&mut self, name: &str, records: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.txt.insert(
            normalize_name(name),
            Ok(records.into_iter().map(Into::into).collect()),
        );
    }

    fn txt_fault(&mut self, name: &str, detail: &str) {
        self.txt
            .insert(normalize_name(name), Err(DnsFault::new(name, detail)));
    }

    fn mx_records(&mut self, name: &str, records: Vec<MxHost>) {
        self.mx.insert(normalize_name(name), Ok(records));
    }

    fn mx_fault(&mut self, name: &str, detail: &str) {
        self.mx
            .insert(normalize_name(name), Err(DnsFault::new(name, detail)));
    }

    fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsClient for StubClient {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsFault> {
        let key = normalize_name(name);
        self.queried.lock().unwrap().push(key.clone());
        self.txt.get(&key).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsFault> {
        let key = normalize_name(name);
        self.queried.lock().unwrap().push(key.clone());
        self.mx.get(&key).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn spf_with_includes(count: usize) -> String {
    let mut record = String::from("v=spf1");
    for index in 0..count {
        record.push_str(&format!(" include:spf{index}.example.net"));
    }
    record.push_str(" -all");
    record
}

#[test]
fn normalize_domain_rejects_empty() {
    let err = normalize_domain("  ").expect_err("empty domain should fail");
    assert!(matches!(err, AuditError::EmptyDomain));
}

#[test]
fn normalize_domain_converts_idna() {
    let ascii = normalize_domain("BÜCHER.example").expect("conversion succeeds");
    assert_eq!(ascii, "xn--bcher-kva.example");
}

#[test]
fn fqdn_composes_label_and_domain() {
    assert_eq!(fqdn("_dmarc", "example.com"), "_dmarc.example.com");
    assert_eq!(fqdn("", "example.com"), "example.com");
    assert_eq!(fqdn("Default._BIMI.", "example.com"), "default._bimi.example.com");
}

#[test]
fn normalize_exchange_trims_dot_and_lowercases() {
    let out = normalize_exchange("Mail.EXAMPLE.com.".to_string());
    assert_eq!(out, "mail.example.com");
}

#[test]
fn audit_options_normalize_provider_key() {
    let options = AuditOptions::new().with_provider("  Klaviyo ");
    assert_eq!(options.provider(), Some("klaviyo"));
    assert!(AuditOptions::new().with_provider("").provider().is_none());
    assert!(AuditOptions::new().with_timeout_ms(0).timeout().is_none());
}

#[test]
fn spf_missing_record_fails() {
    let result = spf::evaluate(&[]);
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.info, "No SPF record found.");
    assert_eq!(result.mechanisms.as_deref(), Some(&[][..]));
    assert_eq!(result.warnings.as_deref(), Some(&[][..]));
}

#[test]
fn spf_version_filter_is_case_insensitive() {
    let result = spf::evaluate(&["V=SPF1 -ALL".to_string()]);
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.info, "SPF record is valid.");
}

#[test]
fn spf_parses_qualifiers_and_terms() {
    let input = vec!["v=spf1 a mx:mail.example.com ip4:192.0.2.0/24 ~all".to_string()];
    let result = spf::evaluate(&input);
    assert_eq!(result.status, CheckStatus::Pass);

    let mechanisms = result.mechanisms.expect("spf carries mechanisms");
    assert_eq!(mechanisms.len(), 4);
    assert_eq!(mechanisms[0].kind, SpfTermKind::A);
    assert_eq!(mechanisms[0].qualifier, SpfQualifier::Pass);
    assert_eq!(mechanisms[1].kind, SpfTermKind::Mx);
    assert_eq!(mechanisms[1].value.as_deref(), Some("mail.example.com"));
    assert_eq!(mechanisms[2].kind, SpfTermKind::Ip4);
    assert_eq!(mechanisms[2].value.as_deref(), Some("192.0.2.0/24"));
    assert_eq!(mechanisms[3].kind, SpfTermKind::All);
    assert_eq!(mechanisms[3].qualifier, SpfQualifier::SoftFail);
}

#[test]
fn spf_redirect_parsed_as_modifier() {
    let result = spf::evaluate(&["v=spf1 redirect=_spf.example.net".to_string()]);
    assert_eq!(result.status, CheckStatus::Pass);

    let mechanisms = result.mechanisms.expect("spf carries mechanisms");
    assert_eq!(mechanisms.len(), 1);
    assert_eq!(mechanisms[0].kind, SpfTermKind::Redirect);
    assert_eq!(mechanisms[0].value.as_deref(), Some("_spf.example.net"));
}

#[test]
fn spf_bad_terms_fail_but_keep_parsed_ones() {
    let input = vec!["v=spf1 ip4:999.0.2.0 bogus -all".to_string()];
    let result = spf::evaluate(&input);
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.info, "SPF record has syntax errors.");

    let mechanisms = result.mechanisms.expect("spf carries mechanisms");
    assert_eq!(mechanisms.len(), 1);
    assert_eq!(mechanisms[0].kind, SpfTermKind::All);
}

#[test]
fn spf_multiple_records_fail_without_parsing() {
    let input = vec![
        "v=spf1 include:_spf.example.net -all".to_string(),
        "v=spf1 -all".to_string(),
    ];
    let result = spf::evaluate(&input);
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.mechanisms.as_deref(), Some(&[][..]));

    let warnings = result.warnings.expect("spf carries warnings");
    assert_eq!(
        warnings,
        vec!["Critical: Multiple SPF records found. Only one is allowed.".to_string()]
    );
}

#[test]
fn spf_eleven_lookups_exceed_the_limit() {
    let result = spf::evaluate(&[spf_with_includes(11)]);
    assert_eq!(result.status, CheckStatus::Fail);

    let warnings = result.warnings.expect("spf carries warnings");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("11"));
    assert!(warnings[0].contains("10"));
}

#[test]
fn spf_ten_lookups_stay_within_the_limit() {
    let result = spf::evaluate(&[spf_with_includes(10)]);
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.warnings.as_deref(), Some(&[][..]));
}

#[tokio::test]
async fn spf_lookup_fault_reports_error_status() {
    let mut stub = StubClient::new();
    stub.txt_fault("example.com", "connection timed out");

    let result = spf::check(&stub, "example.com").await;
    assert_eq!(result.status, CheckStatus::Error);
    assert_eq!(result.info, "DNS query failed.");
    assert!(result.error.expect("fault detail").contains("timed out"));
}

#[test]
fn dmarc_missing_record_fails() {
    let result = dmarc::evaluate(&["v=spf1 -all".to_string()]);
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.info, "No DMARC record found.");
    assert!(result.record.is_none());
}

#[test]
fn dmarc_record_without_policy_tag_fails() {
    let result = dmarc::evaluate(&["v=DMARC1; rua=mailto:x@y.com".to_string()]);
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result.info.contains("(policy) tag is missing"));
    assert!(result.record.is_some());
    assert_eq!(result.rua, Some(true));
    assert!(result.policy.is_none());
}

#[test]
fn dmarc_policy_and_rua_extracted() {
    let result = dmarc::evaluate(&["v=DMARC1; p=reject; rua=mailto:x@y.com".to_string()]);
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.info, "Policy is set to \"reject\".");
    assert_eq!(result.policy.as_deref(), Some("reject"));
    assert_eq!(result.rua, Some(true));
}

#[test]
fn dmarc_without_rua_reports_false() {
    let result = dmarc::evaluate(&["v=DMARC1; p=none".to_string()]);
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.policy.as_deref(), Some("none"));
    assert_eq!(result.rua, Some(false));
}

#[tokio::test]
async fn dkim_klaviyo_probes_only_its_selector() {
    let mut stub = StubClient::new();
    stub.txt_records(
        "klaviyo._domainkey.example.com",
        ["v=DKIM1; k=rsa; p=MIGfMA0GCSqGSIb3"],
    );

    let profile = providers::profile_or_generic(Some("klaviyo"));
    let result = dkim::probe(&stub, "example.com", profile).await;

    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.selector.as_deref(), Some("klaviyo"));
    assert_eq!(result.info, "Key found with selector: 'klaviyo'.");
    assert_eq!(stub.queried(), vec!["klaviyo._domainkey.example.com"]);
}

#[tokio::test]
async fn dkim_selector_fault_does_not_abort_the_scan() {
    let mut stub = StubClient::new();
    stub.txt_fault("selector1._domainkey.example.com", "SERVFAIL");
    stub.txt_records(
        "selector2._domainkey.example.com",
        ["v=DKIM1; p=MIGfMA0GCSqGSIb3"],
    );

    let profile = providers::profile_or_generic(Some("microsoft365"));
    let result = dkim::probe(&stub, "example.com", profile).await;

    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.selector.as_deref(), Some("selector2"));
}

#[tokio::test]
async fn dkim_exhausted_selectors_fail() {
    let stub = StubClient::new();
    let profile = providers::profile_or_generic(None);
    let result = dkim::probe(&stub, "example.com", profile).await;

    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.info, "No DKIM key found for known selectors.");
    assert_eq!(stub.queried().len(), profile.selectors.len());
}

#[tokio::test]
async fn dkim_amazonses_has_nothing_to_probe() {
    let stub = StubClient::new();
    let profile = providers::profile_or_generic(Some("amazonses"));
    let result = dkim::probe(&stub, "example.com", profile).await;

    assert_eq!(result.status, CheckStatus::Fail);
    assert!(stub.queried().is_empty());
}

#[test]
fn unknown_provider_falls_back_to_generic() {
    let generic = providers::profile_or_generic(None);
    assert_eq!(providers::profile_or_generic(Some("unknown-esp")), generic);
    assert_eq!(generic.selectors[0], "google");
    assert!(super::provider_profile("Generic").is_some());
    assert!(super::provider_profile("unknown-esp").is_none());
}

#[tokio::test]
async fn mx_preserves_resolver_order() {
    let mut stub = StubClient::new();
    stub.mx_records(
        "example.com",
        vec![
            MxHost::new(20, "mx2.example.com"),
            MxHost::new(5, "mx1.example.com"),
            MxHost::new(10, "mx3.example.com"),
        ],
    );

    let result = mx::check(&stub, "example.com").await;
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.info, "3 record(s) found.");

    let records = result.records.expect("mx carries records");
    assert_eq!(records[0].priority, 20);
    assert_eq!(records[1].priority, 5);
    assert_eq!(records[2].priority, 10);
}

#[tokio::test]
async fn mx_absent_fails_and_fault_errors() {
    let stub = StubClient::new();
    let result = mx::check(&stub, "example.com").await;
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.info, "No MX records found.");

    let mut stub = StubClient::new();
    stub.mx_fault("example.com", "no route to host");
    let result = mx::check(&stub, "example.com").await;
    assert_eq!(result.status, CheckStatus::Error);
    assert!(result.error.expect("fault detail").contains("no route"));
}

#[tokio::test]
async fn txt_check_matches_predicate() {
    let mut stub = StubClient::new();
    stub.txt_records(
        "default._bimi.example.com",
        ["unrelated", "v=BIMI1; l=https://example.com/logo.svg"],
    );

    let result = txt::check(
        &stub,
        CheckName::Bimi,
        "default._bimi.example.com",
        |record| record.starts_with("v=BIMI1"),
    )
    .await;

    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.info, "Valid record found.");
    assert!(result.record.expect("matched record").starts_with("v=BIMI1"));
}

#[tokio::test]
async fn txt_fault_reports_error_status() {
    let mut stub = StubClient::new();
    stub.txt_fault("_mta-sts.example.com", "SERVFAIL");

    let result = txt::check(&stub, CheckName::MtaSts, "_mta-sts.example.com", |record| {
        record.starts_with("v=STS1")
    })
    .await;

    assert_eq!(result.status, CheckStatus::Error);
    assert_eq!(result.info, "DNS query failed.");
    assert!(result.error.expect("fault detail").contains("SERVFAIL"));
}

fn populated_stub() -> StubClient {
    let mut stub = StubClient::new();
    stub.txt_records("example.com", ["v=spf1 include:_spf.example.net ~all"]);
    stub.txt_records(
        "_dmarc.example.com",
        ["v=DMARC1; p=reject; rua=mailto:dmarc@example.com"],
    );
    stub.txt_records(
        "google._domainkey.example.com",
        ["v=DKIM1; k=rsa; p=MIGfMA0GCSqGSIb3"],
    );
    stub.mx_records(
        "example.com",
        vec![
            MxHost::new(10, "mx1.example.com"),
            MxHost::new(20, "mx2.example.com"),
        ],
    );
    stub.txt_records(
        "default._bimi.example.com",
        ["v=BIMI1; l=https://example.com/logo.svg"],
    );
    stub.txt_records("_mta-sts.example.com", ["v=STS1; id=20240101T000000"]);
    stub
}

#[tokio::test]
async fn empty_zone_fails_every_check_without_errors() {
    let stub = StubClient::new();
    let report = audit_with_client(&stub, "example.com", &AuditOptions::default()).await;
    for check in report.checks() {
        assert_eq!(check.status, CheckStatus::Fail, "{} should fail", check.name);
        assert!(check.error.is_none(), "{} should not error", check.name);
    }
}

#[tokio::test]
async fn audit_combines_all_checks() {
    let stub = populated_stub();
    let report = audit_with_client(&stub, "example.com", &AuditOptions::default()).await;

    assert_eq!(report.domain, "example.com");
    assert!(report.all_pass());
    assert_eq!(report.dkim.selector.as_deref(), Some("google"));
    assert_eq!(report.dmarc.policy.as_deref(), Some("reject"));
    assert_eq!(report.mx.records.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn one_faulty_check_does_not_abort_the_rest() {
    let mut stub = populated_stub();
    stub.txt_fault("example.com", "connection timed out");

    let report = audit_with_client(&stub, "example.com", &AuditOptions::default()).await;
    assert_eq!(report.spf.status, CheckStatus::Error);
    assert_eq!(report.dmarc.status, CheckStatus::Pass);
    assert_eq!(report.mx.status, CheckStatus::Pass);
    assert_eq!(report.bimi.status, CheckStatus::Pass);
}

#[tokio::test]
async fn audit_is_idempotent() {
    let stub = populated_stub();
    let options = AuditOptions::default();
    let first = audit_with_client(&stub, "example.com", &options).await;
    let second = audit_with_client(&stub, "example.com", &options).await;
    assert_eq!(first, second);

    #[cfg(feature = "with-serde")]
    {
        let first_json = serde_json::to_string(&first).expect("serializable report");
        let second_json = serde_json::to_string(&second).expect("serializable report");
        assert_eq!(first_json, second_json);
    }
}

mod spf_parser_properties {
    use proptest::prelude::*;

    use super::super::spf;

    proptest! {
        #[test]
        fn evaluate_is_total(records in prop::collection::vec(".*", 0..4)) {
            let _ = spf::evaluate(&records);
        }

        #[test]
        fn lookup_count_matches_include_count(count in 0usize..20) {
            let mut record = String::from("v=spf1");
            for index in 0..count {
                record.push_str(&format!(" include:spf{index}.example.net"));
            }
            prop_assert_eq!(spf::count_lookup_terms(&record), count);
        }
    }
}

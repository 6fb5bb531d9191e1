use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::resolver::DnsClient;
use super::types::{CheckName, CheckResult, CheckStatus};

/// Hard ceiling on lookup-incurring terms (RFC 7208 §4.6.4).
const MAX_DNS_LOOKUPS: usize = 10;

static LOOKUP_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("include:|a:|mx:|exists:|redirect=").expect("static pattern"));

#[cfg_attr(
    feature = "with-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpfQualifier {
    Pass,
    Fail,
    SoftFail,
    Neutral,
}

impl SpfQualifier {
    fn from_prefix(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Pass),
            '-' => Some(Self::Fail),
            '~' => Some(Self::SoftFail),
            '?' => Some(Self::Neutral),
            _ => None,
        }
    }
}

#[cfg_attr(
    feature = "with-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpfTermKind {
    All,
    Include,
    A,
    Mx,
    Ptr,
    Ip4,
    Ip6,
    Exists,
    Redirect,
    Exp,
    Modifier,
}

/// One parsed SPF term. Modifiers carry the implicit `+` qualifier.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfTerm {
    pub qualifier: SpfQualifier,
    pub kind: SpfTermKind,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub value: Option<String>,
}

pub(crate) async fn check<C>(client: &C, domain: &str) -> CheckResult
where
    C: DnsClient + Sync,
{
    match client.lookup_txt(domain).await {
        Ok(records) => evaluate(&records),
        Err(fault) => {
            warn!(domain, %fault, "SPF TXT lookup failed");
            let mut result = CheckResult::error(CheckName::Spf, &fault);
            result.mechanisms = Some(Vec::new());
            result.warnings = Some(Vec::new());
            result
        }
    }
}

pub(crate) fn evaluate(records: &[String]) -> CheckResult {
    let spf_records: Vec<&str> = records
        .iter()
        .map(|record| record.trim())
        .filter(|trimmed| starts_with_ignore_ascii_case(trimmed, "v=spf1"))
        .collect();

    let mut mechanisms = Vec::new();
    let mut warnings = Vec::new();

    let (status, info) = if spf_records.is_empty() {
        (CheckStatus::Fail, "No SPF record found.".to_string())
    } else if spf_records.len() > 1 {
        // Duplicate records are fatal on their own; neither is parsed.
        warnings.push("Critical: Multiple SPF records found. Only one is allowed.".to_string());
        (CheckStatus::Fail, "Multiple SPF records found.".to_string())
    } else {
        let record = spf_records[0];
        let parsed = parse_record(record);
        mechanisms = parsed.terms;

        let mut status = if parsed.errors.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        let info = if parsed.errors.is_empty() {
            "SPF record is valid.".to_string()
        } else {
            "SPF record has syntax errors.".to_string()
        };

        let lookups = count_lookup_terms(record);
        if lookups > MAX_DNS_LOOKUPS {
            status = CheckStatus::Fail;
            warnings.push(format!(
                "Critical: {lookups} DNS lookups found, exceeding the limit of {MAX_DNS_LOOKUPS}."
            ));
        }
        (status, info)
    };

    let mut result = CheckResult::fail(CheckName::Spf, info);
    result.status = status;
    result.mechanisms = Some(mechanisms);
    result.warnings = Some(warnings);
    result
}

pub(crate) struct ParsedSpf {
    pub terms: Vec<SpfTerm>,
    pub errors: Vec<String>,
}

pub(crate) fn parse_record(record: &str) -> ParsedSpf {
    let mut terms = Vec::new();
    let mut errors = Vec::new();

    let mut tokens = record.split_whitespace();
    match tokens.next() {
        Some(version) if version.eq_ignore_ascii_case("v=spf1") => {}
        _ => errors.push("record does not begin with 'v=spf1'".to_string()),
    }
    for token in tokens {
        match parse_term(token) {
            Ok(term) => terms.push(term),
            Err(error) => errors.push(error),
        }
    }

    ParsedSpf { terms, errors }
}

/// Lexical count of lookup-incurring tokens over the raw record.
pub(crate) fn count_lookup_terms(record: &str) -> usize {
    LOOKUP_TOKENS.find_iter(record).count()
}

fn parse_term(term: &str) -> Result<SpfTerm, String> {
    let mut rest = term;
    let mut qualifier = SpfQualifier::Pass;
    let mut explicit_qualifier = false;
    if let Some(first) = rest.chars().next() {
        if let Some(parsed) = SpfQualifier::from_prefix(first) {
            qualifier = parsed;
            explicit_qualifier = true;
            rest = &rest[1..];
        }
    }
    if rest.is_empty() {
        return Err(format!("'{term}' is not a valid term"));
    }

    let is_modifier = match (rest.find('='), rest.find(':')) {
        (Some(eq), Some(colon)) => eq < colon,
        (Some(_), None) => true,
        _ => false,
    };
    if is_modifier {
        if explicit_qualifier {
            return Err(format!("'{term}': modifiers take no qualifier"));
        }
        parse_modifier(term, rest)
    } else {
        parse_mechanism(term, qualifier, rest)
    }
}

fn parse_modifier(term: &str, rest: &str) -> Result<SpfTerm, String> {
    let (name, value) = match rest.split_once('=') {
        Some(pair) => pair,
        None => return Err(format!("'{term}' is not a valid term")),
    };
    if value.is_empty() {
        return Err(format!("'{term}': modifier requires a value"));
    }
    let lower = name.to_ascii_lowercase();
    if !is_modifier_name(&lower) {
        return Err(format!("'{term}': invalid modifier name '{name}'"));
    }

    let (kind, value) = match lower.as_str() {
        "redirect" => (SpfTermKind::Redirect, value.to_string()),
        "exp" => (SpfTermKind::Exp, value.to_string()),
        _ => (SpfTermKind::Modifier, format!("{lower}={value}")),
    };
    Ok(SpfTerm {
        qualifier: SpfQualifier::Pass,
        kind,
        value: Some(value),
    })
}

fn parse_mechanism(term: &str, qualifier: SpfQualifier, rest: &str) -> Result<SpfTerm, String> {
    let (name, value) = match rest.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    // `a/24`-style terms carry the prefix length on the bare mechanism name.
    let (name, prefix) = match name.split_once('/') {
        Some((name, prefix)) => (name, Some(prefix)),
        None => (name, None),
    };
    if matches!(value, Some("")) {
        return Err(format!("'{term}': mechanism argument is empty"));
    }

    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "all" => {
            if value.is_some() || prefix.is_some() {
                return Err(format!("'{term}': 'all' takes no argument"));
            }
            Ok(SpfTerm {
                qualifier,
                kind: SpfTermKind::All,
                value: None,
            })
        }
        "include" | "exists" => {
            let kind = if lower == "include" {
                SpfTermKind::Include
            } else {
                SpfTermKind::Exists
            };
            match (value, prefix) {
                (Some(target), None) => Ok(SpfTerm {
                    qualifier,
                    kind,
                    value: Some(target.to_string()),
                }),
                _ => Err(format!("'{term}': a target domain is required")),
            }
        }
        "a" | "mx" | "ptr" => {
            let kind = match lower.as_str() {
                "a" => SpfTermKind::A,
                "mx" => SpfTermKind::Mx,
                _ => SpfTermKind::Ptr,
            };
            if kind == SpfTermKind::Ptr && prefix.is_some() {
                return Err(format!("'{term}': prefix length is not allowed"));
            }
            if let Some(prefix) = prefix {
                if !valid_prefix(prefix, 32) {
                    return Err(format!("'{term}': invalid prefix length '/{prefix}'"));
                }
            }
            let argument = match (value, prefix) {
                (Some(value), None) => Some(value.to_string()),
                (None, Some(prefix)) => Some(format!("/{prefix}")),
                (Some(value), Some(prefix)) => Some(format!("{value}/{prefix}")),
                (None, None) => None,
            };
            Ok(SpfTerm {
                qualifier,
                kind,
                value: argument,
            })
        }
        "ip4" | "ip6" => {
            let (kind, max_prefix) = if lower == "ip4" {
                (SpfTermKind::Ip4, 32)
            } else {
                (SpfTermKind::Ip6, 128)
            };
            match (value, prefix) {
                (Some(network), None) if valid_ip(network, max_prefix) => Ok(SpfTerm {
                    qualifier,
                    kind,
                    value: Some(network.to_string()),
                }),
                _ => {
                    let family = if max_prefix == 32 { "IPv4" } else { "IPv6" };
                    Err(format!("'{term}': a valid {family} network is required"))
                }
            }
        }
        other => Err(format!("'{term}': unknown mechanism '{other}'")),
    }
}

fn is_modifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn valid_ip(network: &str, max_prefix: u8) -> bool {
    let (addr, prefix) = match network.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (network, None),
    };
    let addr_ok = if max_prefix == 32 {
        addr.parse::<Ipv4Addr>().is_ok()
    } else {
        addr.parse::<Ipv6Addr>().is_ok()
    };
    addr_ok && prefix.map_or(true, |prefix| valid_prefix(prefix, max_prefix))
}

fn valid_prefix(prefix: &str, max: u8) -> bool {
    prefix
        .parse::<u8>()
        .map(|length| length <= max)
        .unwrap_or(false)
}

fn starts_with_ignore_ascii_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

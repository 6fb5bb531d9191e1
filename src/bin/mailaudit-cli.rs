use anyhow::Result;
use clap::Parser;
use mailaudit_lib::{AuditOptions, CheckStatus, DomainReport, audit_domain_with_options, provider_profile};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mailaudit-cli",
    about = "Audit a domain's email-authentication DNS posture"
)]
struct Cli {
    /// domain to audit (e.g. example.com)
    domain: String,

    /// email service provider hint for DKIM selector probing
    #[arg(long, default_value = "generic")]
    esp: String,

    /// format: human|json
    #[arg(long, default_value = "human")]
    format: String,

    /// per-query DNS timeout (ms); 0 keeps the resolver default
    #[arg(long, default_value_t = 5_000)]
    timeout: u64,

    /// resolver attempts per query
    #[arg(long, default_value_t = 2)]
    attempts: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if provider_profile(&cli.esp).is_none() {
        eprintln!(
            "unknown --esp '{}', falling back to generic selectors",
            cli.esp
        );
    }

    let options = AuditOptions::new()
        .with_provider(&cli.esp)
        .with_timeout_ms(cli.timeout)
        .with_attempts(cli.attempts);
    let report = audit_domain_with_options(&cli.domain, &options).await?;

    match cli.format.as_str() {
        "human" => print_human(&report),
        "json" => {
            #[cfg(feature = "with-serde")]
            {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            #[cfg(not(feature = "with-serde"))]
            {
                eprintln!("format=json nécessite la feature 'with-serde'");
                std::process::exit(1);
            }
        }
        other => {
            eprintln!("unknown --format '{}', use: human|json", other);
            std::process::exit(1);
        }
    }

    // codes de sortie : 0 OK, 2 findings, 1 fatal
    if !report.all_pass() {
        std::process::exit(2);
    }
    Ok(())
}

fn print_human(report: &DomainReport) {
    println!("domain: {}", report.domain);
    for check in report.checks() {
        let label = match check.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Fail => "[FAIL]",
            CheckStatus::Error => "[ERR] ",
        };
        println!("{label} {:<8} {}", check.name.as_str(), check.info);
        if let Some(selector) = &check.selector {
            println!("        selector: {selector}");
        }
        if let Some(policy) = &check.policy {
            println!("        policy: {policy}");
        }
        if let Some(records) = &check.records {
            for mx in records {
                println!("        {:>3} {}", mx.priority, mx.exchange);
            }
        }
        if let Some(warnings) = &check.warnings {
            for warning in warnings {
                println!("        warning: {warning}");
            }
        }
        if let Some(error) = &check.error {
            println!("        error: {error}");
        }
    }
}

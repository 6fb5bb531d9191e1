use phf::phf_map;

/// DKIM selector candidates published as defaults by an email service
/// provider. Entries are product data; list order encodes probe priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub selectors: &'static [&'static str],
}

const GENERIC: ProviderProfile = ProviderProfile {
    name: "Generic",
    selectors: &[
        "google",
        "selector1",
        "selector2",
        "k1",
        "k2",
        "k3",
        "default",
        "mail",
        "dkim",
    ],
};

static PROVIDERS: phf::Map<&'static str, ProviderProfile> = phf_map! {
    "generic" => GENERIC,
    "google-workspace" => ProviderProfile {
        name: "Google Workspace",
        selectors: &["google"],
    },
    "microsoft365" => ProviderProfile {
        name: "Microsoft 365",
        selectors: &["selector1", "selector2"],
    },
    "mailchimp" => ProviderProfile {
        name: "Mailchimp",
        selectors: &["k1", "k2", "k3"],
    },
    "sendgrid" => ProviderProfile {
        name: "SendGrid",
        selectors: &["s1", "s2", "em"],
    },
    "klaviyo" => ProviderProfile {
        name: "Klaviyo",
        selectors: &["klaviyo"],
    },
    "hubspot" => ProviderProfile {
        name: "HubSpot",
        selectors: &["hs1", "hs2"],
    },
    "brevo" => ProviderProfile {
        name: "Brevo",
        selectors: &["mail"],
    },
    "mailerlite" => ProviderProfile {
        name: "MailerLite",
        selectors: &["ml"],
    },
    "postmark" => ProviderProfile {
        name: "Postmark",
        selectors: &["pm"],
    },
    "mailgun" => ProviderProfile {
        name: "Mailgun",
        selectors: &["smtp", "k1"],
    },
    // SES generates per-identity selectors; there is nothing static to probe.
    "amazonses" => ProviderProfile {
        name: "Amazon SES",
        selectors: &[],
    },
};

/// Profile registered under `key`, if any.
pub fn provider_profile(key: &str) -> Option<&'static ProviderProfile> {
    PROVIDERS.get(key.trim().to_ascii_lowercase().as_str())
}

/// Profile for `key`, falling back to the generic selector list when the key
/// is absent or unrecognized.
pub(crate) fn profile_or_generic(key: Option<&str>) -> &'static ProviderProfile {
    key.and_then(provider_profile).unwrap_or(&GENERIC)
}

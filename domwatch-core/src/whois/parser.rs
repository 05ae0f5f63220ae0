use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const AVAILABLE_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "status: free",
    "status: available",
    "domain not found",
    "no object found",
];

// Values never continue onto the next line: an empty "Domain Status:" is no status.
static STATUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^[ \t]*Domain Status:[ \t]*(.+)$",
        r"(?im)^[ \t]*Status:[ \t]*(.+)$",
        r"(?im)^[ \t]*state:[ \t]*(.+)$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// A WHOIS record reduced to the fields the notifier reports on.
///
/// `status` keeps each status line as the registry wrote it, including any
/// trailing informational URL.
#[derive(Debug, Clone)]
pub struct WhoisResponse {
    pub domain: String,
    pub registrar: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub status: Vec<String>,
    pub whois_server: String,
    pub raw_response: String,
}

impl WhoisResponse {
    pub fn parse(domain: &str, whois_server: &str, raw: &str) -> Self {
        let registrar = extract_field(raw, &[
            r"(?i)Registrar:[ \t]*(.+)",
            r"(?i)Registrar Name:[ \t]*(.+)",
            r"(?i)Sponsoring Registrar:[ \t]*(.+)",
        ]);

        let expiration_date = extract_date(raw, &[
            r"(?i)(?:Registry )?Expir(?:y|ation) Date:[ \t]*(.+)",
            r"(?i)Expires On:[ \t]*(.+)",
            r"(?i)expires:[ \t]*(.+)",
            r"(?i)paid-till:[ \t]*(.+)",
        ]);

        WhoisResponse {
            domain: domain.to_string(),
            registrar,
            expiration_date,
            status: extract_all(raw, &STATUS_PATTERNS),
            whois_server: whois_server.to_string(),
            raw_response: raw.to_string(),
        }
    }

    /// Whether the registry answered with one of its "no such domain" phrases.
    pub fn is_available(&self) -> bool {
        let lower = self.raw_response.to_lowercase();
        AVAILABLE_PATTERNS.iter().any(|p| lower.contains(p))
    }
}

fn extract_field(text: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) {
            let value = m.as_str().trim().to_string();
            if !value.is_empty() && value.to_lowercase() != "redacted" {
                return Some(value);
            }
        }
    }
    None
}

fn extract_date(text: &str, patterns: &[&str]) -> Option<DateTime<Utc>> {
    let date_str = extract_field(text, patterns)?;
    parse_date(&date_str)
}

fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let formats = [
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%Y.%m.%d",
        "%Y/%m/%d",
        "%d.%m.%Y",
        "%d/%m/%Y",
    ];

    // registro.br appends a change counter: "20240101 #12345"
    let cleaned = date_str
        .split(" #")
        .next()
        .unwrap_or(date_str)
        .trim()
        .replace(" UTC", "Z")
        .replace(" (UTC)", "");

    let cleaned = if cleaned.len() == 8 && cleaned.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &cleaned[..4], &cleaned[4..6], &cleaned[6..])
    } else {
        cleaned
    };

    for fmt in &formats {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt.and_utc());
        }
        if let Ok(d) = chrono::NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    cleaned.parse::<DateTime<Utc>>().ok()
}

fn extract_all(text: &str, patterns: &[Regex]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();

    for re in patterns {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let value = m.as_str().trim().to_string();
                if !value.is_empty() && !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }

    values
}

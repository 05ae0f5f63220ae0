//! Domain name normalization and domain-list parsing

use crate::error::{DomwatchError, Result};

/// Normalize and validate a domain name
///
/// This function:
/// - Removes http:// and https:// prefixes
/// - Removes www. prefix
/// - Removes trailing slashes and paths
/// - Converts to lowercase
/// - Validates format (must contain dots, only alphanumeric/hyphens/dots)
pub fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.trim().to_lowercase();

    let domain = domain
        .strip_prefix("http://")
        .or_else(|| domain.strip_prefix("https://"))
        .unwrap_or(&domain);

    let domain = domain.split('/').next().unwrap_or(domain);
    let domain = domain.strip_prefix("www.").unwrap_or(domain);

    if domain.is_empty() || !domain.contains('.') {
        return Err(DomwatchError::InvalidDomain(domain.to_string()));
    }

    let valid = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(DomwatchError::InvalidDomain(domain.to_string()));
    }

    // Empty labels and labels with leading/trailing hyphens
    for label in domain.split('.') {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return Err(DomwatchError::InvalidDomain(domain.to_string()));
        }
    }

    Ok(domain.to_string())
}

/// Split a comma- or whitespace-separated domain list.
///
/// Entries are returned as written; [`normalize_domain`] decides which are valid.
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

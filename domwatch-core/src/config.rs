//! Startup configuration read from the environment.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::schedule::Schedule;
use crate::validation::{normalize_domain, parse_domain_list};

pub const TOKEN_VAR: &str = "DISCORD_TOKEN";
pub const CHANNEL_VAR: &str = "DISCORD_CHANNEL";
pub const DOMAINS_VAR: &str = "DOMWATCH_DOMAINS";
pub const PASS_INTERVAL_VAR: &str = "DOMWATCH_PASS_INTERVAL_SECS";
pub const CONNECTION_PAUSE_VAR: &str = "DOMWATCH_CONNECTION_PAUSE_SECS";

/// Read from the working directory when present.
pub const ENV_FILE: &str = ".env";

/// Watched when no list is configured.
pub const DEFAULT_DOMAINS: &[&str] = &["solutech.dev"];

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub channel_id: u64,
    pub domains: Vec<String>,
    pub schedule: Schedule,
}

// Hand-written so the token never reaches a log line.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("domains", &self.domains)
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl Config {
    /// Process environment first, then the dotenv file at `path`.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::layered(path.as_ref(), |name| std::env::var(name).ok())
    }

    fn layered<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = read_env_file(path)?;
        Self::from_source(|name| env(name).or_else(|| file.get(name).cloned()))
    }

    /// Build from any variable source; `from_env_file` passes the process
    /// environment backed by a dotenv file.
    pub fn from_source<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = get(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing(TOKEN_VAR))?;

        let channel_raw = get(CHANNEL_VAR)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::Missing(CHANNEL_VAR))?;
        let channel_id = channel_raw
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: CHANNEL_VAR,
                reason: format!("'{}' is not a numeric channel id: {}", channel_raw, e),
            })?;

        let domains = match get(DOMAINS_VAR) {
            Some(raw) => parse_domain_list(&raw),
            None => DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect(),
        };

        let mut schedule = Schedule::default();
        if let Some(secs) = read_secs(&get, PASS_INTERVAL_VAR)? {
            schedule = schedule.with_pass_interval(secs);
        }
        if let Some(secs) = read_secs(&get, CONNECTION_PAUSE_VAR)? {
            schedule = schedule.with_connection_pause(secs);
        }

        Self {
            token,
            channel_id,
            domains: Vec::new(),
            schedule,
        }
        .with_domains(domains)
    }

    /// Replace the watched list, normalizing every entry.
    pub fn with_domains<I, S>(mut self, domains: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for domain in domains {
            let domain = normalize_domain(domain.as_ref()).map_err(|e| ConfigError::Invalid {
                name: DOMAINS_VAR,
                reason: e.to_string(),
            })?;
            if !normalized.contains(&domain) {
                normalized.push(domain);
            }
        }

        if normalized.is_empty() {
            return Err(ConfigError::Invalid {
                name: DOMAINS_VAR,
                reason: "no domains to watch".to_string(),
            });
        }

        self.domains = normalized;
        Ok(self)
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(env_file_error(e)),
    };

    entries
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_file_error)
}

fn read_secs<F>(get: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return Ok(None);
    };
    let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("'{}' is not a number of seconds: {}", raw, e),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Some(Duration::from_secs(secs)))
}

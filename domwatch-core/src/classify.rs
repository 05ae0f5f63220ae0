//! Turns lookup results into the status text posted to the channel.

use std::fmt;
use std::time::Duration;

use crate::error::LookupError;
use crate::lookup::LookupOutcome;

pub const AVAILABLE_MARKER: &str = "✅ Disponível";
pub const TAKEN_GLYPH: &str = "❌";
pub const CONNECTION_ERROR_MARKER: &str = "Erro de conexão";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Available,
    /// Stripped status keywords, in registry order.
    Taken(Vec<String>),
    ConnectionError,
    Error(String),
}

impl Classification {
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Classification::ConnectionError)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Available => f.write_str(AVAILABLE_MARKER),
            Classification::Taken(keywords) => {
                write!(f, "{} {}", TAKEN_GLYPH, keywords.join(", "))
            }
            Classification::ConnectionError => f.write_str(CONNECTION_ERROR_MARKER),
            Classification::Error(detail) => write!(f, "{} Erro: {}", TAKEN_GLYPH, detail),
        }
    }
}

pub fn classify(result: &Result<LookupOutcome, LookupError>) -> Classification {
    match result {
        Ok(LookupOutcome::Available) | Err(LookupError::NotFound) => Classification::Available,
        Ok(LookupOutcome::Registered { statuses, .. }) => {
            let keywords = status_keywords(statuses);
            if keywords.is_empty() {
                Classification::Available
            } else {
                Classification::Taken(keywords)
            }
        }
        Err(LookupError::Connection(_)) => Classification::ConnectionError,
        Err(LookupError::Malformed(detail)) | Err(LookupError::Other(detail)) => {
            Classification::Error(detail.clone())
        }
    }
}

/// Leading keyword of each status token, URLs dropped, first occurrence kept.
pub fn status_keywords<S: AsRef<str>>(statuses: &[S]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for status in statuses {
        let Some(keyword) = status.as_ref().split_whitespace().next() else {
            continue;
        };
        if is_url(keyword) || keywords.iter().any(|k| k == keyword) {
            continue;
        }
        keywords.push(keyword.to_string());
    }
    keywords
}

fn is_url(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Channel messages, one per situation the polling loop reports on.
pub mod messages {
    use super::*;

    pub fn status_line(domain: &str, classification: &Classification) -> String {
        format!("Status do domínio **{}**: {}", domain, classification)
    }

    pub fn connection_retry(domain: &str, pause: Duration) -> String {
        format!(
            "Erro de conexão ao verificar o domínio **{}**. Tentando novamente em {}.",
            domain,
            describe_pause(pause)
        )
    }

    /// Whole minutes when the pause allows it, seconds otherwise.
    fn describe_pause(pause: Duration) -> String {
        let secs = pause.as_secs();
        let (count, one, many) = if secs >= 60 && secs % 60 == 0 {
            (secs / 60, "minuto", "minutos")
        } else {
            (secs, "segundo", "segundos")
        };
        format!("{} {}", count, if count == 1 { one } else { many })
    }

    pub fn too_long(domain: &str) -> String {
        format!("A resposta para {} é muito longa para o Discord.", domain)
    }

    pub fn admin_alert(domain: &str) -> String {
        format!(
            "Ocorreu um erro ao verificar {}. Contate um administrador.",
            domain
        )
    }
}

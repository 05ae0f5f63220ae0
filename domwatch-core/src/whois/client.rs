use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::parser::WhoisResponse;
use super::servers::{get_tld, get_whois_server};
use crate::error::{DomwatchError, Result};
use crate::validation::normalize_domain;

const WHOIS_PORT: u16 = 43;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB
const MAX_REFERRAL_DEPTH: u8 = 3;

static REFERRAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^\s*Registrar WHOIS Server:[ \t]*(\S+)",
        r"(?im)^\s*Whois Server:[ \t]*(\S+)",
        r"(?im)^\s*ReferralServer:[ \t]*whois://(\S+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Plain WHOIS (RFC 3912) client with registrar referral following.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            port: WHOIS_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn lookup(&self, domain: &str) -> Result<WhoisResponse> {
        let domain = normalize_domain(domain)?;
        let tld = get_tld(&domain).ok_or_else(|| DomwatchError::InvalidDomain(domain.clone()))?;

        let whois_server = get_whois_server(tld)
            .ok_or_else(|| DomwatchError::WhoisServerNotFound(tld.to_string()))?;

        let mut visited = HashSet::new();
        self.lookup_with_referrals(&domain, whois_server, 0, &mut visited)
            .await
    }

    /// Query one server directly, without referral following.
    pub async fn lookup_with_server(&self, domain: &str, server: &str) -> Result<WhoisResponse> {
        let domain = normalize_domain(domain)?;
        let raw_response = self.query_server(server, &domain).await?;
        Ok(WhoisResponse::parse(&domain, server, &raw_response))
    }

    fn lookup_with_referrals<'a>(
        &'a self,
        domain: &'a str,
        whois_server: &'a str,
        depth: u8,
        visited: &'a mut HashSet<String>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<WhoisResponse>> + Send + 'a>>
    {
        Box::pin(async move {
            if depth >= MAX_REFERRAL_DEPTH {
                warn!(depth = depth, server = %whois_server, "Max referral depth exceeded");
                return Err(DomwatchError::WhoisError(
                    "Maximum WHOIS referral depth exceeded".to_string(),
                ));
            }

            let server_lower = whois_server.to_lowercase();
            if !visited.insert(server_lower) {
                warn!(server = %whois_server, "Circular WHOIS referral detected");
                return Err(DomwatchError::WhoisError(
                    "Circular WHOIS referral detected".to_string(),
                ));
            }

            debug!(whois_server = %whois_server, depth = depth, "Querying WHOIS server");

            let raw_response = self.query_server(whois_server, domain).await?;
            let response = WhoisResponse::parse(domain, whois_server, &raw_response);

            if let Some(referral) = extract_referral(&raw_response) {
                if !visited.contains(&referral) {
                    debug!(referral = %referral, "Following referral");
                    match self
                        .lookup_with_referrals(domain, &referral, depth + 1, visited)
                        .await
                    {
                        // Registrar records often omit the EPP status lines the registry carries
                        Ok(mut referred) => {
                            if referred.status.is_empty() {
                                referred.status = response.status;
                            }
                            return Ok(referred);
                        }
                        Err(e) => {
                            debug!(referral = %referral, error = %e, "Referral failed, using registry answer");
                        }
                    }
                }
            }

            Ok(response)
        })
    }

    async fn query_server(&self, server: &str, query: &str) -> Result<String> {
        let addr = format!("{}:{}", server, self.port);

        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| DomwatchError::Timeout(format!("Connection to {} timed out", server)))??;

        let query_bytes = format!("{}\r\n", query);
        timeout(self.timeout, stream.write_all(query_bytes.as_bytes()))
            .await
            .map_err(|_| DomwatchError::Timeout("Write timed out".to_string()))??;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => break, // EOF
                Ok(Ok(n)) => {
                    response.extend_from_slice(&buf[..n]);
                    if response.len() > MAX_RESPONSE_SIZE {
                        return Err(DomwatchError::WhoisError("Response too large".to_string()));
                    }
                }
                Ok(Err(e)) => return Err(DomwatchError::WhoisConnectionFailed(e)),
                Err(_) => {
                    // Some servers keep the socket open after answering
                    if !response.is_empty() {
                        break;
                    }
                    return Err(DomwatchError::Timeout("Read timed out".to_string()));
                }
            }
        }

        if response.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(DomwatchError::MalformedResponse(format!(
                "{} returned an empty response",
                server
            )));
        }

        // UTF-8 first, Latin-1 otherwise
        Ok(match String::from_utf8(response) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&c| c as char).collect(),
        })
    }
}

fn extract_referral(response: &str) -> Option<String> {
    REFERRAL_PATTERNS
        .iter()
        .filter_map(|re| re.captures(response))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches('/').to_lowercase())
        .find(|server| server.contains('.'))
}

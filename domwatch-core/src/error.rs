use thiserror::Error;

/// Why a domain lookup could not produce a registration record.
///
/// `NotFound` is benign: it classifies exactly like an available domain.
/// `Connection` is the only kind that pauses the polling loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no registration record found")]
    NotFound,

    #[error("malformed WHOIS response: {0}")]
    Malformed(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

impl LookupError {
    pub fn is_connection(&self) -> bool {
        matches!(self, LookupError::Connection(_))
    }
}

/// Failures reported by a delivery collaborator.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("message exceeds the platform length limit ({len} characters)")]
    TooLong { len: usize },

    #[error("bot token was rejected")]
    Unauthorized,

    #[error("channel {0} not found or not accessible")]
    ChannelNotFound(u64),

    #[error("rate limited: retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },

    #[error("API error (HTTP {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: u64,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeliveryError {
    pub fn is_too_long(&self) -> bool {
        matches!(self, DeliveryError::TooLong { .. })
    }

    /// Whether waiting and asking again could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::RateLimited { .. } => true,
            DeliveryError::Api { status, .. } => *status >= 500,
            DeliveryError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("could not read {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DomwatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("WHOIS server not found for TLD: {0}")]
    WhoisServerNotFound(String),

    #[error("WHOIS lookup failed: {0}")]
    WhoisError(String),

    #[error("WHOIS connection failed: {0}")]
    WhoisConnectionFailed(#[from] std::io::Error),

    #[error("malformed WHOIS response: {0}")]
    MalformedResponse(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("delivery client never became ready: {0}")]
    NotReady(String),
}

impl From<DomwatchError> for LookupError {
    fn from(err: DomwatchError) -> Self {
        match err {
            DomwatchError::WhoisConnectionFailed(e) => LookupError::Connection(e.to_string()),
            DomwatchError::Timeout(msg) => LookupError::Connection(msg),
            DomwatchError::MalformedResponse(msg) => LookupError::Malformed(msg),
            DomwatchError::InvalidDomain(d) => {
                LookupError::Malformed(format!("invalid domain name: {}", d))
            }
            other => LookupError::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomwatchError>;

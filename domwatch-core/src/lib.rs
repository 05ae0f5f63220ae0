pub mod classify;
pub mod config;
pub mod delivery;
pub mod error;
pub mod lookup;
pub mod notifier;
pub mod schedule;
pub mod validation;
pub mod whois;

pub use error::{ConfigError, DeliveryError, DomwatchError, LookupError, Result};
pub use validation::{normalize_domain, parse_domain_list};

pub use classify::{classify, Classification};
pub use config::Config;
pub use delivery::{ChannelHandle, Delivery, DiscordClient};
pub use lookup::{DomainLookup, LookupOutcome, WhoisLookup};
pub use notifier::{Notifier, PassReport};
pub use schedule::Schedule;
pub use whois::{WhoisClient, WhoisResponse};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The account the delivery client is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub username: String,
}

/// A resolved destination channel, reused for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub id: u64,
    pub name: Option<String>,
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

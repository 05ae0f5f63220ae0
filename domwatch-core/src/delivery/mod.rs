//! Message delivery to the notification channel
//!
//! The polling loop only sees the [`Delivery`] trait; [`DiscordClient`] is the
//! production implementation over Discord's REST API.

mod discord;
mod types;

use async_trait::async_trait;

use crate::error::DeliveryError;

pub use discord::{DiscordClient, DISCORD_API_BASE, MAX_MESSAGE_LEN};
pub use types::{BotIdentity, ChannelHandle};

#[async_trait]
pub trait Delivery: Send + Sync {
    /// One readiness probe. Callers poll this until it succeeds.
    async fn ready(&self) -> Result<BotIdentity, DeliveryError>;

    async fn resolve_channel(&self, channel_id: u64) -> Result<ChannelHandle, DeliveryError>;

    async fn send(&self, channel: &ChannelHandle, content: &str) -> Result<(), DeliveryError>;
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{BotIdentity, ChannelHandle};
use super::Delivery;
use crate::error::DeliveryError;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
/// Discord rejects message content above this many characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const INVALID_FORM_BODY: u64 = 50035;

#[derive(Deserialize)]
struct ChannelPayload {
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Discord REST client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: Client,
    token: String,
    api_base: String,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!(
                "DiscordBot (https://github.com/domwatch/domwatch, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            api_base: DISCORD_API_BASE.to_string(),
        })
    }

    /// Point the client at another API root (a local stand-in in tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Delivery for DiscordClient {
    #[instrument(skip(self))]
    async fn ready(&self) -> Result<BotIdentity, DeliveryError> {
        let response = self
            .http
            .get(self.url("/users/@me"))
            .header("Authorization", self.authorization())
            .send()
            .await?;

        let identity: BotIdentity = check_status(response, None).await?.json().await?;
        debug!(username = %identity.username, "Bot identity confirmed");
        Ok(identity)
    }

    #[instrument(skip(self))]
    async fn resolve_channel(&self, channel_id: u64) -> Result<ChannelHandle, DeliveryError> {
        let response = self
            .http
            .get(self.url(&format!("/channels/{}", channel_id)))
            .header("Authorization", self.authorization())
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
        ) {
            return Err(DeliveryError::ChannelNotFound(channel_id));
        }

        let payload: ChannelPayload = check_status(response, None).await?.json().await?;
        Ok(ChannelHandle {
            id: channel_id,
            name: payload.name,
        })
    }

    #[instrument(skip(self, channel, content), fields(channel = channel.id, len = content.chars().count()))]
    async fn send(&self, channel: &ChannelHandle, content: &str) -> Result<(), DeliveryError> {
        let len = content.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(DeliveryError::TooLong { len });
        }

        let response = self
            .http
            .post(self.url(&format!("/channels/{}/messages", channel.id)))
            .header("Authorization", self.authorization())
            .json(&CreateMessage { content })
            .send()
            .await?;

        check_status(response, Some(len)).await?;
        Ok(())
    }
}

/// Map a non-success response onto [`DeliveryError`].
///
/// `content_len` is set for message posts, where an invalid form body means
/// the content was refused.
async fn check_status(
    response: Response,
    content_len: Option<usize>,
) -> Result<Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ApiErrorBody = response.json().await.unwrap_or_default();

    Err(match status {
        StatusCode::UNAUTHORIZED => DeliveryError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => DeliveryError::RateLimited {
            retry_after: body.retry_after.unwrap_or(1.0),
        },
        _ => match content_len {
            Some(len) if body.code == INVALID_FORM_BODY => DeliveryError::TooLong { len },
            _ => DeliveryError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            },
        },
    })
}

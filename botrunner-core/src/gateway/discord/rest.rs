//! Discord REST client

use async_trait::async_trait;
use botrunner_commands::{ModAction, Reply};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::gateway::ChatApi;
use crate::token::BotToken;

const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// Most messages a single fetch or bulk delete accepts
const PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct RateLimit {
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Authenticated client for the REST API
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
}

impl RestClient {
    pub fn new(api_base: &str, token: &BotToken) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&token.authorization())
            .map_err(|_| ApiError::Transport("token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(
                "DiscordBot (https://github.com/botrunner/botrunner, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        reason: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base, path);
        debug!(%method, %path, "Discord API request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(reason) = reason {
            request = request.header(AUDIT_LOG_REASON, urlencoding::encode(reason).into_owned());
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        check(response).await
    }

    async fn create_message(&self, channel_id: &str, body: &Value) -> Result<String, ApiError> {
        let created: Created = self
            .request(
                Method::POST,
                &format!("/channels/{}/messages", channel_id),
                Some(body),
                None,
            )
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(created.id)
    }

    async fn recent_message_ids(
        &self,
        channel_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<Vec<String>, ApiError> {
        let mut path = format!("/channels/{}/messages?limit={}", channel_id, limit);
        if let Some(before) = before {
            path.push_str(&format!("&before={}", before));
        }
        let messages: Vec<Created> = self
            .request(Method::GET, &path, None, None)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(messages.into_iter().map(|m| m.id).collect())
    }

    async fn delete_batch(&self, channel_id: &str, ids: &[String]) -> Result<(), ApiError> {
        match ids {
            [] => Ok(()),
            [single] => self.delete_message(channel_id, single).await,
            many => {
                self.request(
                    Method::POST,
                    &format!("/channels/{}/messages/bulk-delete", channel_id),
                    Some(&json!({ "messages": many })),
                    None,
                )
                .await?;
                Ok(())
            }
        }
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .json::<RateLimit>()
                .await
                .ok()
                .and_then(|r| r.retry_after);
            Err(ApiError::RateLimited { retry_after })
        }
        _ => Err(ApiError::Http {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl ChatApi for RestClient {
    async fn send_message(&self, channel_id: &str, reply: &Reply) -> Result<String, ApiError> {
        self.create_message(channel_id, &reply.to_message_body()).await
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PUT,
            &format!(
                "/channels/{}/messages/{}/reactions/{}/@me",
                channel_id,
                message_id,
                urlencoding::encode(emoji)
            ),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/channels/{}/messages/{}", channel_id, message_id),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, reply: &Reply) -> Result<String, ApiError> {
        let channel: Created = self
            .request(
                Method::POST,
                "/users/@me/channels",
                Some(&json!({ "recipient_id": user_id })),
                None,
            )
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        self.send_message(&channel.id, reply).await
    }

    async fn moderate(&self, action: &ModAction) -> Result<(), ApiError> {
        match action {
            ModAction::Kick {
                guild_id,
                user_id,
                reason,
            } => {
                self.request(
                    Method::DELETE,
                    &format!("/guilds/{}/members/{}", guild_id, user_id),
                    None,
                    Some(reason.as_str()),
                )
                .await?
            }
            ModAction::Ban {
                guild_id,
                user_id,
                reason,
            } => {
                self.request(
                    Method::PUT,
                    &format!("/guilds/{}/bans/{}", guild_id, user_id),
                    Some(&json!({})),
                    Some(reason.as_str()),
                )
                .await?
            }
            ModAction::Unban { guild_id, user_id } => {
                self.request(
                    Method::DELETE,
                    &format!("/guilds/{}/bans/{}", guild_id, user_id),
                    None,
                    None,
                )
                .await?
            }
        };
        Ok(())
    }

    async fn purge(&self, channel_id: &str, limit: u32) -> Result<usize, ApiError> {
        let mut deleted = 0;
        let mut remaining = limit;
        let mut before: Option<String> = None;

        while remaining > 0 {
            let page = remaining.min(PAGE_SIZE);
            let ids = self
                .recent_message_ids(channel_id, page, before.as_deref())
                .await?;
            if ids.is_empty() {
                break;
            }
            self.delete_batch(channel_id, &ids).await?;
            deleted += ids.len();
            remaining = remaining.saturating_sub(ids.len() as u32);
            if (ids.len() as u32) < page {
                break;
            }
            before = ids.last().cloned();
        }
        Ok(deleted)
    }
}

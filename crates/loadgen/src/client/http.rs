//! `reqwest` implementation of [`ChatApi`].

use super::{ChatApi, ClientError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use helpdesk_types::{
    AuthResponse, Conversation, ConversationId, Credentials, ExpertQueue, Identity, Message,
    MessageId, NewConversation, NewMessage,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

const OK: &[StatusCode] = &[StatusCode::OK];
const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

/// HTTP client for the help-desk backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    /// Create a client with default `reqwest` settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Poll `GET /health` until it answers 200 or `timeout` elapses.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), ClientError> {
        let start = Instant::now();
        loop {
            match self.client.get(self.url("/health")).send().await {
                Ok(resp) if resp.status() == StatusCode::OK => return Ok(()),
                Ok(resp) => debug!(status = resp.status().as_u16(), "Backend not ready"),
                Err(e) => debug!(error = %e, "Backend unreachable"),
            }
            if start.elapsed() >= timeout {
                return Err(ClientError::NotReady(timeout));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    fn authed(&self, builder: RequestBuilder, identity: &Identity) -> RequestBuilder {
        builder.header(AUTHORIZATION, identity.bearer())
    }

    async fn poll_updates(
        &self,
        endpoint: &'static str,
        id_param: &'static str,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        let mut query = vec![(id_param, identity.user_id.as_str().to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Micros, true)));
        }
        let resp = self
            .authed(self.client.get(self.url(endpoint)), identity)
            .query(&query)
            .send()
            .await?;
        drain(expect(resp, endpoint, OK)?).await
    }
}

/// Reject any status outside `accepted`.
fn expect(
    resp: Response,
    endpoint: &'static str,
    accepted: &[StatusCode],
) -> Result<Response, ClientError> {
    if accepted.contains(&resp.status()) {
        Ok(resp)
    } else {
        Err(ClientError::UnexpectedStatus {
            endpoint,
            status: resp.status().as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(
    resp: Response,
    endpoint: &'static str,
) -> Result<T, ClientError> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
        endpoint,
        message: e.to_string(),
    })
}

/// Read the body to completion so the connection returns to the pool.
async fn drain(resp: Response) -> Result<(), ClientError> {
    resp.bytes().await?;
    Ok(())
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        const ENDPOINT: &str = "/auth/register";
        let resp = self
            .client
            .post(self.url(ENDPOINT))
            .json(credentials)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, OK_OR_CREATED)?, ENDPOINT).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        const ENDPOINT: &str = "/auth/login";
        let resp = self
            .client
            .post(self.url(ENDPOINT))
            .json(credentials)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, OK)?, ENDPOINT).await
    }

    async fn current_user(&self, identity: &Identity) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/auth/me";
        let resp = self
            .authed(self.client.get(self.url(ENDPOINT)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }

    async fn create_conversation(
        &self,
        identity: &Identity,
        title: &str,
    ) -> Result<Conversation, ClientError> {
        const ENDPOINT: &str = "/conversations";
        let body = NewConversation {
            title: title.to_string(),
        };
        let resp = self
            .authed(self.client.post(self.url(ENDPOINT)), identity)
            .json(&body)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, CREATED)?, ENDPOINT).await
    }

    async fn list_conversations(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Conversation>, ClientError> {
        const ENDPOINT: &str = "/conversations";
        let resp = self
            .authed(self.client.get(self.url(ENDPOINT)), identity)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, OK)?, ENDPOINT).await
    }

    async fn list_messages(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
    ) -> Result<Vec<Message>, ClientError> {
        const ENDPOINT: &str = "/conversations/:id/messages";
        let path = format!("/conversations/{}/messages", conversation.as_str());
        let resp = self
            .authed(self.client.get(self.url(&path)), identity)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, OK)?, ENDPOINT).await
    }

    async fn send_message(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/messages";
        let body = NewMessage {
            conversation_id: conversation.clone(),
            content: content.to_string(),
        };
        let resp = self
            .authed(self.client.post(self.url(ENDPOINT)), identity)
            .json(&body)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, CREATED)?).await
    }

    async fn mark_read(&self, identity: &Identity, message: &MessageId) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/messages/:id/read";
        let path = format!("/messages/{}/read", message.as_str());
        let resp = self
            .authed(self.client.put(self.url(&path)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }

    async fn conversation_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.poll_updates("/api/conversations/updates", "userId", identity, since)
            .await
    }

    async fn message_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.poll_updates("/api/messages/updates", "userId", identity, since)
            .await
    }

    async fn expert_queue_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.poll_updates("/api/expert-queue/updates", "expertId", identity, since)
            .await
    }

    async fn expert_queue(&self, identity: &Identity) -> Result<ExpertQueue, ClientError> {
        const ENDPOINT: &str = "/expert/queue";
        let resp = self
            .authed(self.client.get(self.url(ENDPOINT)), identity)
            .send()
            .await?;
        decode(expect(resp, ENDPOINT, OK)?, ENDPOINT).await
    }

    async fn claim(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
    ) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/expert/conversations/:id/claim";
        let path = format!("/expert/conversations/{}/claim", conversation.as_str());
        let resp = self
            .authed(self.client.post(self.url(&path)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }

    async fn unclaim(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
    ) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/expert/conversations/:id/unclaim";
        let path = format!("/expert/conversations/{}/unclaim", conversation.as_str());
        let resp = self
            .authed(self.client.post(self.url(&path)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }

    async fn expert_profile(&self, identity: &Identity) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/expert/profile";
        let resp = self
            .authed(self.client.get(self.url(ENDPOINT)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }

    async fn assignment_history(&self, identity: &Identity) -> Result<(), ClientError> {
        const ENDPOINT: &str = "/expert/assignments/history";
        let resp = self
            .authed(self.client.get(self.url(ENDPOINT)), identity)
            .send()
            .await?;
        drain(expect(resp, ENDPOINT, OK)?).await
    }
}

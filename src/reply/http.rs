//! HTTP-backed reply engine.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::reply::{ReplyEngine, ReplyTurn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Serialize)]
struct ReplyRequestBody<'a> {
    instruction: &'a str,
    history: Vec<WireTurn<'a>>,
}

#[derive(Debug, Serialize)]
struct WireTurn<'a> {
    role: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyResponseBody {
    reply: String,
}

/// Posts the persona instruction and conversation tail to a generation
/// endpoint and reads back `{"reply": "..."}`. Requests run on the blocking
/// pool; ureq has no async surface.
pub struct HttpReplyEngine {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpReplyEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReplyEngine for HttpReplyEngine {
    async fn generate(&self, instruction: &str, history: &[ReplyTurn]) -> Result<String> {
        let body = serde_json::to_string(&ReplyRequestBody {
            instruction,
            history: history
                .iter()
                .map(|turn| WireTurn {
                    role: turn.role.as_str(),
                    text: &turn.text,
                })
                .collect(),
        })?;

        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let timeout = self.timeout;

        let raw = tokio::task::spawn_blocking(move || -> Result<String> {
            let mut request = ureq::post(&endpoint)
                .timeout(timeout)
                .set("content-type", "application/json");
            if let Some(api_key) = &api_key {
                request = request.set("authorization", &format!("Bearer {api_key}"));
            }

            let response = request
                .send_string(&body)
                .map_err(|err| anyhow!("reply request failed: {err}"))?;
            if !(200..300).contains(&response.status()) {
                return Err(anyhow!(
                    "reply request failed: received HTTP status {}",
                    response.status()
                ));
            }

            response
                .into_string()
                .map_err(|err| anyhow!("failed to read reply response: {err}"))
        })
        .await
        .map_err(|err| anyhow!("reply request task failed: {err}"))??;

        let parsed: ReplyResponseBody = serde_json::from_str(&raw)
            .map_err(|err| anyhow!("reply response is not valid JSON: {err}"))?;
        Ok(parsed.reply)
    }
}

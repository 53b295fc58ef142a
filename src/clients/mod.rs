/// External API clients module
use crate::errors::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

/// Body of a successful upstream response
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Json(Value),
    /// Non-JSON body such as an image tile; the request URL is the resource
    Binary { content_type: String, len: usize },
}

/// Seam between the façade and the network
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> ApiResult<UpstreamPayload>;
}

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent("satellite-pro/1.0")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> ApiResult<UpstreamPayload> {
        let resp = self.get_client().get(url).send().await?;

        if !resp.status().is_success() {
            return Err(ApiError::Transport(format!(
                "request failed with status {}",
                resp.status()
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        if is_json(&content_type) {
            let json: Value = resp.json().await?;
            Ok(UpstreamPayload::Json(json))
        } else {
            let bytes = resp.bytes().await?;
            Ok(UpstreamPayload::Binary {
                content_type,
                len: bytes.len(),
            })
        }
    }
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}


/// In-memory transport that replays a script and records every URL
#[cfg(test)]
pub mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    pub enum Step {
        Reply(UpstreamPayload),
        Fail,
        Hang(Duration),
        Slow(Duration, UpstreamPayload),
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Every request fails
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> ApiResult<UpstreamPayload> {
            self.calls.lock().unwrap().push(url.to_string());
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Reply(payload)) => Ok(payload),
                Some(Step::Hang(d)) => {
                    tokio::time::sleep(d).await;
                    Err(ApiError::Transport("hung request finished late".into()))
                }
                Some(Step::Slow(d, payload)) => {
                    tokio::time::sleep(d).await;
                    Ok(payload)
                }
                Some(Step::Fail) | None => {
                    Err(ApiError::Transport("connection refused".into()))
                }
            }
        }
    }
}

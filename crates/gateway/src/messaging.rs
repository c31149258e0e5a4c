use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors from the messaging agent boundary.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("messaging agent unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("messaging agent rejected the request (status {status}): {body}")]
    Upstream { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, MessagingError>;

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    address: &'a str,
    message: &'a str,
}

/// Client for the separate always-on messaging agent process.
///
/// The gateway only forwards: send to an address, list messages for an
/// address, and health. Message semantics live entirely in the agent.
#[derive(Clone, Debug)]
pub struct MessagingClient {
    client: reqwest::Client,
    base_url: String,
}

impl MessagingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn passthrough(&self, response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(MessagingError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Agent liveness probe.
    pub async fn health(&self) -> Result<serde_json::Value> {
        let response = self.client.get(self.endpoint("health")).send().await?;
        self.passthrough(response).await
    }

    /// Forward a message to an address.
    pub async fn send(&self, address: &str, message: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(self.endpoint("send"))
            .json(&SendBody { address, message })
            .send()
            .await?;
        self.passthrough(response).await
    }

    /// List messages held for an address.
    pub async fn messages_for(&self, address: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.endpoint(&format!("messages/{address}")))
            .send()
            .await?;
        self.passthrough(response).await
    }
}

impl MessagingError {
    /// Status the gateway should answer with when the proxy call fails.
    pub fn http_status(&self) -> StatusCode {
        match self {
            MessagingError::Transport(_) => StatusCode::BAD_GATEWAY,
            MessagingError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

// src/remote_api.rs
// Handles authenticated calls to the ollama-remote panel daemon.

use crate::error::ApiError;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

const TOKEN_HEADER: &str = "X-Token";
const TOKEN_QUERY: &str = "t";

// Structs matching the daemon's JSON bodies

/// Outcome of one daemon command. Any combination of fields may be present.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    pub output: Option<String>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl ExecResult {
    /// Synthetic result rendered when a call fails before the daemon could
    /// report an exit status.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            output: Some(String::new()),
            exit_code: Some(1),
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub config_path: Option<String>,
    pub host: Option<String>,
    pub lang: Option<String>,
    pub mode: Option<String>,
    #[serde(rename = "unsafe")]
    pub unsafe_mode: Option<bool>,
    pub no_proxy_auto: Option<bool>,
    pub ollama_exe: Option<String>,
    pub selected_mode: Option<String>,
}

/// Body of `POST /api/config/set`. Absent fields are left untouched by the
/// daemon.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_exe: Option<String>,
    #[serde(rename = "unsafe", skip_serializing_if = "Option::is_none")]
    pub unsafe_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_proxy_auto: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    error: Option<String>,
}

/// POST-style commands exposed by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Run,
    Pull,
    SetConfig,
}

impl Operation {
    pub fn path(self) -> &'static str {
        match self {
            Operation::List => "/api/list",
            Operation::Run => "/api/run",
            Operation::Pull => "/api/pull",
            Operation::SetConfig => "/api/config/set",
        }
    }
}

// --- API Client ---

#[derive(Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Like [`RemoteClient::new`], with an optional per-request timeout.
    pub fn with_timeout(
        base_url: Url,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            token: token.into(),
        })
    }

    pub async fn get_config(&self) -> Result<ConfigSnapshot, ApiError> {
        let url = self.endpoint("/api/config")?;
        debug!(%url, "GET config");
        let res = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        read_body(res).await
    }

    /// Invokes a POST command with a free-form parameter object and returns
    /// the daemon's reply as-is.
    pub async fn exec<P>(&self, op: Operation, params: &P) -> Result<ExecResult, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint(op.path())?;
        debug!(%url, ?op, "POST command");
        let res = self
            .authorize(self.client.post(url))
            .json(params)
            .send()
            .await
            .map_err(transport)?;
        read_body(res).await
    }

    pub async fn list(&self) -> Result<ExecResult, ApiError> {
        self.exec(Operation::List, &json!({})).await
    }

    pub async fn run(&self, model: &str, prompt: &str) -> Result<ExecResult, ApiError> {
        self.exec(Operation::Run, &json!({ "model": model, "prompt": prompt }))
            .await
    }

    pub async fn pull(&self, model: &str) -> Result<ExecResult, ApiError> {
        self.exec(Operation::Pull, &json!({ "model": model })).await
    }

    pub async fn set_config(&self, update: &ConfigUpdate) -> Result<ExecResult, ApiError> {
        self.exec(Operation::SetConfig, update).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Token goes in both the header and the query string for transports
    /// that cannot set custom headers.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(TOKEN_HEADER, &self.token)
            .query(&[(TOKEN_QUERY, &self.token)])
    }
}

/// The request URL carries the token in its query, so it is kept out of
/// anything rendered or logged.
fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Reqwest(err.without_url())
}

/// Reads a response body best-effort. Unreadable or malformed bodies become
/// `T::default()`; a non-success status becomes [`ApiError::Status`].
async fn read_body<T: DeserializeOwned + Default>(res: Response) -> Result<T, ApiError> {
    let status = res.status();
    let body = res.bytes().await.unwrap_or_default();

    if !status.is_success() {
        let detail: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        let message = detail
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&body).unwrap_or_default())
}

/// HTTP transport with bearer-token injection
///
/// This module performs every HTTP call the stores make: a single
/// configured reqwest client with the API base URL and a fixed request
/// timeout, exposing the verbs GET/POST/PUT/DELETE over a path and an
/// optional JSON body.
///
/// # Token injection
///
/// Before a request is dispatched, the transport reads the bearer token
/// from credential storage (an asynchronous lookup that always completes
/// first). When a token is present it is attached as
/// `Authorization: Bearer <token>`; when absent the request proceeds
/// unauthenticated and the server decides what that means.
///
/// # Failure semantics
///
/// - 2xx: the response body is decoded as JSON and returned
/// - non-2xx: [`ClientError::Http`] with the status and whatever body was
///   readable
/// - timeout/connectivity: [`ClientError::Network`]
///
/// There are no retries and no backoff; one call, one result.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_client::config::Config;
/// use taskdeck_client::credentials::{CredentialStore, MemoryCredentialStore};
/// use taskdeck_client::transport::Transport;
/// use taskdeck_shared::models::task::Task;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::new("http://localhost:8080");
/// let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
/// let transport = Transport::new(&config, credentials)?;
///
/// let tasks: Vec<Task> = transport.get("/api/tasks").await?;
/// # Ok(())
/// # }
/// ```

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{keys, CredentialStore};
use crate::error::{ClientError, ClientResult};

/// Configured HTTP client for the remote API
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl Transport {
    /// Creates a transport for the configured API
    ///
    /// The underlying client is built once with the configured timeout and
    /// reused for every request.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Transport {
            http,
            base_url: config.base_url.clone(),
            credentials,
        })
    }

    /// GET `path` and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    /// POST `body` to `path` and decode the JSON response
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// POST `body` to `path`, discarding the response body
    ///
    /// For endpoints whose success payload the client has no use for.
    pub async fn post_discard<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<()> {
        self.dispatch(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// PUT `body` to `path` and decode the JSON response
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// DELETE `path`, discarding any acknowledgement body
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.dispatch(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let response = self.dispatch(method, path, body).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sends the request and maps failures into the error taxonomy
    ///
    /// Returns the raw response only for successful statuses; callers that
    /// care about the body decode it themselves.
    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<reqwest::Response> {
        let url = join_url(&self.base_url, path);

        // The token lookup is itself async and must settle before dispatch.
        let token = self.credentials.get(keys::TOKEN).await?;

        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, path = %path, "Dispatching request");

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = if text.is_empty() {
                None
            } else {
                Some(serde_json::from_str(&text).unwrap_or(JsonValue::String(text)))
            };

            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                "Request failed"
            );

            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

/// Joins the base URL and a request path without doubling slashes
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

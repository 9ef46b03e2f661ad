use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::interceptor::NetworkInterceptor;
use super::registry::{FailureInfo, ResponseInfo};
use super::types::NetworkType;
use crate::kernel::id::generate_id;
use crate::kernel::payload::Payload;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("network request failed: {0}")]
    Failed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Failed(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Payload>,
    /// Handed to the transport, which decides when to give up.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Payload,
}

impl FetchResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    /// Headers in `getAllResponseHeaders` form: `name: value` lines joined by CRLF.
    pub fn raw_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}\r\n", name, value))
            .collect()
    }
}

/// The host's fetch implementation.
pub trait FetchTransport {
    fn execute(&self, request: FetchRequest) -> impl Future<Output = Result<FetchResponse, TransportError>> + Send;
}

impl FetchTransport for reqwest::Client {
    fn execute(&self, request: FetchRequest) -> impl Future<Output = Result<FetchResponse, TransportError>> + Send {
        let client = self.clone();
        async move {
            let method = reqwest::Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
                .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;

            let mut builder = client.request(method, request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = match body {
                    Payload::Text(text) => builder.body(text),
                    Payload::Bytes(bytes) => builder.body(bytes),
                    Payload::Json(value) => builder.body(value.to_string()),
                    Payload::Opaque { type_name, .. } => {
                        return Err(TransportError::InvalidRequest(format!(
                            "cannot send opaque {} body",
                            type_name
                        )))
                    }
                };
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let url = response.url().to_string();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                    (name.as_str().to_string(), value)
                })
                .collect();
            let content_type = headers
                .iter()
                .find(|(name, _)| name == "content-type")
                .map(|(_, value)| value.clone());
            let bytes = response.bytes().await?;

            Ok::<_, TransportError>(FetchResponse {
                status,
                url,
                headers,
                body: Payload::from_body(bytes.to_vec(), content_type.as_deref()),
            })
        }
    }
}

/// Instrumented fetch entry point.
pub struct Fetch<T> {
    transport: T,
    interceptor: Arc<NetworkInterceptor>,
}

impl<T: FetchTransport> Fetch<T> {
    pub fn new(transport: T) -> Self {
        Self::with_interceptor(transport, NetworkInterceptor::instance())
    }

    pub fn with_interceptor(transport: T, interceptor: Arc<NetworkInterceptor>) -> Self {
        Self { transport, interceptor }
    }

    /// Reports open, headers and send, awaits the transport, then reports the
    /// outcome. The transport's result is returned as is.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let id = generate_id();
        let started = Instant::now();
        let timeout = request.timeout.map(|limit| limit.as_millis() as u64);

        self.interceptor
            .on_open(&id, NetworkType::Fetch, &request.method, &request.url);
        for (name, value) in &request.headers {
            self.interceptor.on_request_header(&id, name, value);
        }
        self.interceptor.on_send(&id, request.body.as_ref());

        let result = self.transport.execute(request).await;
        let duration = Some(started.elapsed().as_millis() as u64);

        match &result {
            Ok(response) => {
                self.interceptor.on_headers_received(
                    &id,
                    response.content_type(),
                    Some(response.body.size() as u64),
                    &response.raw_headers(),
                );
                let info = ResponseInfo {
                    status: Some(response.status),
                    timeout,
                    duration,
                    response: Some(response.body.clone()),
                    response_url: Some(response.url.clone()),
                    response_type: Some(response.body.response_type().to_string()),
                };
                self.interceptor.on_response(&id, info);
            }
            Err(err) => {
                let failure = FailureInfo {
                    reason: err.to_string(),
                    timed_out: matches!(err, TransportError::Timeout),
                    timeout,
                    duration,
                };
                self.interceptor.on_error(&id, failure);
            }
        }

        result
    }
}

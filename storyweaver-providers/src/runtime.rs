use crate::request::{Body, HttpRequest, redact_url};
use anyhow::{Context, anyhow};
use futures_util::{StreamExt, stream::BoxStream};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Short, log-safe description of a failed response.
    pub fn describe_failure(&self) -> String {
        let body = String::from_utf8_lossy(&self.body);
        let body: String = body.chars().take(300).collect();
        format!("status={} body={}", self.status, body)
    }
}

/// A response whose body is consumed incrementally.
pub struct StreamingResponse {
    pub status: u16,
    pub body: BoxStream<'static, anyhow::Result<Vec<u8>>>,
}

#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    // Per-request limit for buffered calls. Streaming calls only get the connect timeout.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(120),
        }
    }
}

/// Shared HTTP client. Cheap to clone; build one and pass it around.
#[derive(Debug, Clone)]
pub struct HttpRuntime {
    client: reqwest::Client,
    timeouts: HttpTimeouts,
}

impl HttpRuntime {
    pub fn new(timeouts: HttpTimeouts) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .build()
            .context("build http client")?;
        Ok(Self { client, timeouts })
    }

    pub async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        let resp = self
            .builder(req)?
            .timeout(self.timeouts.request)
            .send()
            .await
            .inspect_err(|e| log::warn!("{} {} failed: {e}", req.method, redact_url(&req.url)))
            .context("http request failed")?;
        let status = resp.status().as_u16();
        log::debug!("{} {} -> {status}", req.method, redact_url(&req.url));
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .context("failed reading response body")?
            .to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }

    pub async fn execute_streaming(&self, req: &HttpRequest) -> anyhow::Result<StreamingResponse> {
        let resp = self
            .builder(req)?
            .send()
            .await
            .inspect_err(|e| log::warn!("{} {} failed: {e}", req.method, redact_url(&req.url)))
            .context("http request failed")?;
        let status = resp.status().as_u16();
        log::debug!("{} {} -> {status} (streaming)", req.method, redact_url(&req.url));
        let body = resp
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|b| b.to_vec())
                    .map_err(|e| anyhow::Error::new(e).context("failed reading response stream"))
            })
            .boxed();

        Ok(StreamingResponse { status, body })
    }

    fn builder(&self, req: &HttpRequest) -> anyhow::Result<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        for (k, v) in &req.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name: {k}"))?;
            let value =
                HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }

        let builder = match req.method.as_str() {
            "GET" => self.client.get(&req.url),
            "POST" => self.client.post(&req.url),
            "PUT" => self.client.put(&req.url),
            "DELETE" => self.client.delete(&req.url),
            other => return Err(anyhow!("unsupported method: {other}")),
        }
        .headers(headers);

        Ok(match &req.body {
            Body::Empty => builder,
            Body::Json(s) => builder.body(s.clone()),
        })
    }
}

/// Drains a streaming response into memory (used for error bodies).
pub async fn collect_body(mut resp: StreamingResponse) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(Ok(chunk)) = resp.body.next().await {
        out.extend_from_slice(&chunk);
    }
    out
}

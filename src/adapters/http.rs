use crate::config::TransportConfig;
use crate::domain::model::Response;
use crate::domain::ports::Transport;
use crate::utils::error::{ContentError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// JSON envelope returned by the content endpoints. HTML bodies are taken
/// as the content fragment directly.
#[derive(Debug, Default, Deserialize)]
struct ResponseBody {
    success: Option<bool>,
    output: Option<String>,
    content: Option<String>,
    errors: Option<serde_json::Value>,
    message: Option<String>,
}

impl ResponseBody {
    fn into_response(self, status: StatusCode) -> Response {
        let mut errors = Vec::new();
        if let Some(value) = &self.errors {
            collect_errors(value, &mut errors);
        }

        let failed = !status.is_success() || self.success == Some(false) || !errors.is_empty();
        if failed {
            if errors.is_empty() {
                errors.push(self.message.unwrap_or_else(|| status_message(status)));
            }
            return Response::Error {
                code: Some(status.as_u16()),
                errors,
            };
        }

        Response::Success {
            content: self.output.or(self.content).unwrap_or_default(),
        }
    }
}

/// Flattens `"msg"`, `["msg", ..]` and `{"field": ["msg", ..]}` shapes.
fn collect_errors(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(message) => out.push(message.clone()),
        serde_json::Value::Array(items) => items.iter().for_each(|item| collect_errors(item, out)),
        serde_json::Value::Object(fields) => {
            fields.values().for_each(|item| collect_errors(item, out))
        }
        _ => {}
    }
}

fn status_message(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Request failed")
    )
}

pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: None,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.headers.iter().flatten() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ContentError::InvalidConfigValueError {
                    field: "transport.headers".to_string(),
                    value: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ContentError::InvalidConfigValueError {
                    field: "transport.headers".to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .default_headers(headers)
            .build()?;

        let base_url = config.base_url.as_deref().map(Url::parse).transpose()?;
        Ok(Self { client, base_url })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Endpoints from markup may be page-relative; resolve them against the base URL.
    fn resolve(&self, endpoint: &str) -> Result<Url> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => Ok(base.join(endpoint)?),
                None => Err(url::ParseError::RelativeUrlWithoutBase.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn parse_response(response: reqwest::Response) -> Result<Response> {
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let body = response.text().await?;
        tracing::debug!("Response status: {} ({} bytes)", status, body.len());

        if is_json {
            let payload: ResponseBody = serde_json::from_str(&body)?;
            return Ok(payload.into_response(status));
        }

        if status.is_success() {
            Ok(Response::success(body))
        } else {
            Ok(Response::Error {
                code: Some(status.as_u16()),
                errors: vec![status_message(status)],
            })
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response> {
        let url = self.resolve(url)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        Self::parse_response(response).await
    }

    async fn post(&self, url: &str, body: &[(String, String)]) -> Result<Response> {
        let url = self.resolve(url)?;
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).form(body).send().await?;
        Self::parse_response(response).await
    }
}

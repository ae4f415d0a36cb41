//! Pluggable transport. [`HttpTransport`] talks to the real API; tests
//! substitute in-memory implementations.

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::query::Query;

/// One API call: resource-relative path, method, query and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sends an [`ApiRequest`] and returns the raw JSON response body.
///
/// Implementations must not interpret the envelope; that is the client's job.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError>;
}

/// reqwest-backed transport rooted at `base_url`.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = reqwest::Url::parse(trimmed)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base_url}{path}` with the query appended and percent-encoded.
    fn url_for(&self, req: &ApiRequest) -> Result<reqwest::Url, ApiError> {
        let raw = format!("{}{}", self.base_url(), req.path);
        let mut url = reqwest::Url::parse(&raw)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", raw, e)))?;
        if !req.query.is_empty() {
            url.query_pairs_mut().extend_pairs(req.query.pairs());
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(&req)?;
        debug!(method = %req.method, %url, "api request");

        let mut builder = self
            .http
            .request(req.method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("response body ({}): {}", status.as_u16(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn url_joins_path_and_encodes_query() {
        let t = HttpTransport::new("http://localhost:5000/").unwrap();
        let req = ApiRequest::new(Method::GET, "/materials")
            .with_query(Query::new().search("red sand").param("categoryId", "2"));
        let url = t.url_for(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/materials?search=red+sand&categoryId=2"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let t = HttpTransport::new("http://api.local/v1").unwrap();
        let url = t.url_for(&ApiRequest::new(Method::DELETE, "/edges/3")).unwrap();
        assert_eq!(url.as_str(), "http://api.local/v1/edges/3");
    }
}

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::query::Query;
use crate::resource::Resource;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// CRUD client over the uniform resource endpoints.
///
/// Cheap to clone; all clones share one transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client talking HTTP to `base_url`.
    pub fn http(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url)?)))
    }

    /// Send a request and normalize the envelope.
    pub async fn request(&self, req: ApiRequest) -> Result<Envelope, ApiError> {
        let body = self.transport.send(req).await?;
        Envelope::from_body(body)
    }

    /// `GET /{resource}?{query}`.
    pub async fn list(&self, resource: Resource, query: &Query) -> Result<Envelope, ApiError> {
        let req = ApiRequest::new(Method::GET, resource.collection_path()).with_query(query.clone());
        self.request(req).await
    }

    /// `GET /{resource}/{id}`.
    pub async fn get(&self, resource: Resource, id: i64) -> Result<Envelope, ApiError> {
        self.request(ApiRequest::new(Method::GET, resource.item_path(id)))
            .await
    }

    /// `POST /{resource}`.
    pub async fn create<B: Serialize + ?Sized>(&self, resource: Resource, body: &B) -> Result<Envelope, ApiError> {
        let req = ApiRequest::new(Method::POST, resource.collection_path()).with_body(to_json(body)?);
        self.request(req).await
    }

    /// `PATCH /{resource}/{id}`.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        id: i64,
        body: &B,
    ) -> Result<Envelope, ApiError> {
        let req = ApiRequest::new(Method::PATCH, resource.item_path(id)).with_body(to_json(body)?);
        self.request(req).await
    }

    /// `DELETE /{resource}/{id}`.
    pub async fn delete(&self, resource: Resource, id: i64) -> Result<Envelope, ApiError> {
        self.request(ApiRequest::new(Method::DELETE, resource.item_path(id)))
            .await
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requests and answers every call with a fixed body.
    struct Echo {
        reply: Value,
        seen: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait::async_trait]
    impl Transport for Echo {
        async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
            self.seen.lock().unwrap().push(req);
            Ok(self.reply.clone())
        }
    }

    fn echo(reply: Value) -> (Arc<Echo>, ApiClient) {
        let t = Arc::new(Echo { reply, seen: Mutex::new(Vec::new()) });
        (t.clone(), ApiClient::new(t))
    }

    #[tokio::test]
    async fn update_uses_patch_on_item_path() {
        let (t, client) = echo(json!({"success": true, "data": {"id": 7}}));
        client
            .update(Resource::Transporters, 7, &json!({"name": "Acme"}))
            .await
            .unwrap();
        let seen = t.seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::PATCH);
        assert_eq!(seen[0].path, "/transporters/7");
        assert_eq!(seen[0].body, Some(json!({"name": "Acme"})));
    }

    #[tokio::test]
    async fn envelope_failure_becomes_api_error() {
        let (_, client) = echo(json!({"success": false, "error": "in use"}));
        let err = client.delete(Resource::Edges, 1).await.unwrap_err();
        assert_eq!(err.server_message(), Some("in use"));
    }
}

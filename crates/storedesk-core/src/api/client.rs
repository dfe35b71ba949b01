//! API client for the back-office REST API.
//!
//! Every request goes through [`ApiClient::auth_headers`], which reads the
//! credential store at send time. A stored credential becomes an
//! `Authorization: Bearer` header; without one the request is sent as-is so
//! public endpoints such as login keep working.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::models::order::OrderStatusUpdate;
use crate::models::{Branch, Category, MediaItem, Order, OrderStatus, Product, StoreInfo, User};
use crate::routes::Resource;

use super::envelope::{ApiEnvelope, Payload};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credential exchange endpoint
const LOGIN_PATH: &str = "/user/auth/login";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

/// API client for the back office.
/// Clone is cheap - reqwest::Client and CredentialStore share state internally.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
}

impl ApiClient {
    /// Create a new API client for `base_url` that authenticates from `store`
    pub fn new(base_url: &str, store: CredentialStore) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self::with_client(client, base_url, store))
    }

    /// Build a client around an existing connection pool.
    pub fn with_client(client: Client, base_url: &str, store: CredentialStore) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers for an outgoing request, built from the credential present now.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.store.get() {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");
        Ok(self
            .client
            .request(method, url)
            .headers(self.auth_headers()?))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            if err.is_auth_rejection() {
                warn!(%status, "Backend rejected the credential");
            }
            Err(err)
        }
    }

    async fn send_text(builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.text().await?)
    }

    fn parse<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = Self::send_text(builder).await?;
        Self::parse(&text)
    }

    /// Send and unwrap a response that may or may not use the envelope.
    /// An empty body counts as "no data".
    async fn send_payload<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let text = Self::send_text(builder).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Payload::<T>::from_json(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON: {}", e)))?
            .into_data()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_payload(self.request(Method::GET, path)?)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse(format!("Empty response from {}", path)))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        self.send_payload(self.request(Method::POST, path)?.json(body))
            .await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let text = Self::send_text(self.request(Method::DELETE, path)?).await?;

        // An empty body is fine; an envelope must report success
        if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text) {
            envelope.into_result()?;
        }
        Ok(())
    }

    // ===== Authentication =====

    /// Exchange an identifier and secret for a token envelope.
    ///
    /// The envelope is returned as-is, including non-success codes; judging
    /// it is the login flow's job.
    pub async fn exchange_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        let body = LoginRequest {
            user_name: identifier,
            password: secret,
        };
        self.send(self.request(Method::POST, LOGIN_PATH)?.json(&body))
            .await
    }

    // ===== Generic resource access =====

    async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        let path = format!("/admin/{}/getAll", resource.segment());
        let items: Option<Vec<T>> = self
            .send_payload(self.request(Method::GET, &path)?)
            .await?;
        Ok(items.unwrap_or_default())
    }

    async fn fetch_one<T: DeserializeOwned>(&self, resource: Resource, id: i64) -> Result<T, ApiError> {
        self.get(&format!("/admin/{}/{}", resource.segment(), id))
            .await
    }

    /// Create or update a record. Returns the saved record when the backend echoes it.
    async fn process<T: DeserializeOwned + Serialize>(
        &self,
        resource: Resource,
        record: &T,
    ) -> Result<Option<T>, ApiError> {
        let path = format!("/admin/{}/process", resource.segment());
        self.post(&path, record).await
    }

    /// Delete a record by id.
    pub async fn delete_record(&self, resource: Resource, id: i64) -> Result<(), ApiError> {
        if !resource.supports_delete() {
            return Err(ApiError::InvalidResponse(format!(
                "{} cannot be deleted",
                resource.display_name()
            )));
        }
        self.delete(&format!("/admin/{}/delete/{}", resource.segment(), id))
            .await
    }

    // ===== Data Fetching Methods =====

    pub async fn fetch_store_infos(&self) -> Result<Vec<StoreInfo>, ApiError> {
        self.list(Resource::StoreInfo).await
    }

    pub async fn fetch_store_info(&self, id: i64) -> Result<StoreInfo, ApiError> {
        self.fetch_one(Resource::StoreInfo, id).await
    }

    pub async fn save_store_info(&self, info: &StoreInfo) -> Result<Option<StoreInfo>, ApiError> {
        self.process(Resource::StoreInfo, info).await
    }

    pub async fn fetch_branches(&self) -> Result<Vec<Branch>, ApiError> {
        self.list(Resource::Branch).await
    }

    pub async fn fetch_branch(&self, id: i64) -> Result<Branch, ApiError> {
        self.fetch_one(Resource::Branch, id).await
    }

    pub async fn save_branch(&self, branch: &Branch) -> Result<Option<Branch>, ApiError> {
        self.process(Resource::Branch, branch).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.list(Resource::Category).await
    }

    pub async fn fetch_category(&self, id: i64) -> Result<Category, ApiError> {
        self.fetch_one(Resource::Category, id).await
    }

    pub async fn save_category(&self, category: &Category) -> Result<Option<Category>, ApiError> {
        self.process(Resource::Category, category).await
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.list(Resource::User).await
    }

    pub async fn fetch_user(&self, id: i64) -> Result<User, ApiError> {
        self.fetch_one(Resource::User, id).await
    }

    pub async fn save_user(&self, user: &User) -> Result<Option<User>, ApiError> {
        self.process(Resource::User, user).await
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.list(Resource::Product).await
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Product, ApiError> {
        self.fetch_one(Resource::Product, id).await
    }

    pub async fn save_product(&self, product: &Product) -> Result<Option<Product>, ApiError> {
        self.process(Resource::Product, product).await
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.list(Resource::Order).await
    }

    pub async fn fetch_order(&self, id: i64) -> Result<Order, ApiError> {
        self.fetch_one(Resource::Order, id).await
    }

    /// Move an order to a new status.
    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), ApiError> {
        let body = OrderStatusUpdate { id, status };
        let _: Option<serde_json::Value> = self.post("/admin/order/process", &body).await?;
        Ok(())
    }

    /// Fetch every image stored under a product's file key.
    pub async fn fetch_product_media(&self, file_key: &str) -> Result<Vec<MediaItem>, ApiError> {
        let path = format!("/media/viewAllFileKeyForProduct/{}", file_key);
        let items: Option<Vec<MediaItem>> = self
            .send_payload(self.request(Method::GET, &path)?)
            .await?;
        Ok(items.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::unreachable_base_url;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, store: &CredentialStore) -> ApiClient {
        ApiClient::new(&server.uri(), store.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_attaches_bearer_header_from_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/user/getAll"))
            .and(header("Authorization", "Bearer abc.def.ghi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let store = CredentialStore::in_memory();
        store.set("abc.def.ghi").unwrap();
        let client = client_for(&server, &store).await;

        assert!(client.fetch_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_header_without_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/branch/getAll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = CredentialStore::in_memory();
        let client = client_for(&server, &store).await;
        client.fetch_branches().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_header_tracks_store_changes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/category/getAll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = CredentialStore::in_memory();
        let client = client_for(&server, &store).await;

        store.set("first.token.x").unwrap();
        client.fetch_categories().await.unwrap();
        store.set("second.token.y").unwrap();
        client.fetch_categories().await.unwrap();
        store.clear().unwrap();
        client.fetch_categories().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth: Vec<Option<String>> = requests
            .iter()
            .map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect();
        assert_eq!(
            auth,
            vec![
                Some("Bearer first.token.x".to_string()),
                Some("Bearer second.token.y".to_string()),
                None
            ]
        );
    }

    #[tokio::test]
    async fn test_enveloped_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/product/getAll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 2000,
                "message": "ok",
                "data": [{"id": 1, "name": "Runner", "basePrice": 100.0}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        let products = client.fetch_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Runner");
    }

    #[tokio::test]
    async fn test_wrong_data_shape_reports_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/user/getAll"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 2000, "data": {"id": 1}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        match client.fetch_users().await.unwrap_err() {
            ApiError::InvalidResponse(msg) => assert!(msg.contains("invalid type"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported_not_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/order/7"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
            .mount(&server)
            .await;

        let store = CredentialStore::in_memory();
        store.set("abc.def.ghi").unwrap();
        let client = client_for(&server, &store).await;

        let err = client.fetch_order(7).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        // No forced logout on a server-side rejection
        assert!(store.is_present());
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let uri = unreachable_base_url();
        let client = ApiClient::new(&uri, CredentialStore::in_memory()).unwrap();
        let err = client.fetch_users().await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_invalid_header_fails_with_original_error() {
        let server = MockServer::start().await;
        let store = CredentialStore::in_memory();
        store.set("bad\ntoken").unwrap();
        let client = client_for(&server, &store).await;

        let err = client.fetch_users().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidHeader(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_order_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/order/process"))
            .and(body_json(json!({"id": 4, "status": "SHIPPED"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 2000, "message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        client.update_order_status(4, OrderStatus::Shipped).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_returns_echoed_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/branch/process"))
            .and(body_json(json!({"name": "Hue", "country": "VN", "status": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 2000,
                "data": {"id": 12, "name": "Hue", "country": "VN", "status": 1}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/admin/category/process"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        let branch = Branch {
            name: "Hue".to_string(),
            country: "VN".to_string(),
            status: 1,
            ..Default::default()
        };
        let saved = client.save_branch(&branch).await.unwrap().unwrap();
        assert_eq!(saved.id, Some(12));

        let category = Category { name: "Shoes".to_string(), ..Default::default() };
        assert!(client.save_category(&category).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_envelope_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/category/delete/3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 4009, "message": "category in use"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        let err = client.delete_record(Resource::Category, 3).await.unwrap_err();
        assert_eq!(err.server_message().as_deref(), Some("category in use"));

        let err = client.delete_record(Resource::Order, 3).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_store_info_bare_and_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/inforWeb/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2, "code": "MENU1", "name": "Menu", "status": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/inforWeb/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 2000,
                "data": {"id": 3, "code": "FOOT", "name": "Footer"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        let bare = client.fetch_store_info(2).await.unwrap();
        assert_eq!(bare.code, "MENU1");
        let wrapped = client.fetch_store_info(3).await.unwrap();
        assert_eq!(wrapped.code, "FOOT");
        assert_eq!(wrapped.status, 1);
    }

    #[tokio::test]
    async fn test_fetch_product_media() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/viewAllFileKeyForProduct/key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "front.jpg", "data": "aGVsbG8="},
                {"data": "d29ybGQ="}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, &CredentialStore::in_memory()).await;
        let media = client.fetch_product_media("key-1").await.unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].name.as_deref(), Some("front.jpg"));
        assert!(media[1].name.is_none());
    }
}

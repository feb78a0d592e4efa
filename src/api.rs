//! Store backend API client.
//!
//! Typed async access to the external backend that owns all durable state:
//! product lookup by barcode, member lookup/registration, point updates,
//! and order persistence. The `Backend` trait is the seam the checkout
//! coordinator and product resolver are written (and tested) against;
//! `BackendClient` is the reqwest implementation.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::checkout::OrderPayload;
use crate::config::EngineConfig;
use crate::error::{PosError, PosResult};
use crate::members::Member;
use crate::reports::OrderRecord;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A goods record as the backend returns it from a barcode lookup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GoodsRecord {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The operations the engine needs from the store backend.
///
/// Callers hold the implementation generically; the engine never needs a
/// trait object or extra auto-trait bounds on the returned futures.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn product_by_barcode(&self, code: &str) -> PosResult<GoodsRecord>;
    async fn member_by_phone(&self, phone: &str) -> PosResult<Member>;
    async fn create_member(&self, member: &Member) -> PosResult<()>;
    async fn update_member_points(&self, phone: &str, points: i64) -> PosResult<()>;
    async fn submit_order(&self, payload: &OrderPayload) -> PosResult<()>;
    async fn list_orders(&self) -> PosResult<Vec<OrderRecord>>;
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach store backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid store backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message. The callers
/// append the numeric status themselves.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => "Store backend server error".to_string(),
        _ => "Unexpected response from store backend".to_string(),
    }
}

/// Pull the backend's own message out of an error body when there is one.
/// The backend answers with `{"detail": ...}`; `message`/`error` keys are
/// accepted for forward compatibility.
fn error_message_from_body(status: StatusCode, body_text: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = json
            .get("detail")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
        {
            return format!("{msg} (HTTP {})", status.as_u16());
        }
    }
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        format!("{} (HTTP {})", status_error(status), status.as_u16())
    } else {
        format!(
            "{} (HTTP {}): {trimmed}",
            status_error(status),
            status.as_u16()
        )
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Reqwest-backed implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(config: &EngineConfig) -> PosResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PosError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Perform a request and return the JSON body (null for empty bodies).
    /// Non-success statuses become `PosError::Backend` with the backend's
    /// own message when it sent one.
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> PosResult<Value> {
        let full_url = self.url(path);
        let mut req = self.client.request(method, &full_url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PosError::Network(friendly_error(&self.base_url, &e)))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = error_message_from_body(status, &body_text);
            warn!(path, status = status.as_u16(), "backend request failed");
            return Err(PosError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| PosError::InvalidResponse(format!("invalid JSON: {e}")))
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> PosResult<T> {
        let value = self.request_json(Method::GET, path, None).await?;
        serde_json::from_value(value).map_err(|e| PosError::InvalidResponse(e.to_string()))
    }
}

impl Backend for BackendClient {
    async fn product_by_barcode(&self, code: &str) -> PosResult<GoodsRecord> {
        match self.get_typed(&format!("/api/goods/barcode/{code}")).await {
            Err(PosError::Backend { status: 404, .. }) => Err(PosError::NotFound {
                entity: "Product",
                key: code.to_string(),
            }),
            other => other,
        }
    }

    async fn member_by_phone(&self, phone: &str) -> PosResult<Member> {
        match self.get_typed(&format!("/api/members/{phone}")).await {
            Err(PosError::Backend { status: 404, .. }) => Err(PosError::NotFound {
                entity: "Member",
                key: phone.to_string(),
            }),
            other => other,
        }
    }

    async fn create_member(&self, member: &Member) -> PosResult<()> {
        let body = serde_json::to_value(member)
            .map_err(|e| PosError::InvalidResponse(e.to_string()))?;
        self.request_json(Method::POST, "/api/members", Some(&body))
            .await?;
        Ok(())
    }

    async fn update_member_points(&self, phone: &str, points: i64) -> PosResult<()> {
        let body = serde_json::json!({ "points": points });
        self.request_json(
            Method::PUT,
            &format!("/api/members/{phone}/points"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn submit_order(&self, payload: &OrderPayload) -> PosResult<()> {
        let body = serde_json::to_value(payload)
            .map_err(|e| PosError::InvalidResponse(e.to_string()))?;
        self.request_json(Method::POST, "/api/orders", Some(&body))
            .await?;
        Ok(())
    }

    async fn list_orders(&self) -> PosResult<Vec<OrderRecord>> {
        self.get_typed("/api/orders").await
    }
}

// ===========================================================================
// Test support
// ===========================================================================


// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND),
            "Backend endpoint not found"
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            "Store backend server error"
        );
        assert_eq!(
            status_error(StatusCode::IM_A_TEAPOT),
            "Unexpected response from store backend"
        );
    }

    #[test]
    fn test_error_message_prefers_backend_detail() {
        let msg = error_message_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Phone already registered"}"#,
        );
        assert_eq!(msg, "Phone already registered (HTTP 400)");
    }

    #[test]
    fn test_error_message_falls_back_to_body_text() {
        let msg = error_message_from_body(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(msg, "Store backend server error (HTTP 502): upstream down");
    }

    #[test]
    fn test_error_message_empty_body() {
        let msg = error_message_from_body(StatusCode::NOT_FOUND, "");
        assert_eq!(msg, "Backend endpoint not found (HTTP 404)");
    }

    #[test]
    fn test_goods_record_tolerates_extra_backend_fields() {
        let record: GoodsRecord = serde_json::from_str(
            r#"{
                "barcode": "123456",
                "name": "Camera Lens",
                "type": "camera",
                "cost": 900.0,
                "price": 1500.0,
                "stock": 4,
                "supplier": "ACME",
                "dateReceived": "2025-10-01"
            }"#,
        )
        .unwrap();
        assert_eq!(record.name, "Camera Lens");
        assert_eq!(record.price, 1500.0);
        assert_eq!(record.category.as_deref(), Some("camera"));
    }

    #[test]
    fn test_client_builds_urls_from_config() {
        let config = EngineConfig::new("localhost:8000/api/");
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/goods/barcode/123456"),
            "http://localhost:8000/api/goods/barcode/123456"
        );
    }
}

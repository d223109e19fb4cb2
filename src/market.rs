//! Marketplace client.
//!
//! Talks to the sharing service over its JSON API: account registration and
//! login, the point balance, item listings, publishing archives, and
//! purchasing them. Auth is a bearer token from `login`; error responses
//! carry a `detail` field which is surfaced in [`RepriseError::MarketAuth`]
//! or [`RepriseError::MarketDenied`].

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::error::{RepriseError, Result};
use crate::package::{ExportOptions, PackageKind};

/// Service URL used when none is configured.
pub const DEFAULT_MARKET_URL: &str = "http://localhost:8000";

/// Blocking client for the marketplace API.
pub struct MarketClient {
    base_url: String,
    client: reqwest::blocking::Client,
    token: Option<String>,
}

impl MarketClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::blocking::Client::builder()
                .user_agent("reprise")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            token: None,
        }
    }

    /// Attach a bearer token from an earlier login.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an account. New accounts start with a signup point grant;
    /// returns the server's welcome message.
    pub fn register(&self, user_id: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("/api/register"))
            .json(&serde_json::json!({ "user_id": user_id, "password": password }))
            .send()?;
        let body: RegisterResponse = read_json(response)?;
        Ok(body.message)
    }

    /// Log in and remember the returned token for later calls.
    pub fn login(&mut self, user_id: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.endpoint("/api/login"))
            .json(&serde_json::json!({ "user_id": user_id, "password": password }))
            .send()?;
        let session: Session = read_json(response)?;
        self.token = Some(session.token.clone());
        info!("logged in as '{}' ({} points)", session.user_id, session.points);
        Ok(session)
    }

    /// Current point balance of the logged-in account.
    pub fn points(&self) -> Result<i64> {
        let auth = self.bearer()?;
        let response = self
            .client
            .get(self.endpoint("/api/points"))
            .header(&auth.header_name, &auth.header_value)
            .send()?;
        let body: PointsResponse = read_json(response)?;
        Ok(body.points)
    }

    /// List published items of one kind, newest first.
    pub fn list_items(&self, kind: PackageKind) -> Result<Vec<ItemSummary>> {
        let response = self
            .client
            .get(self.endpoint("/api/items"))
            .query(&[("item_type", kind.as_str())])
            .send()?;
        let body: ItemsResponse = read_json(response)?;
        Ok(body.items)
    }

    /// Publish archive bytes for sale. The server credits the seller a
    /// bonus of a tenth of the asking price on upload.
    pub fn publish(
        &self,
        kind: PackageKind,
        name: &str,
        archive: &[u8],
        opts: &ExportOptions,
    ) -> Result<PublishReceipt> {
        let auth = self.bearer()?;
        let body = serde_json::json!({
            "type": kind.as_str(),
            "name": name,
            "zip_data": BASE64.encode(archive),
            "metadata": {
                "author": opts.author,
                "description": opts.description,
                "price": opts.price,
            },
        });
        let response = self
            .client
            .post(self.endpoint("/api/upload"))
            .header(&auth.header_name, &auth.header_value)
            .json(&body)
            .send()?;
        let receipt: PublishReceipt = read_json(response)?;
        info!("published '{}' as item {}", name, receipt.item_id);
        Ok(receipt)
    }

    /// Buy an item and return its archive bytes. Buying your own item is
    /// free; otherwise the price moves from buyer to seller.
    pub fn purchase(&self, item_id: i64) -> Result<Purchase> {
        let auth = self.bearer()?;
        let response = self
            .client
            .post(self.endpoint("/api/download"))
            .header(&auth.header_name, &auth.header_value)
            .json(&serde_json::json!({ "item_id": item_id }))
            .send()?;
        let body: DownloadResponse = read_json(response)?;
        let archive = BASE64
            .decode(body.zip_data.as_bytes())
            .map_err(|e| RepriseError::MarketDenied {
                message: format!("download payload is not valid base64: {}", e),
            })?;
        Ok(Purchase {
            archive,
            points: body.points,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<AuthHeader> {
        let token = self.token.as_deref().ok_or_else(|| RepriseError::MarketAuth {
            message: "not logged in; no token set".into(),
        })?;
        Ok(AuthHeader::bearer(token))
    }
}

/// Authentication header for marketplace calls.
#[derive(Debug, Clone)]
struct AuthHeader {
    header_name: String,
    header_value: String,
}

impl AuthHeader {
    fn bearer(token: &str) -> Self {
        Self {
            header_name: "Authorization".to_string(),
            header_value: format!("Bearer {}", token),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub points: i64,
    pub user_id: String,
}

/// One listing row from the marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub download_count: i64,
    #[serde(default)]
    pub created_at: String,
}

/// Outcome of publishing an item.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishReceipt {
    pub item_id: i64,
    /// Seller's balance after the upload bonus.
    pub points: i64,
    #[serde(default)]
    pub message: String,
}

/// Outcome of purchasing an item.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub archive: Vec<u8>,
    /// Buyer's balance after the purchase.
    pub points: i64,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    points: i64,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    items: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    zip_data: String,
    points: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Decode a success body, or map an error status to the matching variant:
/// 401 and 403 are auth failures, everything else is a refusal carrying the
/// server's `detail` text.
fn read_json<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json()?);
    }
    let raw = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&raw)
        .map(|body| body.detail)
        .unwrap_or(raw);
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        detail
    };
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(RepriseError::MarketAuth { message })
    } else {
        Err(RepriseError::MarketDenied { message })
    }
}

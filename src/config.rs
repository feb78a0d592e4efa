//! Engine configuration.
//!
//! Plain data handed in by the embedding application: where the store
//! backend lives, what the shop prints on its receipts, and which optional
//! capabilities this terminal runs with. There is no environment or config
//! file handling here; durable settings live behind the backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default timeout for backend requests (20 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment (endpoints add it back)
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    // Strip trailing slashes again (in case "/api/" was present)
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Optional behaviors that varied between the order-entry screens.
/// One parameterized engine replaces the per-screen copies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    /// Loyalty points can be redeemed and earned on this terminal.
    pub loyalty_enabled: bool,
    /// Members can be looked up (and registered) by phone at checkout.
    pub member_lookup_enabled: bool,
    /// Scanned codes are resolved against the backend before the local table.
    pub remote_product_lookup_enabled: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            loyalty_enabled: true,
            member_lookup_enabled: true,
            remote_product_lookup_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Shop identity
// ---------------------------------------------------------------------------

/// What the receipt header and footer say about the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Closing note printed under the totals.
    pub footer_text: Option<String>,
    /// Currency code appended to printed amounts.
    pub currency: String,
}

impl Default for ShopInfo {
    fn default() -> Self {
        Self {
            name: "Thukjai Trading".to_string(),
            address: None,
            phone: None,
            footer_text: Some("Thank you for shopping with us".to_string()),
            currency: "THB".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Everything the engine needs to run one terminal session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Normalised backend base URL, without a trailing `/api`.
    pub base_url: String,
    pub shop: ShopInfo,
    pub capabilities: Capabilities,
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Build a config for the given backend URL with default shop identity
    /// and all capabilities enabled.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            shop: ShopInfo::default(),
            capabilities: Capabilities::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_shop(mut self, shop: ShopInfo) -> Self {
        self.shop = shop;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================

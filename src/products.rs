//! Product resolution for scanned or typed codes.
//!
//! A code is tried against the backend barcode endpoint first (when the
//! terminal runs with remote lookup), then against the local static table
//! when one is configured. A miss is not an error: the code is reported
//! back so the entry form can keep it in the identifier field while the
//! operator fills in the rest by hand.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::api::Backend;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What the entry form needs to pre-fill a line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfo {
    pub name: String,
    pub price: f64,
}

/// Outcome of resolving one code.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The code matched a product; the line can be added directly.
    Resolved(ProductInfo),
    /// No source knew the code. The identifier field keeps it so the
    /// operator can complete the remaining fields manually.
    NotFound { code: String },
    /// Empty scan text; nothing to do.
    Ignored,
}

/// Short audible confirmation played when a scan resolves. Best-effort:
/// implementations must not block, and a failed cue never fails the scan.
pub trait ScanCue {
    fn play(&self);
}

// ---------------------------------------------------------------------------
// Local table
// ---------------------------------------------------------------------------

/// Static code-to-product table for terminals that keep a small offline
/// assortment next to the remote catalogue.
#[derive(Debug, Clone, Default)]
pub struct LocalProductTable {
    entries: HashMap<String, ProductInfo>,
}

impl LocalProductTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, name: &str, price: f64) {
        self.entries.insert(
            code.to_string(),
            ProductInfo {
                name: name.to_string(),
                price,
            },
        );
    }

    pub fn get(&self, code: &str) -> Option<&ProductInfo> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str, f64); N]> for LocalProductTable {
    fn from(rows: [(&str, &str, f64); N]) -> Self {
        let mut table = Self::new();
        for (code, name, price) in rows {
            table.insert(code, name, price);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Maps a scanned/typed code to a product record.
pub struct ProductResolver<B> {
    /// Remote lookup source; `None` when the capability is disabled.
    backend: Option<B>,
    local: Option<LocalProductTable>,
    cue: Option<Box<dyn ScanCue + Send + Sync>>,
}

impl<B: Backend> ProductResolver<B> {
    pub fn new(backend: Option<B>) -> Self {
        Self {
            backend,
            local: None,
            cue: None,
        }
    }

    pub fn with_local_table(mut self, table: LocalProductTable) -> Self {
        self.local = Some(table);
        self
    }

    pub fn with_cue(mut self, cue: Box<dyn ScanCue + Send + Sync>) -> Self {
        self.cue = Some(cue);
        self
    }

    /// Resolve a raw scan/text code.
    ///
    /// Remote not-found and remote failure both fall through to the local
    /// table: a dead network must not stop the counter when the product is
    /// known locally.
    pub async fn resolve(&self, raw: &str) -> Resolution {
        let code = raw.trim();
        if code.is_empty() {
            return Resolution::Ignored;
        }

        if let Some(backend) = &self.backend {
            match backend.product_by_barcode(code).await {
                Ok(goods) => {
                    self.play_cue();
                    return Resolution::Resolved(ProductInfo {
                        name: goods.name,
                        price: goods.price,
                    });
                }
                Err(e) if e.is_not_found() => {
                    debug!(code, "barcode unknown to backend, trying local table");
                }
                Err(e) => {
                    warn!(code, error = %e, "remote product lookup failed, trying local table");
                }
            }
        }

        if let Some(info) = self.local.as_ref().and_then(|t| t.get(code)) {
            self.play_cue();
            return Resolution::Resolved(info.clone());
        }

        Resolution::NotFound {
            code: code.to_string(),
        }
    }

    fn play_cue(&self) {
        if let Some(cue) = &self.cue {
            cue.play();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

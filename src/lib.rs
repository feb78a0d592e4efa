//! Thukjai POS - cart, checkout and receipt engine.
//!
//! The in-memory side of a small retail counter: scan intake, product
//! resolution, the cart ledger, pricing and loyalty arithmetic, the
//! checkout state machine, and receipt composition. All durable state
//! (goods, members, orders) lives behind the store backend HTTP API; this
//! crate owns one transaction at a time, from the first scan to the
//! printed receipt.
//!
//! The embedding UI wires the pieces together: a [`scanner::ScanIntake`]
//! feeds accepted codes into a [`products::ProductResolver`], resolved
//! lines land in a [`checkout::CheckoutSession`], and a successful
//! checkout hands a [`receipt::ReceiptData`] to a
//! [`receipt::DocumentRenderer`] for the platform print dialog.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod members;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod reports;
pub mod scanner;

pub use api::{Backend, BackendClient, GoodsRecord};
pub use cart::{Cart, OrderLine};
pub use checkout::{
    CheckoutOutcome, CheckoutPhase, CheckoutSession, OrderPayload, PaymentType, TransactionState,
};
pub use config::{Capabilities, EngineConfig, ShopInfo};
pub use error::{PosError, PosResult, ValidationError};
pub use members::{Member, MemberStatus};
pub use products::{LocalProductTable, ProductResolver, Resolution, ScanCue};
pub use receipt::{Document, DocumentRenderer, HtmlRenderer, ReceiptData, TextRenderer};
pub use scanner::{ScanEvent, ScanIntake};

/// Initialize structured console logging.
///
/// Honors `RUST_LOG`; without it, engine modules log at debug and
/// everything else at info. Safe to call when the embedding application
/// already installed a subscriber; the second init is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,thukjai_pos=debug"));

    let console_layer = fmt::layer().with_target(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

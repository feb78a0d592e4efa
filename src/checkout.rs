//! Checkout coordination.
//!
//! One transaction is in flight per session. All of its mutable state lives
//! in a single [`TransactionState`] value object; every user action is a
//! pure transition returning a new snapshot, and [`CheckoutSession`] tracks
//! which of `Idle -> Editing -> Submitting` the screen is in.
//!
//! Submitting is strictly sequenced: a new member is registered before the
//! order is persisted, and the member's point balance is written after it,
//! best-effort. A failed registration or submission returns the session to
//! `Editing` with everything the operator typed still in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::Backend;
use crate::cart::Cart;
use crate::config::Capabilities;
use crate::error::{PosResult, ValidationError};
use crate::members::{self, Member, MemberStatus};
use crate::pricing;
use crate::receipt::{ReceiptData, ReceiptLine, ReceiptSequence};

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Cash,
    Transfer,
}

impl PaymentType {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentType::Cash => "Cash",
            PaymentType::Transfer => "Transfer",
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction state
// ---------------------------------------------------------------------------

/// Everything the operator has entered for the current transaction.
/// Replaces the per-screen scatter of independent state variables; each
/// action maps to one transition returning a new immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionState {
    pub cart: Cart,
    pub member: MemberStatus,
    pub payment_type: PaymentType,
    pub cash_received: Option<f64>,
    pub redeem_points: i64,
}

impl TransactionState {
    pub fn add_line(
        &self,
        id: &str,
        name: &str,
        quantity: i64,
        price: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            cart: self.cart.add_line(id, name, quantity, price)?,
            ..self.clone()
        })
    }

    pub fn update_quantity(&self, id: &str, quantity: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            cart: self.cart.update_quantity(id, quantity)?,
            ..self.clone()
        })
    }

    pub fn update_discount(&self, id: &str, amount: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            cart: self.cart.update_discount(id, amount)?,
            ..self.clone()
        })
    }

    pub fn remove_line(&self, id: &str) -> Self {
        Self {
            cart: self.cart.remove_line(id),
            ..self.clone()
        }
    }

    pub fn set_payment_type(&self, payment_type: PaymentType) -> Self {
        Self {
            payment_type,
            ..self.clone()
        }
    }

    pub fn set_cash_received(&self, amount: Option<f64>) -> Self {
        Self {
            cash_received: amount,
            ..self.clone()
        }
    }

    /// Set the redemption request. The stored value is clamped to what the
    /// member can actually spend, as a side effect of the edit.
    pub fn set_redeem_points(&self, requested: i64) -> Self {
        Self {
            redeem_points: pricing::clamp_redeem(
                requested,
                self.member.points(),
                self.grand_total(),
            ),
            ..self.clone()
        }
    }

    /// Attach a member lookup result. The pending redemption is re-clamped
    /// against the new balance.
    pub fn attach_member(&self, member: MemberStatus) -> Self {
        let next = Self {
            member,
            ..self.clone()
        };
        next.set_redeem_points(next.redeem_points)
    }

    pub fn clear_member(&self) -> Self {
        Self {
            member: MemberStatus::Unset,
            redeem_points: 0,
            ..self.clone()
        }
    }

    // -- derived figures ----------------------------------------------------

    pub fn grand_total(&self) -> f64 {
        pricing::grand_total(self.cart.lines())
    }

    pub fn loyalty_discount(&self) -> f64 {
        pricing::loyalty_discount(self.redeem_points, self.member.points(), self.grand_total())
    }

    pub fn net_total(&self) -> f64 {
        pricing::net_total(self.grand_total(), self.loyalty_discount())
    }

    /// Change due, computed only for cash payments with a tendered amount.
    pub fn change_due(&self) -> Option<f64> {
        match (self.payment_type, self.cash_received) {
            (PaymentType::Cash, Some(cash)) => {
                Some(pricing::change_due(cash, self.net_total()))
            }
            _ => None,
        }
    }

    pub fn earned_points(&self) -> i64 {
        pricing::earned_points(self.net_total(), self.member.is_set())
    }
}

/// Checkout preconditions. Each violation carries its own message; nothing
/// is submitted until all pass.
pub fn validate_for_checkout(state: &TransactionState) -> Result<(), ValidationError> {
    if state.cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    if state.payment_type == PaymentType::Cash {
        match state.cash_received {
            None => return Err(ValidationError::MissingCash),
            Some(cash) if cash <= 0.0 => return Err(ValidationError::NonPositiveCash),
            Some(_) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Member resolution
// ---------------------------------------------------------------------------

/// Look up a member by phone. A hit comes back `Found`; an unknown phone
/// becomes a `New` member (registered at checkout) carrying the name the
/// operator typed. Network failures propagate.
pub async fn resolve_member<B: Backend>(
    backend: &B,
    phone: &str,
    entered_name: &str,
) -> PosResult<MemberStatus> {
    let phone = members::normalize_phone(phone);
    if phone.is_empty() {
        return Err(ValidationError::MissingMemberPhone.into());
    }
    match backend.member_by_phone(&phone).await {
        Ok(member) => Ok(MemberStatus::Found(member)),
        Err(e) if e.is_not_found() => Ok(MemberStatus::New(Member {
            name: entered_name.trim().to_string(),
            phone,
            points: 0,
        })),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Order payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub id: String,
    pub name: String,
    pub qty: i64,
    pub price: f64,
    pub total: f64,
}

/// What `POST /api/orders` receives. `cash` and `change` are serialized as
/// zero for transfers; the backend model requires the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// Client-generated reference, stable across retries of one checkout.
    pub order_ref: String,
    pub member: Option<Member>,
    pub items: Vec<OrderItemPayload>,
    pub payment_type: PaymentType,
    pub cash: f64,
    pub total: f64,
    pub discount: f64,
    pub net_total: f64,
    pub change: f64,
    pub redeemed_points: i64,
    pub earned_points: i64,
    pub points_before: i64,
    pub date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Nothing entered yet.
    Idle,
    /// Cart has at least one line.
    Editing,
    /// Submission in flight.
    Submitting,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_ref: String,
    pub receipt: ReceiptData,
    pub earned_points: i64,
    /// Balance written back to the backend, when a member was involved.
    pub new_point_balance: Option<i64>,
    /// Set when the order persisted but the follow-up point write failed.
    /// The order is committed either way.
    pub point_update_error: Option<String>,
}

/// One terminal session: the current transaction plus its phase and the
/// session receipt counter.
#[derive(Debug)]
pub struct CheckoutSession {
    state: TransactionState,
    phase: CheckoutPhase,
    capabilities: Capabilities,
    receipts: ReceiptSequence,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl CheckoutSession {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            state: TransactionState::default(),
            phase: CheckoutPhase::Idle,
            capabilities,
            receipts: ReceiptSequence::default(),
        }
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    fn commit_edit(&mut self, next: TransactionState) {
        self.state = next;
        self.phase = if self.state.cart.is_empty() {
            CheckoutPhase::Idle
        } else {
            CheckoutPhase::Editing
        };
    }

    pub fn add_line(
        &mut self,
        id: &str,
        name: &str,
        quantity: i64,
        price: f64,
    ) -> Result<(), ValidationError> {
        let next = self.state.add_line(id, name, quantity, price)?;
        self.commit_edit(next);
        Ok(())
    }

    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<(), ValidationError> {
        let next = self.state.update_quantity(id, quantity)?;
        self.commit_edit(next);
        Ok(())
    }

    pub fn update_discount(&mut self, id: &str, amount: f64) -> Result<(), ValidationError> {
        let next = self.state.update_discount(id, amount)?;
        self.commit_edit(next);
        Ok(())
    }

    pub fn remove_line(&mut self, id: &str) {
        let next = self.state.remove_line(id);
        self.commit_edit(next);
    }

    pub fn set_payment_type(&mut self, payment_type: PaymentType) {
        let next = self.state.set_payment_type(payment_type);
        self.commit_edit(next);
    }

    pub fn set_cash_received(&mut self, amount: Option<f64>) {
        let next = self.state.set_cash_received(amount);
        self.commit_edit(next);
    }

    /// Request a point redemption. Ignored on terminals without loyalty.
    pub fn set_redeem_points(&mut self, requested: i64) {
        if !self.capabilities.loyalty_enabled {
            debug!("redeem request ignored: loyalty disabled");
            return;
        }
        let next = self.state.set_redeem_points(requested);
        self.commit_edit(next);
    }

    /// Attach a member lookup result. Ignored on terminals without member
    /// lookup.
    pub fn attach_member(&mut self, member: MemberStatus) {
        if !self.capabilities.member_lookup_enabled {
            debug!("member attach ignored: member lookup disabled");
            return;
        }
        let next = self.state.attach_member(member);
        self.commit_edit(next);
    }

    pub fn clear_member(&mut self) {
        let next = self.state.clear_member();
        self.commit_edit(next);
    }

    /// Finalize and submit the transaction.
    ///
    /// Validation failures block the transition and make no API call. On
    /// success all transaction state is cleared and the session returns to
    /// `Idle`; on any submission failure it returns to `Editing` with the
    /// entered data preserved.
    pub async fn checkout<B: Backend>(&mut self, backend: &B) -> PosResult<CheckoutOutcome> {
        validate_for_checkout(&self.state)?;

        self.phase = CheckoutPhase::Submitting;
        match run_checkout(backend, &self.state, self.capabilities).await {
            Ok(mut outcome) => {
                outcome.receipt.receipt_no = self.receipts.next_no();
                self.state = TransactionState::default();
                self.phase = CheckoutPhase::Idle;
                Ok(outcome)
            }
            Err(e) => {
                self.phase = CheckoutPhase::Editing;
                Err(e)
            }
        }
    }
}

/// The submission sequence: register a new member, persist the order, then
/// write the point balance best-effort.
async fn run_checkout<B: Backend>(
    backend: &B,
    state: &TransactionState,
    capabilities: Capabilities,
) -> PosResult<CheckoutOutcome> {
    // A member the lookup did not know must exist before the order
    // references them. Registration failure aborts the checkout.
    if let MemberStatus::New(member) = &state.member {
        members::validate_registration(&member.name, &member.phone)?;
        backend.create_member(member).await?;
        info!(phone = %member.phone, "registered new member");
    }

    let grand_total = state.grand_total();
    let redeemed = if capabilities.loyalty_enabled {
        pricing::clamp_redeem(state.redeem_points, state.member.points(), grand_total)
    } else {
        0
    };
    let discount = redeemed as f64;
    let net_total = pricing::net_total(grand_total, discount);
    let earned = if capabilities.loyalty_enabled {
        pricing::earned_points(net_total, state.member.is_set())
    } else {
        0
    };
    let points_before = state.member.points();
    let change = match (state.payment_type, state.cash_received) {
        (PaymentType::Cash, Some(cash)) => Some(pricing::change_due(cash, net_total)),
        _ => None,
    };
    let now = Utc::now();

    let payload = OrderPayload {
        order_ref: Uuid::new_v4().to_string(),
        member: state.member.member().cloned(),
        items: state
            .cart
            .lines()
            .iter()
            .map(|line| OrderItemPayload {
                id: line.id.clone(),
                name: line.name.clone(),
                qty: line.quantity,
                price: line.price,
                total: line.line_total(),
            })
            .collect(),
        payment_type: state.payment_type,
        cash: state.cash_received.unwrap_or(0.0),
        total: grand_total,
        discount,
        net_total,
        change: change.unwrap_or(0.0),
        redeemed_points: redeemed,
        earned_points: earned,
        points_before,
        date: now,
    };

    backend.submit_order(&payload).await?;
    info!(
        order_ref = %payload.order_ref,
        total = grand_total,
        net_total,
        "order submitted"
    );

    // Point balance follow-up. The order is already committed; a failure
    // here is surfaced but never rolls it back.
    let mut new_point_balance = None;
    let mut point_update_error = None;
    if capabilities.loyalty_enabled {
        if let Some(member) = state.member.member() {
            let balance = points_before - redeemed + earned;
            match backend.update_member_points(&member.phone, balance).await {
                Ok(()) => new_point_balance = Some(balance),
                Err(e) => {
                    warn!(phone = %member.phone, error = %e, "point balance update failed after order commit");
                    point_update_error = Some(e.to_string());
                }
            }
        }
    }

    let receipt = ReceiptData {
        receipt_no: String::new(),
        created_at: now,
        lines: state
            .cart
            .lines()
            .iter()
            .map(|line| ReceiptLine {
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.price,
                discount: line.discount,
                line_total: line.line_total(),
            })
            .collect(),
        grand_total,
        loyalty_discount: discount,
        net_total,
        payment_type: state.payment_type,
        cash_received: state.cash_received,
        change,
        member_name: state.member.member().map(|m| m.name.clone()),
        earned_points: earned,
    };

    Ok(CheckoutOutcome {
        order_ref: payload.order_ref,
        receipt,
        earned_points: earned,
        new_point_balance,
        point_update_error,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

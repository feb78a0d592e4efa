//! Cart ledger: the order lines of the transaction being rung up.
//!
//! Every operation is a pure transition. `self` is left untouched and the
//! updated ledger comes back as a new value, so each user action maps to
//! exactly one snapshot the screen can render, and a rejected edit cannot
//! half-apply.
//!
//! Line identity follows the entry form: the id is whatever the barcode
//! field held, or the `"99"` sentinel when the operator left it blank.
//! Name and price are frozen at entry time and never re-fetched.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Sentinel id assigned when the operator leaves the barcode field blank.
pub const FALLBACK_LINE_ID: &str = "99";

// ---------------------------------------------------------------------------
// Order line
// ---------------------------------------------------------------------------

/// One product entry in the current cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of entry.
    pub price: f64,
    /// Absolute amount subtracted from this line's subtotal, independent
    /// of quantity.
    #[serde(default)]
    pub discount: f64,
}

impl OrderLine {
    /// `quantity * price - discount`. Deliberately not clamped at zero:
    /// an over-sized discount produces a negative line total.
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.price - self.discount
    }
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

/// The ordered set of lines for one transaction, at most one line per id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<OrderLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order, as the receipt will print them.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Add a line, merging on duplicate id.
    ///
    /// A blank id gets the `"99"` sentinel. If a line with the same id is
    /// already in the cart, its quantity goes up by one and the submitted
    /// name/price are ignored, keeping the original line identity.
    /// Otherwise the line is validated (non-empty name, positive quantity,
    /// non-negative price) and appended with zero discount.
    pub fn add_line(
        &self,
        id: &str,
        name: &str,
        quantity: i64,
        price: f64,
    ) -> Result<Cart, ValidationError> {
        let id = {
            let trimmed = id.trim();
            if trimmed.is_empty() {
                FALLBACK_LINE_ID.to_string()
            } else {
                trimmed.to_string()
            }
        };

        let mut next = self.clone();
        if let Some(existing) = next.lines.iter_mut().find(|l| l.id == id) {
            existing.quantity += 1;
            return Ok(next);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if quantity < 1 {
            return Err(ValidationError::InvalidQuantity);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::InvalidPrice);
        }

        next.lines.push(OrderLine {
            id,
            name: name.to_string(),
            quantity,
            price,
            discount: 0.0,
        });
        Ok(next)
    }

    /// Replace a line's quantity. The line must exist and the quantity must
    /// stay positive.
    pub fn update_quantity(&self, id: &str, quantity: i64) -> Result<Cart, ValidationError> {
        if quantity < 1 {
            return Err(ValidationError::InvalidQuantity);
        }
        let mut next = self.clone();
        match next.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(next)
            }
            None => Err(ValidationError::UnknownLine { id: id.to_string() }),
        }
    }

    /// Replace a line's absolute discount amount.
    pub fn update_discount(&self, id: &str, amount: f64) -> Result<Cart, ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidDiscount);
        }
        let mut next = self.clone();
        match next.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.discount = amount;
                Ok(next)
            }
            None => Err(ValidationError::UnknownLine { id: id.to_string() }),
        }
    }

    /// Drop a line. Removing an id that is not present is a no-op.
    pub fn remove_line(&self, id: &str) -> Cart {
        Cart {
            lines: self
                .lines
                .iter()
                .filter(|l| l.id != id)
                .cloned()
                .collect(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with_lens() -> Cart {
        Cart::new()
            .add_line("123456", "Camera Lens", 1, 1500.0)
            .unwrap()
    }

    #[test]
    fn test_add_line_appends_with_zero_discount() {
        let cart = cart_with_lens();
        assert_eq!(cart.len(), 1);
        let line = cart.line("123456").unwrap();
        assert_eq!(line.name, "Camera Lens");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.discount, 0.0);
    }

    #[test]
    fn test_add_duplicate_id_merges_and_keeps_identity() {
        let cart = cart_with_lens();
        // Conflicting name/price are ignored on merge.
        let cart = cart.add_line("123456", "Other Name", 5, 9.99).unwrap();
        assert_eq!(cart.len(), 1);
        let line = cart.line("123456").unwrap();
        assert_eq!(line.name, "Camera Lens");
        assert_eq!(line.price, 1500.0);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_repeated_adds_count_quantity() {
        let mut cart = Cart::new();
        for _ in 0..4 {
            cart = cart.add_line("345678", "Encoder Cable", 1, 450.0).unwrap();
        }
        cart = cart.add_line("789012", "Lighting Kit", 1, 3200.0).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.line("345678").unwrap().quantity, 4);
        assert_eq!(cart.line("789012").unwrap().quantity, 1);
    }

    #[test]
    fn test_blank_id_gets_sentinel() {
        let cart = Cart::new().add_line("  ", "Loose Item", 1, 20.0).unwrap();
        assert!(cart.line(FALLBACK_LINE_ID).is_some());

        // A second blank-id line merges into the sentinel line.
        let cart = cart.add_line("", "Another Loose Item", 1, 35.0).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(FALLBACK_LINE_ID).unwrap().quantity, 2);
    }

    #[test]
    fn test_validation_rejects_without_change() {
        let cart = cart_with_lens();

        assert_eq!(
            cart.add_line("1", "  ", 1, 10.0),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            cart.add_line("1", "Thing", 0, 10.0),
            Err(ValidationError::InvalidQuantity)
        );
        assert_eq!(
            cart.add_line("1", "Thing", 1, -0.5),
            Err(ValidationError::InvalidPrice)
        );
        // Price of zero is accepted.
        assert!(cart.add_line("1", "Freebie", 1, 0.0).is_ok());

        // Source cart is untouched regardless.
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_update_quantity_and_discount() {
        let cart = cart_with_lens();
        let cart = cart.update_quantity("123456", 3).unwrap();
        assert_eq!(cart.line("123456").unwrap().quantity, 3);

        let cart = cart.update_discount("123456", 100.0).unwrap();
        assert_eq!(cart.line("123456").unwrap().discount, 100.0);

        assert_eq!(
            cart.update_quantity("123456", 0),
            Err(ValidationError::InvalidQuantity)
        );
        assert_eq!(
            cart.update_quantity("nope", 2),
            Err(ValidationError::UnknownLine {
                id: "nope".to_string()
            })
        );
        assert_eq!(
            cart.update_discount("123456", -1.0),
            Err(ValidationError::InvalidDiscount)
        );
    }

    #[test]
    fn test_remove_line_is_idempotent() {
        let cart = cart_with_lens();
        let cart = cart.remove_line("123456");
        assert!(cart.is_empty());
        // Removing again is a no-op.
        let cart = cart.remove_line("123456");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let cart = Cart::new()
            .add_line("a", "First", 1, 1.0)
            .unwrap()
            .add_line("b", "Second", 1, 2.0)
            .unwrap()
            .add_line("a", "First", 1, 1.0)
            .unwrap();
        let ids: Vec<&str> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_oversized_discount_goes_negative() {
        let cart = Cart::new().add_line("x", "Cheap Thing", 1, 30.0).unwrap();
        let cart = cart.update_discount("x", 100.0).unwrap();
        assert_eq!(cart.line("x").unwrap().line_total(), -70.0);
    }
}

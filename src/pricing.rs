//! Totals and loyalty arithmetic.
//!
//! Pure functions over cart lines: no I/O, no state, so every derived
//! figure on the screen and the receipt comes from the same place.

use crate::cart::OrderLine;

/// Net-total amount that earns one loyalty point.
pub const POINT_EARN_DIVISOR: f64 = 100.0;

/// Sum of `quantity * price - discount` across all lines. Empty cart is 0.
/// Follows the line totals in staying unclamped, so an over-discounted
/// cart can go negative.
pub fn grand_total(lines: &[OrderLine]) -> f64 {
    lines.iter().map(OrderLine::line_total).sum()
}

/// Clamp a requested redemption to what the member can actually spend:
/// never negative, never above the points balance, never above the grand
/// total. A non-positive grand total caps redemption at zero.
pub fn clamp_redeem(requested: i64, member_points: i64, grand_total: f64) -> i64 {
    let by_balance = requested.clamp(0, member_points.max(0));
    let by_total = grand_total.max(0.0).floor() as i64;
    by_balance.min(by_total)
}

/// Currency value of a redemption: one point is one currency unit.
pub fn loyalty_discount(redeem_points: i64, member_points: i64, grand_total: f64) -> f64 {
    clamp_redeem(redeem_points, member_points, grand_total) as f64
}

/// Grand total minus the loyalty discount.
pub fn net_total(grand_total: f64, discount: f64) -> f64 {
    grand_total - discount
}

/// Change due for a cash payment. The caller only asks when the payment
/// type is cash; transfers never compute change.
pub fn change_due(cash_received: f64, net_total: f64) -> f64 {
    cash_received - net_total
}

/// Points earned by a successful checkout: one point per full 100 of net
/// total, members only. Anonymous checkouts and negative nets earn zero.
pub fn earned_points(net_total: f64, member_attached: bool) -> i64 {
    if !member_attached {
        return 0;
    }
    (net_total / POINT_EARN_DIVISOR).floor().max(0.0) as i64
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;

    fn line(id: &str, qty: i64, price: f64, discount: f64) -> OrderLine {
        OrderLine {
            id: id.to_string(),
            name: format!("Item {id}"),
            quantity: qty,
            price,
            discount,
        }
    }

    #[test]
    fn test_grand_total_empty_is_zero() {
        assert_eq!(grand_total(Cart::new().lines()), 0.0);
    }

    #[test]
    fn test_grand_total_sums_line_totals() {
        // 2*100 + 1*450 - 50 = 600
        let lines = vec![line("a", 2, 100.0, 0.0), line("b", 1, 450.0, 50.0)];
        assert_eq!(grand_total(&lines), 600.0);
    }

    #[test]
    fn test_grand_total_can_go_negative() {
        let lines = vec![line("a", 1, 30.0, 100.0)];
        assert_eq!(grand_total(&lines), -70.0);
    }

    #[test]
    fn test_clamp_redeem_by_balance() {
        // Requested 100 against 80 points and a 600 total clamps to 80.
        assert_eq!(clamp_redeem(100, 80, 600.0), 80);
        assert_eq!(loyalty_discount(100, 80, 600.0), 80.0);
        assert_eq!(net_total(600.0, 80.0), 520.0);
    }

    #[test]
    fn test_clamp_redeem_by_grand_total() {
        assert_eq!(clamp_redeem(500, 500, 120.0), 120);
        // Fractional totals round the cap down.
        assert_eq!(clamp_redeem(500, 500, 120.9), 120);
    }

    #[test]
    fn test_clamp_redeem_never_negative() {
        assert_eq!(clamp_redeem(-5, 80, 600.0), 0);
        assert_eq!(clamp_redeem(50, -10, 600.0), 0);
        assert_eq!(clamp_redeem(50, 80, -70.0), 0);
    }

    #[test]
    fn test_change_due() {
        assert_eq!(change_due(1000.0, 600.0), 400.0);
        assert_eq!(change_due(500.0, 600.0), -100.0);
    }

    #[test]
    fn test_earned_points_floor_per_hundred() {
        assert_eq!(earned_points(520.0, true), 5);
        assert_eq!(earned_points(99.99, true), 0);
        assert_eq!(earned_points(100.0, true), 1);
    }

    #[test]
    fn test_earned_points_zero_for_anonymous() {
        assert_eq!(earned_points(5200.0, false), 0);
    }

    #[test]
    fn test_earned_points_never_negative() {
        assert_eq!(earned_points(-70.0, true), 0);
    }
}

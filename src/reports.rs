//! Sales reporting over persisted orders.
//!
//! The backend owns the order history; this module turns `GET /api/orders`
//! results into the figures the report screen shows: revenue per day,
//! best-selling products, and the period total. Report revenue counts
//! `quantity * unit price` per sold line, matching what the sales screen
//! has always displayed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Backend;
use crate::checkout::OrderItemPayload;
use crate::error::PosResult;
use crate::members::Member;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted order as the backend lists it. Tolerant of missing fields:
/// older orders predate some of the payload additions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(default)]
    pub items: Vec<OrderItemPayload>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub member: Option<Member>,
}

/// One sold line, dated by its order.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleEntry {
    pub date: NaiveDate,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub category: Option<String>,
}

impl SaleEntry {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Inclusive date range; open bounds match everything on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map(|s| date >= s).unwrap_or(true) && self.end.map(|e| date <= e).unwrap_or(true)
    }
}

/// Revenue for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// One product's standing in the best-seller ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSeller {
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub total: f64,
}

/// Ranking depth of the best-seller list.
const BEST_SELLER_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Flatten orders into dated sale entries.
pub fn entries_from_orders(orders: &[OrderRecord]) -> Vec<SaleEntry> {
    orders
        .iter()
        .flat_map(|order| {
            let date = order.date.date_naive();
            order.items.iter().map(move |item| SaleEntry {
                date,
                name: item.name.clone(),
                quantity: item.qty,
                unit_price: item.price,
                category: None,
            })
        })
        .collect()
}

/// Keep the entries whose date falls inside the range.
pub fn filter_period(entries: &[SaleEntry], range: &DateRange) -> Vec<SaleEntry> {
    entries
        .iter()
        .filter(|e| range.contains(e.date))
        .cloned()
        .collect()
}

/// Revenue per day, in date order.
pub fn daily_summary(entries: &[SaleEntry]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries {
        *by_day.entry(entry.date).or_insert(0.0) += entry.revenue();
    }
    by_day
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Top products by quantity sold (revenue breaks ties), at most ten.
pub fn best_sellers(entries: &[SaleEntry]) -> Vec<BestSeller> {
    let mut by_name: HashMap<&str, BestSeller> = HashMap::new();
    for entry in entries {
        let seller = by_name.entry(&entry.name).or_insert_with(|| BestSeller {
            name: entry.name.clone(),
            category: entry.category.clone(),
            quantity: 0,
            total: 0.0,
        });
        seller.quantity += entry.quantity;
        seller.total += entry.revenue();
    }

    let mut ranking: Vec<BestSeller> = by_name.into_values().collect();
    ranking.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal))
    });
    ranking.truncate(BEST_SELLER_LIMIT);
    ranking
}

/// Total revenue across the entries.
pub fn total_sales(entries: &[SaleEntry]) -> f64 {
    entries.iter().map(SaleEntry::revenue).sum()
}

/// Fetch the order history and flatten it to sale entries for the range.
pub async fn fetch_sales_entries<B: Backend>(
    backend: &B,
    range: &DateRange,
) -> PosResult<Vec<SaleEntry>> {
    let orders = backend.list_orders().await?;
    Ok(filter_period(&entries_from_orders(&orders), range))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::api::testing::MockBackend;
    use crate::checkout::{OrderPayload, PaymentType};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn entry(d: u32, name: &str, qty: i64, price: f64) -> SaleEntry {
        SaleEntry {
            date: day(d),
            name: name.to_string(),
            quantity: qty,
            unit_price: price,
            category: None,
        }
    }

    fn sample_entries() -> Vec<SaleEntry> {
        vec![
            entry(20, "Camera Lens", 3, 2300.0),
            entry(21, "Lighting Kit", 2, 4500.0),
            entry(22, "Encoder Cable", 6, 700.0),
            entry(23, "Camera Lens", 4, 2300.0),
            entry(24, "Lighting Kit", 3, 4500.0),
        ]
    }

    #[test]
    fn test_total_sales() {
        assert_eq!(total_sales(&sample_entries()), 42800.0);
        assert_eq!(total_sales(&[]), 0.0);
    }

    #[test]
    fn test_filter_period_inclusive_bounds() {
        let filtered = filter_period(
            &sample_entries(),
            &DateRange {
                start: Some(day(21)),
                end: Some(day(23)),
            },
        );
        assert_eq!(filtered.len(), 3);
        assert_eq!(total_sales(&filtered), 22400.0);
    }

    #[test]
    fn test_filter_period_open_ended() {
        let from_only = DateRange {
            start: Some(day(23)),
            end: None,
        };
        assert_eq!(filter_period(&sample_entries(), &from_only).len(), 2);
        assert_eq!(
            filter_period(&sample_entries(), &DateRange::all()).len(),
            5
        );
    }

    #[test]
    fn test_daily_summary_in_date_order() {
        let summary = daily_summary(&sample_entries());
        assert_eq!(summary.len(), 5);
        assert_eq!(summary[0].date, day(20));
        assert_eq!(summary[0].total, 6900.0);
        assert_eq!(summary[4].date, day(24));
        assert_eq!(summary[4].total, 13500.0);
    }

    #[test]
    fn test_daily_summary_merges_same_day() {
        let entries = vec![
            entry(20, "Camera Lens", 1, 100.0),
            entry(20, "Encoder Cable", 2, 50.0),
        ];
        let summary = daily_summary(&entries);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total, 200.0);
    }

    #[test]
    fn test_best_sellers_ranked_by_quantity() {
        let ranking = best_sellers(&sample_entries());
        assert_eq!(ranking.len(), 3);
        // Camera Lens 7, Encoder Cable 6, Lighting Kit 5.
        assert_eq!(ranking[0].name, "Camera Lens");
        assert_eq!(ranking[0].quantity, 7);
        assert_eq!(ranking[0].total, 16100.0);
        assert_eq!(ranking[1].name, "Encoder Cable");
        assert_eq!(ranking[2].name, "Lighting Kit");
    }

    #[test]
    fn test_best_sellers_truncates_to_ten() {
        let entries: Vec<SaleEntry> = (0..15)
            .map(|i| entry(20, &format!("Item {i}"), i + 1, 10.0))
            .collect();
        assert_eq!(best_sellers(&entries).len(), 10);
    }

    #[test]
    fn test_entries_from_orders_flattens_items() {
        let orders = vec![OrderRecord {
            items: vec![
                OrderItemPayload {
                    id: "a".to_string(),
                    name: "Camera Lens".to_string(),
                    qty: 2,
                    price: 1500.0,
                    total: 3000.0,
                },
                OrderItemPayload {
                    id: "b".to_string(),
                    name: "Encoder Cable".to_string(),
                    qty: 1,
                    price: 450.0,
                    total: 450.0,
                },
            ],
            date: Utc.with_ymd_and_hms(2025, 10, 22, 9, 0, 0).unwrap(),
            total: 3450.0,
            member: None,
        }];

        let entries = entries_from_orders(&orders);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, day(22));
        assert_eq!(entries[0].revenue(), 3000.0);
    }

    #[test]
    fn test_order_record_tolerates_minimal_json() {
        let record: OrderRecord =
            serde_json::from_str(r#"{"date": "2025-10-22T09:00:00Z"}"#).unwrap();
        assert!(record.items.is_empty());
        assert_eq!(record.total, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_sales_entries_filters_by_range() {
        let orders = vec![
            OrderRecord {
                items: vec![OrderItemPayload {
                    id: "a".to_string(),
                    name: "Camera Lens".to_string(),
                    qty: 1,
                    price: 1500.0,
                    total: 1500.0,
                }],
                date: Utc.with_ymd_and_hms(2025, 10, 20, 9, 0, 0).unwrap(),
                total: 1500.0,
                member: None,
            },
            OrderRecord {
                items: vec![OrderItemPayload {
                    id: "b".to_string(),
                    name: "Lighting Kit".to_string(),
                    qty: 1,
                    price: 3200.0,
                    total: 3200.0,
                }],
                date: Utc.with_ymd_and_hms(2025, 10, 24, 9, 0, 0).unwrap(),
                total: 3200.0,
                member: None,
            },
        ];
        let backend = MockBackend {
            orders,
            ..MockBackend::default()
        };

        let entries = fetch_sales_entries(
            &backend,
            &DateRange {
                start: Some(day(22)),
                end: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Lighting Kit");
    }

    #[test]
    fn test_round_trip_payload_as_record() {
        // What checkout submits must list back as an order record.
        let payload = OrderPayload {
            order_ref: "ref-1".to_string(),
            member: None,
            items: vec![OrderItemPayload {
                id: "a".to_string(),
                name: "Camera Lens".to_string(),
                qty: 2,
                price: 1500.0,
                total: 3000.0,
            }],
            payment_type: PaymentType::Cash,
            cash: 3000.0,
            total: 3000.0,
            discount: 0.0,
            net_total: 3000.0,
            change: 0.0,
            redeemed_points: 0,
            earned_points: 0,
            points_before: 0,
            date: Utc.with_ymd_and_hms(2025, 10, 22, 9, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let record: OrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.total, 3000.0);
    }
}

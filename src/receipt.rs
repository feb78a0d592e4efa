//! Receipt composition.
//!
//! Turns a finalized transaction into a printable document: plain text laid
//! out for thermal paper, or a monospace HTML page for the platform print
//! dialog. Composing the document is this module's job; pushing it to a
//! device is the platform collaborator's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::PaymentType;
use crate::config::ShopInfo;

// ---------------------------------------------------------------------------
// Paper geometry
// ---------------------------------------------------------------------------

/// Thermal paper width, which fixes the character columns per row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    /// Printable character columns for the width.
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// One printed row of the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount: f64,
    pub line_total: f64,
}

/// The finalized transaction as the receipt shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub receipt_no: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub grand_total: f64,
    /// Loyalty redemption amount; zero hides the discount rows.
    pub loyalty_discount: f64,
    pub net_total: f64,
    pub payment_type: PaymentType,
    pub cash_received: Option<f64>,
    pub change: Option<f64>,
    pub member_name: Option<String>,
    pub earned_points: i64,
}

/// A composed printable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// `text/plain` or `text/html`.
    pub media_type: &'static str,
    pub body: String,
}

/// Capability seam for the platform's print path: one renderer, one method.
pub trait DocumentRenderer {
    fn render(&self, receipt: &ReceiptData) -> Document;
}

// ---------------------------------------------------------------------------
// Receipt numbering
// ---------------------------------------------------------------------------

/// Session-scoped receipt counter. Durable numbering lives behind the
/// backend; this only has to be unique within one terminal session.
#[derive(Debug, Clone)]
pub struct ReceiptSequence {
    next: u64,
}

impl Default for ReceiptSequence {
    fn default() -> Self {
        Self::starting_at(1001)
    }
}

impl ReceiptSequence {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_no(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        n.to_string()
    }
}

// ---------------------------------------------------------------------------
// Currency formatting
// ---------------------------------------------------------------------------

/// Format an amount with thousands grouping; decimals only when the amount
/// has them. `1500.0` prints as `1,500`, `99.5` as `99.50`.
pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = cents / 100;
    let frac = cents % 100;

    let mut out = group_thousands(whole);
    if frac != 0 {
        out.push_str(&format!(".{frac:02}"));
    }
    if value < 0.0 && cents != 0 {
        out.insert(0, '-');
    }
    out
}

/// Amount plus currency code, as printed on totals rows.
pub fn format_money(value: f64, currency: &str) -> String {
    format!("{} {currency}", format_amount(value))
}

fn group_thousands(n: i64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Text layout
// ---------------------------------------------------------------------------

/// Plain-text line layout for a fixed column width: centered headers,
/// dashed separators, label/value rows with a right-aligned value.
struct ReceiptLayout {
    width: usize,
    out: String,
}

impl ReceiptLayout {
    fn new(width: usize) -> Self {
        Self {
            width,
            out: String::new(),
        }
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn center(&mut self, text: &str) {
        let len = text.chars().count();
        let pad = self.width.saturating_sub(len) / 2;
        for _ in 0..pad {
            self.out.push(' ');
        }
        self.line(text);
    }

    fn separator(&mut self) {
        for _ in 0..self.width {
            self.out.push('-');
        }
        self.out.push('\n');
    }

    /// Left-aligned label, right-aligned value.
    fn line_pair(&mut self, label: &str, value: &str) {
        let gap = self
            .width
            .saturating_sub(label.chars().count() + value.chars().count());
        self.out.push_str(label);
        for _ in 0..gap {
            self.out.push(' ');
        }
        self.line(value);
    }

    fn build(self) -> String {
        self.out
    }
}

// ---------------------------------------------------------------------------
// Text renderer
// ---------------------------------------------------------------------------

/// Renders the receipt as plain text for thermal paper.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    shop: ShopInfo,
    paper: PaperWidth,
}

impl TextRenderer {
    pub fn new(shop: ShopInfo) -> Self {
        Self {
            shop,
            paper: PaperWidth::Mm80,
        }
    }

    pub fn with_paper(mut self, paper: PaperWidth) -> Self {
        self.paper = paper;
        self
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, receipt: &ReceiptData) -> Document {
        let currency = self.shop.currency.as_str();
        let mut doc = ReceiptLayout::new(self.paper.chars());

        doc.center(&self.shop.name);
        if let Some(address) = &self.shop.address {
            doc.center(address);
        }
        if let Some(phone) = &self.shop.phone {
            doc.center(&format!("Tel: {phone}"));
        }
        doc.separator();

        doc.center("RECEIPT");
        doc.line(&format!("No: {}", receipt.receipt_no));
        doc.line(&format!(
            "Date: {}",
            receipt.created_at.format("%d/%m/%Y %H:%M:%S")
        ));
        doc.separator();

        for line in &receipt.lines {
            doc.line(&line.name);
            doc.line(&format!(
                "  {} x {} = {}",
                line.quantity,
                format_amount(line.unit_price),
                format_amount(line.line_total)
            ));
            if line.discount != 0.0 {
                doc.line(&format!("  discount -{}", format_amount(line.discount)));
            }
        }
        doc.separator();

        doc.line_pair("Total", &format_money(receipt.grand_total, currency));
        if receipt.loyalty_discount != 0.0 {
            doc.line_pair(
                "Points discount",
                &format!("-{}", format_money(receipt.loyalty_discount, currency)),
            );
            doc.line_pair("Net total", &format_money(receipt.net_total, currency));
        }
        doc.line_pair("Payment", receipt.payment_type.label());
        if receipt.payment_type == PaymentType::Cash {
            if let Some(cash) = receipt.cash_received {
                doc.line_pair("Cash received", &format_money(cash, currency));
            }
            if let Some(change) = receipt.change {
                doc.line_pair("Change", &format_money(change, currency));
            }
        }

        if let Some(member) = &receipt.member_name {
            doc.separator();
            doc.line(&format!("Member: {member}"));
            doc.line(&format!("Points earned: {}", receipt.earned_points));
        }

        doc.separator();
        if let Some(footer) = &self.shop.footer_text {
            doc.center(footer);
        }

        Document {
            media_type: "text/plain",
            body: doc.build(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTML renderer
// ---------------------------------------------------------------------------

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Renders the receipt as a self-contained 80mm HTML page for the platform
/// print dialog.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    shop: ShopInfo,
}

impl HtmlRenderer {
    pub fn new(shop: ShopInfo) -> Self {
        Self { shop }
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, receipt: &ReceiptData) -> Document {
        let currency = self.shop.currency.as_str();

        let mut rows = String::new();
        for line in &receipt.lines {
            rows.push_str(&format!(
                r#"<tr><td style="text-align:left;">{} x {} {currency} - {}</td><td style="text-align:right;">{} {currency}</td></tr>"#,
                line.quantity,
                format_amount(line.unit_price),
                escape_html(&line.name),
                format_amount(line.line_total),
            ));
            if line.discount != 0.0 {
                rows.push_str(&format!(
                    r#"<tr><td style="text-align:left;">&nbsp;&nbsp;discount</td><td style="text-align:right;">-{} {currency}</td></tr>"#,
                    format_amount(line.discount),
                ));
            }
        }

        let mut summary = String::new();
        if receipt.loyalty_discount != 0.0 {
            summary.push_str(&format!(
                r#"<div class="flex-line"><span>Points discount:</span><span>-{}</span></div>"#,
                format_money(receipt.loyalty_discount, currency)
            ));
            summary.push_str(&format!(
                r#"<div class="total-line"><span>Net total:</span><span>{}</span></div>"#,
                format_money(receipt.net_total, currency)
            ));
        }

        summary.push_str(&format!(
            r#"<div class="flex-line"><span>Payment:</span><span>{}</span></div>"#,
            receipt.payment_type.label()
        ));
        if receipt.payment_type == PaymentType::Cash {
            if let Some(cash) = receipt.cash_received {
                summary.push_str(&format!(
                    r#"<div class="flex-line"><span>Cash received:</span><span>{}</span></div>"#,
                    format_money(cash, currency)
                ));
            }
            if let Some(change) = receipt.change {
                summary.push_str(&format!(
                    r#"<div class="flex-line"><span>Change:</span><span>{}</span></div>"#,
                    format_money(change, currency)
                ));
            }
        }
        if let Some(member) = &receipt.member_name {
            summary.push_str(&format!(
                r#"<div class="flex-line"><span>Member:</span><span>{}</span></div>"#,
                escape_html(member)
            ));
            summary.push_str(&format!(
                r#"<div class="flex-line"><span>Points earned:</span><span>{}</span></div>"#,
                receipt.earned_points
            ));
        }

        let header_meta = {
            let mut meta = String::new();
            if let Some(address) = &self.shop.address {
                meta.push_str(&format!("<small>{}</small><br/>", escape_html(address)));
            }
            if let Some(phone) = &self.shop.phone {
                meta.push_str(&format!("<small>Tel: {}</small><br/>", escape_html(phone)));
            }
            meta
        };

        let footer = self
            .shop
            .footer_text
            .as_deref()
            .map(escape_html)
            .unwrap_or_default();

        let body = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<title>Receipt {receipt_no}</title>
<style>
  @page {{ size: 80mm auto; margin: 0; }}
  body {{
    width: 80mm;
    margin: 0 auto;
    font-family: monospace;
    font-size: 14px;
    text-align: center;
    line-height: 1.6;
    letter-spacing: 0.3px;
  }}
  h1 {{ font-size: 20px; margin: 4px 0; }}
  small {{ font-size: 13px; }}
  hr {{ border: none; border-top: 2px dashed black; margin: 10px 0; }}
  table {{ width: 100%; border-collapse: collapse; margin-top: 5px; }}
  td {{ padding: 4px 0; font-size: 14px; }}
  .flex-line {{
    display: flex;
    justify-content: space-between;
    padding: 0 10px;
    font-size: 14px;
  }}
  .total-line {{
    display: flex;
    justify-content: space-between;
    padding: 5px 10px;
    font-size: 16px;
    font-weight: bold;
    border-top: 2px solid black;
    margin-top: 5px;
  }}
</style>
</head>
<body>
<h1>{shop_name}</h1>
{header_meta}<hr/>
<strong style="font-size:16px;">RECEIPT</strong><br/>
<small>No: {receipt_no}</small><br/>
<small>{date}</small><hr/>
<table>{rows}</table>
<hr/>
<div class="total-line"><span>Total:</span><span>{total}</span></div>
{summary}
<hr/><p style="margin-top:10px;font-size:15px;">{footer}</p>
</body>
</html>"#,
            receipt_no = escape_html(&receipt.receipt_no),
            shop_name = escape_html(&self.shop.name),
            header_meta = header_meta,
            date = receipt.created_at.format("%d/%m/%Y %H:%M:%S"),
            rows = rows,
            total = format_money(receipt.grand_total, currency),
            summary = summary,
            footer = footer,
        );

        Document {
            media_type: "text/html",
            body,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

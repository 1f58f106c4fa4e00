use serde::{Deserialize, Serialize};

/// A position in source-image pixel space (also used for display/client
/// coordinates during conversion). Serialized as `[x, y]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Point { x: p[0], y: p[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Four document corners in a fixed cyclic order.
pub type Quad = [Point; 4];

/// One line item as reported by the recognition service. Every field may be
/// absent; `total_price` is authoritative and is not required to equal
/// `quantity * price_per_item`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_item: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptDiscount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}

/// Structured receipt from the recognition service. Treated as untrusted:
/// both lists default to empty when missing from the wire JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptData {
    #[serde(default)]
    pub product_item: Vec<ReceiptItem>,
    #[serde(default)]
    pub product_item_discount: Vec<ReceiptDiscount>,
}

/// One persisted record of a processing attempt, success or failure.
/// Immutable after creation except for deletion. Persisted as camelCase
/// JSON, the format the history browser stores and reads back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// Epoch milliseconds at creation.
    pub timestamp: i64,
    pub file_name: String,
    /// None marks a failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReceiptData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Small preview image as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
}

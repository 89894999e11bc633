use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{cart::Cart, line_item::QuoteLineItem};
use crate::utils::price::round_currency;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuote {
    pub items: Vec<QuoteLineItem>,
    pub total: f64,
    pub date: DateTime<Utc>,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfq_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

impl SavedQuote {
    pub fn from_cart(cart: &Cart, rfq_number: Option<String>, customer: Option<String>) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: round_currency(cart.grand_total()),
            date: Utc::now(),
            item_count: cart.len(),
            rfq_number,
            customer,
        }
    }
}

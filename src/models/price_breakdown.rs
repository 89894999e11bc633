use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use super::cost_table::CostAxis;
use crate::pricing::PricingStrategy;

#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub strategy: PricingStrategy,
    /// g
    pub weight: f64,
    pub quantity: u32,
    pub base_price: f64,
    pub costs: Vec<PriceBreakdownCost>,
    /// Before rounding and, for per-order pricing, before the discount.
    pub subtotal: f64,
    pub discount_rate: f64,
    pub unit_price: f64,
    pub line_total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceBreakdownCost {
    pub axis: CostAxis,
    pub option: String,
    pub unit_cost: f64,
    /// Grams for material, bore count for bores, 1 otherwise.
    pub multiplier: f64,
    pub amount: f64,
}

/// `{ "price": … }`, the pricing output of the config service.
#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PriceResponse {
    pub price: f64,
}

/// `{ "grand_total": … }`
#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GrandTotalResponse {
    pub grand_total: f64,
}

impl PriceBreakdown {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn discount_amount(&self) -> f64 {
        if self.discount_rate > 0.0 {
            self.subtotal * self.discount_rate
        } else {
            0.0
        }
    }

    /// The per-order strategy prices the whole line, the others a piece.
    pub fn response(&self) -> PriceResponse {
        let price = if self.strategy.uses_base_price() {
            self.line_total
        } else {
            self.unit_price
        };
        PriceResponse { price }
    }
}

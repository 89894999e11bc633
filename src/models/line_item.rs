use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{configuration::Configuration, price_breakdown::PriceBreakdown};

/// One priced cart line. The computed fields are only ever written from a
/// [`PriceBreakdown`] of the same configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
    pub id: Uuid,
    #[serde(flatten)]
    pub configuration: Configuration,
    /// g
    pub weight: f64,
    pub unit_price: f64,
    pub line_total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl QuoteLineItem {
    pub fn new(configuration: Configuration, breakdown: &PriceBreakdown) -> Self {
        Self::with_id(Uuid::new_v4(), configuration, breakdown)
    }

    pub fn with_id(id: Uuid, configuration: Configuration, breakdown: &PriceBreakdown) -> Self {
        Self {
            id,
            configuration,
            weight: breakdown.weight,
            unit_price: breakdown.unit_price,
            line_total: breakdown.line_total,
            warnings: breakdown.warnings.clone(),
        }
    }
}

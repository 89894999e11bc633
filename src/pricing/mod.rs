pub mod engine;
pub mod weight;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;

use crate::{
    is_selected,
    models::{
        configuration::Configuration,
        cost_table::{CostAxis, CostTable},
        price_breakdown::{PriceBreakdown, PriceBreakdownCost},
    },
    utils::price::{apply_volume_discount, calculate_line_total, round_currency, volume_discount_rate},
};

pub use engine::PriceEngine;

#[derive(Debug, Error, PartialEq)]
pub enum PricingStrategyError {
    #[error("Unknown pricing strategy: {0}")]
    Unknown(String),
}

/// How a configuration is turned into money.
#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PricingStrategy {
    /// Material plus every selected treatment, per piece.
    #[default]
    PerUnit,
    /// Material only, per piece.
    PerUnitMaterialOnly,
    /// Product-group base price plus all terms, times quantity, with the
    /// volume discount applied to the whole order.
    PerOrderWithVolumeDiscount,
}

impl PricingStrategy {
    pub const ALL: [PricingStrategy; 3] = [
        PricingStrategy::PerUnit,
        PricingStrategy::PerUnitMaterialOnly,
        PricingStrategy::PerOrderWithVolumeDiscount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingStrategy::PerUnit => "per-unit",
            PricingStrategy::PerUnitMaterialOnly => "per-unit-material-only",
            PricingStrategy::PerOrderWithVolumeDiscount => "per-order-with-volume-discount",
        }
    }

    pub fn uses_base_price(&self) -> bool {
        matches!(self, PricingStrategy::PerOrderWithVolumeDiscount)
    }
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PricingStrategy {
    type Err = PricingStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == needle)
            .or(match needle.as_str() {
                "material-only" | "no-config" => Some(PricingStrategy::PerUnitMaterialOnly),
                "per-order" | "volume-discount" => Some(PricingStrategy::PerOrderWithVolumeDiscount),
                _ => None,
            })
            .ok_or_else(|| PricingStrategyError::Unknown(s.to_string()))
    }
}

/// Unit costs looked up for one configuration. Every field is already 0 for
/// unselected or unknown options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedCosts {
    pub material_per_gram: f64,
    pub bore: f64,
    pub coating: f64,
    pub hardening: f64,
    pub tolerance_width: f64,
    pub tolerance_height: f64,
    pub base_price: f64,
}

impl ResolvedCosts {
    pub fn from_table(table: &CostTable, config: &Configuration) -> Self {
        Self {
            material_per_gram: table.cost_of(CostAxis::Material, &config.material),
            bore: table.cost_of(CostAxis::Bore, &config.bore),
            coating: table.cost_of(CostAxis::Coating, &config.coating),
            hardening: table.cost_of(CostAxis::Hardening, &config.hardening),
            tolerance_width: table.cost_of(CostAxis::Tolerance, &config.tolerance_width),
            tolerance_height: table.cost_of(CostAxis::Tolerance, &config.tolerance_height),
            base_price: table.base_price(&config.product_group),
        }
    }
}

/// Prices one configuration from its weight and resolved costs. Pure: the
/// same inputs always give the same breakdown.
pub fn price_configuration(
    config: &Configuration,
    weight: f64,
    costs: &ResolvedCosts,
    strategy: PricingStrategy,
) -> PriceBreakdown {
    let quantity = config.quantity.max(1);
    let mut warnings = Vec::new();

    if weight <= 0.0 {
        warnings.push("Weight is 0; configuration is incomplete".to_string());
    }
    if costs.material_per_gram <= 0.0 && !config.material.trim().is_empty() {
        warnings.push(format!("No cost found for material {}", config.material));
    }

    let base_cost = weight * costs.material_per_gram;
    let mut terms = vec![PriceBreakdownCost {
        axis: CostAxis::Material,
        option: config.material.clone(),
        unit_cost: costs.material_per_gram,
        multiplier: weight,
        amount: base_cost,
    }];

    if strategy == PricingStrategy::PerUnitMaterialOnly {
        let unit_price = round_currency(base_cost);
        return PriceBreakdown {
            strategy,
            weight,
            quantity,
            base_price: 0.0,
            costs: terms,
            subtotal: base_cost,
            discount_rate: 0.0,
            unit_price,
            line_total: calculate_line_total(unit_price, quantity),
            warnings,
        };
    }

    let bore_count = config.number_of_bores.max(1) as f64;
    let options = [
        (CostAxis::Bore, &config.bore, costs.bore, bore_count),
        (CostAxis::Coating, &config.coating, costs.coating, 1.0),
        (CostAxis::Hardening, &config.hardening, costs.hardening, 1.0),
        (CostAxis::Tolerance, &config.tolerance_width, costs.tolerance_width, 1.0),
        (CostAxis::Tolerance, &config.tolerance_height, costs.tolerance_height, 1.0),
    ];
    for (axis, option, unit_cost, multiplier) in options {
        if is_selected(option) {
            terms.push(PriceBreakdownCost {
                axis,
                option: option.clone(),
                unit_cost,
                multiplier,
                amount: unit_cost * multiplier,
            });
        }
    }

    match strategy {
        PricingStrategy::PerOrderWithVolumeDiscount => {
            if costs.base_price <= 0.0 {
                warnings.push(format!(
                    "No base price for product group {}; counted as 0",
                    config.product_group
                ));
            }
            let options_total: f64 = terms.iter().map(|t| t.amount).sum();
            let per_piece = costs.base_price + options_total;
            let subtotal = per_piece * quantity as f64;
            let discount_rate = volume_discount_rate(quantity);
            let line_total = round_currency(apply_volume_discount(subtotal, quantity));
            PriceBreakdown {
                strategy,
                weight,
                quantity,
                base_price: costs.base_price,
                costs: terms,
                subtotal,
                discount_rate,
                unit_price: round_currency(line_total / quantity as f64),
                line_total,
                warnings,
            }
        }
        _ => {
            let mut total = base_cost;
            for term in terms.iter().skip(1) {
                total += term.amount;
            }
            let unit_price = round_currency(total);
            PriceBreakdown {
                strategy,
                weight,
                quantity,
                base_price: 0.0,
                costs: terms,
                subtotal: total,
                discount_rate: 0.0,
                unit_price,
                line_total: calculate_line_total(unit_price, quantity),
                warnings,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::weight::calculate_material_weight;

    fn steel_key(quantity: u32) -> Configuration {
        Configuration {
            product_group: "Passfeder (Keyway)".into(),
            material: "C45".into(),
            width: 6.0,
            height: 4.0,
            depth: 10.0,
            quantity,
            ..Default::default()
        }
    }

    fn price(config: &Configuration, table: &CostTable, strategy: PricingStrategy) -> PriceBreakdown {
        let weight = calculate_material_weight(
            config.width,
            config.height,
            config.depth,
            &config.material,
            table,
        );
        price_configuration(config, weight, &ResolvedCosts::from_table(table, config), strategy)
    }

    #[test]
    fn strategies_parse_from_names_and_aliases() {
        for strategy in PricingStrategy::ALL {
            assert_eq!(strategy.as_str().parse(), Ok(strategy));
        }
        assert_eq!("material-only".parse(), Ok(PricingStrategy::PerUnitMaterialOnly));
        assert!("cheapest".parse::<PricingStrategy>().is_err());
    }

    #[test]
    fn material_only_ignores_treatments() {
        let table = CostTable::builtin();
        let mut config = steel_key(1);
        let plain = price(&config, &table, PricingStrategy::PerUnitMaterialOnly);

        config.bore = "M5".into();
        config.number_of_bores = 3;
        config.coating = "Typ 2".into();
        config.hardening = "HRC 45".into();
        config.tolerance_width = "h7".into();
        let treated = price(&config, &table, PricingStrategy::PerUnitMaterialOnly);

        assert_eq!(plain.unit_price, round_currency(1.884 * 1.5));
        assert_eq!(plain.unit_price, treated.unit_price);
        assert_eq!(treated.costs.len(), 1);
    }

    #[test]
    fn per_order_discounts_before_rounding() {
        let table = CostTable::builtin();
        let mut config = steel_key(25);
        config.coating = "Typ 1".into();

        let breakdown = price(&config, &table, PricingStrategy::PerOrderWithVolumeDiscount);
        let pre_discount = (1.884 * 1.5 + 3.2) * 25.0;

        assert_eq!(breakdown.discount_rate, 0.04);
        assert!((breakdown.subtotal - pre_discount).abs() < 1e-9);
        assert_eq!(breakdown.line_total, round_currency(breakdown.subtotal * 0.96));
    }

    #[test]
    fn per_order_adds_group_base_price() {
        let mut table = CostTable::builtin();
        table.base_prices.insert("Passfeder (Keyway)".into(), 20.0);
        let config = steel_key(2);

        let breakdown = price(&config, &table, PricingStrategy::PerOrderWithVolumeDiscount);

        assert_eq!(breakdown.base_price, 20.0);
        assert_eq!(breakdown.discount_rate, 0.0);
        assert_eq!(breakdown.line_total, round_currency((20.0 + 1.884 * 1.5) * 2.0));
        assert_eq!(breakdown.unit_price, round_currency(breakdown.line_total / 2.0));
        assert!(breakdown.warnings.is_empty());
    }

    #[test]
    fn per_order_warns_on_missing_base_price() {
        let table = CostTable::builtin();
        let config = steel_key(2);

        let per_order = price(&config, &table, PricingStrategy::PerOrderWithVolumeDiscount);
        let per_unit = price(&config, &table, PricingStrategy::PerUnit);

        assert_eq!(per_order.base_price, 0.0);
        assert_eq!(
            per_order.warnings,
            vec!["No base price for product group Passfeder (Keyway); counted as 0".to_string()]
        );
        assert!(per_unit.warnings.is_empty());
    }

    #[test]
    fn incomplete_configuration_prices_at_zero_with_warning() {
        let table = CostTable::builtin();
        let mut config = steel_key(5);
        config.depth = 0.0;

        let breakdown = price(&config, &table, PricingStrategy::PerUnit);

        assert_eq!(breakdown.weight, 0.0);
        assert_eq!(breakdown.unit_price, 0.0);
        assert_eq!(breakdown.line_total, 0.0);
        assert!(!breakdown.warnings.is_empty());
    }

    #[test]
    fn per_unit_and_per_order_differ_above_one_piece() {
        let table = CostTable::builtin();
        let config = steel_key(400);
        let per_unit = price(&config, &table, PricingStrategy::PerUnit);
        let per_order = price(&config, &table, PricingStrategy::PerOrderWithVolumeDiscount);
        assert!(per_order.line_total < per_unit.line_total);
    }
}

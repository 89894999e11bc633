use std::sync::Arc;

use futures::join;
use tracing::{debug, warn};

use super::{PricingStrategy, ResolvedCosts, price_configuration, weight::calculate_weight};
use crate::{
    catalog::{CatalogError, CostSource, StaticCatalog},
    models::{configuration::Configuration, cost_table::{CostAxis, CostTable}, price_breakdown::PriceBreakdown},
};

/// Prices configurations against a cost source with one strategy.
///
/// Lookup failures never abort a quote: the affected cost counts as 0 and
/// the breakdown carries a warning instead.
#[derive(Clone)]
pub struct PriceEngine {
    source: Arc<dyn CostSource>,
    strategy: PricingStrategy,
}

impl PriceEngine {
    pub fn new(source: Arc<dyn CostSource>, strategy: PricingStrategy) -> Self {
        Self { source, strategy }
    }

    pub fn offline(table: CostTable, strategy: PricingStrategy) -> Self {
        Self::new(Arc::new(StaticCatalog::new(table)), strategy)
    }

    pub fn strategy(&self) -> PricingStrategy {
        self.strategy
    }

    pub fn with_strategy(&self, strategy: PricingStrategy) -> Self {
        Self {
            source: Arc::clone(&self.source),
            strategy,
        }
    }

    /// Grams, from the geometry and the material's density.
    pub fn weight(&self, config: &Configuration) -> f64 {
        let density = self.source.density_of(&config.material);
        calculate_weight(config.width, config.height, config.depth, density)
    }

    /// Looks up every cost of `config` concurrently.
    pub async fn resolve_costs(&self, config: &Configuration) -> (ResolvedCosts, Vec<String>) {
        let source = self.source.as_ref();
        let with_base_price =
            self.strategy.uses_base_price() && !config.product_group.trim().is_empty();

        let (material, bore, coating, hardening, tolerance_width, tolerance_height, base_price) = join!(
            source.cost_of(CostAxis::Material, &config.material),
            source.cost_of(CostAxis::Bore, &config.bore),
            source.cost_of(CostAxis::Coating, &config.coating),
            source.cost_of(CostAxis::Hardening, &config.hardening),
            source.cost_of(CostAxis::Tolerance, &config.tolerance_width),
            source.cost_of(CostAxis::Tolerance, &config.tolerance_height),
            async {
                if with_base_price {
                    source.base_price(&config.product_group).await
                } else {
                    Ok(0.0)
                }
            },
        );

        let mut warnings = Vec::new();
        let mut settle = |what: &str, result: Result<f64, CatalogError>| match result {
            Ok(cost) => cost,
            Err(e) => {
                warn!("Failed to resolve {what} cost: {e}");
                warnings.push(format!("{what} cost unavailable, counted as 0: {e}"));
                0.0
            }
        };

        let costs = ResolvedCosts {
            material_per_gram: settle("material", material),
            bore: settle("bore", bore),
            coating: settle("coating", coating),
            hardening: settle("hardening", hardening),
            tolerance_width: settle("width tolerance", tolerance_width),
            tolerance_height: settle("height tolerance", tolerance_height),
            base_price: base_price.unwrap_or_else(|e| {
                warn!("Failed to resolve base price for {}: {e}", config.product_group);
                0.0
            }),
        };
        (costs, warnings)
    }

    pub async fn quote(&self, config: &Configuration) -> PriceBreakdown {
        let weight = self.weight(config);
        let (costs, lookup_warnings) = self.resolve_costs(config).await;
        let mut breakdown = price_configuration(config, weight, &costs, self.strategy);
        breakdown.warnings.extend(lookup_warnings);
        debug!(
            "Priced {} {} x{}: unit {} line {}",
            config.product_group,
            config.dimensions_label(),
            breakdown.quantity,
            breakdown.unit_price,
            breakdown.line_total
        );
        breakdown
    }

    pub async fn unit_price(&self, config: &Configuration) -> f64 {
        self.quote(config).await.unit_price
    }
}

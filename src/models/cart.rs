use std::fmt::Write;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    configuration::{ConfigField, ConfigFieldError, Configuration},
    line_item::QuoteLineItem,
    price_breakdown::{GrandTotalResponse, PriceBreakdown},
};
use crate::{
    pricing::{PriceEngine, PricingStrategy},
    utils::{currency::format_eur, price::round_currency},
};

#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    #[error("No line item with id {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Field(#[from] ConfigFieldError),
}

/// Ordered line items of one quote session, all priced by the same engine.
#[derive(Clone)]
pub struct Cart {
    engine: PriceEngine,
    items: Vec<QuoteLineItem>,
}

impl Cart {
    pub fn new(engine: PriceEngine) -> Self {
        Self {
            engine,
            items: Vec::new(),
        }
    }

    pub fn engine(&self) -> &PriceEngine {
        &self.engine
    }

    pub fn items(&self) -> &[QuoteLineItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&QuoteLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub async fn add_item(&mut self, configuration: Configuration) -> (Uuid, PriceBreakdown) {
        let breakdown = self.engine.quote(&configuration).await;
        let item = QuoteLineItem::new(configuration, &breakdown);
        let id = item.id;
        info!("Added line item {id}: {}", format_eur(item.line_total));
        self.items.push(item);
        (id, breakdown)
    }

    pub fn remove_item(&mut self, id: Uuid) -> Option<QuoteLineItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        debug!("Removed line item {id}");
        Some(self.items.remove(index))
    }

    /// Replaces one field and re-prices the item from scratch. The item keeps
    /// its id and position.
    pub async fn edit_item(
        &mut self,
        id: Uuid,
        field: ConfigField,
        value: &str,
    ) -> Result<PriceBreakdown, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CartError::NotFound(id))?;

        let mut configuration = self.items[index].configuration.clone();
        configuration.set_field(field, value);
        let breakdown = self.engine.quote(&configuration).await;
        self.items[index] = QuoteLineItem::with_id(id, configuration, &breakdown);
        Ok(breakdown)
    }

    /// Like [`Cart::edit_item`], addressing the field by its wire key.
    pub async fn edit_item_by_key(
        &mut self,
        id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<PriceBreakdown, CartError> {
        let field: ConfigField = key.parse()?;
        self.edit_item(id, field, value).await
    }

    /// Switches the pricing strategy and re-prices every item.
    pub async fn set_strategy(&mut self, strategy: PricingStrategy) {
        if strategy == self.engine.strategy() {
            return;
        }
        self.engine = self.engine.with_strategy(strategy);
        let engine = &self.engine;
        let breakdowns =
            join_all(self.items.iter().map(|item| engine.quote(&item.configuration))).await;

        for (item, breakdown) in self.items.iter_mut().zip(breakdowns) {
            *item = QuoteLineItem::with_id(item.id, item.configuration.clone(), &breakdown);
        }
        info!("Re-priced {} line items with {strategy}", self.items.len());
    }

    pub fn grand_total(&self) -> f64 {
        self.items.iter().map(|item| item.line_total).sum()
    }

    pub fn grand_total_response(&self) -> GrandTotalResponse {
        GrandTotalResponse {
            grand_total: round_currency(self.grand_total()),
        }
    }

    /// Plain-text quote table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<4} {:<28} {:<10} {:<14} {:>6} {:>14} {:>14}",
            "Pos", "Product", "Material", "Dimensions", "Qty", "Unit price", "Line total"
        );
        for (pos, item) in self.items.iter().enumerate() {
            let config = &item.configuration;
            let _ = writeln!(
                out,
                "{:<4} {:<28} {:<10} {:<14} {:>6} {:>14} {:>14}",
                pos + 1,
                config.product_group,
                config.material,
                config.dimensions_label(),
                config.quantity,
                format_eur(item.unit_price),
                format_eur(item.line_total)
            );
            for warning in &item.warnings {
                let _ = writeln!(out, "     ! {warning}");
            }
        }
        let _ = writeln!(out, "{:>96}", format!("Total: {}", format_eur(self.grand_total())));
        out
    }
}

use async_trait::async_trait;

use super::{CatalogError, CostSource, OptionSource, ProductGroup};
use crate::models::{
    cost_table::{CostAxis, CostTable},
    option_set::OptionSet,
    product_family::ProductFamily,
};

/// Offline catalog backed by a [`CostTable`] and the built-in option sets.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    table: CostTable,
}

impl StaticCatalog {
    pub fn new(table: CostTable) -> Self {
        Self { table }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(CostTable::builtin())
    }
}

#[async_trait]
impl CostSource for StaticCatalog {
    async fn cost_of(&self, axis: CostAxis, value: &str) -> Result<f64, CatalogError> {
        Ok(self.table.cost_of(axis, value))
    }

    async fn base_price(&self, product_group: &str) -> Result<f64, CatalogError> {
        Ok(self.table.base_price(product_group))
    }

    fn density_of(&self, material: &str) -> f64 {
        self.table.density_of(material)
    }
}

#[async_trait]
impl OptionSource for StaticCatalog {
    async fn options_for(&self, family: ProductFamily) -> Result<OptionSet, CatalogError> {
        Ok(OptionSet::builtin(family))
    }

    async fn product_groups(&self) -> Result<Vec<ProductGroup>, CatalogError> {
        Ok(ProductFamily::ALL
            .into_iter()
            .enumerate()
            .map(|(i, family)| ProductGroup {
                id: i as u32 + 1,
                name: family.display_name().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_builtin_tables() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.cost_of(CostAxis::Bore, "M4").await.unwrap(), 13.0);
        assert_eq!(catalog.cost_of(CostAxis::Bore, "none").await.unwrap(), 0.0);
        assert_eq!(catalog.base_price("Passfeder (Keyway)").await.unwrap(), 0.0);

        let groups = catalog.product_groups().await.unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].name, "Nutenstein (T-Slot Nut)");

        let options = catalog.options_for(ProductFamily::DiscSpring).await.unwrap();
        assert_eq!(options.materials, vec!["Aluminium"]);
    }
}

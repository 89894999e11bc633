use std::sync::Arc;

use tracing::{info, warn};

use super::{OptionSource, ProductGroup, StaticCatalog};
use crate::models::{
    configuration::Configuration,
    option_set::{OptionSet, OptionViolation},
    product_family::ProductFamily,
};

/// Looks up the legal options of a product family. A remote source is tried
/// first; any failure falls back to the built-in sets so callers never block.
#[derive(Clone)]
pub struct OptionResolver {
    remote: Option<Arc<dyn OptionSource>>,
    fallback: StaticCatalog,
}

impl OptionResolver {
    pub fn new(remote: Option<Arc<dyn OptionSource>>) -> Self {
        Self {
            remote,
            fallback: StaticCatalog::default(),
        }
    }

    pub fn offline() -> Self {
        Self::new(None)
    }

    pub async fn options_for(&self, family: ProductFamily) -> OptionSet {
        if let Some(remote) = &self.remote {
            match remote.options_for(family).await {
                Ok(options) => return options,
                Err(e) => warn!("Failed to load product options for {family}: {e}"),
            }
        }
        OptionSet::builtin(family)
    }

    /// Fills defaults and reports out-of-set values. A configuration whose
    /// product group is unknown is left untouched.
    pub async fn resolve_configuration(&self, config: &mut Configuration) -> Vec<OptionViolation> {
        let Some(family) = config.family() else {
            info!("No option set for product group {:?}", config.product_group);
            return Vec::new();
        };
        self.options_for(family).await.resolve(config)
    }

    pub async fn product_groups(&self) -> Vec<ProductGroup> {
        if let Some(remote) = &self.remote {
            match remote.product_groups().await {
                Ok(groups) if !groups.is_empty() => return groups,
                Ok(_) => warn!("Config service returned no product groups"),
                Err(e) => warn!("Failed to load product groups: {e}"),
            }
        }
        // StaticCatalog never fails here.
        self.fallback.product_groups().await.unwrap_or_default()
    }
}

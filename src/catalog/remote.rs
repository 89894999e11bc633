use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{CatalogError, CostSource, OptionSource, ProductGroup};
use crate::{
    is_selected,
    models::{
        cost_table::{CostAxis, CostTable},
        material::base_material,
        option_set::OptionSet,
        product_family::ProductFamily,
    },
    utils::{
        http::{HttpError, http_api_key_headers, http_get_json, http_join_url, http_post_json},
        lenient::value_as_f64,
    },
};

const PRODUCT_GROUPS_TABLE: &str = "productgroups";

/// Catalog served by the config service: REST tables for costs and edge
/// functions for option sets. Densities stay local, since the service only
/// stores costs.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    api_key: String,
    retries: u32,
    local: CostTable,
}

impl HttpCatalog {
    pub fn new(client: Client, base_url: &str, api_key: &str, retries: u32, local: CostTable) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retries,
            local,
        }
    }

    fn headers(&self) -> Result<HeaderMap, HttpError> {
        http_api_key_headers(&self.api_key)
    }

    /// First row of `table` where `column` equals `value`, if any.
    async fn select_one(
        &self,
        table: &'static str,
        select: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Value>, CatalogError> {
        let url = http_join_url(&self.base_url, &format!("rest/v1/{table}"));
        let query = [
            ("select", select.to_string()),
            (column, format!("eq.{value}")),
            ("limit", "1".to_string()),
        ];
        let rows = http_get_json(&self.client, &url, &query, Some(self.headers()?), self.retries).await?;
        Ok(first_row(rows))
    }

    async fn lookup_cost(&self, axis: CostAxis, value: &str) -> Result<Option<f64>, CatalogError> {
        let row = self
            .select_one(axis.table(), axis.cost_column(), axis.name_column(), value)
            .await?;
        let Some(row) = row else {
            debug!("No cost found for {value} in {}", axis.table());
            return Ok(None);
        };
        parse_cost(axis, value, &row).map(Some)
    }

    async fn invoke(&self, function: &str, body: &Value) -> Result<Value, CatalogError> {
        let url = http_join_url(&self.base_url, &format!("functions/v1/{function}"));
        Ok(http_post_json(&self.client, &url, body, Some(self.headers()?), self.retries).await?)
    }
}

#[async_trait]
impl CostSource for HttpCatalog {
    async fn cost_of(&self, axis: CostAxis, value: &str) -> Result<f64, CatalogError> {
        if !is_selected(value) {
            return Ok(0.0);
        }
        let value = value.trim();
        if let Some(cost) = self.lookup_cost(axis, value).await? {
            return Ok(cost);
        }
        if axis == CostAxis::Material {
            if let Some(base) = base_material(value, self.local.material_names()) {
                if base != value {
                    info!("Material {value} not priced, retrying as {base}");
                    return Ok(self.lookup_cost(axis, base).await?.unwrap_or(0.0));
                }
            }
        }
        Ok(0.0)
    }

    async fn base_price(&self, product_group: &str) -> Result<f64, CatalogError> {
        let row = self
            .select_one(PRODUCT_GROUPS_TABLE, "base_price", "group_name", product_group)
            .await?
            .ok_or_else(|| CatalogError::GroupNotFound(product_group.to_string()))?;
        Ok(row.get("base_price").and_then(value_as_f64).unwrap_or(0.0))
    }

    fn density_of(&self, material: &str) -> f64 {
        self.local.density_of(material)
    }
}

#[async_trait]
impl OptionSource for HttpCatalog {
    async fn options_for(&self, family: ProductFamily) -> Result<OptionSet, CatalogError> {
        let body = json!({ "action": "get-options", "productGroup": family.display_name() });
        let response = self.invoke("product-config", &body).await?;
        parse_options(family, response)
    }

    async fn product_groups(&self) -> Result<Vec<ProductGroup>, CatalogError> {
        let response = self.invoke("get-product-groups", &json!({})).await?;
        Ok(serde_json::from_value(response)?)
    }
}

fn first_row(rows: Value) -> Option<Value> {
    match rows {
        Value::Array(mut rows) if !rows.is_empty() => Some(rows.swap_remove(0)),
        Value::Object(row) if !row.is_empty() => Some(Value::Object(row)),
        _ => None,
    }
}

fn parse_cost(axis: CostAxis, value: &str, row: &Value) -> Result<f64, CatalogError> {
    let raw = row.get(axis.cost_column()).unwrap_or(&Value::Null);
    value_as_f64(raw).ok_or_else(|| CatalogError::InvalidCost {
        table: axis.table(),
        value: value.to_string(),
        raw: raw.to_string(),
    })
}

/// The service answers unknown groups with `{"error": ...}` or an empty body.
fn parse_options(family: ProductFamily, response: Value) -> Result<OptionSet, CatalogError> {
    if response.get("error").is_some() {
        return Err(CatalogError::GroupNotFound(family.display_name().to_string()));
    }
    let options = OptionSet::from_value(response)?;
    if options.is_empty() {
        return Err(CatalogError::GroupNotFound(family.display_name().to_string()));
    }
    Ok(options)
}

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{configuration::Configuration, cost_table::CostTable, material::base_material, product_family::ProductFamily};
use crate::{
    NONE_OPTION,
    utils::lenient::{de_string, de_u32, value_as_f64},
};

const NOT_AVAILABLE: &str = "N/A";
const DEFAULT_DOCUMENT_TYPE: &str = "RFQ";
const DEFAULT_MATERIAL: &str = "C45";

/// Header fields of an ingested RFQ or order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DocumentHeader {
    #[serde(default, deserialize_with = "de_string")]
    pub supplier_name: String,
    #[serde(default, deserialize_with = "de_string")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "de_string")]
    pub type_of_document: String,
    #[serde(default, deserialize_with = "de_string")]
    pub date: String,
    #[serde(default, deserialize_with = "de_string")]
    pub customer_number: String,
    #[serde(default, deserialize_with = "de_string")]
    pub order_or_rfq_number: String,
}

impl DocumentHeader {
    /// Fills every missing field: "N/A", "RFQ" for the type, today for the date.
    pub fn with_defaults(mut self) -> Self {
        for field in [
            &mut self.supplier_name,
            &mut self.customer_name,
            &mut self.customer_number,
            &mut self.order_or_rfq_number,
        ] {
            if field.is_empty() {
                *field = NOT_AVAILABLE.to_string();
            }
        }
        if self.type_of_document.is_empty() {
            self.type_of_document = DEFAULT_DOCUMENT_TYPE.to_string();
        }
        if self.date.is_empty() {
            self.date = Utc::now().date_naive().to_string();
        }
        self
    }

    pub fn rfq_number(&self) -> Option<&str> {
        Some(self.order_or_rfq_number.as_str()).filter(|n| *n != NOT_AVAILABLE)
    }

    pub fn customer(&self) -> Option<&str> {
        Some(self.customer_name.as_str()).filter(|n| *n != NOT_AVAILABLE)
    }
}

/// One requested position as the ingestion service extracts it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ExtractedItem {
    #[serde(default, deserialize_with = "de_u32")]
    pub pos: u32,
    #[serde(default, deserialize_with = "de_string")]
    pub article_name: String,
    #[serde(default, deserialize_with = "de_string")]
    pub supplier_material_number: String,
    #[serde(default, deserialize_with = "de_string")]
    pub customer_material_number: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "de_u32")]
    pub qty: u32,
    #[serde(default, deserialize_with = "de_string")]
    pub unit: String,
    #[serde(default, alias = "deliveryDate", deserialize_with = "de_string")]
    pub delivery_date: String,
    #[serde(default, rename = "productGroup", deserialize_with = "de_string")]
    pub product_group: String,
    #[serde(default, deserialize_with = "de_string")]
    pub material: String,
    /// `"6x4x10"` or `{ "width": 6, "height": 4, "depth": 10 }`
    #[serde(default)]
    pub dimensions: Option<Value>,
    #[serde(default)]
    pub width: Option<Value>,
    #[serde(default)]
    pub height: Option<Value>,
    #[serde(default)]
    pub depth: Option<Value>,
    #[serde(default, deserialize_with = "de_string")]
    pub bore: String,
    #[serde(default, rename = "numberOfBores", deserialize_with = "de_u32")]
    pub number_of_bores: u32,
    #[serde(default, deserialize_with = "de_string")]
    pub coating: String,
    #[serde(default, deserialize_with = "de_string")]
    pub hardening: String,
    #[serde(default, rename = "toleranceBreite", deserialize_with = "de_string")]
    pub tolerance_width: String,
    #[serde(default, rename = "toleranceHohe", deserialize_with = "de_string")]
    pub tolerance_height: String,
    #[serde(default, rename = "dinNorm", deserialize_with = "de_string")]
    pub din_norm: String,
}

impl ExtractedItem {
    pub fn requested_quantity(&self) -> u32 {
        [self.qty, self.quantity]
            .into_iter()
            .find(|q| *q > 0)
            .unwrap_or(1)
    }
}

/// Turns extracted items into priceable configurations.
#[derive(Debug, Clone)]
pub struct ItemMapper {
    dimensions: Regex,
    material: Regex,
    din_norm: Regex,
    table: CostTable,
}

impl ItemMapper {
    pub fn new(table: CostTable) -> Result<Self, regex::Error> {
        Ok(Self {
            dimensions: Regex::new(
                r"(\d+(?:[.,]\d+)?)\s*[xX×]\s*(\d+(?:[.,]\d+)?)(?:\s*[xX×]\s*(\d+(?:[.,]\d+)?))?",
            )?,
            material: Regex::new(r"\b([A-Z]\d+[A-Z]?)\b")?,
            din_norm: Regex::new(r"\bDIN\s*\d+\b")?,
            table,
        })
    }

    pub fn to_configuration(&self, item: &ExtractedItem) -> Configuration {
        let [width, height, depth] = self.dimensions_of(item);
        if width.is_none() || height.is_none() || depth.is_none() {
            warn!(
                "Incomplete dimensions for position {} ({:?})",
                item.pos, item.article_name
            );
        }

        let product_group = if item.product_group.is_empty() {
            ProductFamily::Keyway.display_name().to_string()
        } else {
            item.product_group.clone()
        };

        let din_norm = if item.din_norm.is_empty() {
            self.din_norm
                .find(&item.article_name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        } else {
            item.din_norm.clone()
        };

        let configuration = Configuration {
            product_group,
            din_norm,
            material: self.material_of(item),
            width: width.unwrap_or(0.0),
            height: height.unwrap_or(0.0),
            depth: depth.unwrap_or(0.0),
            bore: or_none(&item.bore),
            number_of_bores: item.number_of_bores,
            coating: or_none(&item.coating),
            hardening: or_none(&item.hardening),
            tolerance_width: or_none(&item.tolerance_width),
            tolerance_height: or_none(&item.tolerance_height),
            quantity: item.requested_quantity(),
        };
        debug!(
            "Mapped position {} to {} {}",
            item.pos,
            configuration.material,
            configuration.dimensions_label()
        );
        configuration
    }

    /// Dimensions field first, then the separate fields, then the article name.
    fn dimensions_of(&self, item: &ExtractedItem) -> [Option<f64>; 3] {
        let mut dims = match &item.dimensions {
            Some(Value::String(raw)) => {
                let parts: Vec<Option<f64>> = raw
                    .split(['x', 'X', '×'])
                    .map(|p| positive(&Value::String(p.to_string())))
                    .collect();
                match parts.as_slice() {
                    [w, h, d] => [*w, *h, *d],
                    _ => [None; 3],
                }
            }
            Some(Value::Object(obj)) => ["width", "height", "depth"]
                .map(|k| obj.get(k).and_then(positive)),
            _ => [None; 3],
        };

        for (slot, field) in dims.iter_mut().zip([&item.width, &item.height, &item.depth]) {
            if let Some(value) = field {
                *slot = positive(value);
            }
        }

        if dims.iter().any(Option::is_none) {
            if let Some(caps) = self.dimensions.captures(&item.article_name) {
                for (slot, group) in dims.iter_mut().zip(1..=3) {
                    if slot.is_none() {
                        *slot = caps
                            .get(group)
                            .and_then(|m| positive(&Value::String(m.as_str().to_string())));
                    }
                }
            }
        }
        dims
    }

    fn material_of(&self, item: &ExtractedItem) -> String {
        let raw = if item.material.is_empty() {
            self.material
                .captures(&item.article_name)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        } else {
            item.material.clone()
        };
        if raw.is_empty() {
            return DEFAULT_MATERIAL.to_string();
        }
        base_material(&raw, self.table.material_names())
            .map(str::to_string)
            .unwrap_or(raw)
    }
}

fn positive(value: &Value) -> Option<f64> {
    value_as_f64(value).filter(|v| *v > 0.0)
}

fn or_none(value: &str) -> String {
    if value.trim().is_empty() {
        NONE_OPTION.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapper() -> ItemMapper {
        ItemMapper::new(CostTable::builtin()).unwrap()
    }

    fn item(value: Value) -> ExtractedItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_article_name_only_item() {
        let item = item(json!({
            "pos": 1,
            "article_name": "DIN 6885 C45K B 6x4x10",
            "supplier_material_number": "00111488",
            "quantity": 400,
            "unit": "St",
            "delivery_date": "2025-06-23"
        }));
        let config = mapper().to_configuration(&item);

        assert_eq!(config.product_group, "Passfeder (Keyway)");
        assert_eq!(config.din_norm, "DIN 6885");
        assert_eq!(config.material, "C45");
        assert_eq!((config.width, config.height, config.depth), (6.0, 4.0, 10.0));
        assert_eq!(config.bore, "none");
        assert_eq!(config.quantity, 400);
    }

    #[test]
    fn explicit_fields_win_over_article_name() {
        let item = item(json!({
            "article_name": "Passfeder 8x7x20",
            "dimensions": { "width": "5", "height": 5 },
            "depth": "12,5",
            "material": "Edelstahl",
            "qty": "3",
            "coating": "Typ 2"
        }));
        let config = mapper().to_configuration(&item);

        assert_eq!((config.width, config.height, config.depth), (5.0, 5.0, 12.5));
        assert_eq!(config.material, "Edelstahl");
        assert_eq!(config.quantity, 3);
        assert_eq!(config.coating, "Typ 2");
    }

    #[test]
    fn unresolvable_dimensions_become_zero() {
        let item = item(json!({ "article_name": "Nutenstein 8x12", "dimensions": "NA" }));
        let config = mapper().to_configuration(&item);

        assert_eq!((config.width, config.height, config.depth), (8.0, 12.0, 0.0));
        assert_eq!(config.material, "C45");
        assert_eq!(config.quantity, 1);
    }

    #[test]
    fn qty_wins_over_quantity() {
        assert_eq!(item(json!({ "qty": 5, "quantity": 40 })).requested_quantity(), 5);
        assert_eq!(item(json!({ "qty": 0, "quantity": 40 })).requested_quantity(), 40);
        assert_eq!(item(json!({})).requested_quantity(), 1);
    }

    #[test]
    fn dimension_string_is_split() {
        let item = item(json!({ "dimensions": "6 x 4 x 12" }));
        let config = mapper().to_configuration(&item);
        assert_eq!((config.width, config.height, config.depth), (6.0, 4.0, 12.0));
    }

    #[test]
    fn header_defaults_missing_fields() {
        let header: DocumentHeader = serde_json::from_value(json!({
            "customer_name": "Ferdinand Gross GmbH & Co. KG",
            "order_or_rfq_number": 1172482
        }))
        .unwrap();
        let header = header.with_defaults();

        assert_eq!(header.supplier_name, "N/A");
        assert_eq!(header.type_of_document, "RFQ");
        assert_eq!(header.rfq_number(), Some("1172482"));
        assert_eq!(header.date.len(), 10);
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use typeshare::typeshare;

use super::product_family::ProductFamily;
use crate::{
    NONE_OPTION,
    utils::lenient::{de_f64, de_option_string, de_quantity, de_string, de_u32, parse_f64, parse_u32},
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigFieldError {
    #[error("Unknown configuration field: {0}")]
    Unknown(String),
}

/// Inputs of one quote line as the configurator and the chat agent send them.
///
/// Unknown keys (including a client-computed `weight`) are ignored; weight is
/// always derived from the geometry.
#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, deserialize_with = "de_string")]
    pub product_group: String,
    #[serde(default, deserialize_with = "de_string")]
    pub din_norm: String,
    #[serde(default, deserialize_with = "de_string")]
    pub material: String,
    /// mm
    #[serde(rename = "breite", default, deserialize_with = "de_f64")]
    pub width: f64,
    /// mm
    #[serde(rename = "hohe", default, deserialize_with = "de_f64")]
    pub height: f64,
    /// mm
    #[serde(rename = "tiefe", default, deserialize_with = "de_f64")]
    pub depth: f64,
    #[serde(default = "none_option", deserialize_with = "de_option_string")]
    pub bore: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub number_of_bores: u32,
    #[serde(default = "none_option", deserialize_with = "de_option_string")]
    pub coating: String,
    #[serde(default = "none_option", deserialize_with = "de_option_string")]
    pub hardening: String,
    #[serde(
        rename = "toleranceBreite",
        default = "none_option",
        deserialize_with = "de_option_string"
    )]
    pub tolerance_width: String,
    #[serde(
        rename = "toleranceHohe",
        default = "none_option",
        deserialize_with = "de_option_string"
    )]
    pub tolerance_height: String,
    #[serde(default = "default_quantity", deserialize_with = "de_quantity")]
    pub quantity: u32,
}

fn none_option() -> String {
    NONE_OPTION.to_string()
}

fn default_quantity() -> u32 {
    1
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            product_group: String::new(),
            din_norm: String::new(),
            material: String::new(),
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            bore: none_option(),
            number_of_bores: 0,
            coating: none_option(),
            hardening: none_option(),
            tolerance_width: none_option(),
            tolerance_height: none_option(),
            quantity: default_quantity(),
        }
    }
}

impl Configuration {
    pub fn family(&self) -> Option<ProductFamily> {
        self.product_group.parse().ok()
    }

    pub fn get_field(&self, field: ConfigField) -> String {
        match field {
            ConfigField::ProductGroup => self.product_group.clone(),
            ConfigField::DinNorm => self.din_norm.clone(),
            ConfigField::Material => self.material.clone(),
            ConfigField::Width => self.width.to_string(),
            ConfigField::Height => self.height.to_string(),
            ConfigField::Depth => self.depth.to_string(),
            ConfigField::Bore => self.bore.clone(),
            ConfigField::NumberOfBores => self.number_of_bores.to_string(),
            ConfigField::Coating => self.coating.clone(),
            ConfigField::Hardening => self.hardening.clone(),
            ConfigField::ToleranceWidth => self.tolerance_width.clone(),
            ConfigField::ToleranceHeight => self.tolerance_height.clone(),
            ConfigField::Quantity => self.quantity.to_string(),
        }
    }

    /// Replaces one field from its textual form.
    ///
    /// Returns `false` when the value could not be parsed and a safe default
    /// (0 for dimensions and bore counts, 1 for quantity, "none" for options)
    /// was stored instead.
    pub fn set_field(&mut self, field: ConfigField, value: &str) -> bool {
        let value = value.trim();
        let option_value = || {
            if value.is_empty() {
                none_option()
            } else {
                value.to_string()
            }
        };

        let parsed = match field {
            ConfigField::ProductGroup => {
                self.product_group = value.to_string();
                true
            }
            ConfigField::DinNorm => {
                self.din_norm = value.to_string();
                true
            }
            ConfigField::Material => {
                self.material = value.to_string();
                true
            }
            ConfigField::Width => set_dimension(&mut self.width, value),
            ConfigField::Height => set_dimension(&mut self.height, value),
            ConfigField::Depth => set_dimension(&mut self.depth, value),
            ConfigField::Bore => {
                self.bore = option_value();
                true
            }
            ConfigField::NumberOfBores => {
                let count = parse_u32(value);
                self.number_of_bores = count.unwrap_or(0);
                count.is_some()
            }
            ConfigField::Coating => {
                self.coating = option_value();
                true
            }
            ConfigField::Hardening => {
                self.hardening = option_value();
                true
            }
            ConfigField::ToleranceWidth => {
                self.tolerance_width = option_value();
                true
            }
            ConfigField::ToleranceHeight => {
                self.tolerance_height = option_value();
                true
            }
            ConfigField::Quantity => {
                let quantity = parse_u32(value).filter(|q| *q >= 1);
                self.quantity = quantity.unwrap_or(1);
                quantity.is_some()
            }
        };

        if !parsed {
            warn!("Could not parse {field} value {value:?}, using default");
        }
        parsed
    }

    /// Applies `key: value` pairs (as sent by the chat agent) to this
    /// configuration and returns how many keys were recognised.
    pub fn apply_form_fill<'a, I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut applied = 0;
        for (key, value) in entries {
            match key.parse::<ConfigField>() {
                Ok(field) => {
                    self.set_field(field, value);
                    applied += 1;
                }
                Err(_) => debug!("Ignoring form fill key {key:?}"),
            }
        }
        applied
    }

    pub fn dimensions_label(&self) -> String {
        format!("{}×{}×{}", self.width, self.height, self.depth)
    }
}

fn set_dimension(target: &mut f64, value: &str) -> bool {
    match parse_f64(value).filter(|v| *v >= 0.0) {
        Some(v) => {
            *target = v;
            true
        }
        None => {
            *target = 0.0;
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    ProductGroup,
    DinNorm,
    Material,
    Width,
    Height,
    Depth,
    Bore,
    NumberOfBores,
    Coating,
    Hardening,
    ToleranceWidth,
    ToleranceHeight,
    Quantity,
}

impl ConfigField {
    pub const ALL: [ConfigField; 13] = [
        ConfigField::ProductGroup,
        ConfigField::DinNorm,
        ConfigField::Material,
        ConfigField::Width,
        ConfigField::Height,
        ConfigField::Depth,
        ConfigField::Bore,
        ConfigField::NumberOfBores,
        ConfigField::Coating,
        ConfigField::Hardening,
        ConfigField::ToleranceWidth,
        ConfigField::ToleranceHeight,
        ConfigField::Quantity,
    ];

    /// Key used on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::ProductGroup => "productGroup",
            ConfigField::DinNorm => "dinNorm",
            ConfigField::Material => "material",
            ConfigField::Width => "breite",
            ConfigField::Height => "hohe",
            ConfigField::Depth => "tiefe",
            ConfigField::Bore => "bore",
            ConfigField::NumberOfBores => "numberOfBores",
            ConfigField::Coating => "coating",
            ConfigField::Hardening => "hardening",
            ConfigField::ToleranceWidth => "toleranceBreite",
            ConfigField::ToleranceHeight => "toleranceHohe",
            ConfigField::Quantity => "quantity",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ConfigField {
    type Err = ConfigFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if let Some(field) = Self::ALL.into_iter().find(|f| f.key() == key) {
            return Ok(field);
        }
        match key.to_lowercase().as_str() {
            "productgroup" | "product_group" | "product" => Ok(ConfigField::ProductGroup),
            "dinnorm" | "norm" | "din_norm" => Ok(ConfigField::DinNorm),
            "width" => Ok(ConfigField::Width),
            "height" => Ok(ConfigField::Height),
            "depth" => Ok(ConfigField::Depth),
            "numberofbores" | "number_of_bores" | "bores" => Ok(ConfigField::NumberOfBores),
            "tolerancewidth" | "tolerance_width" | "tolerancebreite" => {
                Ok(ConfigField::ToleranceWidth)
            }
            "toleranceheight" | "tolerance_height" | "tolerancehohe" => {
                Ok(ConfigField::ToleranceHeight)
            }
            "qty" | "quantity" => Ok(ConfigField::Quantity),
            _ => Err(ConfigFieldError::Unknown(s.to_string())),
        }
    }
}

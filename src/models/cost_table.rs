use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;

use super::material::{DEFAULT_DENSITY_G_CM3, Material, base_material};
use crate::is_selected;

#[derive(Debug, Error)]
pub enum CostTableError {
    #[error("Failed to read cost table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse cost table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid material row: {0}")]
    InvalidMaterial(String),

    #[error("Unknown cost axis: {0}")]
    UnknownAxis(String),
}

#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CostAxis {
    Material,
    Bore,
    Coating,
    Hardening,
    Tolerance,
}

impl CostAxis {
    pub const ALL: [CostAxis; 5] = [
        CostAxis::Material,
        CostAxis::Bore,
        CostAxis::Coating,
        CostAxis::Hardening,
        CostAxis::Tolerance,
    ];

    /// Remote table holding this axis.
    pub fn table(&self) -> &'static str {
        match self {
            CostAxis::Material => "materials",
            CostAxis::Bore => "bores",
            CostAxis::Coating => "coatings",
            CostAxis::Hardening => "hardeninglevels",
            CostAxis::Tolerance => "tolerances",
        }
    }

    pub fn name_column(&self) -> &'static str {
        match self {
            CostAxis::Material => "material_name",
            CostAxis::Bore => "bore_size",
            CostAxis::Coating => "coating_type",
            CostAxis::Hardening => "hardening_level",
            CostAxis::Tolerance => "tolerance_grade",
        }
    }

    pub fn cost_column(&self) -> &'static str {
        match self {
            CostAxis::Material => "cost_per_gram",
            CostAxis::Bore => "cost_per_bore",
            CostAxis::Coating => "cost_per_part",
            CostAxis::Hardening => "cost_per_lot",
            CostAxis::Tolerance => "cost_per_side",
        }
    }
}

impl fmt::Display for CostAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self {
            CostAxis::Material => "material",
            CostAxis::Bore => "bore",
            CostAxis::Coating => "coating",
            CostAxis::Hardening => "hardening",
            CostAxis::Tolerance => "tolerance",
        };
        write!(f, "{axis}")
    }
}

impl FromStr for CostAxis {
    type Err = CostTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "material" => Ok(CostAxis::Material),
            "bore" => Ok(CostAxis::Bore),
            "coating" => Ok(CostAxis::Coating),
            "hardening" => Ok(CostAxis::Hardening),
            "tolerance" => Ok(CostAxis::Tolerance),
            other => Err(CostTableError::UnknownAxis(other.to_string())),
        }
    }
}

/// Unit costs for every priced option, keyed by option name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CostTable {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub bores: BTreeMap<String, f64>,
    #[serde(default)]
    pub coatings: BTreeMap<String, f64>,
    #[serde(default)]
    pub hardening: BTreeMap<String, f64>,
    #[serde(default)]
    pub tolerances: BTreeMap<String, f64>,
    /// Per-order base price by product group display name.
    #[serde(default)]
    pub base_prices: BTreeMap<String, f64>,
}

impl CostTable {
    pub fn builtin() -> Self {
        let materials = vec![
            Material::new("C45", 7.85, 1.5),
            Material::new("C60", 7.84, 2.5),
            Material::new("Edelstahl", 7.95, 3.0),
            Material::new("Aluminium", 2.70, 4.5),
            Material::new("Messing", 8.50, 6.0),
        ];

        // M1 = 10 … M21 = 30
        let bores = (1..=21)
            .map(|n| (format!("M{n}"), 9.0 + n as f64))
            .collect();

        // Typ 1 = 3.2 … Typ 17 = 6.4
        let coatings = (1..=17)
            .map(|n| (format!("Typ {n}"), 3.0 + 0.2 * n as f64))
            .collect();

        // HRC 40 = 50 … HRC 58 = 230
        let hardening = (40..=58)
            .map(|n| (format!("HRC {n}"), 50.0 + 10.0 * (n - 40) as f64))
            .collect();

        // h4 = 1.5 … h17 = 2.8
        let tolerances = (4..=17)
            .map(|n| (format!("h{n}"), 1.5 + 0.1 * (n - 4) as f64))
            .collect();

        Self {
            materials,
            bores: round_costs(bores),
            coatings: round_costs(coatings),
            hardening: round_costs(hardening),
            tolerances: round_costs(tolerances),
            base_prices: BTreeMap::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CostTableError> {
        let table: CostTable = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, CostTableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), CostTableError> {
        match self.materials.iter().find(|m| !m.is_valid()) {
            Some(m) => Err(CostTableError::InvalidMaterial(m.name.clone())),
            None => Ok(()),
        }
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    /// Looks a material up by name, falling back to its base material.
    pub fn material(&self, name: &str) -> Option<&Material> {
        let base = base_material(name, self.material_names())?;
        self.materials.iter().find(|m| m.name == base)
    }

    pub fn density_of(&self, material: &str) -> f64 {
        self.material(material)
            .map(|m| m.density)
            .unwrap_or(DEFAULT_DENSITY_G_CM3)
    }

    pub fn base_price(&self, product_group: &str) -> f64 {
        self.base_prices.get(product_group).copied().unwrap_or(0.0)
    }

    /// Cost of one option value. "none", empty and unknown values cost 0.
    pub fn cost_of(&self, axis: CostAxis, value: &str) -> f64 {
        if !is_selected(value) {
            return 0.0;
        }
        let value = value.trim();
        let cost = match axis {
            CostAxis::Material => self.material(value).map(|m| m.cost_per_gram),
            CostAxis::Bore => self.bores.get(value).copied(),
            CostAxis::Coating => self.coatings.get(value).copied(),
            CostAxis::Hardening => self.hardening.get(value).copied(),
            CostAxis::Tolerance => self.tolerances.get(value).copied(),
        };
        cost.filter(|c| c.is_finite()).unwrap_or(0.0)
    }
}

fn round_costs(costs: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    costs
        .into_iter()
        .map(|(k, v)| (k, crate::utils::price::round_currency(v)))
        .collect()
}

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use typeshare::typeshare;

use super::{
    configuration::{ConfigField, Configuration},
    material::base_material,
    product_family::ProductFamily,
};
use crate::{
    NONE_OPTION, is_selected,
    utils::lenient::{de_f64_list, de_string_list, de_u32_list},
};

/// Legal values of every configurable field for one product family.
#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct OptionSet {
    #[serde(default, deserialize_with = "de_string_list")]
    pub norms: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub materials: Vec<String>,
    /// mm, shared by width, height and depth
    #[serde(default, deserialize_with = "de_f64_list")]
    pub dimensions: Vec<f64>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub bores: Vec<String>,
    #[serde(default, deserialize_with = "de_u32_list")]
    pub number_of_bores: Vec<u32>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub coatings: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub hardening: Vec<String>,
    #[serde(rename = "TolerancesBreite", default, deserialize_with = "de_string_list")]
    pub tolerances_width: Vec<String>,
    #[serde(rename = "TolerancesHohe", default, deserialize_with = "de_string_list")]
    pub tolerances_height: Vec<String>,
}

/// The config service's naming of the same contract.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOptionSet {
    #[serde(default, deserialize_with = "de_string_list")]
    pub standards: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub materials: Vec<String>,
    #[serde(default, deserialize_with = "de_f64_list")]
    pub widths: Vec<f64>,
    #[serde(default, deserialize_with = "de_f64_list")]
    pub heights: Vec<f64>,
    #[serde(default, deserialize_with = "de_f64_list")]
    pub depths: Vec<f64>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub bores: Vec<String>,
    #[serde(default, deserialize_with = "de_u32_list")]
    pub num_bores: Vec<u32>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub coatings: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub hardening: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub tolerances: Vec<String>,
}

impl From<RemoteOptionSet> for OptionSet {
    fn from(remote: RemoteOptionSet) -> Self {
        let mut dimensions: Vec<f64> = remote
            .widths
            .into_iter()
            .chain(remote.heights)
            .chain(remote.depths)
            .collect();
        dimensions.sort_by(f64::total_cmp);
        dimensions.dedup();

        Self {
            norms: remote.standards,
            materials: remote.materials,
            dimensions,
            bores: remote.bores,
            number_of_bores: remote.num_bores,
            coatings: remote.coatings,
            hardening: remote.hardening,
            tolerances_width: remote.tolerances.clone(),
            tolerances_height: remote.tolerances,
        }
    }
}

const CANONICAL_KEYS: [&str; 9] = [
    "Norms",
    "Materials",
    "Dimensions",
    "Bores",
    "NumberOfBores",
    "Coatings",
    "Hardening",
    "TolerancesBreite",
    "TolerancesHohe",
];

#[derive(Debug, Clone, PartialEq)]
pub struct OptionViolation {
    pub field: ConfigField,
    pub value: String,
}

impl OptionSet {
    /// Accepts either naming scheme.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let canonical = value
            .as_object()
            .map(|obj| CANONICAL_KEYS.iter().any(|k| obj.contains_key(*k)))
            .unwrap_or(false);

        if canonical {
            serde_json::from_value(value)
        } else {
            serde_json::from_value::<RemoteOptionSet>(value).map(OptionSet::from)
        }
    }

    pub fn builtin(family: ProductFamily) -> Self {
        let hardening = numbered("HRC ", 40..=58);
        let number_of_bores: Vec<u32> = (1..=10).collect();

        match family {
            ProductFamily::Keyway => {
                let mut tolerances = numbered("h", 4..=17);
                tolerances.push(NONE_OPTION.to_string());
                Self {
                    norms: strings(&["DIN 6885", "Keine Norm"]),
                    materials: strings(&["C45", "Edelstahl", "Aluminium"]),
                    dimensions: (4..=18).map(f64::from).collect(),
                    bores: numbered("M", 1..=12),
                    number_of_bores,
                    coatings: numbered("Typ ", 1..=12),
                    hardening,
                    tolerances_width: tolerances.clone(),
                    tolerances_height: tolerances,
                }
            }
            ProductFamily::DiscSpring => {
                let mut tolerances = numbered("h", 13..=17);
                tolerances.push(NONE_OPTION.to_string());
                Self {
                    norms: strings(&["DIN 6888", "Keine Norm"]),
                    materials: strings(&["Aluminium"]),
                    dimensions: [4, 5, 6, 7, 16, 17, 18, 19, 20, 21]
                        .into_iter()
                        .map(f64::from)
                        .collect(),
                    bores: numbered("M", 1..=2),
                    number_of_bores,
                    coatings: numbered("Typ ", 1..=12),
                    hardening,
                    tolerances_width: tolerances.clone(),
                    tolerances_height: tolerances,
                }
            }
            ProductFamily::TSlotNut => {
                let mut tolerances = numbered("h", 13..=17);
                tolerances.push(NONE_OPTION.to_string());
                let mut coatings = numbered("Typ ", 1..=6);
                coatings.extend(numbered("Typ ", 13..=17));
                Self {
                    norms: strings(&["Keine Norm"]),
                    materials: strings(&["Aluminium", "Messing"]),
                    dimensions: [3, 4, 5, 6, 7, 16, 17, 18, 22, 23, 24, 25, 26, 27, 28, 29]
                        .into_iter()
                        .map(f64::from)
                        .collect(),
                    bores: numbered("M", 13..=21),
                    number_of_bores,
                    coatings,
                    hardening,
                    tolerances_width: tolerances.clone(),
                    tolerances_height: tolerances,
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
            && self.materials.is_empty()
            && self.dimensions.is_empty()
            && self.bores.is_empty()
            && self.coatings.is_empty()
            && self.hardening.is_empty()
            && self.tolerances_width.is_empty()
            && self.tolerances_height.is_empty()
    }

    /// Whether `value` is legal for `field`. An empty list does not constrain
    /// its field, and "none" is always legal for the optional treatments.
    pub fn allows(&self, field: ConfigField, value: &str) -> bool {
        let listed = |list: &[String]| list.is_empty() || list.iter().any(|v| v == value.trim());
        let optional = |list: &[String]| !is_selected(value) || listed(list);
        let dimension = || match crate::utils::lenient::parse_f64(value) {
            Some(v) => {
                self.dimensions.is_empty()
                    || self.dimensions.iter().any(|d| (d - v).abs() < 1e-9)
            }
            None => false,
        };

        match field {
            ConfigField::ProductGroup | ConfigField::Quantity => true,
            ConfigField::DinNorm => listed(&self.norms),
            ConfigField::Material => {
                listed(&self.materials)
                    || base_material(value, self.materials.iter().map(String::as_str)).is_some()
            }
            ConfigField::Width | ConfigField::Height | ConfigField::Depth => dimension(),
            ConfigField::Bore => optional(&self.bores),
            ConfigField::NumberOfBores => match crate::utils::lenient::parse_u32(value) {
                Some(0) => true,
                Some(n) => self.number_of_bores.is_empty() || self.number_of_bores.contains(&n),
                None => false,
            },
            ConfigField::Coating => optional(&self.coatings),
            ConfigField::Hardening => optional(&self.hardening),
            ConfigField::ToleranceWidth => optional(&self.tolerances_width),
            ConfigField::ToleranceHeight => optional(&self.tolerances_height),
        }
    }

    pub fn violations(&self, config: &Configuration) -> Vec<OptionViolation> {
        ConfigField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = config.get_field(field);
                (!self.allows(field, &value)).then_some(OptionViolation { field, value })
            })
            .collect()
    }

    /// Fills empty norm, material and zero dimensions with the first legal
    /// value. Returns the fields that were defaulted.
    pub fn apply_defaults(&self, config: &mut Configuration) -> Vec<ConfigField> {
        let mut defaulted = Vec::new();

        if config.din_norm.trim().is_empty() {
            if let Some(norm) = self.norms.first() {
                config.din_norm = norm.clone();
                defaulted.push(ConfigField::DinNorm);
            }
        }

        if config.material.trim().is_empty() {
            if let Some(material) = self.materials.first() {
                config.material = material.clone();
                defaulted.push(ConfigField::Material);
            }
        }

        if let Some(first) = self.dimensions.first().copied() {
            for (field, target) in [
                (ConfigField::Width, &mut config.width),
                (ConfigField::Height, &mut config.height),
                (ConfigField::Depth, &mut config.depth),
            ] {
                if *target <= 0.0 {
                    *target = first;
                    defaulted.push(field);
                }
            }
        }

        defaulted
    }

    /// Applies defaults and logs every value outside the legal set. Nothing
    /// is rejected; unknown options simply price at 0.
    pub fn resolve(&self, config: &mut Configuration) -> Vec<OptionViolation> {
        self.apply_defaults(config);
        let violations = self.violations(config);
        for v in &violations {
            warn!(
                "{} value {:?} is not offered for {:?}",
                v.field, v.value, config.product_group
            );
        }
        violations
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn numbered(prefix: &str, range: RangeInclusive<u32>) -> Vec<String> {
    range.map(|n| format!("{prefix}{n}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_sets_match_catalogue() {
        let keyway = OptionSet::builtin(ProductFamily::Keyway);
        assert_eq!(keyway.dimensions.first(), Some(&4.0));
        assert_eq!(keyway.dimensions.last(), Some(&18.0));
        assert_eq!(keyway.bores.len(), 12);
        assert_eq!(keyway.hardening.len(), 19);
        assert_eq!(keyway.number_of_bores, (1..=10).collect::<Vec<_>>());
        assert!(keyway.tolerances_width.contains(&"none".to_string()));

        let nut = OptionSet::builtin(ProductFamily::TSlotNut);
        assert_eq!(nut.norms, vec!["Keine Norm"]);
        assert!(nut.coatings.contains(&"Typ 13".to_string()));
        assert!(!nut.coatings.contains(&"Typ 7".to_string()));
    }

    #[test]
    fn accepts_both_naming_schemes() {
        let canonical = OptionSet::from_value(json!({
            "Norms": ["DIN 6885"],
            "Materials": ["C45"],
            "Dimensions": [4, 5],
            "NumberOfBores": ["1", "2"],
            "TolerancesBreite": ["h9"],
            "TolerancesHohe": ["h9"]
        }))
        .unwrap();

        let remote = OptionSet::from_value(json!({
            "standards": ["DIN 6885"],
            "materials": ["C45"],
            "widths": ["5"],
            "heights": [4],
            "depths": [5],
            "numBores": [1, 2],
            "tolerances": ["h9"]
        }))
        .unwrap();

        assert_eq!(canonical, remote);
        assert_eq!(remote.dimensions, vec![4.0, 5.0]);
    }

    #[test]
    fn none_is_always_legal_for_treatments() {
        let set = OptionSet::builtin(ProductFamily::DiscSpring);
        assert!(set.allows(ConfigField::Bore, "none"));
        assert!(set.allows(ConfigField::Bore, "M2"));
        assert!(!set.allows(ConfigField::Bore, "M3"));
        assert!(set.allows(ConfigField::NumberOfBores, "0"));
        assert!(!set.allows(ConfigField::NumberOfBores, "11"));
        assert!(!set.allows(ConfigField::Width, "8"));
    }

    #[test]
    fn resolves_defaults_and_reports_violations() {
        let set = OptionSet::builtin(ProductFamily::Keyway);
        let mut config = Configuration {
            product_group: "Passfeder (Keyway)".into(),
            material: "C45K".into(),
            width: 6.0,
            coating: "Typ 17".into(),
            ..Default::default()
        };

        let violations = set.resolve(&mut config);

        assert_eq!(config.din_norm, "DIN 6885");
        assert_eq!((config.width, config.height, config.depth), (6.0, 4.0, 4.0));
        assert_eq!(
            violations,
            vec![OptionViolation {
                field: ConfigField::Coating,
                value: "Typ 17".into()
            }]
        );
    }

    #[test]
    fn empty_set_constrains_nothing() {
        let set = OptionSet::default();
        assert!(set.is_empty());
        let config = Configuration {
            material: "Titan".into(),
            width: 99.0,
            bore: "M40".into(),
            ..Default::default()
        };
        assert!(set.violations(&config).is_empty());
    }
}

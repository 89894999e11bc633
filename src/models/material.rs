use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Density of generic steel, used when a material is unknown.
pub const DEFAULT_DENSITY_G_CM3: f64 = 7.85;

#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// g/cm³
    pub density: f64,
    pub cost_per_gram: f64,
}

impl Material {
    pub fn new(name: &str, density: f64, cost_per_gram: f64) -> Self {
        Self {
            name: name.to_string(),
            density,
            cost_per_gram,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.density > 0.0 && self.density.is_finite() && self.cost_per_gram >= 0.0
    }
}

/// Reduces a supplier-qualified material name ("C45K", "C45K-variant",
/// "1.0503 C45") to a known base material.
///
/// An exact match wins. Otherwise the longest known name that prefixes the
/// input is used, then the longest known name contained anywhere in it.
pub fn base_material<'a, I>(name: &str, known: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let known: Vec<&'a str> = known.into_iter().collect();

    if let Some(exact) = known.iter().find(|k| **k == name) {
        return Some(*exact);
    }

    let longest = |candidates: Vec<&'a str>| candidates.into_iter().max_by_key(|k| k.len());

    longest(
        known
            .iter()
            .copied()
            .filter(|k| !k.is_empty() && name.starts_with(k))
            .collect(),
    )
    .or_else(|| {
        longest(
            known
                .iter()
                .copied()
                .filter(|k| !k.is_empty() && name.contains(k))
                .collect(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [&str; 5] = ["C45", "C60", "Edelstahl", "Aluminium", "Messing"];

    #[test]
    fn exact_names_resolve_to_themselves() {
        assert_eq!(base_material("C60", KNOWN), Some("C60"));
        assert_eq!(base_material(" Messing ", KNOWN), Some("Messing"));
    }

    #[test]
    fn qualified_names_reduce_to_base() {
        assert_eq!(base_material("C45K", KNOWN), Some("C45"));
        assert_eq!(base_material("C45K-variant", KNOWN), Some("C45"));
        assert_eq!(base_material("1.0503 C45", KNOWN), Some("C45"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(base_material("S235", KNOWN), None);
        assert_eq!(base_material("", KNOWN), None);
    }

    #[test]
    fn prefers_longest_prefix() {
        let known = ["C4", "C45"];
        assert_eq!(base_material("C45K", known), Some("C45"));
    }
}

use crate::{
    models::cost_table::CostTable,
    utils::unit::{round_places, volume_cm3},
};

/// Weight in grams of a `width × height × depth` mm block of the given
/// density, rounded to 3 decimals. Any missing dimension yields 0.
pub fn calculate_weight(width: f64, height: f64, depth: f64, density: f64) -> f64 {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(width) || !usable(height) || !usable(depth) || !usable(density) {
        return 0.0;
    }
    round_places(volume_cm3(width, height, depth) * density, 3)
}

/// Resolves the density through the table (exact name, base material, then
/// generic steel) before calculating.
pub fn calculate_material_weight(
    width: f64,
    height: f64,
    depth: f64,
    material: &str,
    table: &CostTable,
) -> f64 {
    calculate_weight(width, height, depth, table.density_of(material))
}

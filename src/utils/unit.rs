use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LengthUnitError {
    #[error("Invalid length unit: {0}")]
    InvalidUnit(String),
}

#[derive(Debug, Error)]
pub enum MassUnitError {
    #[error("Invalid mass unit: {0}")]
    InvalidUnit(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
}

impl LengthUnit {
    pub fn to_millimeters(&self) -> f64 {
        match self {
            LengthUnit::Mm => 1.0,
            LengthUnit::Cm => 10.0,
            LengthUnit::M => 1000.0,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit_str = match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::M => "m",
        };
        write!(f, "{unit_str}")
    }
}

impl FromStr for LengthUnit {
    type Err = LengthUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mm" => Ok(LengthUnit::Mm),
            "cm" => Ok(LengthUnit::Cm),
            "m" => Ok(LengthUnit::M),
            other => Err(LengthUnitError::InvalidUnit(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    #[default]
    G,
    Kg,
}

impl MassUnit {
    pub fn to_grams(&self) -> f64 {
        match self {
            MassUnit::G => 1.0,
            MassUnit::Kg => 1000.0,
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit_str = match self {
            MassUnit::G => "g",
            MassUnit::Kg => "kg",
        };
        write!(f, "{unit_str}")
    }
}

impl FromStr for MassUnit {
    type Err = MassUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(MassUnit::G),
            "kg" => Ok(MassUnit::Kg),
            other => Err(MassUnitError::InvalidUnit(other.to_string())),
        }
    }
}

pub fn convert_length(amount: f64, from_unit: &LengthUnit, to_unit: &LengthUnit) -> f64 {
    let amount_mm = amount * from_unit.to_millimeters();
    amount_mm / to_unit.to_millimeters()
}

pub fn convert_mass(amount: f64, from_unit: &MassUnit, to_unit: &MassUnit) -> f64 {
    let amount_g = amount * from_unit.to_grams();
    amount_g / to_unit.to_grams()
}

/// Volume in cubic centimeters of a block measured in millimeters.
pub fn volume_cm3(width_mm: f64, height_mm: f64, depth_mm: f64) -> f64 {
    let cm = |v: f64| convert_length(v, &LengthUnit::Mm, &LengthUnit::Cm);
    cm(width_mm) * cm(height_mm) * cm(depth_mm)
}

pub fn round_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_matches_cubic_millimeter_form() {
        let a = round_places(volume_cm3(60.0, 40.0, 100.0), 3);
        let b = round_places(60.0 * 40.0 * 100.0 / 1000.0, 3);
        assert_eq!(a, b);
        assert_eq!(a, 240.0);
    }

    #[test]
    fn parses_and_converts_units() {
        let unit: LengthUnit = "cm".parse().unwrap();
        assert_eq!(convert_length(2.5, &unit, &LengthUnit::Mm), 25.0);
        assert!("inch".parse::<LengthUnit>().is_err());
        assert_eq!(convert_mass(1884.0, &MassUnit::G, &MassUnit::Kg), 1.884);
    }

    #[test]
    fn rounds_to_requested_places() {
        assert_eq!(round_places(2.826, 2), 2.83);
        assert_eq!(round_places(1.88351, 3), 1.884);
        assert_eq!(round_places(-2.345, 1), -2.3);
    }
}

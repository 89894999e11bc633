use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProductFamilyError {
    #[error("Unknown product group: {0}")]
    Unknown(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub enum ProductFamily {
    Keyway,
    DiscSpring,
    TSlotNut,
}

impl ProductFamily {
    pub const ALL: [ProductFamily; 3] = [
        ProductFamily::Keyway,
        ProductFamily::DiscSpring,
        ProductFamily::TSlotNut,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ProductFamily::Keyway => "Passfeder (Keyway)",
            ProductFamily::DiscSpring => "Scheibenfeder (Disc Spring)",
            ProductFamily::TSlotNut => "Nutenstein (T-Slot Nut)",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            ProductFamily::Keyway => &["keyway", "passfeder"],
            ProductFamily::DiscSpring => &["disc-spring", "disc spring", "scheibenfeder"],
            ProductFamily::TSlotNut => &["t-slot-nut", "t-slot nut", "nutenstein"],
        }
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ProductFamily {
    type Err = ProductFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| {
                family.display_name().to_lowercase() == needle
                    || family.aliases().contains(&needle.as_str())
            })
            .ok_or_else(|| ProductFamilyError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for ProductFamily {
    type Error = ProductFamilyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductFamily> for String {
    fn from(family: ProductFamily) -> Self {
        family.display_name().to_string()
    }
}

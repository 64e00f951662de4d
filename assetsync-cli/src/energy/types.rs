//! Energy categories and the aggregate flags written onto ancestors

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Asset id to energy category
pub type EnergyMap = BTreeMap<String, EnergyType>;

/// Child asset id to parent asset id
pub type ParentMap = BTreeMap<String, String>;

/// Recognized energy category of a leaf asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Electricity,
    Gas,
    Water,
    Thermal,
    /// Any value that matches no known category; propagates but sets no flag
    Other,
}

impl EnergyType {
    pub const ALL: [EnergyType; 5] = [
        EnergyType::Electricity,
        EnergyType::Gas,
        EnergyType::Water,
        EnergyType::Thermal,
        EnergyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyType::Electricity => "electricity",
            EnergyType::Gas => "gas",
            EnergyType::Water => "water",
            EnergyType::Thermal => "thermal",
            EnergyType::Other => "other",
        }
    }

    /// Lenient classification of a free-text cell; `None` for blank input
    pub fn normalize(raw: &str) -> Option<Self> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return None;
        }

        let kind = if value.contains("elec") || value.contains("élec") {
            EnergyType::Electricity
        } else if value.contains("gaz") || value.contains("gas") {
            EnergyType::Gas
        } else if value.contains("eau") || value.contains("water") {
            EnergyType::Water
        } else if value.contains("therm") || value.contains("chaleur") || value.contains("heat") {
            EnergyType::Thermal
        } else {
            EnergyType::Other
        };
        Some(kind)
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnergyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnergyType::normalize(s).ok_or_else(|| anyhow::anyhow!("Empty energy type"))
    }
}

/// Presence flags for an ancestor; absent fields are not written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_electricity: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_gas: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_water: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_thermal: Option<bool>,
}

impl EnergyFlags {
    /// One `true` flag per recognized type in `types`
    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a EnergyType>) -> Self {
        let mut flags = Self::default();
        for kind in types {
            flags.set(*kind);
        }
        flags
    }

    pub fn set(&mut self, kind: EnergyType) {
        match kind {
            EnergyType::Electricity => self.is_electricity = Some(true),
            EnergyType::Gas => self.is_gas = Some(true),
            EnergyType::Water => self.is_water = Some(true),
            EnergyType::Thermal => self.is_thermal = Some(true),
            EnergyType::Other => {}
        }
    }

    /// Types whose flag is set
    pub fn types(&self) -> BTreeSet<EnergyType> {
        let mut types = BTreeSet::new();
        let pairs = [
            (self.is_electricity, EnergyType::Electricity),
            (self.is_gas, EnergyType::Gas),
            (self.is_water, EnergyType::Water),
            (self.is_thermal, EnergyType::Thermal),
        ];
        for (flag, kind) in pairs {
            if flag == Some(true) {
                types.insert(kind);
            }
        }
        types
    }

    pub fn is_empty(&self) -> bool {
        self.is_electricity.is_none()
            && self.is_gas.is_none()
            && self.is_water.is_none()
            && self.is_thermal.is_none()
    }
}

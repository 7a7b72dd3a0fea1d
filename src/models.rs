//! Data models for Satisfactory items, buildings and recipes.

use std::fmt;

use serde::Serialize;

/// Building role, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildingCategory {
    Production,
    Generator,
    Extractor,
}

impl fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BuildingCategory::Production => "PRODUCTION",
            BuildingCategory::Generator => "GENERATOR",
            BuildingCategory::Extractor => "EXTRACTOR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Fluids are tracked in milliliters rather than discrete units.
    pub is_fluid: bool,
    pub points: f64,
    pub raw_resource: bool,
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub name: String,
    /// Positive draws power, negative generates it.
    pub power: f64,
    pub power_exponent: f64,
    pub description: String,
    pub category: BuildingCategory,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub item: String,
    /// Flow rate per minute: units for solids, liters for fluids.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub alternate: bool,
    /// Class name of the building this recipe runs in, if one resolved.
    pub building: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub product: Vec<RecipeIngredient>,
}

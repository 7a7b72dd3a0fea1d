//! Derives the item, building and recipe collections from a parsed dump.
//!
//! All lookups run against read-only tables built up front; records that
//! fail to parse or reference unknown classes are omitted and counted,
//! never defaulted.

use std::collections::{HashMap, HashSet};
use std::fmt;

use anyhow::{Context, Result};

use crate::docs::{ClassRecord, DocsFile};
use crate::models::{Building, BuildingCategory, Item, Recipe, RecipeIngredient};
use crate::parse::{self, StructureError, Token};

/// Class groups describing items.
const ITEM_CLASSES: &[&str] = &[
    "ItemDescriptor",
    "ConsumableDescriptor",
    "ItemDescriptorBiomass",
    "AmmoTypeProjectile",
    "AmmoTypeSpreadshot",
    "AmmoTypeInstantHit",
    "ItemDescriptorNuclearFuel",
    "EquipmentDescriptor",
];

const RESOURCE_CLASSES: &[&str] = &["ResourceDescriptor"];

const MANUFACTURER_CLASSES: &[&str] =
    &["BuildableManufacturer", "BuildableManufacturerVariablePower"];

const GENERATOR_CLASSES: &[&str] = &["BuildableGeneratorFuel", "BuildableGeneratorNuclear"];

const EXTRACTOR_CLASSES: &[&str] = &[
    "BuildableResourceExtractor",
    "BuildableWaterPump",
    "BuildableFrackingExtractor",
    "BuildableFrackingActivator",
];

/// Fluid amounts are recorded in milliliters; 1000 to the liter.
const FLUID_DIVISOR: f64 = 1000.0;

/// Convert a raw per-cycle amount into a per-minute flow rate.
pub fn per_minute_rate(raw_amount: f64, is_fluid: bool, cycle_duration_s: f64) -> f64 {
    let divisor = if is_fluid { FLUID_DIVISOR } else { 1.0 };
    (raw_amount / divisor) * (60.0 / cycle_duration_s)
}

/// Everything derived from one dump: the building table, the items
/// referenced by at least one valid recipe, and the valid recipes.
#[derive(Debug)]
pub struct ExtractedData {
    pub items: Vec<Item>,
    pub buildings: Vec<Building>,
    pub recipes: Vec<Recipe>,
    pub stats: ExtractStats,
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub buildings: usize,
    pub items: usize,
    pub recipes: usize,
    pub generator_recipes: usize,
    pub invalid_recipes: usize,
    pub dropped_ingredients: usize,
    pub skipped_fuels: usize,
    pub skipped_records: usize,
    pub errors: usize,
}

impl fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extracted {} buildings, {} items, {} recipes ({} generated). \
             Dropped: {} recipes without a known building, {} unknown ingredients, \
             {} fuel entries. Skipped records: {}, errors: {}",
            self.buildings,
            self.items,
            self.recipes,
            self.generator_recipes,
            self.invalid_recipes,
            self.dropped_ingredients,
            self.skipped_fuels,
            self.skipped_records,
            self.errors
        )
    }
}

/// Run the full derivation over a parsed dump.
pub fn extract_all(docs: &DocsFile) -> ExtractedData {
    let mut stats = ExtractStats::default();

    let all_items = collect_items(docs, &mut stats);
    let buildings = collect_buildings(docs, &mut stats);

    let item_index = index_items(&all_items);
    let building_index: HashMap<&str, &Building> = {
        let mut index = HashMap::new();
        for building in &buildings {
            index.entry(building.id.as_str()).or_insert(building);
        }
        index
    };

    let mut recipes = Vec::new();
    for record in docs.group("Recipe") {
        match recipe_from_record(record, &item_index, &building_index, &mut stats) {
            Ok(Some(recipe)) => recipes.push(recipe),
            Ok(None) => {}
            Err(e) => {
                eprintln!("  Error parsing recipe: {e:#}");
                stats.errors += 1;
            }
        }
    }

    let generated = generator_recipes(docs, &item_index, &mut stats);
    stats.generator_recipes = generated.len();
    recipes.extend(generated);

    // Keep only recipes that run in a known production building. This drops
    // Build Gun and Customizer entries among others.
    let total = recipes.len();
    recipes.retain(|recipe| {
        recipe
            .building
            .as_deref()
            .is_some_and(|id| building_index.contains_key(id))
    });
    stats.invalid_recipes = total - recipes.len();
    stats.recipes = recipes.len();

    let items = referenced_items(&recipes, &item_index);
    stats.items = items.len();
    stats.buildings = buildings.len();

    ExtractedData {
        items,
        buildings,
        recipes,
        stats,
    }
}

/// Items in group order, with the raw resources appended after.
fn collect_items(docs: &DocsFile, stats: &mut ExtractStats) -> Vec<Item> {
    let mut items = Vec::new();
    for record in docs.matching(ITEM_CLASSES) {
        match item_from_record(record, false) {
            Some(item) => items.push(item),
            None => stats.skipped_records += 1,
        }
    }
    for record in docs.matching(RESOURCE_CLASSES) {
        match item_from_record(record, true) {
            Some(item) => items.push(item),
            None => stats.skipped_records += 1,
        }
    }
    items
}

fn item_from_record(record: &ClassRecord, raw_resource: bool) -> Option<Item> {
    Some(Item {
        id: record.class_name()?.to_string(),
        name: record.str_field("mDisplayName")?.to_string(),
        is_fluid: record.str_field("mStackSize") == Some("SS_FLUID"),
        points: record.f64_field("mResourceSinkPoints")?,
        raw_resource,
        energy: record.f64_field("mEnergyValue")?,
    })
}

fn collect_buildings(docs: &DocsFile, stats: &mut ExtractStats) -> Vec<Building> {
    let mut buildings = Vec::new();
    let kinds = [
        (MANUFACTURER_CLASSES, BuildingCategory::Production),
        (GENERATOR_CLASSES, BuildingCategory::Generator),
        (EXTRACTOR_CLASSES, BuildingCategory::Extractor),
    ];
    for (classes, category) in kinds {
        for record in docs.matching(classes) {
            match building_from_record(record, category) {
                Some(building) => buildings.push(building),
                None => stats.skipped_records += 1,
            }
        }
    }
    buildings
}

fn building_from_record(record: &ClassRecord, category: BuildingCategory) -> Option<Building> {
    // Generators report the power they produce; stored negated so the two
    // kinds share one signed field.
    let power = match category {
        BuildingCategory::Generator => -record.f64_field("mPowerProduction")?,
        _ => record.f64_field("mPowerConsumption")?,
    };
    Some(Building {
        id: record.class_name()?.to_string(),
        name: record.str_field("mDisplayName")?.to_string(),
        power,
        power_exponent: record.f64_field("mPowerConsumptionExponent")?,
        description: record
            .str_field("mDescription")
            .unwrap_or_default()
            .to_string(),
        category,
    })
}

fn index_items<'a>(items: &'a [Item]) -> HashMap<&'a str, &'a Item> {
    let mut index = HashMap::new();
    for item in items {
        // first record wins on duplicate class names
        index.entry(item.id.as_str()).or_insert(item);
    }
    index
}

fn recipe_from_record(
    record: &ClassRecord,
    items: &HashMap<&str, &Item>,
    buildings: &HashMap<&str, &Building>,
    stats: &mut ExtractStats,
) -> Result<Option<Recipe>> {
    let Some(id) = record.class_name() else {
        stats.skipped_records += 1;
        return Ok(None);
    };
    // "mManufactoringDuration" is the dump's own spelling.
    let Some(duration) = record
        .f64_field("mManufactoringDuration")
        .filter(|d| *d > 0.0)
    else {
        stats.skipped_records += 1;
        return Ok(None);
    };

    let building = match record.str_field("mProducedIn") {
        Some(raw) => {
            resolve_building(raw, buildings).with_context(|| format!("mProducedIn of {id}"))?
        }
        None => None,
    };
    let ingredients = ingredient_list(record.str_field("mIngredients"), items, duration, stats)
        .with_context(|| format!("mIngredients of {id}"))?;
    let product = ingredient_list(record.str_field("mProduct"), items, duration, stats)
        .with_context(|| format!("mProduct of {id}"))?;

    Ok(Some(Recipe {
        id: id.to_string(),
        name: record.str_field("mDisplayName").unwrap_or(id).to_string(),
        alternate: id.contains("Alternate"),
        building,
        ingredients,
        product,
    }))
}

/// Resolve a recipe's building from its `mProducedIn` candidate list.
///
/// A recipe can list several producers; the first one present in the
/// known-building table wins and the rest are ignored. That tie-break is
/// deliberate policy, not an accident of iteration order.
fn resolve_building(
    raw: &str,
    buildings: &HashMap<&str, &Building>,
) -> Result<Option<String>, StructureError> {
    let tokens = parse::parse_value(raw)?;
    Ok(tokens
        .iter()
        .filter_map(Token::as_text)
        .filter_map(parse::class_name)
        .find(|candidate| buildings.contains_key(candidate))
        .map(str::to_string))
}

/// Decode an `mIngredients`/`mProduct` value into normalized entries.
///
/// Each entry is a `(ItemClass=...,Amount=n)` group. Entries referencing an
/// item outside the tracked set are dropped and counted, not errors.
fn ingredient_list(
    raw: Option<&str>,
    items: &HashMap<&str, &Item>,
    duration: f64,
    stats: &mut ExtractStats,
) -> Result<Vec<RecipeIngredient>, StructureError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut entries = Vec::new();
    for token in parse::parse_value(raw)? {
        let Some(fields) = token.as_group() else {
            continue;
        };
        let id = fields
            .iter()
            .filter_map(Token::as_text)
            .find_map(parse::class_name);
        let amount = fields
            .iter()
            .filter_map(Token::as_text)
            .find_map(parse::amount);
        let (Some(id), Some(amount)) = (id, amount) else {
            stats.dropped_ingredients += 1;
            continue;
        };
        let Some(item) = items.get(id) else {
            stats.dropped_ingredients += 1;
            continue;
        };
        entries.push(RecipeIngredient {
            item: item.id.clone(),
            amount: per_minute_rate(amount as f64, item.is_fluid, duration),
        });
    }
    Ok(entries)
}

/// Synthesize one power-generation recipe per fuel type per generator.
///
/// These have no source recipe records; the ingredient rates fall out of
/// the generator's rated power output and the fuel's energy density.
fn generator_recipes(
    docs: &DocsFile,
    items: &HashMap<&str, &Item>,
    stats: &mut ExtractStats,
) -> Vec<Recipe> {
    let mut recipes = Vec::new();
    for record in docs.matching(GENERATOR_CLASSES) {
        let Some(building_id) = record.class_name() else {
            stats.skipped_records += 1;
            continue;
        };
        let Some(power) = record.f64_field("mPowerProduction") else {
            stats.skipped_records += 1;
            continue;
        };

        for fuel in record.record_list_field("mFuel") {
            let Some(fuel_class) = fuel.str_field("mFuelClass") else {
                stats.skipped_fuels += 1;
                continue;
            };
            // Fuels outside the tracked item set (raw biomass) are skipped.
            let Some(fuel_item) = items.get(bare_class(fuel_class)) else {
                stats.skipped_fuels += 1;
                continue;
            };
            // a zero energy value would divide the burn rate by zero
            if fuel_item.energy <= 0.0 {
                stats.skipped_fuels += 1;
                continue;
            }

            let fluid_divisor = if fuel_item.is_fluid { FLUID_DIVISOR } else { 1.0 };
            // Fuel burned per minute to sustain the rated output.
            let fuel_amount = power * 60.0 / fuel_item.energy / fluid_divisor;

            let mut ingredients = vec![RecipeIngredient {
                item: fuel_item.id.clone(),
                amount: fuel_amount,
            }];
            let mut product = Vec::new();

            if let Some(supplemental) = fuel.str_field("mSupplementalResourceClass") {
                match (
                    items.get(bare_class(supplemental)),
                    record.f64_field("mSupplementalToPowerRatio"),
                ) {
                    // the game's power-to-coolant ratio
                    (Some(item), Some(ratio)) => ingredients.push(RecipeIngredient {
                        item: item.id.clone(),
                        amount: power * ratio * 3.0 / 50.0,
                    }),
                    _ => stats.dropped_ingredients += 1,
                }
            }

            if let Some(byproduct) = fuel.str_field("mByproduct") {
                match (
                    items.get(bare_class(byproduct)),
                    fuel.f64_field("mByproductAmount"),
                ) {
                    // sized as a ratio of the primary fuel amount
                    (Some(item), Some(ratio)) => product.push(RecipeIngredient {
                        item: item.id.clone(),
                        amount: fuel_amount * ratio,
                    }),
                    _ => stats.dropped_ingredients += 1,
                }
            }

            recipes.push(Recipe {
                id: format!("{building_id}{}", bare_class(fuel_class)),
                // the dump has no per-fuel recipe names
                name: "Generate Power".to_string(),
                alternate: false,
                building: Some(building_id.to_string()),
                ingredients,
                product,
            });
        }
    }
    recipes
}

/// Fuel tables reference items by bare class name, but some dump versions
/// write full object paths there too.
fn bare_class(value: &str) -> &str {
    parse::class_name(value).unwrap_or(value)
}

/// Items referenced by at least one retained recipe, in first-reference
/// order: products before ingredients, per recipe.
fn referenced_items(recipes: &[Recipe], items: &HashMap<&str, &Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut referenced = Vec::new();
    for recipe in recipes {
        for entry in recipe.product.iter().chain(recipe.ingredients.iter()) {
            if seen.insert(entry.item.as_str()) {
                if let Some(item) = items.get(entry.item.as_str()) {
                    referenced.push((*item).clone());
                }
            }
        }
    }
    referenced
}

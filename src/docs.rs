//! Outer envelope of the game's data dump.
//!
//! `Docs.json` is a JSON array of class groups. Each group carries a
//! `NativeClass` tag such as `Class'/Script/FactoryGame.FGItemDescriptor'`
//! and a list of class records whose field values are all string-encoded,
//! numbers included.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::output;

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(rename = "NativeClass")]
    native_class: String,
    #[serde(rename = "Classes")]
    classes: Vec<ClassRecord>,
}

/// One class record: a string-keyed field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassRecord(Map<String, Value>);

impl ClassRecord {
    /// The record's `ClassName` field.
    pub fn class_name(&self) -> Option<&str> {
        self.str_field("ClassName")
    }

    /// A field as a string. The dump uses `""` for absent values, so empty
    /// strings read as absent here too.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self.0.get(name)?.as_str() {
            Some("") | None => None,
            Some(value) => Some(value),
        }
    }

    /// A field as a number, accepting both JSON numbers and the dump's
    /// string-encoded form (`"mPowerConsumption": "4.000000"`).
    pub fn f64_field(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A field holding a nested list of records, such as a generator's
    /// `mFuel` table.
    pub fn record_list_field(&self, name: &str) -> Vec<ClassRecord> {
        match self.0.get(name) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_object().cloned().map(ClassRecord))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A parsed dump, grouped by shortened native-class id, in file order.
#[derive(Debug)]
pub struct DocsFile {
    groups: Vec<(String, Vec<ClassRecord>)>,
}

impl DocsFile {
    /// Load and parse a dump from disk.
    pub fn load(path: &Path) -> Result<DocsFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        DocsFile::from_json(content.trim_start_matches('\u{feff}'))
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse a dump from its JSON text.
    pub fn from_json(content: &str) -> Result<DocsFile> {
        let raw: Vec<RawGroup> = serde_json::from_str(content).context("malformed data dump")?;
        let mut groups = Vec::new();
        for group in raw {
            // Groups whose tag doesn't follow the FG naming scheme carry
            // nothing we extract; leave them out.
            let Some(id) = short_native_id(&group.native_class) else {
                continue;
            };
            groups.push((id.to_string(), group.classes));
        }
        Ok(DocsFile { groups })
    }

    /// Number of recognized class groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterate groups in file order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[ClassRecord])> {
        self.groups
            .iter()
            .map(|(id, records)| (id.as_str(), records.as_slice()))
    }

    /// Records of the group with the given id, or an empty slice.
    pub fn group(&self, id: &str) -> &[ClassRecord] {
        self.groups
            .iter()
            .find(|(group_id, _)| group_id == id)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    /// Records of every group whose id is in `ids`, in file order.
    pub fn matching<'a>(&'a self, ids: &'a [&str]) -> impl Iterator<Item = &'a ClassRecord> + 'a {
        self.groups
            .iter()
            .filter(move |(id, _)| ids.contains(&id.as_str()))
            .flat_map(|(_, records)| records.iter())
    }
}

/// Shorten a `NativeClass` tag to its class id:
/// `Class'/Script/FactoryGame.FGItemDescriptor'` becomes `ItemDescriptor`.
fn short_native_id(native_class: &str) -> Option<&str> {
    let (_, tail) = native_class.rsplit_once('.')?;
    tail.trim_end_matches('\'').strip_prefix("FG")
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    id: &'a str,
    length: usize,
    items: Option<&'a ClassRecord>,
}

/// Write a quick field reference for the dump: every group's id, record
/// count, and first record as an example of the fields it carries.
pub fn write_reference_map(docs: &DocsFile, path: &Path) -> Result<()> {
    let summaries: Vec<GroupSummary> = docs
        .groups()
        .map(|(id, records)| GroupSummary {
            id,
            length: records.len(),
            items: records.first(),
        })
        .collect();
    output::write_json(path, &summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "NativeClass": "Class'/Script/FactoryGame.FGResourceDescriptor'",
            "Classes": [
                {
                    "ClassName": "Desc_Water_C",
                    "mDisplayName": "Water",
                    "mStackSize": "SS_FLUID",
                    "mResourceSinkPoints": "5",
                    "mEnergyValue": "0.000000"
                }
            ]
        },
        {
            "NativeClass": "NotAnFGClass",
            "Classes": []
        }
    ]"#;

    #[test]
    fn shortens_native_class_tags() {
        assert_eq!(
            short_native_id("Class'/Script/FactoryGame.FGItemDescriptor'"),
            Some("ItemDescriptor")
        );
        assert_eq!(short_native_id("NotAnFGClass"), None);
    }

    #[test]
    fn groups_unrecognized_tags_are_ignored() {
        let docs = DocsFile::from_json(SAMPLE).unwrap();
        assert_eq!(docs.group_count(), 1);
        assert_eq!(docs.group("ResourceDescriptor").len(), 1);
        assert!(docs.group("ItemDescriptor").is_empty());
    }

    #[test]
    fn string_encoded_numbers_parse() {
        let docs = DocsFile::from_json(SAMPLE).unwrap();
        let record = &docs.group("ResourceDescriptor")[0];
        assert_eq!(record.class_name(), Some("Desc_Water_C"));
        assert_eq!(record.f64_field("mResourceSinkPoints"), Some(5.0));
        assert_eq!(record.f64_field("mEnergyValue"), Some(0.0));
        assert_eq!(record.f64_field("mMissing"), None);
    }

    #[test]
    fn empty_string_fields_read_as_absent() {
        let docs = DocsFile::from_json(
            r#"[{"NativeClass": "Class'/Script/FactoryGame.FGRecipe'",
                 "Classes": [{"ClassName": "Recipe_A_C", "mProducedIn": ""}]}]"#,
        )
        .unwrap();
        let record = &docs.group("Recipe")[0];
        assert_eq!(record.str_field("mProducedIn"), None);
    }
}

//! JSON emission for the extracted collections.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::extract::ExtractedData;

/// Write a value as tab-indented JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Write the three output collections under `dir`.
pub fn write_collections(data: &ExtractedData, dir: &Path) -> Result<()> {
    write_json(&dir.join("buildings.json"), &data.buildings)?;
    write_json(&dir.join("items.json"), &data.items)?;
    write_json(&dir.join("recipes.json"), &data.recipes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::env;

    #[test]
    fn writes_tab_indented_json() {
        let dir = env::temp_dir().join("satisfactory-extractor-output-test");
        let path = dir.join("nested").join("sample.json");
        let value = json!([{"id": "Desc_OreIron_C", "points": 1}]);

        write_json(&path, &value).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n\t"));
        let round_trip: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(round_trip, value);

        let _ = fs::remove_dir_all(&dir);
    }
}

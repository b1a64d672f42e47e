//! Reference catalog of known entities.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// A known entity and where to find its portrait art.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(alias = "canonicalName")]
    pub canonical_name: String,
    /// Abbreviated name as printed under the portrait; not unique
    #[serde(alias = "shortName")]
    pub short_name: String,
    #[serde(alias = "referencePortraitURL", alias = "referencePortraitUrl")]
    pub reference_portrait_url: String,
    /// Optional glyph shown in text output
    #[serde(default)]
    pub icon: Option<String>,
}

/// The identity attached to a resolved cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub id: String,
    pub canonical_name: String,
    pub short_name: String,
    pub icon: Option<String>,
}

impl From<&CatalogEntry> for EntityRef {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            canonical_name: entry.canonical_name.clone(),
            short_name: entry.short_name.clone(),
            icon: entry.icon.clone(),
        }
    }
}

/// Source of catalog entries.
pub trait CatalogProvider {
    fn list_all(&self) -> Result<Vec<CatalogEntry>>;
}

impl CatalogProvider for Vec<CatalogEntry> {
    fn list_all(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.clone())
    }
}

/// Catalog stored as a JSON array of entries.
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for JsonCatalog {
    fn list_all(&self) -> Result<Vec<CatalogEntry>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog {}", self.path.display()))
    }
}

/// Catalog entries grouped by short name (case-insensitive).
///
/// Entries are kept sorted by id so every lookup is independent of the
/// order the provider returned them in.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    by_short_name: BTreeMap<String, Vec<usize>>,
}

impl CatalogIndex {
    pub fn new(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let mut by_short_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_short_name
                .entry(entry.short_name.to_uppercase())
                .or_default()
                .push(idx);
        }

        Self {
            entries,
            by_short_name,
        }
    }

    pub fn load(provider: &dyn CatalogProvider) -> Result<Self> {
        let entries = provider.list_all()?;
        crate::log(&format!("Catalog: {} entries", entries.len()));
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// All entries printed with this short name.
    pub fn group(&self, short_name: &str) -> Vec<&CatalogEntry> {
        self.by_short_name
            .get(&short_name.to_uppercase())
            .map(|ids| ids.iter().map(|&idx| &self.entries[idx]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(id: &str, short: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            canonical_name: format!("{} ({})", short, id),
            short_name: short.to_string(),
            reference_portrait_url: format!("https://example.invalid/{}.png", id),
            icon: None,
        }
    }

    #[test]
    fn test_group_by_short_name() {
        let index = CatalogIndex::new(vec![
            entry("thor-classic", "THOR"),
            entry("hulk", "HULK"),
            entry("thor-ragnarok", "Thor"),
        ]);
        let ids: Vec<&str> = index.group("thor").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["thor-classic", "thor-ragnarok"]);
        assert_eq!(index.group("HULK").len(), 1);
        assert!(index.group("LOKI").is_empty());
    }

    #[test]
    fn test_group_order_ignores_input_order() {
        let a = CatalogIndex::new(vec![entry("b", "X"), entry("a", "X")]);
        let b = CatalogIndex::new(vec![entry("a", "X"), entry("b", "X")]);
        let ids = |index: &CatalogIndex| -> Vec<String> {
            index.group("X").iter().map(|e| e.id.clone()).collect()
        };
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_json_catalog_accepts_camel_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{ "id": "hulk", "canonicalName": "Hulk", "shortName": "HULK",
                  "referencePortraitURL": "https://example.invalid/hulk.png" }]"#,
        )
        .unwrap();

        let entries = JsonCatalog::new(&path).list_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].short_name, "HULK");
        assert_eq!(entries[0].icon, None);
    }
}

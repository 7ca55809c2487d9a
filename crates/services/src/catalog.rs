//! Content catalog loading.
//!
//! The catalog file describes groups of items, each with an always-visible
//! title/summary and a gated body.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use gate_core::model::{Catalog, ContentGroup, ContentItem, GroupId, ItemId};

use crate::error::CatalogLoadError;

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    id: String,
    title: String,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
    body: String,
}

/// Parse a catalog from raw JSON.
///
/// # Errors
///
/// Returns `CatalogLoadError` for malformed JSON or duplicate item keys.
pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogLoadError> {
    let raw: RawCatalog = serde_json::from_str(raw)?;

    let groups = raw
        .groups
        .into_iter()
        .map(|group| ContentGroup {
            id: GroupId::new(group.id),
            title: group.title,
            items: group
                .items
                .into_iter()
                .map(|item| ContentItem {
                    id: ItemId::new(item.id),
                    title: item.title,
                    summary: item.summary,
                    body: item.body,
                })
                .collect(),
        })
        .collect();

    Ok(Catalog::new(groups)?)
}

/// Load the catalog from a file.
///
/// # Errors
///
/// Returns `CatalogLoadError::Io` when the file cannot be read, otherwise
/// whatever `parse_catalog` reports.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_catalog(&raw)
}

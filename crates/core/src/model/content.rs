use std::collections::HashMap;

use thiserror::Error;

use crate::model::ids::{GroupId, ItemId, ItemKey};

//
// ─── CONTENT TYPES ─────────────────────────────────────────────────────────────
//

/// One unit of gated content. `title` and `summary` are always visible on the
/// item card; `body` is the payload revealed only after unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: ItemId,
    pub title: String,
    pub summary: String,
    pub body: String,
}

/// A grouping of items shown together, e.g. one day of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGroup {
    pub id: GroupId,
    pub title: String,
    pub items: Vec<ContentItem>,
}

/// The full content catalog, loaded once at startup.
///
/// Keeps the group order from the source file and indexes items by their
/// composite key for the unlock flow.
#[derive(Debug, Clone)]
pub struct Catalog {
    groups: Vec<ContentGroup>,
    by_key: HashMap<ItemKey, (usize, usize)>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate item keys.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateItem` if two items resolve to the same
    /// `group:item` key.
    pub fn new(groups: Vec<ContentGroup>) -> Result<Self, CatalogError> {
        let mut by_key = HashMap::new();
        for (group_idx, group) in groups.iter().enumerate() {
            for (item_idx, item) in group.items.iter().enumerate() {
                let key = ItemKey::new(&group.id, &item.id);
                if by_key.insert(key.clone(), (group_idx, item_idx)).is_some() {
                    return Err(CatalogError::DuplicateItem { key });
                }
            }
        }
        Ok(Self { groups, by_key })
    }

    /// Groups in source order.
    #[must_use]
    pub fn groups(&self) -> &[ContentGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&ContentGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    #[must_use]
    pub fn item(&self, key: &ItemKey) -> Option<&ContentItem> {
        let (group_idx, item_idx) = *self.by_key.get(key)?;
        Some(&self.groups[group_idx].items[item_idx])
    }

    /// Total item count across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate content item {key}")]
    DuplicateItem { key: ItemKey },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

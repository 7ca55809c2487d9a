use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for a content group (a screen/tab worth of items).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    /// Creates a new `GroupId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a content item within a group.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new `ItemId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a question in the pool.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Composite key identifying one item across all groups.
///
/// Rendered as `group:item`, which is also how it keys the persisted ledger
/// maps, so the serialized form stays a plain JSON string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(String);

impl ItemKey {
    #[must_use]
    pub fn new(group: &GroupId, item: &ItemId) -> Self {
        Self(format!("{}:{}", group.as_str(), item.as_str()))
    }

    /// Returns the joined `group:item` form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Group half of the key.
    #[must_use]
    pub fn group(&self) -> GroupId {
        match self.0.split_once(':') {
            Some((group, _)) => GroupId::new(group),
            None => GroupId::new(self.0.clone()),
        }
    }

    /// Item half of the key.
    #[must_use]
    pub fn item(&self) -> ItemId {
        match self.0.split_once(':') {
            Some((_, item)) => ItemId::new(item),
            None => ItemId::new(""),
        }
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an `ItemKey` from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseItemKeyError {
    raw: String,
}

impl fmt::Display for ParseItemKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item key must look like group:item, got {:?}", self.raw)
    }
}

impl std::error::Error for ParseItemKeyError {}

impl FromStr for ItemKey {
    type Err = ParseItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((group, item)) if !group.is_empty() && !item.is_empty() => {
                Ok(ItemKey::new(&GroupId::new(group), &ItemId::new(item)))
            }
            _ => Err(ParseItemKeyError { raw: s.to_string() }),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

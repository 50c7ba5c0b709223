//! Category lookup table
//!
//! Categories are a fixed set on the server side. The ids are the ones the
//! backend seeds; they are not contiguous.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// A transaction category known to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Category {
    Food,
    Transport,
    Health,
    Leisure,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 4] = [
        Category::Food,
        Category::Transport,
        Category::Health,
        Category::Leisure,
    ];

    /// Server-side category id
    pub fn id(self) -> i64 {
        match self {
            Category::Food => 1,
            Category::Transport => 51,
            Category::Health => 101,
            Category::Leisure => 151,
        }
    }

    /// Display name, as the server reports it in `categoryName`
    pub fn name(self) -> &'static str {
        match self {
            Category::Food => "Alimentação",
            Category::Transport => "Transporte",
            Category::Health => "Saúde",
            Category::Leisure => "Lazer",
        }
    }

    /// Look up a category by server id
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Parse a category from an id ("51") or a name ("transporte"), ignoring case
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Self::from_id(id)
                .ok_or_else(|| Error::validation(format!("Unknown category id: {}", id)));
        }

        let lower = trimmed.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name().to_lowercase() == lower)
            .ok_or_else(|| Error::validation(format!("Unknown category: {}", trimmed)))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i64> for Category {
    type Error = String;

    fn try_from(id: i64) -> std::result::Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| format!("unknown category id {}", id))
    }
}

impl From<Category> for i64 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

use serde::{Deserialize, Serialize};

use crate::filter::FilterGroup;
use crate::sort::Sort;

/// Relation expansion applied to each result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Populate {
    /// Replace the id stored in `field` with the referenced document.
    Ref {
        field: String,
        collection: String,
        columns: Option<Vec<String>>,
    },
    /// Attach under `field` every document of `collection` whose
    /// `foreign_field` equals this document's `_id`.
    Children {
        field: String,
        collection: String,
        foreign_field: String,
        columns: Option<Vec<String>>,
    },
}

impl Populate {
    pub fn reference(field: &str, collection: &str, columns: &[&str]) -> Self {
        Populate::Ref {
            field: field.to_string(),
            collection: collection.to_string(),
            columns: to_columns(columns),
        }
    }

    pub fn children(field: &str, collection: &str, foreign_field: &str, columns: &[&str]) -> Self {
        Populate::Children {
            field: field.to_string(),
            collection: collection.to_string(),
            foreign_field: foreign_field.to_string(),
            columns: to_columns(columns),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Populate::Ref { field, .. } | Populate::Children { field, .. } => field,
        }
    }
}

fn to_columns(columns: &[&str]) -> Option<Vec<String>> {
    if columns.is_empty() {
        None
    } else {
        Some(columns.iter().map(|c| c.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filter: Option<FilterGroup>,
    #[serde(default)]
    pub sort: Vec<Sort>,
    pub skip: Option<usize>,
    pub take: Option<usize>,
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub populate: Vec<Populate>,
}

impl Query {
    pub fn filtered(filter: FilterGroup) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }
}

use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::operator::Operator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: Bson,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: value.into(),
        }
    }
}

/// Points within `radius` radians of `center` (`[lng, lat]`), measured on
/// the GeoJSON point stored under `field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoWithin {
    pub field: String,
    pub center: [f64; 2],
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
    Condition(Filter),
    GeoWithin(GeoWithin),
    Group(FilterGroup),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub logical: LogicalOp,
    pub children: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn and(children: Vec<FilterNode>) -> Self {
        Self {
            logical: LogicalOp::And,
            children,
        }
    }

    /// A single-condition AND group, the common shape for lookups by a field.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::and(vec![FilterNode::Condition(Filter::eq(field, value))])
    }

    /// Every field name the group touches, including nested groups.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                FilterNode::Condition(f) => out.push(f.field.as_str()),
                FilterNode::GeoWithin(g) => out.push(g.field.as_str()),
                FilterNode::Group(g) => out.extend(g.fields()),
            }
        }
        out
    }
}

use std::cmp::Ordering;

use bson::{Bson, Document};
use camp_query::{Filter, FilterGroup, FilterNode, GeoWithin, LogicalOp, Operator};

use crate::geo;
use crate::path::get_path;
use crate::value::{operand_cmp, operand_eq};

/// Evaluate whether a document matches the given filter group.
///
/// An empty group matches everything.
pub(crate) fn matches(doc: &Document, group: &FilterGroup) -> bool {
    match group.logical {
        LogicalOp::And => group.children.iter().all(|c| node_matches(doc, c)),
        LogicalOp::Or => group.children.is_empty() || group.children.iter().any(|c| node_matches(doc, c)),
    }
}

pub(crate) fn matches_opt(doc: &Document, group: Option<&FilterGroup>) -> bool {
    group.is_none_or(|g| matches(doc, g))
}

fn node_matches(doc: &Document, node: &FilterNode) -> bool {
    match node {
        FilterNode::Condition(filter) => condition_matches(doc, filter),
        FilterNode::GeoWithin(geo) => geo_matches(doc, geo),
        FilterNode::Group(group) => matches(doc, group),
    }
}

fn condition_matches(doc: &Document, filter: &Filter) -> bool {
    let stored = get_path(doc, &filter.field);
    match filter.operator {
        Operator::Eq => eq_matches(stored, &filter.value),
        Operator::In => match &filter.value {
            Bson::Array(candidates) => candidates.iter().any(|c| eq_matches(stored, c)),
            single => eq_matches(stored, single),
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let predicate: fn(Ordering) -> bool = match filter.operator {
                Operator::Gt => |o| o == Ordering::Greater,
                Operator::Gte => |o| o != Ordering::Less,
                Operator::Lt => |o| o == Ordering::Less,
                _ => |o| o != Ordering::Greater,
            };
            match stored {
                Some(Bson::Array(items)) => items
                    .iter()
                    .any(|item| operand_cmp(item, &filter.value).is_some_and(predicate)),
                Some(value) => operand_cmp(value, &filter.value).is_some_and(predicate),
                None => false,
            }
        }
    }
}

fn eq_matches(stored: Option<&Bson>, operand: &Bson) -> bool {
    // eq null matches both missing fields and explicit nulls
    if matches!(operand, Bson::Null) {
        return matches!(stored, None | Some(Bson::Null));
    }
    match stored {
        Some(Bson::Array(items)) => items.iter().any(|item| operand_eq(item, operand)),
        Some(value) => operand_eq(value, operand),
        None => false,
    }
}

fn geo_matches(doc: &Document, geo: &GeoWithin) -> bool {
    geo::point_at(doc, &geo.field)
        .is_some_and(|point| geo::central_angle(geo.center, point) <= geo.radius)
}

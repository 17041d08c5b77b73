use bson::Bson;

use crate::error::TranslateError;
use crate::filter::{Filter, FilterGroup, FilterNode};
use crate::operator::Operator;
use crate::page::PaginationWindow;
use crate::query::{Populate, Query};
use crate::raw::{RawQuery, RawValue};
use crate::sort::Sort;

/// Control keys; never part of the filter.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Sort applied when the request names none.
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// A listing request compiled from its query string.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub filter: Option<FilterGroup>,
    pub columns: Option<Vec<String>>,
    pub sort: Vec<Sort>,
    pub window: PaginationWindow,
}

impl TranslatedQuery {
    /// Reject the query if its filter, sort or projection names any of
    /// `restricted` (or a path below one of them).
    pub fn check_restricted(&self, restricted: &[&str]) -> Result<(), TranslateError> {
        let filter_fields = self.filter.as_ref().map(FilterGroup::fields).unwrap_or_default();
        let sort_fields = self.sort.iter().map(|s| s.field.as_str());
        let columns = self.columns.iter().flatten().map(String::as_str);

        for field in filter_fields.into_iter().chain(sort_fields).chain(columns) {
            let root = field.split('.').next().unwrap_or(field);
            if restricted.contains(&root) {
                return Err(TranslateError::RestrictedField(field.to_string()));
            }
        }
        Ok(())
    }

    /// The store query for the requested page, with the endpoint's relation
    /// expansion attached.
    pub fn page_query(&self, populate: Vec<Populate>) -> Query {
        Query {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            skip: Some(to_usize(self.window.start_index())),
            take: Some(to_usize(self.window.limit)),
            columns: self.columns.clone(),
            populate,
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Compile a raw query into filter, projection, sort and pagination window.
///
/// Every non-reserved key becomes conditions on exactly that field. Inside a
/// nested value, a key equal to an operator token (`gt`, `gte`, `lt`, `lte`,
/// `in`) becomes a comparison; any other key addresses a sub-field
/// (`location[state]=MA` filters `location.state`).
pub fn translate(raw: &RawQuery) -> Result<TranslatedQuery, TranslateError> {
    let mut conditions = Vec::new();
    for (key, value) in raw.iter() {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        check_field_name(key)?;
        walk_field(key, value, &mut conditions)?;
    }
    let filter = (!conditions.is_empty()).then(|| FilterGroup::and(conditions));

    let columns = match list_param(raw, "select")? {
        Some(fields) => {
            let columns: Vec<String> = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            for column in &columns {
                if column.starts_with('-') {
                    return Err(TranslateError::Malformed(format!(
                        "`select` lists fields to include; cannot exclude `{column}`"
                    )));
                }
                check_field_name(column)?;
            }
            (!columns.is_empty()).then_some(columns)
        }
        None => None,
    };

    let mut sort = match list_param(raw, "sort")? {
        Some(spec) => Sort::parse_list(&spec),
        None => Vec::new(),
    };
    for s in &sort {
        check_field_name(&s.field)?;
    }
    if sort.is_empty() {
        sort.push(Sort::desc(DEFAULT_SORT_FIELD));
    }

    let window = PaginationWindow::from_params(
        scalar_param(raw, "page")?.as_deref(),
        scalar_param(raw, "limit")?.as_deref(),
    );

    Ok(TranslatedQuery {
        filter,
        columns,
        sort,
        window,
    })
}

fn walk_field(
    path: &str,
    value: &RawValue,
    out: &mut Vec<FilterNode>,
) -> Result<(), TranslateError> {
    match value {
        RawValue::Str(s) => out.push(condition(path, Operator::Eq, Bson::String(s.clone()))),
        RawValue::List(items) => out.push(condition(path, Operator::In, string_array(items))),
        RawValue::Map(entries) => {
            if entries.is_empty() {
                return Err(TranslateError::Malformed(format!("`{path}` has no value")));
            }
            for (key, nested) in entries {
                match Operator::from_token(key) {
                    Some(op) => out.push(operator_condition(path, key, op, nested)?),
                    None => {
                        check_field_name(key)?;
                        walk_field(&format!("{path}.{key}"), nested, out)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn operator_condition(
    field: &str,
    token: &str,
    op: Operator,
    value: &RawValue,
) -> Result<FilterNode, TranslateError> {
    let operand = match (op, value) {
        (Operator::In, RawValue::Str(s)) => {
            let items: Vec<String> = s.split(',').map(|v| v.trim().to_string()).collect();
            string_array(&items)
        }
        (Operator::In, RawValue::List(items)) => string_array(items),
        (_, RawValue::Str(s)) => Bson::String(s.clone()),
        (_, RawValue::List(_)) => {
            return Err(TranslateError::Malformed(format!(
                "operator `{token}` on `{field}` takes a single value"
            )));
        }
        (_, RawValue::Map(_)) => {
            return Err(TranslateError::Malformed(format!(
                "operator `{token}` on `{field}` cannot take a nested value"
            )));
        }
    };
    Ok(condition(field, op, operand))
}

fn condition(field: &str, operator: Operator, value: Bson) -> FilterNode {
    FilterNode::Condition(Filter {
        field: field.to_string(),
        operator,
        value,
    })
}

fn string_array(items: &[String]) -> Bson {
    Bson::Array(items.iter().cloned().map(Bson::String).collect())
}

fn check_field_name(name: &str) -> Result<(), TranslateError> {
    if name.is_empty() || name.split('.').any(|s| s.is_empty()) {
        return Err(TranslateError::Malformed(format!("invalid field name `{name}`")));
    }
    if name.starts_with('$') {
        return Err(TranslateError::Malformed(format!(
            "field name `{name}` cannot start with `$`"
        )));
    }
    Ok(())
}

/// `select`/`sort`: one value, or repeated values joined as a list.
fn list_param(raw: &RawQuery, key: &str) -> Result<Option<String>, TranslateError> {
    match raw.get(key) {
        None => Ok(None),
        Some(RawValue::Str(s)) => Ok(Some(s.clone())),
        Some(RawValue::List(items)) => Ok(Some(items.join(","))),
        Some(RawValue::Map(_)) => Err(TranslateError::Malformed(format!(
            "`{key}` cannot take nested keys"
        ))),
    }
}

/// `page`/`limit`: exactly one value.
fn scalar_param(raw: &RawQuery, key: &str) -> Result<Option<String>, TranslateError> {
    match raw.get(key) {
        None => Ok(None),
        Some(RawValue::Str(s)) => Ok(Some(s.clone())),
        Some(_) => Err(TranslateError::Malformed(format!("`{key}` must be a single value"))),
    }
}

use std::collections::BTreeMap;

use crate::error::TranslateError;

/// Deepest bracket nesting accepted in a query-string key (`a[b][c]...`).
pub const MAX_KEY_DEPTH: usize = 5;

/// One value of a parsed query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Str(String),
    List(Vec<String>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn str(value: impl Into<String>) -> Self {
        RawValue::Str(value.into())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, RawValue)>) -> Self {
        RawValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A query string parsed into a key/value tree.
///
/// `price[gt]=10&careers=Business&careers=Other` becomes
/// `{price: {gt: "10"}, careers: ["Business", "Other"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    entries: BTreeMap<String, RawValue>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (without
    /// the leading `?`).
    pub fn parse(query: &str) -> Result<Self, TranslateError> {
        let mut raw = RawQuery::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            let path = split_key(&key)?;
            raw.insert_path(&path, value.into_owned())?;
        }
        Ok(raw)
    }

    pub fn with(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.entries.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.entries.iter()
    }

    fn insert_path(&mut self, path: &[&str], value: String) -> Result<(), TranslateError> {
        insert_into(&mut self.entries, path, value)
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawQuery {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Split `a[b][c]` into `["a", "b", "c"]`. A trailing `[]` is kept as an
/// empty segment meaning "append to list".
fn split_key(key: &str) -> Result<Vec<&str>, TranslateError> {
    let Some(open) = key.find('[') else {
        return Ok(vec![key]);
    };

    let mut path = vec![&key[..open]];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|close| (&r[..close], &r[close + 1..])));
        match inner {
            Some((segment, tail)) => {
                path.push(segment);
                rest = tail;
            }
            None => {
                return Err(TranslateError::Malformed(format!(
                    "unbalanced brackets in key `{key}`"
                )));
            }
        }
    }

    if path[0].is_empty() {
        return Err(TranslateError::Malformed(format!("missing field name in key `{key}`")));
    }
    if path.len() > MAX_KEY_DEPTH + 1 {
        return Err(TranslateError::Malformed(format!("key `{key}` is nested too deeply")));
    }
    if path[..path.len() - 1].iter().any(|s| s.is_empty()) {
        return Err(TranslateError::Malformed(format!("empty segment in key `{key}`")));
    }
    Ok(path)
}

fn insert_into(
    entries: &mut BTreeMap<String, RawValue>,
    path: &[&str],
    value: String,
) -> Result<(), TranslateError> {
    let (head, tail) = match path {
        [head, tail @ ..] => (*head, tail),
        [] => return Ok(()),
    };

    // `a[]=x` appends to `a` as a list.
    if tail == [""] {
        match entries.get_mut(head) {
            None => {
                entries.insert(head.to_string(), RawValue::List(vec![value]));
            }
            Some(existing) => push_scalar(head, existing, value)?,
        }
        return Ok(());
    }

    if tail.is_empty() {
        match entries.get_mut(head) {
            None => {
                entries.insert(head.to_string(), RawValue::Str(value));
            }
            Some(existing) => push_scalar(head, existing, value)?,
        }
        return Ok(());
    }

    let child = entries
        .entry(head.to_string())
        .or_insert_with(|| RawValue::Map(BTreeMap::new()));
    match child {
        RawValue::Map(inner) => insert_into(inner, tail, value),
        _ => Err(TranslateError::Malformed(format!(
            "`{head}` is given both as a value and as a nested key"
        ))),
    }
}

fn push_scalar(key: &str, existing: &mut RawValue, value: String) -> Result<(), TranslateError> {
    match existing {
        RawValue::Str(first) => {
            *existing = RawValue::List(vec![std::mem::take(first), value]);
            Ok(())
        }
        RawValue::List(items) => {
            items.push(value);
            Ok(())
        }
        RawValue::Map(_) => Err(TranslateError::Malformed(format!(
            "`{key}` is given both as a value and as a nested key"
        ))),
    }
}

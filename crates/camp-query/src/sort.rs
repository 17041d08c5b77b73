use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse a comma-separated sort list; a leading `-` means descending.
    /// Empty segments are skipped.
    pub fn parse_list(spec: &str) -> Vec<Sort> {
        spec.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "-")
            .map(|s| match s.strip_prefix('-') {
                Some(field) => Sort::desc(field),
                None => Sort::asc(s),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_directions() {
        let sorts = Sort::parse_list("-tuition,name");
        assert_eq!(sorts, vec![Sort::desc("tuition"), Sort::asc("name")]);
    }

    #[test]
    fn parse_skips_empty_segments() {
        assert_eq!(Sort::parse_list(",,-,"), vec![]);
        assert_eq!(Sort::parse_list(" name , "), vec![Sort::asc("name")]);
    }
}

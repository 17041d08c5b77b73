mod error;
mod filter;
mod operator;
mod page;
mod query;
mod raw;
mod sort;
mod translate;

pub use error::TranslateError;
pub use filter::{Filter, FilterGroup, FilterNode, GeoWithin, LogicalOp};
pub use operator::Operator;
pub use page::{DEFAULT_LIMIT, DEFAULT_PAGE, PageLink, Pagination, PaginationWindow};
pub use query::{Populate, Query};
pub use raw::{MAX_KEY_DEPTH, RawQuery, RawValue};
pub use sort::{Sort, SortDirection};
pub use translate::{DEFAULT_SORT_FIELD, RESERVED_KEYS, TranslatedQuery, translate};

use bson::oid::ObjectId;
use bson::{Bson, Document};
use camp_query::{FilterGroup, Query};

use crate::error::StoreError;

/// Collection settings fixed at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    pub name: String,
    /// Field sets whose combined values must be unique across documents.
    pub unique: Vec<Vec<String>>,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: Vec::new(),
        }
    }

    pub fn unique(mut self, fields: &[&str]) -> Self {
        self.unique.push(fields.iter().map(|f| f.to_string()).collect());
        self
    }
}

/// A mean over child documents written onto their parent.
#[derive(Debug, Clone, Copy)]
pub struct MeanRollup<'a> {
    /// Collection holding the children.
    pub source: &'a str,
    /// Selects the children of this parent.
    pub filter: &'a FilterGroup,
    /// Numeric child field that is averaged.
    pub field: &'a str,
    /// Collection holding the parent.
    pub target: &'a str,
    pub id: &'a ObjectId,
    /// Parent field that receives the result.
    pub target_field: &'a str,
}

/// The document-store capability the service runs on.
///
/// Every operation is synchronous and safe to call from many threads at
/// once; reads never wait on writers.
pub trait DocumentStore: Send + Sync {
    /// Create a collection; a no-op when it already exists.
    fn create_collection(&self, config: CollectionConfig) -> Result<(), StoreError>;

    /// Insert a document, assigning `_id` when absent. Returns the stored document.
    fn insert_one(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Insert `doc` unless a document matching `conflict` already exists.
    /// The check and the insert are one write. `None` when refused.
    fn insert_unless(
        &self,
        collection: &str,
        conflict: &FilterGroup,
        doc: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Filter, sort, skip/take, project and populate.
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    fn find_by_id(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, StoreError>;

    fn find_one(
        &self,
        collection: &str,
        filter: &FilterGroup,
    ) -> Result<Option<Document>, StoreError>;

    fn count(&self, collection: &str, filter: Option<&FilterGroup>) -> Result<u64, StoreError>;

    /// Set the top-level fields in `set`, remove those in `unset`, and return
    /// the updated document. `None` when no document has this id.
    fn update_by_id(
        &self,
        collection: &str,
        id: &ObjectId,
        set: Document,
        unset: &[String],
    ) -> Result<Option<Document>, StoreError>;

    fn delete_by_id(&self, collection: &str, id: &ObjectId)
    -> Result<Option<Document>, StoreError>;

    fn delete_many(&self, collection: &str, filter: Option<&FilterGroup>)
    -> Result<u64, StoreError>;

    /// Set `rollup.target_field` on the parent to `finish(mean)` of the
    /// children's `rollup.field`, or remove it when no child has a value.
    /// Reading the children and writing the parent are one write, so the
    /// parent always reflects the children as of its own update. Returns the
    /// parent, `None` when it no longer exists.
    fn roll_up_mean(
        &self,
        rollup: MeanRollup<'_>,
        finish: &dyn Fn(f64) -> Bson,
    ) -> Result<Option<Document>, StoreError>;

    /// Refuse all further operations.
    fn close(&self);
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, RwLock};

use arc_swap::ArcSwap;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use camp_query::{FilterGroup, Populate, Query, Sort, SortDirection};
use imbl::OrdMap;

use crate::error::StoreError;
use crate::eval::matches_opt;
use crate::path::{get_path, project};
use crate::store::{CollectionConfig, DocumentStore, MeanRollup};
use crate::value::{as_f64, operand_eq, sort_cmp};

/// Documents of one collection keyed by the hex form of their `_id`.
pub(crate) type Records = OrdMap<String, Document>;

struct Collection {
    config: CollectionConfig,
    records: ArcSwap<Records>,
}

/// In-process document store.
///
/// Each collection is an immutable `OrdMap` published through an `ArcSwap`:
/// readers load the current snapshot without locking, writers serialize on a
/// single mutex, edit a structural-sharing clone and swap it in.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>, StoreError> {
        self.check_open()?;
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Storage(format!("catalog lock poisoned: {e}")))?;
        collections
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Current snapshot of a collection. Cheap due to imbl structural sharing.
    fn snapshot(&self, name: &str) -> Result<Arc<Records>, StoreError> {
        Ok(self.collection(name)?.records.load_full())
    }

    /// Run `edit` against a private copy of the collection and publish it
    /// if the edit succeeds.
    fn write<R>(
        &self,
        name: &str,
        edit: impl FnOnce(&CollectionConfig, &mut Records) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let collection = self.collection(name)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))?;

        let mut records = (**collection.records.load()).clone();
        let result = edit(&collection.config, &mut records)?;
        collection.records.store(Arc::new(records));
        Ok(result)
    }

    fn populate(&self, docs: &mut [Document], populate: &Populate) -> Result<(), StoreError> {
        match populate {
            Populate::Ref {
                field,
                collection,
                columns,
            } => {
                let target = self.snapshot(collection)?;
                for doc in docs.iter_mut() {
                    let Some(key) = doc.get(field).and_then(id_key) else {
                        continue;
                    };
                    let expanded = target
                        .get(&key)
                        .map(|d| Bson::Document(project_opt(d, columns.as_deref())))
                        .unwrap_or(Bson::Null);
                    doc.insert(field.as_str(), expanded);
                }
            }
            Populate::Children {
                field,
                collection,
                foreign_field,
                columns,
            } => {
                let target = self.snapshot(collection)?;
                let mut by_parent: HashMap<String, Vec<Bson>> = HashMap::new();
                for child in target.values() {
                    if let Some(key) = get_path(child, foreign_field).and_then(id_key) {
                        by_parent
                            .entry(key)
                            .or_default()
                            .push(Bson::Document(project_opt(child, columns.as_deref())));
                    }
                }
                for doc in docs.iter_mut() {
                    let children = doc
                        .get("_id")
                        .and_then(id_key)
                        .and_then(|key| by_parent.get(&key).cloned())
                        .unwrap_or_default();
                    doc.insert(field.as_str(), Bson::Array(children));
                }
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn create_collection(&self, config: CollectionConfig) -> Result<(), StoreError> {
        self.check_open()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Storage(format!("catalog lock poisoned: {e}")))?;
        collections.entry(config.name.clone()).or_insert_with(|| {
            tracing::debug!(collection = %config.name, "creating collection");
            Arc::new(Collection {
                config,
                records: ArcSwap::new(Arc::new(OrdMap::new())),
            })
        });
        Ok(())
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let (key, doc) = keyed(doc)?;
        self.write(collection, |config, records| {
            insert_record(config, records, key, doc)
        })
    }

    fn insert_unless(
        &self,
        collection: &str,
        conflict: &FilterGroup,
        doc: Document,
    ) -> Result<Option<Document>, StoreError> {
        let (key, doc) = keyed(doc)?;
        self.write(collection, |config, records| {
            if records.values().any(|d| matches_opt(d, Some(conflict))) {
                return Ok(None);
            }
            insert_record(config, records, key, doc).map(Some)
        })
    }

    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let records = self.snapshot(collection)?;

        let mut matched: Vec<&Document> = records
            .values()
            .filter(|d| matches_opt(d, query.filter.as_ref()))
            .collect();
        sort_documents(&mut matched, &query.sort);

        let mut docs: Vec<Document> = matched
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.take.unwrap_or(usize::MAX))
            .map(|d| project_opt(d, query.columns.as_deref()))
            .collect();

        for populate in &query.populate {
            self.populate(&mut docs, populate)?;
        }
        Ok(docs)
    }

    fn find_by_id(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self.snapshot(collection)?.get(&id.to_hex()).cloned())
    }

    fn find_one(
        &self,
        collection: &str,
        filter: &FilterGroup,
    ) -> Result<Option<Document>, StoreError> {
        let records = self.snapshot(collection)?;
        Ok(records
            .values()
            .find(|d| matches_opt(d, Some(filter)))
            .cloned())
    }

    fn count(&self, collection: &str, filter: Option<&FilterGroup>) -> Result<u64, StoreError> {
        let records = self.snapshot(collection)?;
        Ok(records.values().filter(|d| matches_opt(d, filter)).count() as u64)
    }

    fn update_by_id(
        &self,
        collection: &str,
        id: &ObjectId,
        mut set: Document,
        unset: &[String],
    ) -> Result<Option<Document>, StoreError> {
        let key = id.to_hex();
        set.remove("_id");

        self.write(collection, |config, records| {
            let Some(mut doc) = records.get(&key).cloned() else {
                return Ok(None);
            };
            for (field, value) in set {
                doc.insert(field, value);
            }
            for field in unset {
                doc.remove(field);
            }
            check_unique(config, records, &key, &doc)?;
            records.insert(key.clone(), doc.clone());
            Ok(Some(doc))
        })
    }

    fn delete_by_id(
        &self,
        collection: &str,
        id: &ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        let key = id.to_hex();
        self.write(collection, |_, records| Ok(records.remove(&key)))
    }

    fn delete_many(
        &self,
        collection: &str,
        filter: Option<&FilterGroup>,
    ) -> Result<u64, StoreError> {
        self.write(collection, |_, records| {
            let doomed: Vec<String> = records
                .iter()
                .filter(|(_, d)| matches_opt(d, filter))
                .map(|(k, _)| k.clone())
                .collect();
            for key in &doomed {
                records.remove(key);
            }
            Ok(doomed.len() as u64)
        })
    }

    fn roll_up_mean(
        &self,
        rollup: MeanRollup<'_>,
        finish: &dyn Fn(f64) -> Bson,
    ) -> Result<Option<Document>, StoreError> {
        let key = rollup.id.to_hex();
        self.write(rollup.target, |_, records| {
            // The write lock is held, so no other write can publish children now.
            let children = self.snapshot(rollup.source)?;
            let Some(mut parent) = records.get(&key).cloned() else {
                return Ok(None);
            };
            match mean_of(&children, rollup.filter, rollup.field) {
                Some(mean) => {
                    parent.insert(rollup.target_field, finish(mean));
                }
                None => {
                    parent.remove(rollup.target_field);
                }
            }
            records.insert(key.clone(), parent.clone());
            Ok(Some(parent))
        })
    }

    fn close(&self) {
        if !self.closed.swap(true, AtomicOrdering::AcqRel) {
            tracing::info!("document store closed");
        }
    }
}

/// Give `doc` an `_id` when it has none and return the record key.
fn keyed(mut doc: Document) -> Result<(String, Document), StoreError> {
    let key = match doc.get("_id") {
        None => {
            let id = ObjectId::new();
            doc.insert("_id", id);
            id.to_hex()
        }
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(_) => {
            return Err(StoreError::InvalidDocument("_id must be an ObjectId".into()));
        }
    };
    Ok((key, doc))
}

fn insert_record(
    config: &CollectionConfig,
    records: &mut Records,
    key: String,
    doc: Document,
) -> Result<Document, StoreError> {
    if records.contains_key(&key) {
        return Err(StoreError::DuplicateKey {
            collection: config.name.clone(),
            field: "_id".into(),
        });
    }
    check_unique(config, records, &key, &doc)?;
    records.insert(key, doc.clone());
    Ok(doc)
}

fn mean_of(records: &Records, filter: &FilterGroup, field: &str) -> Option<f64> {
    let (sum, n) = records
        .values()
        .filter(|d| matches_opt(d, Some(filter)))
        .filter_map(|d| get_path(d, field).and_then(as_f64))
        .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn project_opt(doc: &Document, columns: Option<&[String]>) -> Document {
    match columns {
        Some(columns) => project(doc, columns),
        None => doc.clone(),
    }
}

fn id_key(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(id) => Some(id.to_hex()),
        Bson::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn sort_documents(docs: &mut [&Document], sorts: &[Sort]) {
    if sorts.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for sort in sorts {
            let ord = sort_cmp(get_path(a, &sort.field), get_path(b, &sort.field));
            let ord = match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Reject `doc` if another document already holds the same values for any
/// unique field set. Sets with a missing or null field are not enforced.
fn check_unique(
    config: &CollectionConfig,
    records: &Records,
    own_key: &str,
    doc: &Document,
) -> Result<(), StoreError> {
    for fields in &config.unique {
        let values: Option<Vec<&Bson>> = fields
            .iter()
            .map(|f| get_path(doc, f).filter(|v| !matches!(v, Bson::Null)))
            .collect();
        let Some(values) = values else {
            continue;
        };

        let clash = records.iter().any(|(key, other)| {
            key != own_key
                && fields.iter().zip(&values).all(|(field, value)| {
                    get_path(other, field).is_some_and(|existing| operand_eq(existing, value))
                })
        });
        if clash {
            return Err(StoreError::DuplicateKey {
                collection: config.name.clone(),
                field: fields.first().cloned().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

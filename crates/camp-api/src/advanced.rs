use bson::Document;
use camp_query::{Pagination, Populate, RawQuery, translate};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::json::doc_to_json;
use crate::state::AppState;

/// How one listing endpoint exposes a collection.
#[derive(Debug, Clone)]
pub struct Listing {
    pub collection: &'static str,
    pub populate: Vec<Populate>,
    /// Fields stripped from results and refused in the query string.
    pub hidden: &'static [&'static str],
}

impl Listing {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            populate: Vec::new(),
            hidden: &[],
        }
    }

    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }

    pub fn hidden(mut self, hidden: &'static [&'static str]) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsEnvelope {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

/// Run a listing request: translate the query string, fetch the page and
/// the total match count concurrently, and wrap both in the envelope.
pub async fn advanced_results(
    state: &AppState,
    query_string: Option<&str>,
    listing: Listing,
) -> Result<ResultsEnvelope, ApiError> {
    let raw = RawQuery::parse(query_string.unwrap_or_default())?;
    let translated = translate(&raw)?;
    translated.check_restricted(listing.hidden)?;

    let query = translated.page_query(listing.populate);
    let filter = translated.filter.clone();
    let collection = listing.collection;

    let (docs, total) = tokio::try_join!(
        state.blocking(move |store| Ok(store.find(collection, &query)?)),
        state.blocking(move |store| Ok(store.count(collection, filter.as_ref())?)),
    )?;

    tracing::debug!(collection, total, returned = docs.len(), "advanced results");
    let data: Vec<Value> = docs
        .into_iter()
        .map(|doc| doc_to_json(strip(doc, listing.hidden)))
        .collect();
    Ok(ResultsEnvelope {
        success: true,
        count: data.len(),
        pagination: translated.window.links(total),
        data,
    })
}

fn strip(mut doc: Document, hidden: &[&str]) -> Document {
    for field in hidden {
        doc.remove(*field);
    }
    doc
}

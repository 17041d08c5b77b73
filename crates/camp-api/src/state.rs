use std::sync::Arc;

use camp_store::DocumentStore;

use crate::config::Config;
use crate::error::ApiError;
use crate::geocoder::Geocoder;
use crate::mailer::Mailer;
use crate::upload::PhotoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailer: Arc<dyn Mailer>,
    pub photos: Arc<PhotoStore>,
}

impl AppState {
    /// Run a synchronous store call on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn DocumentStore) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }
}

mod error;
mod eval;
mod geo;
mod path;
mod store;
mod value;

pub use error::StoreError;
pub use geo::central_angle;
pub use store::{CollectionConfig, DocumentStore, MeanRollup};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

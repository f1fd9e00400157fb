pub mod catalog;
pub mod curation;
pub mod interactions;
pub mod library;
pub mod search;

pub use catalog::{MovieCatalog, TmdbCatalog};
pub use interactions::InteractionStore;
pub use search::{SearchPipeline, SearchQuery, SearchSettings};

use std::sync::Arc;

use crate::{
    repositories::MovieRepository,
    services::{InteractionStore, SearchPipeline},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn MovieRepository>,
    pub store: Arc<InteractionStore>,
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn MovieRepository>,
        store: Arc<InteractionStore>,
        pipeline: Arc<SearchPipeline>,
    ) -> Self {
        Self {
            repository,
            store,
            pipeline,
        }
    }
}

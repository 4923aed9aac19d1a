use std::sync::Arc;
use nr_search::NewsService;

pub struct AppState {
    pub service: Arc<NewsService>,
}

impl AppState {
    pub fn new(service: NewsService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

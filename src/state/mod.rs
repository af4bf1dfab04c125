use std::sync::Arc;
use std::time::Instant;

use url::Url;

use crate::enrichment::HttpEnricher;
use crate::indexer::IndexerClient;
use crate::service::NftService;

/// The facade as wired in production: live indexer transport plus the HTTP
/// enrichment backend.
pub type MarketNftService = NftService<IndexerClient, HttpEnricher>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketNftService>,
    pub indexer_endpoint: Url,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: MarketNftService, indexer_endpoint: Url) -> Self {
        Self {
            service: Arc::new(service),
            indexer_endpoint,
            start_time: Instant::now(),
        }
    }
}

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::models::nft::Nft;

pub mod queries;

/// Read access to the indexer's NFT entity connection.
///
/// The facade is written against this trait so tests can drive it with an
/// in-process gateway instead of a live indexer.
pub trait NftGateway {
    fn fetch_nfts(&self, document: String) -> impl Future<Output = Result<NftConnection>> + Send;
}

/// GraphQL transport to the chain indexer.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: Client,
    endpoint: Url,
}

impl IndexerClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        assert!(!endpoint.is_empty(), "Indexer endpoint must be provided");
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid indexer endpoint: {endpoint}"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build indexer HTTP client")?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts one GraphQL document and unwraps the `data`/`errors` envelope.
    async fn execute<T: DeserializeOwned>(&self, document: &str) -> Result<T> {
        let envelope: GraphQlEnvelope<T> = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "query": document }))
            .send()
            .await
            .context("Indexer request failed")?
            .error_for_status()
            .context("Indexer returned an error status")?
            .json()
            .await
            .context("Indexer response was not valid JSON")?;

        if let Some(error) = envelope.errors.first() {
            bail!("Indexer rejected query: {}", error.message);
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("Indexer response carried no data"))
    }
}

impl NftGateway for IndexerClient {
    fn fetch_nfts(&self, document: String) -> impl Future<Output = Result<NftConnection>> + Send {
        async move {
            let data: NftListData = self.execute(&document).await?;
            Ok(data.nft_entities)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NftListData {
    #[serde(rename = "nftEntities")]
    nft_entities: NftConnection,
}

/// The `nftEntities` connection payload: nodes plus pagination metadata.
/// `pageInfo` is only present when the document requested it.
#[derive(Debug, Clone, Deserialize)]
pub struct NftConnection {
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    pub nodes: Vec<Nft>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPreviousPage")]
    pub has_previous_page: bool,
}

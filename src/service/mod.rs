use std::fmt;

use anyhow::anyhow;
use futures::future::try_join_all;
use thiserror::Error;
use tracing::warn;

use crate::enrichment::Enricher;
use crate::indexer::{NftConnection, NftGateway, queries};
use crate::models::nft::{EnrichedNft, Nft, PaginatedResponse};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Which operation family an error belongs to. Display renders the
/// client-facing message for that family; the message never leaks the
/// underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFamily {
    AllNfts,
    SingleNft,
    OwnerNfts,
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFamily::AllNfts => write!(f, "Couldn't get NFTs"),
            QueryFamily::SingleNft => write!(f, "Couldn't get NFT"),
            QueryFamily::OwnerNfts => write!(f, "Couldn't get user's NFTs"),
        }
    }
}

/// Typed failure of a facade operation.
///
/// The rendered message is the family's static text in every variant, so
/// callers that only forward `to_string()` keep the original flat surface,
/// while callers that match can tell not-found from a broken transport.
#[derive(Debug, Error)]
pub enum NftQueryError {
    #[error("{family}")]
    Transport {
        family: QueryFamily,
        #[source]
        source: anyhow::Error,
    },
    #[error("{family}")]
    Enrichment {
        family: QueryFamily,
        #[source]
        source: anyhow::Error,
    },
    #[error("{family}")]
    NotFound { family: QueryFamily },
}

impl NftQueryError {
    pub fn family(&self) -> QueryFamily {
        match self {
            NftQueryError::Transport { family, .. }
            | NftQueryError::Enrichment { family, .. }
            | NftQueryError::NotFound { family } => *family,
        }
    }
}

/// Offset of the first record on `page` when pages hold `limit` records.
/// Pages are 1-based; a zero page is treated as the first, and an offset
/// past `u64::MAX` saturates instead of wrapping.
pub fn page_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}

/// Read-only query facade over the indexer's NFT entities.
///
/// Every operation is stateless: one indexer request, then one enrichment
/// call per returned node, all launched concurrently. The first enrichment
/// failure aborts the operation and drops the outstanding calls.
#[derive(Debug, Clone)]
pub struct NftService<G, E> {
    gateway: G,
    enricher: E,
}

impl<G: NftGateway, E: Enricher> NftService<G, E> {
    pub fn new(gateway: G, enricher: E) -> Self {
        Self { gateway, enricher }
    }

    /// Fetches the full unpaginated node set and enriches every record.
    pub async fn get_all_nfts(&self) -> Result<Vec<EnrichedNft>, NftQueryError> {
        let connection = self.fetch(queries::all_nfts(), QueryFamily::AllNfts).await?;
        self.enrich_all(connection.nodes, QueryFamily::AllNfts)
            .await
    }

    /// Fetches one page of NFTs. Page-info and total count are echoed
    /// verbatim from the indexer response.
    pub async fn get_paginated_nfts(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<EnrichedNft>, NftQueryError> {
        let offset = page_offset(page, limit);
        let connection = self
            .fetch(queries::all_nfts_paginated(limit, offset), QueryFamily::AllNfts)
            .await?;
        self.paginate(connection, QueryFamily::AllNfts).await
    }

    /// Fetches a single NFT by identifier. An empty node set is a
    /// not-found failure, distinct from transport errors but rendered with
    /// the same message.
    pub async fn get_nft(&self, id: &str) -> Result<EnrichedNft, NftQueryError> {
        let family = QueryFamily::SingleNft;
        let mut connection = self.fetch(queries::nft_from_id(id), family).await?;
        if connection.nodes.is_empty() {
            warn!("NFT {id} not found in indexer");
            return Err(NftQueryError::NotFound { family });
        }
        let nft = connection.nodes.swap_remove(0);
        self.enricher.enrich(nft).await.map_err(|source| {
            warn!("Enrichment failed for NFT {id}: {source:#}");
            NftQueryError::Enrichment { family, source }
        })
    }

    /// Fetches every NFT currently held by `owner` (server-side filter).
    pub async fn get_nfts_from_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<EnrichedNft>, NftQueryError> {
        let connection = self
            .fetch(queries::nfts_from_owner(owner), QueryFamily::OwnerNfts)
            .await?;
        self.enrich_all(connection.nodes, QueryFamily::OwnerNfts)
            .await
    }

    /// Paginated variant of [`Self::get_nfts_from_owner`].
    pub async fn get_paginated_nfts_from_owner(
        &self,
        owner: &str,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<EnrichedNft>, NftQueryError> {
        let offset = page_offset(page, limit);
        let connection = self
            .fetch(
                queries::nfts_from_owner_paginated(owner, limit, offset),
                QueryFamily::OwnerNfts,
            )
            .await?;
        self.paginate(connection, QueryFamily::OwnerNfts).await
    }

    async fn fetch(
        &self,
        document: String,
        family: QueryFamily,
    ) -> Result<NftConnection, NftQueryError> {
        self.gateway.fetch_nfts(document).await.map_err(|source| {
            warn!("Indexer query failed: {source:#}");
            NftQueryError::Transport { family, source }
        })
    }

    async fn enrich_all(
        &self,
        nodes: Vec<Nft>,
        family: QueryFamily,
    ) -> Result<Vec<EnrichedNft>, NftQueryError> {
        try_join_all(nodes.into_iter().map(|nft| self.enricher.enrich(nft)))
            .await
            .map_err(|source| {
                warn!("Enrichment fan-out aborted: {source:#}");
                NftQueryError::Enrichment { family, source }
            })
    }

    async fn paginate(
        &self,
        connection: NftConnection,
        family: QueryFamily,
    ) -> Result<PaginatedResponse<EnrichedNft>, NftQueryError> {
        // Paginated documents always request pageInfo; its absence means
        // the indexer response is malformed.
        let page_info = connection.page_info.ok_or_else(|| NftQueryError::Transport {
            family,
            source: anyhow!("Indexer response missing pageInfo"),
        })?;
        let data = self.enrich_all(connection.nodes, family).await?;
        Ok(PaginatedResponse {
            data,
            total_count: connection.total_count,
            has_next_page: page_info.has_next_page,
            has_previous_page: page_info.has_previous_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{Result, anyhow};

    use super::*;
    use crate::indexer::PageInfo;
    use crate::models::nft::EnrichedNft;

    fn raw_nft(id: &str, owner: &str) -> Nft {
        Nft {
            id: id.to_string(),
            owner: owner.to_string(),
            creator: None,
            listed: 1,
            timestamp_list: None,
            uri: None,
            price: "1000".to_string(),
            price_tiime: "2000".to_string(),
            serie_id: None,
            total_nft: None,
            total_listed_nft: None,
            views_count: None,
            serie_data: None,
            marketplace_id: None,
        }
    }

    /// In-process gateway: serves a canned connection and records every
    /// document it receives.
    struct FakeGateway {
        connection: NftConnection,
        fail: bool,
        documents: Mutex<Vec<String>>,
    }

    impl FakeGateway {
        fn with_nodes(nodes: Vec<Nft>) -> Self {
            Self {
                connection: NftConnection {
                    total_count: nodes.len() as u64,
                    page_info: None,
                    nodes,
                },
                fail: false,
                documents: Mutex::new(Vec::new()),
            }
        }

        fn with_connection(connection: NftConnection) -> Self {
            Self {
                connection,
                fail: false,
                documents: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                connection: NftConnection {
                    total_count: 0,
                    page_info: None,
                    nodes: Vec::new(),
                },
                fail: true,
                documents: Mutex::new(Vec::new()),
            }
        }

        fn last_document(&self) -> String {
            self.documents
                .lock()
                .expect("documents lock")
                .last()
                .cloned()
                .expect("at least one document sent")
        }
    }

    impl NftGateway for &FakeGateway {
        fn fetch_nfts(
            &self,
            document: String,
        ) -> impl std::future::Future<Output = Result<NftConnection>> + Send {
            self.documents.lock().expect("documents lock").push(document);
            let result = if self.fail {
                Err(anyhow!("connection refused"))
            } else {
                Ok(self.connection.clone())
            };
            async move { result }
        }
    }

    /// Enricher that tags each record and can be told to reject one id.
    struct FakeEnricher {
        reject_id: Option<String>,
    }

    impl FakeEnricher {
        fn passthrough() -> Self {
            Self { reject_id: None }
        }

        fn rejecting(id: &str) -> Self {
            Self {
                reject_id: Some(id.to_string()),
            }
        }
    }

    impl Enricher for &FakeEnricher {
        fn enrich(
            &self,
            nft: Nft,
        ) -> impl std::future::Future<Output = Result<EnrichedNft>> + Send {
            let reject = self.reject_id.as_deref() == Some(nft.id.as_str());
            async move {
                if reject {
                    return Err(anyhow!("metadata host unreachable"));
                }
                let mut enriched = EnrichedNft::from_raw(nft);
                enriched.name = Some(format!("nft-{}", enriched.nft.id));
                Ok(enriched)
            }
        }
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(2, 10), 10);
        assert_eq!(page_offset(3, 25), 50);
        for page in 1..=20u64 {
            for limit in 1..=20u64 {
                assert_eq!(page_offset(page, limit), (page - 1) * limit);
            }
        }
    }

    #[test]
    fn offset_saturates_for_oversized_pages() {
        assert_eq!(page_offset(u64::MAX, 2), u64::MAX);
        assert_eq!(page_offset(0, 10), 0);
    }

    #[tokio::test]
    async fn get_all_nfts_enriches_every_node_in_order() {
        let gateway = FakeGateway::with_nodes(vec![
            raw_nft("1", "alice"),
            raw_nft("2", "bob"),
            raw_nft("3", "carol"),
        ]);
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let nfts = service.get_all_nfts().await.expect("listing succeeds");
        assert_eq!(nfts.len(), 3);
        for (nft, expected_id) in nfts.iter().zip(["1", "2", "3"]) {
            assert_eq!(nft.nft.id, expected_id);
            assert_eq!(nft.name.as_deref(), Some(format!("nft-{expected_id}").as_str()));
        }
    }

    #[tokio::test]
    async fn get_nft_on_empty_node_set_is_not_found() {
        let gateway = FakeGateway::with_nodes(Vec::new());
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let err = service.get_nft("4821").await.expect_err("lookup fails");
        assert!(matches!(err, NftQueryError::NotFound { .. }));
        assert_eq!(err.to_string(), "Couldn't get NFT");
    }

    #[tokio::test]
    async fn get_nft_returns_first_node_enriched() {
        let gateway = FakeGateway::with_nodes(vec![raw_nft("7", "alice"), raw_nft("8", "bob")]);
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let nft = service.get_nft("7").await.expect("lookup succeeds");
        assert_eq!(nft.nft.id, "7");
        assert_eq!(nft.name.as_deref(), Some("nft-7"));
        assert!(gateway.last_document().contains("id: { equalTo: \"7\" }"));
    }

    #[tokio::test]
    async fn single_enrichment_failure_aborts_the_listing() {
        let gateway = FakeGateway::with_nodes(vec![
            raw_nft("1", "alice"),
            raw_nft("2", "bob"),
            raw_nft("3", "carol"),
        ]);
        let enricher = FakeEnricher::rejecting("2");
        let service = NftService::new(&gateway, &enricher);

        let err = service.get_all_nfts().await.expect_err("listing fails");
        assert!(matches!(err, NftQueryError::Enrichment { .. }));
        assert_eq!(err.to_string(), "Couldn't get NFTs");
    }

    #[tokio::test]
    async fn transport_failure_carries_the_owner_family() {
        let gateway = FakeGateway::failing();
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let err = service
            .get_nfts_from_owner("alice")
            .await
            .expect_err("listing fails");
        assert!(matches!(err, NftQueryError::Transport { .. }));
        assert_eq!(err.family(), QueryFamily::OwnerNfts);
        assert_eq!(err.to_string(), "Couldn't get user's NFTs");
    }

    #[tokio::test]
    async fn paginated_listing_echoes_page_info_verbatim() {
        let gateway = FakeGateway::with_connection(NftConnection {
            total_count: 57,
            page_info: Some(PageInfo {
                has_next_page: true,
                has_previous_page: true,
            }),
            nodes: vec![raw_nft("11", "alice")],
        });
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let page = service
            .get_paginated_nfts(2, 10)
            .await
            .expect("page fetch succeeds");
        assert_eq!(page.total_count, 57);
        assert!(page.has_next_page);
        assert!(page.has_previous_page);
        assert_eq!(page.data.len(), 1);

        let document = gateway.last_document();
        assert!(document.contains("first: 10"));
        assert!(document.contains("offset: 10"));
    }

    #[tokio::test]
    async fn paginated_owner_listing_filters_and_paginates() {
        let gateway = FakeGateway::with_connection(NftConnection {
            total_count: 3,
            page_info: Some(PageInfo {
                has_next_page: false,
                has_previous_page: true,
            }),
            nodes: vec![raw_nft("21", "alice")],
        });
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let page = service
            .get_paginated_nfts_from_owner("alice", 3, 1)
            .await
            .expect("page fetch succeeds");
        assert_eq!(page.total_count, 3);
        assert!(!page.has_next_page);

        let document = gateway.last_document();
        assert!(document.contains("owner: { equalTo: \"alice\" }"));
        assert!(document.contains("first: 1"));
        assert!(document.contains("offset: 2"));
    }

    #[tokio::test]
    async fn paginated_response_without_page_info_is_a_transport_error() {
        let gateway = FakeGateway::with_connection(NftConnection {
            total_count: 1,
            page_info: None,
            nodes: vec![raw_nft("1", "alice")],
        });
        let enricher = FakeEnricher::passthrough();
        let service = NftService::new(&gateway, &enricher);

        let err = service
            .get_paginated_nfts(1, 10)
            .await
            .expect_err("malformed response fails");
        assert!(matches!(err, NftQueryError::Transport { .. }));
        assert_eq!(err.to_string(), "Couldn't get NFTs");
    }
}

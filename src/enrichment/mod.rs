use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::models::nft::{Category, EnrichedNft, MediaLink, Nft, UserProfile};

/// The enrichment collaborator: attaches off-chain auxiliary data to one raw
/// NFT record. The returned record keeps the same identifier; a failure here
/// fails the operation that requested it.
pub trait Enricher {
    fn enrich(&self, nft: Nft) -> impl Future<Output = Result<EnrichedNft>> + Send;
}

/// Default enrichment backend.
///
/// Display name and media links come from the metadata document at the NFT's
/// content URI; owner/creator profiles and category tags come from the
/// profile service. A missing record (404) leaves the field unpopulated,
/// any other failure propagates.
#[derive(Debug, Clone)]
pub struct HttpEnricher {
    http: Client,
    profile_service: Url,
}

impl HttpEnricher {
    pub fn new(profile_service: &str, timeout: Duration) -> Result<Self> {
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let mut profile_service = Url::parse(profile_service)
            .with_context(|| format!("Invalid profile service endpoint: {profile_service}"))?;
        // Url::join treats a path without a trailing slash as a file.
        if !profile_service.path().ends_with('/') {
            profile_service.set_path(&format!("{}/", profile_service.path()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build enrichment HTTP client")?;

        Ok(Self {
            http,
            profile_service,
        })
    }

    async fn fetch_metadata(&self, uri: &str) -> Result<NftMetadata> {
        self.http
            .get(uri)
            .send()
            .await
            .with_context(|| format!("Metadata request failed for {uri}"))?
            .error_for_status()
            .with_context(|| format!("Metadata host returned an error status for {uri}"))?
            .json()
            .await
            .with_context(|| format!("Metadata at {uri} was not valid JSON"))
    }

    async fn fetch_profile(&self, wallet_id: &str) -> Result<Option<UserProfile>> {
        let url = self
            .profile_service
            .join(&format!("users/{wallet_id}"))
            .context("Failed to build profile URL")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Profile request failed for {wallet_id}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let profile = response
            .error_for_status()
            .with_context(|| format!("Profile service returned an error status for {wallet_id}"))?
            .json()
            .await
            .with_context(|| format!("Profile for {wallet_id} was not valid JSON"))?;
        Ok(Some(profile))
    }

    async fn fetch_categories(&self, nft_id: &str) -> Result<Option<Vec<Category>>> {
        let url = self
            .profile_service
            .join(&format!("nfts/{nft_id}/categories"))
            .context("Failed to build categories URL")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Category request failed for NFT {nft_id}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let categories: Vec<Category> = response
            .error_for_status()
            .with_context(|| format!("Category service returned an error status for {nft_id}"))?
            .json()
            .await
            .with_context(|| format!("Categories for NFT {nft_id} were not valid JSON"))?;
        Ok(Some(categories))
    }
}

impl Enricher for HttpEnricher {
    fn enrich(&self, nft: Nft) -> impl Future<Output = Result<EnrichedNft>> + Send {
        async move {
            let metadata = async {
                match nft.uri.as_deref() {
                    Some(uri) => self.fetch_metadata(uri).await.map(Some),
                    None => Ok(None),
                }
            };
            let owner_profile = self.fetch_profile(&nft.owner);
            let creator_profile = async {
                match nft.creator.as_deref() {
                    Some(creator) => self.fetch_profile(creator).await,
                    None => Ok(None),
                }
            };
            let categories = self.fetch_categories(&nft.id);

            let (metadata, owner_data, creator_data, categories) =
                futures::try_join!(metadata, owner_profile, creator_profile, categories)?;

            let mut enriched = EnrichedNft::from_raw(nft);
            if let Some(metadata) = metadata {
                enriched.name = metadata.name;
                enriched.media = metadata.media;
                enriched.crypted_media = metadata.crypted_media;
            }
            enriched.owner_data = owner_data;
            enriched.creator_data = creator_data;
            enriched.categories = categories;
            Ok(enriched)
        }
    }
}

#[derive(Debug, Deserialize)]
struct NftMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    media: Option<MediaLink>,
    #[serde(rename = "cryptedMedia", default)]
    crypted_media: Option<MediaLink>,
}

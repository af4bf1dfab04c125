use serde::{Deserialize, Serialize};

/// Raw NFT record as returned by the indexer's `nftEntities` connection.
///
/// Prices are kept as decimal strings: the chain denominates them in the
/// smallest unit and the values routinely exceed `u64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub id: String,
    pub owner: String,
    #[serde(default)]
    pub creator: Option<String>,
    pub listed: i32,
    #[serde(default)]
    pub timestamp_list: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    pub price: String,
    pub price_tiime: String,
    #[serde(default)]
    pub serie_id: Option<String>,
    #[serde(default)]
    pub total_nft: Option<u64>,
    #[serde(default)]
    pub total_listed_nft: Option<u64>,
    #[serde(default)]
    pub views_count: Option<u64>,
    #[serde(default)]
    pub serie_data: Option<Vec<Nft>>,
    #[serde(default)]
    pub marketplace_id: Option<String>,
}

/// NFT record with off-chain auxiliary data attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedNft {
    #[serde(flatten)]
    pub nft: Nft,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub media: Option<MediaLink>,
    #[serde(default)]
    pub crypted_media: Option<MediaLink>,
    #[serde(default)]
    pub owner_data: Option<UserProfile>,
    #[serde(default)]
    pub creator_data: Option<UserProfile>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

impl EnrichedNft {
    /// Wraps a raw record with no auxiliary data populated.
    pub fn from_raw(nft: Nft) -> Self {
        Self {
            nft,
            name: None,
            media: None,
            crypted_media: None,
            owner_data: None,
            creator_data: None,
            categories: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture_uri: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One page of results with the indexer's page-info echoed verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

//! GraphQL document builders for the indexer's `nftEntities` connection.
//!
//! The indexer exposes a PostGraphile-style schema: connections take
//! `first`/`offset` for pagination and a `filter` argument for server-side
//! filtering. Documents are assembled as plain strings; the only dynamic
//! values are numeric limits/offsets and quoted identifiers.

const NFT_SCALAR_FIELDS: &str = "id owner creator listed timestampList uri price priceTiime \
     serieId marketplaceId totalNft totalListedNft viewsCount";

const PAGE_INFO_FIELDS: &str = "pageInfo { hasNextPage hasPreviousPage }";

/// Full node selection: every scalar field plus the nested series records.
/// The nested selection stays scalar-only — series members carry no series
/// of their own.
fn nft_node_fields() -> String {
    format!("{NFT_SCALAR_FIELDS} serieData {{ {NFT_SCALAR_FIELDS} }}")
}

pub fn all_nfts() -> String {
    let fields = nft_node_fields();
    format!(
        "{{ nftEntities(orderBy: [TIMESTAMP_CREATE_DESC]) \
         {{ totalCount nodes {{ {fields} }} }} }}"
    )
}

pub fn all_nfts_paginated(limit: u64, offset: u64) -> String {
    let fields = nft_node_fields();
    format!(
        "{{ nftEntities(orderBy: [TIMESTAMP_CREATE_DESC], first: {limit}, offset: {offset}) \
         {{ totalCount {PAGE_INFO_FIELDS} nodes {{ {fields} }} }} }}"
    )
}

pub fn nft_from_id(id: &str) -> String {
    let fields = nft_node_fields();
    format!(
        "{{ nftEntities(filter: {{ id: {{ equalTo: \"{}\" }} }}) \
         {{ totalCount nodes {{ {fields} }} }} }}",
        escape_argument(id)
    )
}

pub fn nfts_from_owner(owner: &str) -> String {
    let fields = nft_node_fields();
    format!(
        "{{ nftEntities(orderBy: [TIMESTAMP_CREATE_DESC], \
         filter: {{ owner: {{ equalTo: \"{}\" }} }}) \
         {{ totalCount nodes {{ {fields} }} }} }}",
        escape_argument(owner)
    )
}

pub fn nfts_from_owner_paginated(owner: &str, limit: u64, offset: u64) -> String {
    let fields = nft_node_fields();
    format!(
        "{{ nftEntities(orderBy: [TIMESTAMP_CREATE_DESC], first: {limit}, offset: {offset}, \
         filter: {{ owner: {{ equalTo: \"{}\" }} }}) \
         {{ totalCount {PAGE_INFO_FIELDS} nodes {{ {fields} }} }} }}",
        escape_argument(owner)
    )
}

/// Escapes a caller-supplied value for inlining inside a quoted GraphQL
/// string literal.
fn escape_argument(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_document_carries_limit_and_offset() {
        let document = all_nfts_paginated(10, 10);
        assert!(document.contains("first: 10"));
        assert!(document.contains("offset: 10"));
        assert!(document.contains("totalCount"));
        assert!(document.contains("hasNextPage"));
        assert!(document.contains("hasPreviousPage"));
    }

    #[test]
    fn unpaginated_document_has_no_page_arguments() {
        let document = all_nfts();
        assert!(!document.contains("first:"));
        assert!(!document.contains("offset:"));
        assert!(!document.contains("pageInfo"));
    }

    #[test]
    fn id_filter_quotes_the_identifier() {
        let document = nft_from_id("4821");
        assert!(document.contains("id: { equalTo: \"4821\" }"));
    }

    #[test]
    fn owner_filter_present_in_both_variants() {
        let owner = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
        let expected = format!("owner: {{ equalTo: \"{owner}\" }}");
        assert!(nfts_from_owner(owner).contains(&expected));
        assert!(nfts_from_owner_paginated(owner, 10, 20).contains(&expected));
    }

    #[test]
    fn hostile_argument_is_escaped() {
        let document = nft_from_id("a\"} } evil");
        assert!(document.contains("a\\\"} } evil"));
        assert!(!document.contains("equalTo: \"a\"}"));
    }

    #[test]
    fn node_selection_covers_wire_fields() {
        let fields = nft_node_fields();
        for field in [
            "id",
            "owner",
            "creator",
            "listed",
            "timestampList",
            "uri",
            "price",
            "priceTiime",
            "serieId",
            "marketplaceId",
            "totalNft",
            "totalListedNft",
            "viewsCount",
            "serieData",
        ] {
            assert!(fields.contains(field), "missing field {field}");
        }
    }

    #[test]
    fn every_document_requests_series_counts_and_views() {
        for document in [
            all_nfts(),
            all_nfts_paginated(10, 0),
            nft_from_id("1"),
            nfts_from_owner("alice"),
            nfts_from_owner_paginated("alice", 10, 0),
        ] {
            for field in ["totalNft", "totalListedNft", "viewsCount"] {
                assert!(document.contains(field), "document never requests {field}");
            }
            assert!(
                document.contains(&format!("serieData {{ {NFT_SCALAR_FIELDS} }}")),
                "document never requests the nested series selection"
            );
        }
    }
}

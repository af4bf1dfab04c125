use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::service::{DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::state::AppState;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/nfts", get(list_nfts))
        .route("/nfts/{id}", get(get_nft))
        .route("/owners/{owner}/nfts", get(list_owner_nfts))
}

/// Optional pagination controls. When neither parameter is supplied the
/// handler returns the full unpaginated listing.
#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<u64>,
    limit: Option<u64>,
}

impl PageParams {
    fn is_paginated(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }

    /// A zero from the query string would place page one at a negative
    /// offset, so it falls back to the default alongside absent values.
    fn resolve(&self) -> (u64, u64) {
        let page = self.page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT);
        (page, limit)
    }
}

async fn list_nfts(
    Query(params): Query<PageParams>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    if !params.is_paginated() {
        let nfts = state.service.get_all_nfts().await?;
        return Ok(Json(nfts).into_response());
    }

    let (page, limit) = params.resolve();
    let page_response = state.service.get_paginated_nfts(page, limit).await?;
    Ok(Json(page_response).into_response())
}

async fn get_nft(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    let nft = state.service.get_nft(&id).await?;
    Ok(Json(nft).into_response())
}

async fn list_owner_nfts(
    Path(owner): Path<String>,
    Query(params): Query<PageParams>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    if !params.is_paginated() {
        let nfts = state.service.get_nfts_from_owner(&owner).await?;
        return Ok(Json(nfts).into_response());
    }

    let (page, limit) = params.resolve();
    let page_response = state
        .service
        .get_paginated_nfts_from_owner(&owner, page, limit)
        .await?;
    Ok(Json(page_response).into_response())
}

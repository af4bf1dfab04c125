use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::NftQueryError;
use crate::state::AppState;

mod nfts;

pub fn router(state: AppState) -> Router {
    // Configure CORS for marketplace front-end access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let nft_router = nfts::router().with_state(state.clone());
    Router::new()
        .route("/health", get(health_live))
        .route("/health/ready", get(health_ready))
        .merge(nft_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_live(State(state): State<AppState>) -> Result<Json<HealthResponse>, HttpError> {
    let uptime = state.start_time.elapsed().as_secs();
    let response = HealthResponse {
        status: "live",
        uptime_seconds: uptime,
    };
    Ok(Json(response))
}

async fn health_ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, HttpError> {
    let response = ReadyResponse {
        status: "ready",
        indexer_endpoint: state.indexer_endpoint.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    indexer_endpoint: String,
    uptime_seconds: u64,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        assert!(status != StatusCode::OK, "Error status cannot be 200");
        assert!(!message.is_empty(), "Error message cannot be empty");
        Self { status, message }
    }
}

impl From<NftQueryError> for HttpError {
    fn from(err: NftQueryError) -> Self {
        let status = match err {
            NftQueryError::NotFound { .. } => StatusCode::NOT_FOUND,
            NftQueryError::Transport { .. } | NftQueryError::Enrichment { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        // The Display text is the family's static message; the cause has
        // already been logged at the facade boundary.
        HttpError::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        info!("HTTP error: {}", self.message);
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::service::QueryFamily;

    #[test]
    fn not_found_maps_to_404_with_family_message() {
        let err = HttpError::from(NftQueryError::NotFound {
            family: QueryFamily::SingleNft,
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Couldn't get NFT");
    }

    #[test]
    fn transport_and_enrichment_map_to_502() {
        let transport = HttpError::from(NftQueryError::Transport {
            family: QueryFamily::AllNfts,
            source: anyhow!("timeout"),
        });
        assert_eq!(transport.status, StatusCode::BAD_GATEWAY);
        assert_eq!(transport.message, "Couldn't get NFTs");

        let enrichment = HttpError::from(NftQueryError::Enrichment {
            family: QueryFamily::OwnerNfts,
            source: anyhow!("metadata host down"),
        });
        assert_eq!(enrichment.status, StatusCode::BAD_GATEWAY);
        assert_eq!(enrichment.message, "Couldn't get user's NFTs");
    }
}

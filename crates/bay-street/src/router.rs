use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::ingest::IngestError;
use crate::scoring::Deal;
use crate::service::{AllocationRequest, DealService, DealServiceError};
use crate::universe::DealStore;

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) csv: String,
}

/// Router builder exposing scoring, universe and allocation endpoints.
pub fn deal_router<S>(service: Arc<DealService<S>>) -> Router
where
    S: DealStore + 'static,
{
    Router::new()
        .route("/api/v1/deals/score", post(score_handler::<S>))
        .route(
            "/api/v1/deals",
            post(add_handler::<S>).get(list_handler::<S>),
        )
        .route("/api/v1/deals/import", post(import_handler::<S>))
        .route("/api/v1/portfolio/allocate", post(allocate_handler::<S>))
        .with_state(service)
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<DealService<S>>>,
    Json(deal): Json<Deal>,
) -> Response
where
    S: DealStore + 'static,
{
    let card = service.preview(&deal);
    (StatusCode::OK, Json(card)).into_response()
}

pub(crate) async fn add_handler<S>(
    State(service): State<Arc<DealService<S>>>,
    Json(deal): Json<Deal>,
) -> Response
where
    S: DealStore + 'static,
{
    match service.add(deal) {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn list_handler<S>(State(service): State<Arc<DealService<S>>>) -> Response
where
    S: DealStore + 'static,
{
    match service.universe() {
        Ok(universe) => {
            let ranked = universe.ranked();
            (StatusCode::OK, Json(json!({ "deals": ranked }))).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn import_handler<S>(
    State(service): State<Arc<DealService<S>>>,
    Json(request): Json<ImportRequest>,
) -> Response
where
    S: DealStore + 'static,
{
    let reader = Cursor::new(request.csv.into_bytes());
    match service.import(reader) {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn allocate_handler<S>(
    State(service): State<Arc<DealService<S>>>,
    Json(request): Json<AllocationRequest>,
) -> Response
where
    S: DealStore + 'static,
{
    match service.allocate(&request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(other) => error_response(other),
    }
}

fn error_response(error: DealServiceError) -> Response {
    match error {
        DealServiceError::Ingest(IngestError::MissingColumns(columns)) => {
            let payload = json!({
                "error": "missing required columns",
                "missing_columns": columns,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        DealServiceError::Ingest(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        DealServiceError::Store(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

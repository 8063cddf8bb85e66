use std::collections::HashSet;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::adaptive::CatalogItem;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", put(replace_catalog))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceCatalogRequest {
    items: Vec<CatalogItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceCatalogResponse {
    count: usize,
}

async fn replace_catalog(
    State(state): State<AppState>,
    Json(payload): Json<ReplaceCatalogRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_items(&payload.items)?;
    let count = state.catalog().replace(payload.items);
    tracing::info!(count, "catalog replaced");
    Ok(ok(ReplaceCatalogResponse { count }))
}

fn validate_items(items: &[CatalogItem]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.trim().is_empty() {
            return Err(AppError::bad_request("catalog item id must not be empty"));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(AppError::bad_request(format!(
                "duplicate catalog item id: {}",
                item.id
            )));
        }
        if !(0.0..=1.0).contains(&item.cognitive_load) {
            return Err(AppError::bad_request(format!(
                "cognitive load of {} must be within [0, 1]",
                item.id
            )));
        }
    }
    Ok(())
}

//! Dashboard statistics handler

use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::CatalogStats;

use crate::core::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Re-read both snapshots before computing
    #[serde(default)]
    pub refresh: bool,
}

/// Figures computed from the server-held snapshots
pub async fn get_stats(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<ApiResponse<CatalogStats>> {
    let mut products = state.products.lock().await;
    let mut employees = state.employees.lock().await;
    if query.refresh {
        state.service.fetch_products(&mut products).await?;
        state.service.fetch_employees(&mut employees).await?;
    }
    Ok(ApiResponse::success(
        state.service.stats(&products, &employees),
    ))
}

//! Catalog hierarchy handlers

use axum::extract::{Path, State};
use shared::error::{ApiResponse, AppResult};

use crate::api::PRODUCTS_RESOURCE;
use crate::catalog::cascade::CascadeOutcome;
use crate::core::ServerState;
use crate::service::may_have_written;

pub async fn delete_company(
    State(state): State<ServerState>,
    Path(company): Path<String>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    let mut products = state.products.lock().await;
    let result = state
        .service
        .delete_company_hierarchy(&mut products, &company)
        .await;
    finish(&state, result)
}

pub async fn delete_category(
    State(state): State<ServerState>,
    Path((company, category)): Path<(String, String)>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    let mut products = state.products.lock().await;
    let result = state
        .service
        .delete_category_hierarchy(&mut products, &company, &category)
        .await;
    finish(&state, result)
}

pub async fn delete_subcategory(
    State(state): State<ServerState>,
    Path((company, category, subcategory)): Path<(String, String, String)>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    let mut products = state.products.lock().await;
    let result = state
        .service
        .delete_subcategory_hierarchy(&mut products, &company, &category, &subcategory)
        .await;
    finish(&state, result)
}

fn finish(
    state: &ServerState,
    result: AppResult<CascadeOutcome>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    let outcome = result.inspect_err(|e| {
        // Split deletes can fail after some chunks landed
        if may_have_written(e) {
            state.bump(PRODUCTS_RESOURCE);
        }
    })?;
    state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::success(outcome))
}

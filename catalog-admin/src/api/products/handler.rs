//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::{Product, ProductInput, ProductUpdate};

use crate::api::PRODUCTS_RESOURCE;
use crate::core::ServerState;
use crate::service::may_have_written;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: usize,
    pub revision: u64,
}

/// Re-read the catalog and return every leaf product
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Product>>> {
    let mut products = state.products.lock().await;
    let list = state.service.fetch_products(&mut products).await?.to_vec();
    Ok(ApiResponse::success(list))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductInput>,
) -> AppResult<ApiResponse<Product>> {
    let mut products = state.products.lock().await;
    let product = state.service.add_product(&mut products, &payload).await?;
    state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::success_with_message("Product added", product))
}

/// Update a product from the current snapshot
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<ApiResponse<Product>> {
    let mut products = state.products.lock().await;
    let product = state
        .service
        .update_product(&mut products, &id, &payload)
        .await?;
    state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::success_with_message("Product updated", product))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let mut products = state.products.lock().await;
    state.service.delete_product(&mut products, &id).await?;
    state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::ok())
}

/// Delete every leaf product
pub async fn delete_all(State(state): State<ServerState>) -> AppResult<ApiResponse<CountResponse>> {
    let mut products = state.products.lock().await;
    let result = state.service.delete_all_products(&mut products).await;
    let count = result.inspect_err(|e| {
        // Partial deletes still change the catalog
        if may_have_written(e) {
            state.bump(PRODUCTS_RESOURCE);
        }
    })?;
    let revision = state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::success(CountResponse { count, revision }))
}

pub async fn import(
    State(state): State<ServerState>,
    Json(records): Json<Vec<ProductInput>>,
) -> AppResult<ApiResponse<CountResponse>> {
    let mut products = state.products.lock().await;
    let count = state.service.import_products(&mut products, &records).await?;
    let revision = state.bump(PRODUCTS_RESOURCE);
    Ok(ApiResponse::success_with_message(
        format!("Imported {} products", count),
        CountResponse { count, revision },
    ))
}

//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/health | GET | 健康检查和资源版本号 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "code": 0,
//!   "message": "OK",
//!   "data": {
//!     "status": "ok",
//!     "version": "0.1.0",
//!     "environment": "development",
//!     "revisions": { "products": 3, "employees": 1 }
//!   }
//! }
//! ```

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::error::ApiResponse;

use crate::api::{EMPLOYEES_RESOURCE, PRODUCTS_RESOURCE};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 状态 (ok)
    status: &'static str,
    version: &'static str,
    environment: String,
    /// 轮询方据此判断快照是否变化
    revisions: Revisions,
}

#[derive(Debug, Serialize)]
pub struct Revisions {
    products: u64,
    employees: u64,
}

async fn health(State(state): State<ServerState>) -> ApiResponse<HealthResponse> {
    ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        revisions: Revisions {
            products: state.resource_versions.get(PRODUCTS_RESOURCE),
            employees: state.resource_versions.get(EMPLOYEES_RESOURCE),
        },
    })
}

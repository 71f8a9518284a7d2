//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查和资源版本
//! - [`products`] - 商品管理和批量导入
//! - [`catalog`] - 公司/分类/子分类级联删除
//! - [`employees`] - 员工管理
//! - [`stats`] - 仪表盘统计
//!
//! 所有接口返回 [`ApiResponse`](shared::ApiResponse) 信封，
//! 错误经由 `AppError` 的 `IntoResponse` 映射状态码。

pub mod catalog;
pub mod employees;
pub mod health;
pub mod products;
pub mod stats;

use axum::Router;

use crate::core::ServerState;

/// 资源名，用于版本号
pub const PRODUCTS_RESOURCE: &str = "products";
pub const EMPLOYEES_RESOURCE: &str = "employees";

/// 合并所有路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(catalog::router())
        .merge(employees::router())
        .merge(stats::router())
}

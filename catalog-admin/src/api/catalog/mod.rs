//! Catalog hierarchy API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/catalog/{company} | DELETE | 删除公司及其所有后代 |
//! | /api/catalog/{company}/{category} | DELETE | 删除分类及其所有后代 |
//! | /api/catalog/{company}/{category}/{subcategory} | DELETE | 删除子分类及其商品 |

mod handler;

use axum::{Router, routing::delete};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/catalog", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{company}", delete(handler::delete_company))
        .route("/{company}/{category}", delete(handler::delete_category))
        .route(
            "/{company}/{category}/{subcategory}",
            delete(handler::delete_subcategory),
        )
}

//! Catalog Admin - 产品目录与员工名册管理端
//!
//! # 架构概述
//!
//! 数据全部位于远程文档存储，目录按 公司 → 分类 → 子分类 → 商品 分层存放。
//!
//! - **目录** (`catalog`): 字段规范化、叶子识别、写入、级联删除、批量导入、统计
//! - **批量写入** (`batch`): 按存储上限分块提交
//! - **员工** (`employees`): 双根名册读取与废弃字段清理
//! - **服务** (`service`): 调用方持有快照的数据访问入口
//! - **HTTP API** (`api`): axum 管理接口
//!
//! # 模块结构
//!
//! ```text
//! catalog-admin/src/
//! ├── core/          # 配置、状态、服务器
//! ├── catalog/       # 目录核心
//! ├── employees/     # 员工名册
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志
//! ├── batch.rs       # 分块执行器
//! └── service.rs     # 服务入口
//! ```

pub mod api;
pub mod batch;
pub mod catalog;
pub mod core;
pub mod employees;
pub mod service;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use service::{CatalogService, EmployeeState, ProductState, ServiceConfig};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env 并初始化日志
pub fn setup_environment(log_level: Option<&str>) -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(
        Some(log_level.unwrap_or(&config.log_level)),
        config.log_dir.as_deref(),
    );
    config
}

pub fn print_banner() {
    println!(
        r#"
   ______      __        __
  / ____/___ _/ /_____ _/ /___  ____ _
 / /   / __ `/ __/ __ `/ / __ \/ __ `/
/ /___/ /_/ / /_/ /_/ / / /_/ / /_/ /
\____/\__,_/\__/\__,_/_/\____/\__, /
                             /____/   admin
    "#
    );
}

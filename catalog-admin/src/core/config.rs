use doc_store::{DEFAULT_MAX_BATCH_OPS, StoreConfig};
use std::str::FromStr;

use crate::catalog::CascadeOverflow;
use crate::employees::migrator::DEFAULT_CHUNK_SIZE;
use crate::service::{
    DEFAULT_COMPANIES_ROOT, DEFAULT_EMPLOYEES_FALLBACK_ROOT, DEFAULT_EMPLOYEES_ROOT, ServiceConfig,
};

/// 存储后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// 远程文档存储 (Firestore REST)
    #[default]
    Rest,
    /// 进程内存储，用于本地调试
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// 管理端配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | STORE_BACKEND | rest | 存储后端 (rest / memory) |
/// | STORE_BASE_URL | https://firestore.googleapis.com/v1 | 存储 REST 地址 |
/// | STORE_PROJECT_ID | (空) | 项目 ID |
/// | STORE_DATABASE | (default) | 数据库 ID |
/// | STORE_TOKEN | - | Bearer token |
/// | STORE_API_KEY | - | Web API key |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | COMPANIES_ROOT | admin-data/root/products | 公司集合 |
/// | EMPLOYEES_ROOT | admin-data/root/employees | 员工集合 |
/// | EMPLOYEES_FALLBACK_ROOT | company/admin-data/employees | 旧员工集合 |
/// | MAX_BATCH_OPS | 500 | 单批最大操作数 |
/// | MIGRATION_CHUNK_SIZE | 400 | 分块大小 |
/// | CASCADE_OVERFLOW | split | 级联删除超限策略 (split / reject) |
/// | CHUNKED_IMPORT | false | 导入是否分块 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// STORE_BACKEND=memory HTTP_PORT=8080 cargo run -- serve
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 存储后端
    pub store_backend: StoreBackend,
    pub store_base_url: String,
    pub store_project_id: String,
    pub store_database: String,
    pub store_token: Option<String>,
    pub store_api_key: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,

    // === 存储布局 ===
    pub companies_root: String,
    pub employees_root: String,
    pub employees_fallback_root: String,

    // === 批量写入 ===
    /// 单批最大操作数 (存储上限)
    pub max_batch_ops: usize,
    /// 分块大小，始终低于上限
    pub migration_chunk_size: usize,
    pub cascade_overflow: CascadeOverflow,
    pub chunked_import: bool,

    /// HTTP API 服务端口
    pub http_port: u16,
    pub log_level: String,
    /// 日志目录，未设置时输出到终端
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

/// 读取并解析环境变量，缺失或无法解析时使用默认值
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            store_backend: env_or("STORE_BACKEND", StoreBackend::Rest),
            store_base_url: std::env::var("STORE_BASE_URL")
                .unwrap_or_else(|_| doc_store::config::DEFAULT_BASE_URL.into()),
            store_project_id: std::env::var("STORE_PROJECT_ID").unwrap_or_default(),
            store_database: std::env::var("STORE_DATABASE").unwrap_or_else(|_| "(default)".into()),
            store_token: env_opt("STORE_TOKEN"),
            store_api_key: env_opt("STORE_API_KEY"),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),

            companies_root: std::env::var("COMPANIES_ROOT")
                .unwrap_or_else(|_| DEFAULT_COMPANIES_ROOT.into()),
            employees_root: std::env::var("EMPLOYEES_ROOT")
                .unwrap_or_else(|_| DEFAULT_EMPLOYEES_ROOT.into()),
            employees_fallback_root: std::env::var("EMPLOYEES_FALLBACK_ROOT")
                .unwrap_or_else(|_| DEFAULT_EMPLOYEES_FALLBACK_ROOT.into()),

            max_batch_ops: env_or("MAX_BATCH_OPS", DEFAULT_MAX_BATCH_OPS),
            migration_chunk_size: env_or("MIGRATION_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            cascade_overflow: env_or("CASCADE_OVERFLOW", CascadeOverflow::Split),
            chunked_import: env_or("CHUNKED_IMPORT", false),

            http_port: env_or("HTTP_PORT", 3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 存储客户端配置
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(self.store_project_id.clone())
            .with_base_url(self.store_base_url.clone())
            .with_database(self.store_database.clone())
            .with_timeout_ms(self.request_timeout_ms)
            .with_max_batch_ops(self.max_batch_ops);
        if let Some(token) = &self.store_token {
            config = config.with_token(token.clone());
        }
        if let Some(key) = &self.store_api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }

    /// 服务层配置
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            companies_root: self.companies_root.clone(),
            employees_root: self.employees_root.clone(),
            employees_fallback_root: self.employees_fallback_root.clone(),
            chunk_size: self.migration_chunk_size,
            cascade_overflow: self.cascade_overflow,
            chunked_import: self.chunked_import,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("MEMORY".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("rest".parse::<StoreBackend>().unwrap(), StoreBackend::Rest);
        assert!("sql".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_store_config_carries_credentials() {
        let mut config = Config::from_env();
        config.store_project_id = "shop".into();
        config.store_token = Some("t".into());
        config.max_batch_ops = 100;

        let store = config.store_config();
        assert_eq!(store.project_id, "shop");
        assert_eq!(store.token.as_deref(), Some("t"));
        assert_eq!(store.max_batch_ops, 100);
    }

    #[test]
    fn test_service_config_mirrors_layout() {
        let mut config = Config::from_env();
        config.companies_root = "tenants/a/products".into();
        config.chunked_import = true;

        let service = config.service_config();
        assert_eq!(service.companies_root, "tenants/a/products");
        assert!(service.chunked_import);
    }
}

use dashmap::DashMap;
use doc_store::{DocumentStore, MemoryStore, RestStore};
use shared::error::AppResult;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::{Config, StoreBackend};
use crate::service::{CatalogService, EmployeeState, ProductState};

/// 资源版本管理器
///
/// 每种资源类型维护独立的版本号，写操作成功后递增。
/// 轮询方通过比较版本号判断快照是否变化。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号，不存在时返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 根据配置打开存储后端
pub fn open_store(config: &Config) -> AppResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Rest => Arc::new(RestStore::new(&config.store_config())?),
        StoreBackend::Memory => Arc::new(MemoryStore::with_max_batch_ops(config.max_batch_ops)),
    };
    Ok(store)
}

/// 服务器状态
///
/// 使用 Arc 实现浅拷贝。快照由服务器持有，每个请求在锁内把快照
/// 交给 [`CatalogService`]，同一快照上的操作因此串行执行。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | service | 数据访问入口 |
/// | products | 商品快照 |
/// | employees | 员工快照 |
/// | resource_versions | 资源版本号 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub service: CatalogService<dyn DocumentStore>,
    pub products: Arc<Mutex<ProductState>>,
    pub employees: Arc<Mutex<EmployeeState>>,
    pub resource_versions: Arc<ResourceVersions>,
}

impl ServerState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let service = CatalogService::new(store, config.service_config());
        Self {
            config,
            service,
            products: Arc::new(Mutex::new(ProductState::default())),
            employees: Arc::new(Mutex::new(EmployeeState::default())),
            resource_versions: Arc::new(ResourceVersions::new()),
        }
    }

    /// 打开存储并创建状态
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let store = open_store(config)?;
        tracing::info!(backend = ?config.store_backend, "Document store ready");
        Ok(Self::new(config.clone(), store))
    }

    /// 写操作完成后调用
    pub fn bump(&self, resource: &str) -> u64 {
        self.resource_versions.increment(resource)
    }
}

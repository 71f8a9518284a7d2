//! Catalog service facade
//!
//! [`CatalogService`] holds the store and configuration only. The catalog and
//! employee snapshots belong to the caller ([`ProductState`],
//! [`EmployeeState`]) and are passed in by `&mut`. Every operation marks the
//! snapshot as loading, clears the previous error and, on failure, records an
//! operation-scoped message before returning the error.
//!
//! Single-document writes patch the snapshot in place. Subtree deletes,
//! delete-all and import re-read the whole catalog afterwards, even when they
//! fail part way.

use doc_store::{CollectionPath, DocPath, DocumentStore};
use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    CatalogStats, Employee, EmployeeCreate, EmployeeRoot, EmployeeUpdate, Product, ProductInput,
    ProductUpdate,
};
use std::sync::Arc;

use crate::catalog::cascade::CascadeOutcome;
use crate::catalog::{
    self, BulkImporter, CascadeDeleter, CascadeOverflow, CascadeRoot, CatalogWriter, PRODUCTS,
    root_collection, stats,
};
use crate::employees::registry::apply_update;
use crate::employees::{EmployeeRegistry, MigrationReport, migrator};

pub const DEFAULT_COMPANIES_ROOT: &str = "admin-data/root/products";
pub const DEFAULT_EMPLOYEES_ROOT: &str = "admin-data/root/employees";
pub const DEFAULT_EMPLOYEES_FALLBACK_ROOT: &str = "company/admin-data/employees";

/// Storage layout and write policies
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub companies_root: String,
    pub employees_root: String,
    pub employees_fallback_root: String,
    /// Chunk size for the employee sweep and split writes
    pub chunk_size: usize,
    pub cascade_overflow: CascadeOverflow,
    /// Import through the bounded executor instead of one atomic batch
    pub chunked_import: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            companies_root: DEFAULT_COMPANIES_ROOT.to_string(),
            employees_root: DEFAULT_EMPLOYEES_ROOT.to_string(),
            employees_fallback_root: DEFAULT_EMPLOYEES_FALLBACK_ROOT.to_string(),
            chunk_size: migrator::DEFAULT_CHUNK_SIZE,
            cascade_overflow: CascadeOverflow::default(),
            chunked_import: false,
        }
    }
}

/// Caller-owned catalog snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductState {
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ProductState {
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Caller-owned employee snapshot
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeState {
    pub employees: Vec<Employee>,
    pub loading: bool,
    pub error: Option<String>,
    /// Outcome of the sweep run by the last successful read
    pub last_migration: Option<MigrationReport>,
}

impl EmployeeState {
    pub fn find(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }
}

trait Tracked {
    fn status(&mut self) -> (&mut bool, &mut Option<String>);

    fn begin(&mut self) {
        let (loading, error) = self.status();
        *loading = true;
        *error = None;
    }

    fn settle<T>(&mut self, what: &str, result: AppResult<T>) -> AppResult<T> {
        let (loading, error) = self.status();
        *loading = false;
        if let Err(e) = &result {
            tracing::error!(code = %e.code, error = %e, "{}", what);
            *error = Some(what.to_string());
        }
        result
    }
}

impl Tracked for ProductState {
    fn status(&mut self) -> (&mut bool, &mut Option<String>) {
        (&mut self.loading, &mut self.error)
    }
}

impl Tracked for EmployeeState {
    fn status(&mut self) -> (&mut bool, &mut Option<String>) {
        (&mut self.loading, &mut self.error)
    }
}

/// Errors after which some writes may already have landed
pub fn may_have_written(err: &AppError) -> bool {
    matches!(
        err.code,
        ErrorCode::StoreFailure | ErrorCode::NetworkError | ErrorCode::TimeoutError
    )
}

/// Data-access and mutation entry point
pub struct CatalogService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    config: ServiceConfig,
}

impl<S: DocumentStore + ?Sized> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: DocumentStore + ?Sized> CatalogService<S> {
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn companies(&self) -> AppResult<CollectionPath> {
        root_collection(&self.config.companies_root)
    }

    fn employee_roots(&self) -> AppResult<(CollectionPath, CollectionPath)> {
        Ok((
            root_collection(&self.config.employees_root)?,
            root_collection(&self.config.employees_fallback_root)?,
        ))
    }

    /// Cross-tree scan, normalized and leaf-filtered
    async fn read_catalog(&self) -> AppResult<Vec<Product>> {
        let docs = self.store.collection_group(PRODUCTS).await?;
        let scanned = docs.len();
        let products: Vec<Product> = docs.iter().filter_map(catalog::classify).collect();
        tracing::debug!(scanned, leaves = products.len(), "Catalog read");
        Ok(products)
    }

    /// Re-read after a multi-document write; a failed re-read keeps the old
    /// snapshot and is only logged
    async fn resync(&self, state: &mut ProductState) {
        match self.read_catalog().await {
            Ok(products) => state.products = products,
            Err(e) => tracing::warn!(error = %e, "Catalog re-read failed, snapshot may be stale"),
        }
    }

    /// Stored path of a snapshot product; fails before any network call
    fn product_path(state: &ProductState, id: &str) -> AppResult<(DocPath, Product)> {
        let product = state
            .find(id)
            .filter(|p| p.path.is_some())
            .ok_or_else(|| AppError::path_missing(id))?;
        let path = product
            .path
            .as_deref()
            .and_then(|raw| DocPath::parse(raw).ok())
            .ok_or_else(|| AppError::path_missing(id))?;
        Ok((path, product.clone()))
    }

    // ========== Products ==========

    pub async fn fetch_products<'s>(&self, state: &'s mut ProductState) -> AppResult<&'s [Product]> {
        state.begin();
        let result = self.read_catalog().await;
        let result = state.settle("Failed to fetch products", result);
        state.products = result?;
        Ok(&state.products)
    }

    pub async fn add_product(&self, state: &mut ProductState, input: &ProductInput) -> AppResult<Product> {
        state.begin();
        let result = async {
            let companies = self.companies()?;
            CatalogWriter::new(self.store.as_ref(), &companies)
                .add_product(input)
                .await
        }
        .await;
        let product = state.settle("Failed to add product", result)?;
        state.products.push(product.clone());
        Ok(product)
    }

    pub async fn update_product(
        &self,
        state: &mut ProductState,
        id: &str,
        update: &ProductUpdate,
    ) -> AppResult<Product> {
        state.begin();
        let target = Self::product_path(state, id);
        let result = async {
            let (path, current) = target?;
            let companies = self.companies()?;
            CatalogWriter::new(self.store.as_ref(), &companies)
                .update_product(&path, &current, update)
                .await
        }
        .await;
        let product = state.settle("Failed to update product", result)?;
        if let Some(slot) = state.products.iter_mut().find(|p| p.id == id) {
            *slot = product.clone();
        }
        Ok(product)
    }

    pub async fn delete_product(&self, state: &mut ProductState, id: &str) -> AppResult<()> {
        state.begin();
        let target = Self::product_path(state, id);
        let result = async {
            let (path, _) = target?;
            let companies = self.companies()?;
            CatalogWriter::new(self.store.as_ref(), &companies)
                .delete_product(&path)
                .await
        }
        .await;
        state.settle("Failed to delete product", result)?;
        state.products.retain(|p| p.id != id);
        Ok(())
    }

    /// Delete every leaf product; ancestor documents are left in place
    pub async fn delete_all_products(&self, state: &mut ProductState) -> AppResult<usize> {
        state.begin();
        let result = async {
            let companies = self.companies()?;
            let leaves: Vec<DocPath> = self
                .store
                .collection_group(PRODUCTS)
                .await?
                .into_iter()
                .map(|d| d.path)
                .filter(catalog::is_leaf_path)
                .collect();
            self.deleter(&companies).delete_paths(leaves).await
        }
        .await;
        self.finish_bulk(state, "Failed to delete all products", result)
            .await
            .map(|outcome| outcome.deleted)
    }

    pub async fn delete_company_hierarchy(
        &self,
        state: &mut ProductState,
        company: &str,
    ) -> AppResult<CascadeOutcome> {
        self.delete_hierarchy(state, "Failed to delete company", CascadeRoot::company(company))
            .await
    }

    pub async fn delete_category_hierarchy(
        &self,
        state: &mut ProductState,
        company: &str,
        category: &str,
    ) -> AppResult<CascadeOutcome> {
        self.delete_hierarchy(
            state,
            "Failed to delete category",
            CascadeRoot::category(company, category),
        )
        .await
    }

    pub async fn delete_subcategory_hierarchy(
        &self,
        state: &mut ProductState,
        company: &str,
        category: &str,
        subcategory: &str,
    ) -> AppResult<CascadeOutcome> {
        self.delete_hierarchy(
            state,
            "Failed to delete subcategory",
            CascadeRoot::subcategory(company, category, subcategory),
        )
        .await
    }

    async fn delete_hierarchy(
        &self,
        state: &mut ProductState,
        what: &str,
        root: AppResult<CascadeRoot>,
    ) -> AppResult<CascadeOutcome> {
        state.begin();
        let result = async {
            let root = root?;
            let companies = self.companies()?;
            self.deleter(&companies).delete(&root).await
        }
        .await;
        self.finish_bulk(state, what, result).await
    }

    /// Import records; returns how many products were written
    pub async fn import_products(
        &self,
        state: &mut ProductState,
        records: &[ProductInput],
    ) -> AppResult<usize> {
        state.begin();
        let result = async {
            let companies = self.companies()?;
            let mut importer = BulkImporter::new(self.store.as_ref(), &companies);
            if self.config.chunked_import {
                importer = importer.chunked(self.config.chunk_size);
            }
            importer.import(records).await
        }
        .await;
        self.finish_bulk(state, "Failed to import products", result)
            .await
    }

    fn deleter<'a>(&'a self, companies: &'a CollectionPath) -> CascadeDeleter<'a, S> {
        CascadeDeleter::new(
            self.store.as_ref(),
            companies,
            self.config.cascade_overflow,
            self.config.chunk_size,
        )
    }

    /// Re-read after a multi-document write, then settle
    async fn finish_bulk<T>(
        &self,
        state: &mut ProductState,
        what: &str,
        result: AppResult<T>,
    ) -> AppResult<T> {
        let wrote = match &result {
            Ok(_) => true,
            Err(e) => may_have_written(e),
        };
        if wrote {
            self.resync(state).await;
        }
        state.settle(what, result)
    }

    // ========== Employees ==========

    /// Merged registry; sweeps the deprecated field as a side effect
    pub async fn fetch_employees<'s>(
        &self,
        state: &'s mut EmployeeState,
    ) -> AppResult<&'s [Employee]> {
        state.begin();
        let result = async {
            let (primary, fallback) = self.employee_roots()?;
            EmployeeRegistry::new(self.store.as_ref(), &primary, &fallback)
                .fetch(self.config.chunk_size)
                .await
        }
        .await;
        let (employees, report) = state.settle("Failed to fetch employees", result)?;
        state.employees = employees;
        state.last_migration = Some(report);
        Ok(&state.employees)
    }

    pub async fn add_employee(
        &self,
        state: &mut EmployeeState,
        create: &EmployeeCreate,
    ) -> AppResult<Employee> {
        state.begin();
        let result = async {
            let (primary, fallback) = self.employee_roots()?;
            EmployeeRegistry::new(self.store.as_ref(), &primary, &fallback)
                .add(create)
                .await
        }
        .await;
        let employee = state.settle("Failed to add employee", result)?;
        state.employees.push(employee.clone());
        Ok(employee)
    }

    /// Update in whichever root the record was read from (primary if unknown)
    pub async fn update_employee(
        &self,
        state: &mut EmployeeState,
        id: &str,
        update: &EmployeeUpdate,
    ) -> AppResult<Employee> {
        state.begin();
        let current = state.find(id).cloned();
        let root = current.as_ref().map(|e| e.root).unwrap_or_default();
        let result = async {
            let (primary, fallback) = self.employee_roots()?;
            let registry = EmployeeRegistry::new(self.store.as_ref(), &primary, &fallback);
            let updated_at = registry.update(id, root, update).await?;
            match current {
                Some(mut employee) => {
                    apply_update(&mut employee, update, &updated_at);
                    Ok(employee)
                }
                None => registry
                    .get(id, root)
                    .await?
                    .ok_or_else(|| AppError::employee_not_found(id)),
            }
        }
        .await;
        let employee = state.settle("Failed to update employee", result)?;
        match state.employees.iter_mut().find(|e| e.id == id) {
            Some(slot) => *slot = employee.clone(),
            None => state.employees.push(employee.clone()),
        }
        Ok(employee)
    }

    pub async fn delete_employee(&self, state: &mut EmployeeState, id: &str) -> AppResult<()> {
        state.begin();
        let root = Self::employee_root(state, id);
        let result = async {
            let (primary, fallback) = self.employee_roots()?;
            EmployeeRegistry::new(self.store.as_ref(), &primary, &fallback)
                .delete(id, root)
                .await
        }
        .await;
        state.settle("Failed to delete employee", result)?;
        state.employees.retain(|e| e.id != id);
        Ok(())
    }

    fn employee_root(state: &EmployeeState, id: &str) -> EmployeeRoot {
        state.find(id).map(|e| e.root).unwrap_or_default()
    }

    // ========== Statistics ==========

    pub fn stats(&self, products: &ProductState, employees: &EmployeeState) -> CatalogStats {
        stats::compute(&products.products, employees.employees.len())
    }
}

//! Employee registry over two storage roots
//!
//! Records live under the primary root; older ones may still sit under the
//! deprecated fallback root. Both are read and merged into one set, and each
//! record keeps track of the root it came from so writes land in place.

use chrono::Utc;
use doc_store::{CollectionPath, DocPath, Document, DocumentStore, Fields, StoreError};
use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Employee, EmployeeCreate, EmployeeRoot, EmployeeUpdate, default_role};
use std::collections::HashSet;

use super::migrator::{BoundedBatchMigrator, DEPRECATED_FIELD, MigrationReport};

/// Stored fields the app sometimes wrote as numbers
const TEXT_FIELDS: [&str; 5] = ["name", "mobile", "loginId", "password", "role"];

/// Timestamps older clients stored as epoch millis
const STAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// Text rendering of a loosely typed scalar; `None` for null and containers
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Employee record for a stored document
///
/// Loosely typed fields are coerced rather than rejected: null counts as
/// absent and scalars become text. Only a document without a usable id
/// yields `None`.
pub fn to_employee(doc: &Document, root: EmployeeRoot) -> Option<Employee> {
    let id = doc.id();
    if id.trim().is_empty() {
        tracing::warn!(path = %doc.path, "Skipping employee record without an id");
        return None;
    }

    let mut fields = doc.fields.clone();
    fields.remove(DEPRECATED_FIELD);
    fields.retain(|_, value| !value.is_null());
    for key in TEXT_FIELDS.iter().chain(STAMP_FIELDS.iter()) {
        let Some(value) = fields.remove(*key) else {
            continue;
        };
        match as_text(&value) {
            Some(text) => {
                fields.insert(key.to_string(), Value::String(text));
            }
            None => tracing::debug!(path = %doc.path, field = *key, "Dropping non-text employee field"),
        }
    }
    fields.insert("id".into(), json!(id));
    fields.insert("root".into(), json!(root));

    match serde_json::from_value::<Employee>(Value::Object(fields.clone())) {
        Ok(employee) => Some(employee),
        Err(e) => {
            tracing::warn!(path = %doc.path, error = %e, "Employee record kept with defaults");
            fields.remove("id");
            fields.remove("root");
            Some(Employee {
                id: id.to_string(),
                name: String::new(),
                mobile: String::new(),
                login_id: String::new(),
                password: String::new(),
                role: default_role(),
                created_at: None,
                updated_at: None,
                root,
                extra: fields,
            })
        }
    }
}

/// Keep the first record per id; primary-root records come first
fn dedupe(records: impl IntoIterator<Item = Employee>) -> Vec<Employee> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|employee| seen.insert(employee.id.clone()))
        .collect()
}

/// Apply a partial update to an in-memory record
pub fn apply_update(employee: &mut Employee, update: &EmployeeUpdate, updated_at: &str) {
    if let Some(name) = &update.name {
        employee.name = name.clone();
    }
    if let Some(mobile) = &update.mobile {
        employee.mobile = mobile.clone();
        employee.login_id = mobile.clone();
    }
    if let Some(password) = &update.password {
        employee.password = password.clone();
    }
    employee.updated_at = Some(updated_at.to_string());
    employee.extra.remove(DEPRECATED_FIELD);
}

fn mobile_required() -> AppError {
    AppError::new(ErrorCode::EmployeeMobileRequired).with_detail("field", "mobile")
}

pub struct EmployeeRegistry<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    primary: &'a CollectionPath,
    fallback: &'a CollectionPath,
}

impl<'a, S: DocumentStore + ?Sized> EmployeeRegistry<'a, S> {
    pub fn new(store: &'a S, primary: &'a CollectionPath, fallback: &'a CollectionPath) -> Self {
        Self {
            store,
            primary,
            fallback,
        }
    }

    fn collection(&self, root: EmployeeRoot) -> &CollectionPath {
        match root {
            EmployeeRoot::Primary => self.primary,
            EmployeeRoot::Fallback => self.fallback,
        }
    }

    fn doc_path(&self, id: &str, root: EmployeeRoot) -> AppResult<DocPath> {
        self.collection(root)
            .doc(id)
            .map_err(|_| AppError::employee_not_found(id))
    }

    /// Read both roots; one unreadable root is skipped with a warning
    async fn read_roots(&self) -> AppResult<Vec<(EmployeeRoot, Document)>> {
        let mut docs = Vec::new();
        let mut failures = Vec::new();

        for root in [EmployeeRoot::Primary, EmployeeRoot::Fallback] {
            let collection = self.collection(root);
            match self.store.list(collection).await {
                Ok(found) => docs.extend(found.into_iter().map(|d| (root, d))),
                Err(e) => {
                    tracing::warn!(root = %collection, error = %e, "Employee root unreadable, skipping");
                    failures.push(e);
                }
            }
        }

        if failures.len() == 2 {
            let detail: Vec<String> = failures.iter().map(StoreError::to_string).collect();
            return Err(AppError::store(format!(
                "Both employee roots unreadable: {}",
                detail.join("; ")
            )));
        }
        Ok(docs)
    }

    /// Merged registry, with the deprecated field swept as a side effect
    pub async fn fetch(&self, chunk_size: usize) -> AppResult<(Vec<Employee>, MigrationReport)> {
        let docs = self.read_roots().await?;

        let plain: Vec<Document> = docs.iter().map(|(_, d)| d.clone()).collect();
        let report = BoundedBatchMigrator::new(self.store, chunk_size)
            .sweep(&plain)
            .await;

        let employees = dedupe(docs.iter().filter_map(|(root, doc)| to_employee(doc, *root)));
        Ok((employees, report))
    }

    /// Read one record from the given root
    pub async fn get(&self, id: &str, root: EmployeeRoot) -> AppResult<Option<Employee>> {
        let path = self.doc_path(id, root)?;
        Ok(self
            .store
            .get(&path)
            .await?
            .and_then(|doc| to_employee(&doc, root)))
    }

    /// Create a record under the primary root
    pub async fn add(&self, create: &EmployeeCreate) -> AppResult<Employee> {
        let mobile = create.mobile.trim();
        if mobile.is_empty() {
            return Err(mobile_required());
        }
        if create.name.trim().is_empty() {
            return Err(AppError::validation("Employee name is required").with_detail("field", "name"));
        }

        let created_at = Utc::now().to_rfc3339();
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(create.name.trim()));
        fields.insert("mobile".into(), json!(mobile));
        fields.insert("loginId".into(), json!(mobile));
        fields.insert("password".into(), json!(create.password));
        fields.insert("role".into(), json!(default_role()));
        fields.insert("createdAt".into(), json!(created_at));

        let doc = self.store.add(self.primary, fields).await?;
        tracing::info!(id = %doc.id(), "Employee added");
        to_employee(&doc, EmployeeRoot::Primary)
            .ok_or_else(|| AppError::internal("Written employee record is unreadable"))
    }

    /// Partial update; returns the `updatedAt` stamp written
    pub async fn update(
        &self,
        id: &str,
        root: EmployeeRoot,
        update: &EmployeeUpdate,
    ) -> AppResult<String> {
        let mut fields = Fields::new();
        if let Some(name) = &update.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(mobile) = &update.mobile {
            if mobile.trim().is_empty() {
                return Err(mobile_required());
            }
            fields.insert("mobile".into(), json!(mobile));
            fields.insert("loginId".into(), json!(mobile));
        }
        if let Some(password) = &update.password {
            fields.insert("password".into(), json!(password));
        }
        let updated_at = Utc::now().to_rfc3339();
        fields.insert("updatedAt".into(), json!(updated_at));

        let path = self.doc_path(id, root)?;
        self.store
            .update(&path, fields, vec![DEPRECATED_FIELD.to_string()])
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AppError::employee_not_found(id),
                other => other.into(),
            })?;
        tracing::info!(id, ?root, "Employee updated");
        Ok(updated_at)
    }

    pub async fn delete(&self, id: &str, root: EmployeeRoot) -> AppResult<()> {
        let path = self.doc_path(id, root)?;
        self.store.delete(&path).await?;
        tracing::info!(id, ?root, "Employee deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::MemoryStore;

    fn roots() -> (CollectionPath, CollectionPath) {
        (
            CollectionPath::parse("admin-data/root/employees").unwrap(),
            CollectionPath::parse("company/admin-data/employees").unwrap(),
        )
    }

    fn seed(store: &MemoryStore, collection: &CollectionPath, id: &str, value: Value) {
        store.insert(
            collection.doc(id).unwrap(),
            value.as_object().cloned().unwrap_or_default(),
        );
    }

    #[test]
    fn test_to_employee_strips_email_and_coerces_numbers() {
        let doc = Document::new(
            DocPath::parse("staff/e1").unwrap(),
            json!({ "name": "Priya", "mobile": 9876543210u64, "email": "p@x.in" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let employee = to_employee(&doc, EmployeeRoot::Fallback).unwrap();
        assert_eq!(employee.id, "e1");
        assert_eq!(employee.mobile, "9876543210");
        assert_eq!(employee.root, EmployeeRoot::Fallback);
        assert!(!employee.extra.contains_key("email"));
    }

    #[test]
    fn test_to_employee_tolerates_nulls_and_numeric_stamps() {
        let doc = Document::new(
            DocPath::parse("staff/e7").unwrap(),
            json!({
                "name": null,
                "mobile": "1",
                "role": null,
                "createdAt": 1700000000000u64,
                "updatedAt": null,
                "tags": ["night"]
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let employee = to_employee(&doc, EmployeeRoot::Primary).unwrap();
        assert_eq!(employee.name, "");
        assert_eq!(employee.role, "employee");
        assert_eq!(employee.created_at.as_deref(), Some("1700000000000"));
        assert!(employee.updated_at.is_none());
        assert_eq!(employee.extra["tags"], json!(["night"]));
    }

    #[test]
    fn test_to_employee_drops_container_text_fields() {
        let doc = Document::new(
            DocPath::parse("staff/e8").unwrap(),
            json!({ "name": { "first": "Asha" }, "mobile": true })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let employee = to_employee(&doc, EmployeeRoot::Fallback).unwrap();
        assert_eq!(employee.id, "e8");
        assert_eq!(employee.name, "");
        assert_eq!(employee.mobile, "true");
    }

    #[test]
    fn test_to_employee_needs_an_id() {
        let doc = Document::new(DocPath::parse("staff/ ").unwrap(), Fields::new());
        assert!(to_employee(&doc, EmployeeRoot::Primary).is_none());
    }

    #[test]
    fn test_dedupe_keeps_first_record_per_id() {
        let record = |id: &str, name: &str, root| {
            let path = CollectionPath::parse("staff").unwrap().doc(id).unwrap();
            let doc = Document::new(path, json!({ "name": name }).as_object().cloned().unwrap());
            to_employee(&doc, root).unwrap()
        };
        let merged = dedupe(vec![
            record("e1", "Current", EmployeeRoot::Primary),
            record("e1", "Stale", EmployeeRoot::Fallback),
            record("e2", "Old", EmployeeRoot::Fallback),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Current");
        assert_eq!(merged[0].root, EmployeeRoot::Primary);
        assert_eq!(merged[1].id, "e2");
    }

    #[tokio::test]
    async fn test_fetch_merges_roots_primary_wins() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        seed(&store, &primary, "e1", json!({ "name": "Current", "mobile": "1" }));
        seed(&store, &fallback, "e1", json!({ "name": "Stale", "mobile": "1" }));
        seed(&store, &fallback, "e2", json!({ "name": "Old", "mobile": "2", "email": "o@x.in" }));

        let registry = EmployeeRegistry::new(&store, &primary, &fallback);
        let (employees, report) = registry.fetch(400).await.unwrap();

        assert_eq!(employees.len(), 2);
        let e1 = employees.iter().find(|e| e.id == "e1").unwrap();
        assert_eq!(e1.name, "Current");
        assert_eq!(e1.root, EmployeeRoot::Primary);
        assert_eq!(report.cleared, 1);
    }

    #[tokio::test]
    async fn test_fetch_survives_one_root() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        seed(&store, &primary, "e1", json!({ "name": "A", "mobile": "1" }));
        store.fail_reads(&fallback.to_string());

        let registry = EmployeeRegistry::new(&store, &primary, &fallback);
        let (employees, _) = registry.fetch(400).await.unwrap();
        assert_eq!(employees.len(), 1);

        store.fail_reads(&primary.to_string());
        let err = registry.fetch(400).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreFailure);
    }

    #[tokio::test]
    async fn test_add_sets_defaults() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        let registry = EmployeeRegistry::new(&store, &primary, &fallback);

        let employee = registry
            .add(&EmployeeCreate {
                name: "Rajesh".into(),
                mobile: "+91 98765".into(),
                password: "emp123".into(),
            })
            .await
            .unwrap();

        assert_eq!(employee.login_id, "+91 98765");
        assert_eq!(employee.role, "employee");
        assert!(employee.created_at.is_some());
        let stored = store.fields(&primary.doc(&employee.id).unwrap()).unwrap();
        assert_eq!(stored["password"], json!("emp123"));
    }

    #[tokio::test]
    async fn test_add_requires_mobile() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        let err = EmployeeRegistry::new(&store, &primary, &fallback)
            .add(&EmployeeCreate {
                name: "A".into(),
                mobile: "  ".into(),
                password: "x".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmployeeMobileRequired);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_targets_fallback_root() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        seed(&store, &fallback, "e2", json!({ "name": "Old", "mobile": "2", "email": "o@x.in", "role": "employee" }));
        let registry = EmployeeRegistry::new(&store, &primary, &fallback);

        let update = EmployeeUpdate {
            mobile: Some("3".into()),
            ..Default::default()
        };
        registry.update("e2", EmployeeRoot::Fallback, &update).await.unwrap();

        let stored = store.fields(&fallback.doc("e2").unwrap()).unwrap();
        assert_eq!(stored["loginId"], json!("3"));
        assert_eq!(stored["role"], json!("employee"));
        assert!(!stored.contains_key("email"));
        assert!(stored.contains_key("updatedAt"));
        assert!(!store.contains(&primary.doc("e2").unwrap()));
    }

    #[tokio::test]
    async fn test_update_missing_employee() {
        let store = MemoryStore::new();
        let (primary, fallback) = roots();
        let err = EmployeeRegistry::new(&store, &primary, &fallback)
            .update("ghost", EmployeeRoot::Primary, &EmployeeUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmployeeNotFound);
    }
}

//! Employee API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::{Employee, EmployeeCreate, EmployeeUpdate};

use crate::api::EMPLOYEES_RESOURCE;
use crate::core::ServerState;
use crate::employees::MigrationReport;

#[derive(Debug, Serialize)]
pub struct EmployeeList {
    pub employees: Vec<Employee>,
    /// Deprecated-field sweep run by this read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationReport>,
}

/// Merged registry from both roots
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<EmployeeList>> {
    let mut employees = state.employees.lock().await;
    let list = state.service.fetch_employees(&mut employees).await?.to_vec();
    if employees.last_migration.as_ref().is_some_and(|m| m.cleared > 0) {
        state.bump(EMPLOYEES_RESOURCE);
    }
    Ok(ApiResponse::success(EmployeeList {
        employees: list,
        migration: employees.last_migration.clone(),
    }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<ApiResponse<Employee>> {
    let mut employees = state.employees.lock().await;
    let employee = state.service.add_employee(&mut employees, &payload).await?;
    state.bump(EMPLOYEES_RESOURCE);
    Ok(ApiResponse::success_with_message("Employee added", employee))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<EmployeeUpdate>,
) -> AppResult<ApiResponse<Employee>> {
    let mut employees = state.employees.lock().await;
    let employee = state
        .service
        .update_employee(&mut employees, &id, &payload)
        .await?;
    state.bump(EMPLOYEES_RESOURCE);
    Ok(ApiResponse::success_with_message("Employee updated", employee))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let mut employees = state.employees.lock().await;
    state.service.delete_employee(&mut employees, &id).await?;
    state.bump(EMPLOYEES_RESOURCE);
    Ok(ApiResponse::ok())
}

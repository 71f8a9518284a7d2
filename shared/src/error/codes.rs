//! Unified error codes for the catalog admin workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 6xxx: Catalog (product hierarchy) errors
//! - 8xxx: Employee registry errors
//! - 9xxx: System / document store errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the admin frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 6xxx: Catalog ====================
    /// Product not found in the local snapshot
    ProductNotFound = 6001,
    /// Price or minimum price is negative or not a finite number
    ProductInvalidPrice = 6002,
    /// Product has no recorded storage path
    ProductPathMissing = 6003,
    /// Company / category / subcategory name is blank
    HierarchyNameRequired = 6101,
    /// Import file could not be parsed into product records
    ImportInvalidRecord = 6201,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Employee mobile number is required
    EmployeeMobileRequired = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Document store round trip failed
    StoreFailure = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Queued writes exceed the store's per-batch ceiling
    BatchOverflow = 9401,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product price must be a non-negative number",
            ErrorCode::ProductPathMissing => "Product path not found",
            ErrorCode::HierarchyNameRequired => "Company, category and subcategory names are required",
            ErrorCode::ImportInvalidRecord => "Import record is invalid",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmployeeMobileRequired => "Employee mobile number is required",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StoreFailure => "Document store operation failed",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::BatchOverflow => "Too many operations for a single atomic batch",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductPathMissing),
            6101 => Ok(ErrorCode::HierarchyNameRequired),
            6201 => Ok(ErrorCode::ImportInvalidRecord),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8002 => Ok(ErrorCode::EmployeeMobileRequired),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StoreFailure),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::BatchOverflow),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::ProductPathMissing.code(), 6003);
        assert_eq!(ErrorCode::EmployeeNotFound.code(), 8001);
        assert_eq!(ErrorCode::StoreFailure.code(), 9002);
        assert_eq!(ErrorCode::BatchOverflow.code(), 9401);
    }

    #[test]
    fn test_try_from_roundtrips_known_codes() {
        for code in [
            ErrorCode::InvalidFormat,
            ErrorCode::ProductInvalidPrice,
            ErrorCode::HierarchyNameRequired,
            ErrorCode::EmployeeMobileRequired,
            ErrorCode::BatchOverflow,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_rejects_unknown_value() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        // retired codes
        for value in [1, 4, 7, 8, 8003] {
            assert_eq!(ErrorCode::try_from(value), Err(InvalidErrorCode(value)));
        }
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ProductPathMissing).unwrap();
        assert_eq!(json, "6003");
        let code: ErrorCode = serde_json::from_str("9401").unwrap();
        assert_eq!(code, ErrorCode::BatchOverflow);
    }
}

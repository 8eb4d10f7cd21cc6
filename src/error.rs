//! Error types for the payroll core.
//!
//! Every fallible operation in the service returns [`AppError`]. The variants
//! follow the failure classes the API distinguishes for callers: a missing
//! entity, an operation forbidden by current status, bad input, an external
//! collaborator being down, and a store failure that rolled back.

use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced run/grade/mapping/workflow does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// The entity's current status forbids the attempted operation.
    #[error("{entity} {id} is '{status}': {message}")]
    InvalidState {
        entity: &'static str,
        id: u64,
        status: String,
        message: String,
    },

    /// Missing or contradictory input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An external collaborator failed. Only surfaced when the operation
    /// cannot degrade; the engine normally logs and substitutes zero.
    #[error("dependency '{name}' unavailable: {message}")]
    DependencyUnavailable { name: &'static str, message: String },

    /// A multi-step cascade failed and was rolled back. Surfaced as a single
    /// opaque failure, never partially applied.
    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn invalid_state(
        entity: &'static str,
        id: u64,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AppError::InvalidState {
            entity,
            id,
            status: status.into(),
            message: message.into(),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidState { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DependencyUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Transaction(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store errors are logged with detail but reported opaquely.
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "Internal Server Error".to_string()
            }
            AppError::Transaction(e) => {
                tracing::error!(error = %e, "transaction rolled back");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = AppError::not_found("payroll run", 42);
        assert_eq!(error.to_string(), "payroll run 42 not found");
    }

    #[test]
    fn test_invalid_state_displays_status() {
        let error = AppError::invalid_state(
            "grade revision",
            7,
            "implemented",
            "already implemented",
        );
        assert_eq!(
            error.to_string(),
            "grade revision 7 is 'implemented': already implemented"
        );
    }

    #[test]
    fn test_status_codes() {
        use actix_web::ResponseError;

        assert_eq!(
            AppError::not_found("payslip", 1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::invalid_state("run", 1, "locked", "locked").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DependencyUnavailable {
                name: "deductions",
                message: "timeout".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<(), AppError> {
            Err(AppError::Validation("missing field".into()))
        }

        fn outer() -> Result<(), AppError> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}

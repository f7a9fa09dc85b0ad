//! Error handling for the Libris HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use libris_authz::Denied;
use libris_db::StoreError;
use libris_kernel::ValidationErrors;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Envelope used for every non-validation error
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    /// Field and record-level validation failures, rendered as a flat
    /// `field -> [messages]` map.
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String, code: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: "unauthorized".to_string(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            code: "forbidden".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<Denied> for AppError {
    fn from(_: Denied) -> Self {
        Self::forbidden("You do not have permission to perform this action.")
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                Self::not_found(format!("No {entity} matches id {id}."))
            }
            // Race losers that slipped past the policy checks.
            StoreError::UniqueViolation { .. } => Self::Validation(ValidationErrors::non_field(
                "A record with these values already exists.",
            )),
            StoreError::ForeignKeyViolation { .. } => Self::Validation(
                ValidationErrors::non_field("A referenced record does not exist."),
            ),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, error_code, message) = match self {
            AppError::Validation(errors) => {
                tracing::info!(error_id = %error_id, %errors, "request rejected by validation");
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            AppError::NotFound { message, code } => (StatusCode::NOT_FOUND, code, message),
            AppError::Unauthorized { message, code } => (StatusCode::UNAUTHORIZED, code, message),
            AppError::Forbidden { message, code } => (StatusCode::FORBIDDEN, code, message),
            AppError::BadRequest { message, code } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
                format!("{e:#}"),
            ),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                %message,
                "Request error"
            );
        } else {
            tracing::info!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "Request error"
            );
        }

        // Hide internal error details from clients in release builds
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = ErrorBody {
            code: error_code,
            message,
            details: Vec::new(),
            trace_id: error_id.to_string(),
            timestamp,
        };

        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use libris_authz::{Caller, Entity, Operation};
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_as_field_map() {
        let mut errors = ValidationErrors::field("year", "Year must be between 1000 and 9999.");
        errors.add_non_field("duplicate");

        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["year"][0], "Year must be between 1000 and 9999.");
        assert_eq!(body["non_field_errors"][0], "duplicate");
    }

    #[tokio::test]
    async fn not_found_uses_error_envelope() {
        let response = AppError::not_found("Test resource not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "Test resource not found");
        assert!(Uuid::parse_str(body["error"]["trace_id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn envelope_fields_lead_with_code() {
        let body = ErrorBody {
            code: "not_found".to_string(),
            message: "gone".to_string(),
            details: Vec::new(),
            trace_id: "t".to_string(),
            timestamp: "now".to_string(),
        };
        let text = serde_json::to_string(&body).unwrap();
        let position = |key: &str| text.find(&format!("\"{key}\"")).unwrap();
        assert!(position("code") < position("message"));
        assert!(position("message") < position("details"));
    }

    #[test]
    fn denied_maps_to_forbidden() {
        let denied = Denied {
            entity: Entity::Book,
            operation: Operation::Create,
            caller: Caller::User,
        };
        let response = AppError::from(denied).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_unique_violation_becomes_record_level_error() {
        let err = AppError::from(StoreError::UniqueViolation {
            message: "UNIQUE constraint failed: book.title".to_string(),
        });
        match err {
            AppError::Validation(errors) => assert_eq!(errors.non_field_messages().len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let error = AppError::Internal(internal_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

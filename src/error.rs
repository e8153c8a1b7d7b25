use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

use crate::schemas::{ExpenseId, PersonId};

pub type Result<T> = std::result::Result<T, SplitError>;

#[derive(Error, Debug, PartialEq)]
pub enum SplitError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A person named `{0}` already exists")]
    DuplicateName(String),

    #[error("Person not found: {0}")]
    PersonNotFound(PersonId),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Session unavailable")]
    SessionUnavailable,
}

impl ResponseError for SplitError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SplitError::Validation(_) => StatusCode::BAD_REQUEST,
            SplitError::DuplicateName(_) => StatusCode::CONFLICT,
            SplitError::PersonNotFound(_) | SplitError::ExpenseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SplitError::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl SplitError {
    fn error_type(&self) -> &str {
        match self {
            SplitError::Validation(_) => "validation_error",
            SplitError::DuplicateName(_) => "duplicate_name",
            SplitError::PersonNotFound(_) => "person_not_found",
            SplitError::ExpenseNotFound(_) => "expense_not_found",
            SplitError::SessionUnavailable => "internal_error",
        }
    }
}

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::dispatch::DispatchError;
use crate::repo::RepoError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Missing required fields")] MissingFields(Vec<&'static str>),
    #[error("Bad request")] BadRequest(String),
    #[error("Unauthorized")] Unauthorized(String),
    #[error("Forbidden")] Forbidden(String),
    #[error("Not found")] NotFound,
    #[error("Conflict")] Conflict,
    #[error("Too many requests")] TooManyRequests,
    #[error("Request timed out")] Timeout,
    #[error("Internal server error")] Internal(String),
}

impl ApiError {
    fn details(&self) -> Option<String> {
        match self {
            ApiError::MissingFields(fields) => Some(fields.join(", ")),
            ApiError::BadRequest(d)
            | ApiError::Unauthorized(d)
            | ApiError::Forbidden(d)
            | ApiError::Internal(d) => Some(d.clone()),
            _ => None,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::NotFound,
            RepoError::Conflict => ApiError::Conflict,
            RepoError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NotFound(_) => ApiError::NotFound,
            DispatchError::NotApplicable { .. } => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::MissingFields(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

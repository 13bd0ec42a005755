use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Business-rule and caller failures surfaced by the attendance API.
/// None of these are retried: they are legitimate rejections, not
/// transient faults.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Already checked in, check out first")]
    AlreadyCheckedIn,

    #[error("No open attendance session to check out")]
    NoOpenSession,

    #[error("{0}")]
    InvalidInput(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to generate report: {0}")]
    QueryFailed(String),

    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AlreadyCheckedIn => "already_checked_in",
            ApiError::NoOpenSession => "no_open_session",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::UserNotFound => "user_not_found",
            ApiError::QueryFailed(_) => "query_failed",
            ApiError::Internal => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AlreadyCheckedIn
            | ApiError::NoOpenSession
            | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::QueryFailed(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "kind": self.kind(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rejections_are_bad_request() {
        assert_eq!(ApiError::AlreadyCheckedIn.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoOpenSession.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidInput("latitude is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn lookup_and_store_failures_map_to_404_and_500() {
        assert_eq!(ApiError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::QueryFailed("connection refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ApiError::AlreadyCheckedIn.kind(), "already_checked_in");
        assert_eq!(ApiError::NoOpenSession.kind(), "no_open_session");
        assert_eq!(ApiError::QueryFailed("x".into()).kind(), "query_failed");
    }

    #[test]
    fn query_failed_carries_store_diagnostic() {
        let err = ApiError::QueryFailed("pool timed out".into());
        assert!(err.to_string().contains("pool timed out"));
    }
}

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use boost_pricing::PricingError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    BadRequest(String),
    InvalidRange(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, code) = match self {
            AppError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "DATABASE_ERROR")
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::InvalidRange(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_RANGE"),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            AppError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "INTERNAL_ERROR")
            }
        };
        (
            status,
            Json(ErrorResponse {
                message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("database error: {e}");
        AppError::DatabaseError(e.to_string())
    }
}

impl From<eyre::Error> for AppError {
    fn from(e: eyre::Error) -> Self {
        tracing::error!("{e:#}");
        if e.downcast_ref::<sqlx::Error>().is_some() {
            AppError::DatabaseError(format!("{e:#}"))
        } else {
            AppError::InternalError(e.to_string())
        }
    }
}

impl From<PricingError> for AppError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::InvalidRange { .. } => AppError::InvalidRange(e.to_string()),
            PricingError::InvalidInput(_) => AppError::BadRequest(e.to_string()),
            PricingError::InvalidTierTable(_) | PricingError::InvalidConfig(_) => {
                AppError::InternalError(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_errors_map_to_codes() {
        let range = AppError::from(PricingError::InvalidRange {
            start: 1500,
            target: 1200,
        });
        assert!(matches!(range, AppError::InvalidRange(_)));

        let input = AppError::from(PricingError::InvalidInput("missing".into()));
        assert!(matches!(input, AppError::BadRequest(_)));

        let response = AppError::Conflict("taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn wrapped_sqlx_errors_stay_database_errors() {
        use eyre::WrapErr;

        let report = Err::<(), _>(sqlx::Error::RowNotFound)
            .wrap_err("get order")
            .unwrap_err();
        assert!(matches!(AppError::from(report), AppError::DatabaseError(_)));
        assert!(matches!(
            AppError::from(eyre::eyre!("boom")),
            AppError::InternalError(_)
        ));
    }
}

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    RequestValidationError(#[from] garde::Report),
    #[error("サイトタイプ（{0}）が見つかりませんでした。")]
    SiteTypeNotFound(String),
    #[error("装備（{0}）が見つかりませんでした。")]
    EquipmentNotFound(String),
    #[error("予約（{0}）が見つかりませんでした。")]
    BookingNotFound(String),
    #[error("指定期間に空いているサイトがありません。")]
    NoSiteAvailable,
    #[error("装備「{name}」の在庫が不足しています（要求 {requested}、残り {available}）。")]
    InsufficientEquipmentStock {
        equipment_id: String,
        name: String,
        requested: i32,
        available: i32,
    },
    #[error("予約の状態を {from} から {to} に変更できません。")]
    InvalidStateTransition { from: String, to: String },
    #[error("予約はすでにキャンセルされています。")]
    AlreadyCancelled,
    #[error("リソースが混み合っています。時間をおいて再度お試しください。")]
    Busy,
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    ConversionEntityError(String),
}

impl AppError {
    // 副作用なしに再試行してよいエラーかどうか
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Busy | AppError::TransactionError(_))
    }
}

// 再試行可能なエラーで Retry-After に載せる秒数
const RETRY_AFTER_SECS: &str = "1";

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match &self {
            AppError::ValidationError(_) | AppError::RequestValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::SiteTypeNotFound(_)
            | AppError::EquipmentNotFound(_)
            | AppError::BookingNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoSiteAvailable
            | AppError::InsufficientEquipmentStock { .. }
            | AppError::InvalidStateTransition { .. }
            | AppError::AlreadyCancelled => StatusCode::CONFLICT,
            AppError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::ConversionEntityError(_) => {
                tracing::error!(
                    error.cause_chain = ?self,
                    error.message = %self,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let retryable = self.is_retryable();
        let mut response = (
            status_code,
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response();
        if retryable {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                header::HeaderValue::from_static(RETRY_AFTER_SECS),
            );
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_a_retryable_service_unavailable() {
        let res = AppError::Busy.into_response();

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.headers()[header::RETRY_AFTER], RETRY_AFTER_SECS);
    }

    #[test]
    fn conflicts_carry_no_retry_hint() {
        let res = AppError::NoSiteAvailable.into_response();

        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert!(res.headers().get(header::RETRY_AFTER).is_none());
    }
}

//! 管理后台错误类型定义
//!
//! 领域错误在此映射为 HTTP 状态码与统一响应体。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedback_core::FeedbackError;
use serde_json::json;

const GENERIC_INTERNAL_MESSAGE: &str = "服务内部错误，请稍后重试";

/// 管理后台错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] FeedbackError),

    #[error("参数验证失败: {0}")]
    Validation(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        let err = match self {
            Self::Validation(_) => return StatusCode::BAD_REQUEST,
            Self::Domain(err) => err,
        };

        match err {
            FeedbackError::Validation(_)
            | FeedbackError::InvalidSortField(_)
            | FeedbackError::ResetTokenInvalid
            | FeedbackError::ResetTokenExpired
            | FeedbackError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,

            FeedbackError::InvalidCredentials
            | FeedbackError::Unauthenticated
            | FeedbackError::TokenInvalid
            | FeedbackError::TokenExpired
            | FeedbackError::UserNotFound => StatusCode::UNAUTHORIZED,

            FeedbackError::Forbidden => StatusCode::FORBIDDEN,
            FeedbackError::NotFound { .. } => StatusCode::NOT_FOUND,
            FeedbackError::Conflict(_) => StatusCode::CONFLICT,
            FeedbackError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            FeedbackError::Delivery(_)
            | FeedbackError::Persistence(_)
            | FeedbackError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Domain(err) => err.error_code(),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if self.is_internal() {
            tracing::error!(error = %self, code = self.error_code(), "请求处理失败");
            GENERIC_INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (ApiError::Validation("email".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (FeedbackError::Validation("score".into()).into(), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (FeedbackError::InvalidSortField("password".into()).into(), StatusCode::BAD_REQUEST, "INVALID_SORT_FIELD"),
            (FeedbackError::ResetTokenInvalid.into(), StatusCode::BAD_REQUEST, "RESET_TOKEN_INVALID"),
            (FeedbackError::ResetTokenExpired.into(), StatusCode::BAD_REQUEST, "RESET_TOKEN_EXPIRED"),
            (
                FeedbackError::InvalidStateTransition { id: 3, status: "approved".into() }.into(),
                StatusCode::BAD_REQUEST,
                "INVALID_STATE_TRANSITION",
            ),
            (FeedbackError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (FeedbackError::Unauthenticated.into(), StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            (FeedbackError::TokenInvalid.into(), StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            (FeedbackError::TokenExpired.into(), StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            (FeedbackError::UserNotFound.into(), StatusCode::UNAUTHORIZED, "USER_NOT_FOUND"),
            (FeedbackError::Forbidden.into(), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (FeedbackError::not_found("tag", 4).into(), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (FeedbackError::Conflict("email".into()).into(), StatusCode::CONFLICT, "CONFLICT"),
            (FeedbackError::Unavailable("pool".into()).into(), StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            (FeedbackError::Delivery("telegram".into()).into(), StatusCode::INTERNAL_SERVER_ERROR, "DELIVERY_FAILURE"),
            (FeedbackError::Internal("bug".into()).into(), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ]
    }

    #[test]
    fn test_all_variants_status_code() {
        for (error, expected_status, label) in all_error_variants() {
            assert_eq!(error.status_code(), expected_status, "状态码不匹配: variant={label}");
        }
    }

    #[test]
    fn test_all_variants_error_code() {
        for (error, _status, expected_code) in all_error_variants() {
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[tokio::test]
    async fn test_into_response_body_structure() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let label = format!("{error:?}");
            let response = error.into_response();
            assert_eq!(response.status(), expected_status, "{label}");

            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value =
                serde_json::from_slice(&body_bytes).expect("响应体不是合法 JSON");

            assert_eq!(body["success"], json!(false), "{label}");
            assert_eq!(body["code"], json!(expected_code), "{label}");
            assert!(!body["message"].as_str().unwrap_or("").is_empty(), "{label}");
            assert!(body["data"].is_null(), "{label}");
        }
    }

    #[tokio::test]
    async fn test_system_errors_hide_internal_details() {
        let response =
            ApiError::from(FeedbackError::Internal("stack overflow at module X".into()))
                .into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        let message = body["message"].as_str().unwrap();

        assert!(!message.contains("stack overflow"));
        assert_eq!(message, GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::{ValidationError, ValidationErrors};

        let mut errors = ValidationErrors::new();
        let mut field_error = ValidationError::new("email");
        field_error.message = Some("邮箱格式不正确".into());
        errors.add("email", field_error);

        let api_error: ApiError = errors.into();
        match &api_error {
            ApiError::Validation(msg) => assert!(msg.contains("email")),
            other => panic!("期望 Validation 变体，实际: {other:?}"),
        }
        assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);
    }
}

//! API 错误定义与响应转换。

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use tg_shared_protocol::ErrorBody;

use crate::auth::error::{AuthError, TokenError};

/// 凭证错误对外文案（不区分 identity 与 secret）。
pub(crate) const INCORRECT_CREDENTIALS_DETAIL: &str = "Incorrect username or password";
/// token 无效对外文案（不区分过期/篡改/格式错误）。
pub(crate) const INVALID_TOKEN_DETAIL: &str = "Invalid token";
/// 缺少 bearer 凭证对外文案。
pub(crate) const NOT_AUTHENTICATED_DETAIL: &str = "Not authenticated";

/// 接口错误。
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) code: &'static str,
    pub(crate) detail: String,
}

impl ApiError {
    /// 构造统一 API 错误。
    pub(crate) fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
        }
    }

    /// 401，并附带 bearer 质询头。
    pub(crate) fn unauthorized(code: &'static str, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, detail)
    }

    pub(crate) fn not_authenticated() -> Self {
        Self::unauthorized("NOT_AUTHENTICATED", NOT_AUTHENTICATED_DETAIL)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::unauthorized("INVALID_CREDENTIALS", INCORRECT_CREDENTIALS_DETAIL)
            }
            AuthError::InvalidToken(_) => Self::unauthorized("INVALID_TOKEN", INVALID_TOKEN_DETAIL),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
                code: self.code.to_string(),
            }),
        )
            .into_response();
        if challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

//! Bearer 凭证提取：从 `Authorization` 头取出 token，校验后把身份交给受保护接口。

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    api::error::ApiError,
    auth::{error::AuthError, token::Identity},
    state::AppState,
};

/// 解析 `Authorization: Bearer <token>`；scheme 大小写不敏感。
pub(crate) fn bearer_token_from_header(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token)
}

/// 已通过 token 校验的请求身份。
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedIdentity(pub(crate) Identity);

impl FromRequestParts<AppState> for AuthenticatedIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token_from_header)
            .ok_or_else(ApiError::not_authenticated)?;

        match state.authority.validate(token) {
            Ok(identity) => Ok(Self(identity)),
            Err(err) => {
                if let AuthError::InvalidToken(reason) = &err {
                    warn!(%reason, uri = %parts.uri, "bearer token rejected");
                }
                Err(err.into())
            }
        }
    }
}

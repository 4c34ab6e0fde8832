//! HTTP 路由处理函数：凭证换发、受保护聊天接口与健康检查。

use axum::{
    Form, Json,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
};
use tg_shared_protocol::{ChatRequest, ChatResponse, TokenResponse};
use tracing::{error, info, warn};

use crate::{
    api::{error::ApiError, types::LoginForm},
    auth::bearer::AuthenticatedIdentity,
    state::AppState,
};

/// 凭证换发：校验 identity/secret，成功后签发 bearer token。
pub(crate) async fn token_handler(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form.map_err(|rejection| {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST",
            rejection.body_text(),
        )
    })?;
    if !form.has_supported_grant_type() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNSUPPORTED_GRANT_TYPE",
            "unsupported grant_type",
        ));
    }

    info!(identity = %form.username, "login attempt");
    let identity = state
        .credentials
        .authenticate(&form.username, &form.password)
        .inspect_err(|_| warn!(identity = %form.username, "failed login attempt"))?;

    let token = state
        .authority
        .issue(&identity)
        .inspect_err(|err| error!(%identity, "issue access token failed: {err}"))?;
    info!(%identity, expires_at = token.expires_at(), "successful login");
    Ok(Json(TokenResponse::bearer(token.into_string())))
}

/// 受保护接口：回显消息内容。
pub(crate) async fn chat_handler(
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST",
            rejection.body_text(),
        )
    })?;
    info!(%identity, "chat message received");

    let response = ChatResponse {
        response: format!("Echo: {}", request.content),
    };
    info!(%identity, "chat response sent");
    Ok(Json(response))
}

/// 健康检查接口。
pub(crate) async fn healthz() -> &'static str {
    "ok"
}

//! Gateway 应用装配：路由、CORS 与监听。

use anyhow::Context;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::{
    api::handlers::{chat_handler, healthz, token_handler},
    config::GatewayConfig,
    state::AppState,
};

/// Gateway 入口：按配置装配路由并开始监听。
pub(crate) async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let authority = config.authority();
    let GatewayConfig {
        addr,
        cors_origins,
        credentials_path,
        credentials_file_loaded,
        credentials,
        ..
    } = config;

    if !credentials_file_loaded {
        warn!(
            "credential file {} not found; using inline credentials only",
            credentials_path.display()
        );
    }
    if credentials.is_empty() {
        warn!("no credential records configured; every login will be rejected");
    }
    info!(
        algorithm = %authority.key().algorithm(),
        ttl_sec = authority.ttl().as_secs(),
        identities = credentials.len(),
        origins = ?cors_origins,
        "gateway configured"
    );

    let state = AppState::new(credentials, authority);
    let app = build_router(state, &cors_origins)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("tokengate listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 组装路由；`/chat` 的鉴权由 `AuthenticatedIdentity` 提取器完成。
pub(crate) fn build_router(state: AppState, cors_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/healthz", get(healthz))
        .route("/token", post(token_handler))
        .route("/chat", post(chat_handler))
        .layer(cors_layer(cors_origins)?)
        .with_state(state))
}

/// 允许配置内的来源携带凭证访问，方法与请求头按预检请求回显。
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("invalid CORS origin {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{
            Method, Request, StatusCode,
            header::{
                ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN,
                ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION,
                CONTENT_TYPE, ORIGIN, WWW_AUTHENTICATE,
            },
        },
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::build_router;
    use crate::{
        auth::{
            credentials::{CredentialRecord, CredentialStore},
            signing::{SigningKey, TokenAlgorithm},
            token::{DEFAULT_TOKEN_TTL, Identity, TokenAuthority, unix_now},
        },
        state::AppState,
    };

    const FRONTEND: &str = "http://localhost:5173";

    fn state() -> AppState {
        AppState::new(
            CredentialStore::from_records([CredentialRecord::new("testuser", "testpass")])
                .unwrap(),
            TokenAuthority::new(
                SigningKey::new("router-test-key", TokenAlgorithm::Hs256).unwrap(),
                DEFAULT_TOKEN_TTL,
            ),
        )
    }

    fn app(state: AppState) -> Router {
        build_router(state, &[FRONTEND.to_string()]).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: Router, form: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/token")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn chat(app: Router, authorization: Option<&str>, content: &str) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(CONTENT_TYPE, "application/json");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let body = serde_json::json!({ "content": content }).to_string();
        app.oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let response = app(state())
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn correct_credentials_get_bearer_token_that_unlocks_chat() {
        let state = state();
        let response = login(app(state.clone()), "username=testuser&password=testpass").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(state.authority.validate(&token).unwrap().as_str(), "testuser");

        let response = chat(app(state), Some(&format!("Bearer {token}")), "hello").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["response"], "Echo: hello");
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_identity_look_the_same() {
        for form in [
            "username=testuser&password=wrong",
            "username=nobody&password=testpass",
        ] {
            let response = login(app(state()), form).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
            let body = json_body(response).await;
            assert_eq!(body["detail"], "Incorrect username or password");
            assert!(body.get("access_token").is_none());
        }
    }

    #[tokio::test]
    async fn password_grant_type_is_accepted_others_are_not() {
        let response = login(
            app(state()),
            "grant_type=password&username=testuser&password=testpass",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = login(
            app(state()),
            "grant_type=client_credentials&username=testuser&password=testpass",
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_form_fields_are_unprocessable() {
        let response = login(app(state()), "username=testuser").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_without_bearer_is_not_authenticated() {
        let response = chat(app(state()), None, "hello").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn chat_with_invalid_or_expired_token_is_rejected() {
        let state = state();
        let expired = state
            .authority
            .issue_at(&Identity::new("testuser"), unix_now() - 31 * 60)
            .unwrap();
        for header in [
            "Bearer garbage".to_string(),
            format!("Bearer {}", expired.as_str()),
        ] {
            let response = chat(app(state.clone()), Some(&header), "hello").await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(json_body(response).await["detail"], "Invalid token");
        }
    }

    #[tokio::test]
    async fn token_signed_by_another_key_is_rejected() {
        let foreign = TokenAuthority::new(
            SigningKey::new("someone-else", TokenAlgorithm::Hs256).unwrap(),
            DEFAULT_TOKEN_TTL,
        );
        let token = foreign.issue(&Identity::new("testuser")).unwrap();
        let response = chat(
            app(state()),
            Some(&format!("Bearer {}", token.as_str())),
            "hello",
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["detail"], "Invalid token");
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin_only() {
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/chat")
                .header(ORIGIN, origin)
                .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
                .body(Body::empty())
                .unwrap()
        };

        let response = app(state()).oneshot(preflight(FRONTEND)).await.unwrap();
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let response = app(state())
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}

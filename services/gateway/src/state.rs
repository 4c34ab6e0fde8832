//! Gateway 共享状态：凭证存储与 token 签发方，启动后只读。

use std::sync::Arc;

use crate::auth::{credentials::CredentialStore, token::TokenAuthority};

/// Gateway 共享状态。
#[derive(Clone)]
pub(crate) struct AppState {
    /// 预置凭证（只读）。
    pub(crate) credentials: Arc<CredentialStore>,
    /// token 签发/校验方（密钥只读）。
    pub(crate) authority: Arc<TokenAuthority>,
}

impl AppState {
    pub(crate) fn new(credentials: CredentialStore, authority: TokenAuthority) -> Self {
        Self {
            credentials: Arc::new(credentials),
            authority: Arc::new(authority),
        }
    }
}

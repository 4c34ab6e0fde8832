//! 鉴权错误分类。
//!
//! 对外只暴露两类失败：凭证错误与 token 无效；token 无效的具体原因
//! （过期、签名错误、格式错误……）仅用于日志审计，不回传给客户端。

use thiserror::Error;

/// 鉴权核心错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AuthError {
    /// 身份不存在或密钥不匹配，两者不做区分。
    #[error("incorrect username or password")]
    InvalidCredentials,
    /// token 校验失败（格式、签名、claims、过期统一归入此类）。
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenRejection),
}

/// token 被拒绝的内部原因。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum TokenRejection {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("claims undecodable")]
    InvalidClaims,
    #[error("missing subject")]
    MissingSubject,
    #[error("expired at {exp} (now {now})")]
    Expired { exp: u64, now: u64 },
}

/// 签发阶段错误：仅在 HMAC 原语拒绝密钥或 claims 无法编码时出现。
#[derive(Debug, Error)]
pub(crate) enum TokenError {
    #[error("signing key rejected by {0}")]
    Signing(&'static str),
    #[error("encode claims failed: {0}")]
    Encode(#[from] serde_json::Error),
}

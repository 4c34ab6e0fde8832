//! Token 签发与校验。
//!
//! token 为 compact JWS：`base64url(header).base64url(claims).base64url(hmac)`，
//! claims 只含 `sub` 与 `exp`。服务端不保存任何 token 状态：
//! 签名可验证且 `exp` 晚于当前时间即视为有效，无吊销列表。

use std::{fmt, time::Duration};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::auth::{
    error::{AuthError, TokenError, TokenRejection},
    signing::SigningKey,
};

/// 默认 access token 有效期（30 分钟）。
pub(crate) const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// JWS header 中的 `typ`。
const TOKEN_TYP: &str = "JWT";

/// 当前 unix 秒。
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 已认证主体的标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Identity(String);

impl Identity {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 已签发的 access token。
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    encoded: String,
    expires_at: u64,
}

impl AccessToken {
    pub(crate) fn as_str(&self) -> &str {
        &self.encoded
    }

    /// 过期时间（unix 秒）。
    pub(crate) fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub(crate) fn into_string(self) -> String {
        self.encoded
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// access token claims。
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AccessTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) sub: Option<String>,
    pub(crate) exp: u64,
}

/// Token 签发/校验方：持有只读签名密钥与固定 TTL，可被并发请求共享。
#[derive(Debug, Clone)]
pub(crate) struct TokenAuthority {
    key: SigningKey,
    ttl_sec: u64,
}

impl TokenAuthority {
    pub(crate) fn new(key: SigningKey, ttl: Duration) -> Self {
        Self {
            key,
            ttl_sec: ttl.as_secs(),
        }
    }

    pub(crate) fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_sec)
    }

    pub(crate) fn key(&self) -> &SigningKey {
        &self.key
    }

    /// 为已通过凭证校验的身份签发 token（不再重复校验凭证）。
    pub(crate) fn issue(&self, identity: &Identity) -> Result<AccessToken, TokenError> {
        self.issue_at(identity, unix_now())
    }

    /// 以给定时刻为签发时间签发 token。
    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        now: u64,
    ) -> Result<AccessToken, TokenError> {
        let claims = AccessTokenClaims {
            sub: Some(identity.as_str().to_string()),
            exp: now.saturating_add(self.ttl_sec),
        };
        let encoded = self.encode_claims(&claims)?;
        Ok(AccessToken {
            encoded,
            expires_at: claims.exp,
        })
    }

    /// 校验 token 并还原身份。
    pub(crate) fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        self.validate_at(token, unix_now())
    }

    /// 以给定时刻为校验时间校验 token；`now >= exp` 即视为过期。
    pub(crate) fn validate_at(&self, token: &str, now: u64) -> Result<Identity, AuthError> {
        let (signing_input, sig_b64) = token.rsplit_once('.').ok_or(TokenRejection::Malformed)?;
        let (header_b64, claims_b64) = signing_input
            .split_once('.')
            .ok_or(TokenRejection::Malformed)?;
        if header_b64.is_empty() || claims_b64.is_empty() || sig_b64.is_empty() {
            return Err(TokenRejection::Malformed.into());
        }

        let header: TokenHeader = decode_segment(header_b64).ok_or(TokenRejection::Malformed)?;
        if header.alg != self.key.algorithm().as_str() {
            return Err(TokenRejection::UnsupportedAlgorithm(header.alg).into());
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64.as_bytes())
            .map_err(|_| TokenRejection::Malformed)?;
        if !self.key.verify(signing_input.as_bytes(), &sig) {
            return Err(TokenRejection::BadSignature.into());
        }

        let claims: AccessTokenClaims =
            decode_segment(claims_b64).ok_or(TokenRejection::InvalidClaims)?;
        if now >= claims.exp {
            return Err(TokenRejection::Expired {
                exp: claims.exp,
                now,
            }
            .into());
        }
        let Some(sub) = claims.sub else {
            return Err(TokenRejection::MissingSubject.into());
        };
        Ok(Identity(sub))
    }

    /// 按当前算法对任意 claims 编码并签名。
    pub(crate) fn encode_claims(&self, claims: &AccessTokenClaims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: self.key.algorithm().as_str().to_string(),
            typ: Some(TOKEN_TYP.to_string()),
        };
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let sig = self.key.sign(signing_input.as_bytes())?;
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(sig)))
    }
}

/// base64url 解码单段并反序列化 JSON。
fn decode_segment<T: DeserializeOwned>(segment: &str) -> Option<T> {
    let raw = URL_SAFE_NO_PAD.decode(segment.as_bytes()).ok()?;
    serde_json::from_slice(&raw).ok()
}

//! HMAC 签名密钥与算法标识。

use std::{fmt, str::FromStr};

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::auth::error::TokenError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// 支持的对称签名算法（JWS `alg` 取值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl TokenAlgorithm {
    /// 返回 JWS header 中使用的算法名。
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }
}

impl fmt::Display for TokenAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenAlgorithm {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(format!(
                "unsupported token algorithm: {other}; expected HS256, HS384 or HS512"
            )),
        }
    }
}

/// 进程级签名密钥：启动时注入，运行期只读。
#[derive(Clone)]
pub(crate) struct SigningKey {
    secret: Vec<u8>,
    algorithm: TokenAlgorithm,
}

impl SigningKey {
    /// 用外部提供的密钥材料构造签名密钥；空密钥直接拒绝。
    pub(crate) fn new(
        secret: impl Into<Vec<u8>>,
        algorithm: TokenAlgorithm,
    ) -> Result<Self, String> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err("signing key must not be empty".to_string());
        }
        Ok(Self { secret, algorithm })
    }

    pub(crate) fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    /// 计算 `input` 的 HMAC 标签。
    pub(crate) fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let tag = match self.algorithm {
            TokenAlgorithm::Hs256 => {
                let mut mac = HmacSha256::new_from_slice(&self.secret)
                    .map_err(|_| TokenError::Signing("HS256"))?;
                mac.update(input);
                mac.finalize().into_bytes().to_vec()
            }
            TokenAlgorithm::Hs384 => {
                let mut mac = HmacSha384::new_from_slice(&self.secret)
                    .map_err(|_| TokenError::Signing("HS384"))?;
                mac.update(input);
                mac.finalize().into_bytes().to_vec()
            }
            TokenAlgorithm::Hs512 => {
                let mut mac = HmacSha512::new_from_slice(&self.secret)
                    .map_err(|_| TokenError::Signing("HS512"))?;
                mac.update(input);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(tag)
    }

    /// 常量时间比较 `input` 的 HMAC 标签与 `signature`。
    pub(crate) fn verify(&self, input: &[u8], signature: &[u8]) -> bool {
        match self.algorithm {
            TokenAlgorithm::Hs256 => HmacSha256::new_from_slice(&self.secret)
                .map(|mut mac| {
                    mac.update(input);
                    mac.verify_slice(signature).is_ok()
                })
                .unwrap_or(false),
            TokenAlgorithm::Hs384 => HmacSha384::new_from_slice(&self.secret)
                .map(|mut mac| {
                    mac.update(input);
                    mac.verify_slice(signature).is_ok()
                })
                .unwrap_or(false),
            TokenAlgorithm::Hs512 => HmacSha512::new_from_slice(&self.secret)
                .map(|mut mac| {
                    mac.update(input);
                    mac.verify_slice(signature).is_ok()
                })
                .unwrap_or(false),
        }
    }
}

impl fmt::Debug for SigningKey {
    // 密钥材料不进日志。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{SigningKey, TokenAlgorithm};

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("hs256".parse::<TokenAlgorithm>(), Ok(TokenAlgorithm::Hs256));
        assert_eq!(" HS512 ".parse::<TokenAlgorithm>(), Ok(TokenAlgorithm::Hs512));
        assert!("none".parse::<TokenAlgorithm>().is_err());
        assert!("RS256".parse::<TokenAlgorithm>().is_err());
    }

    #[test]
    fn tag_length_follows_algorithm() {
        for (alg, len) in [
            (TokenAlgorithm::Hs256, 32),
            (TokenAlgorithm::Hs384, 48),
            (TokenAlgorithm::Hs512, 64),
        ] {
            let key = SigningKey::new("k", alg).unwrap();
            let tag = key.sign(b"payload").unwrap();
            assert_eq!(tag.len(), len);
            assert!(key.verify(b"payload", &tag));
            assert!(!key.verify(b"payload!", &tag));
        }
    }

    #[test]
    fn distinct_keys_do_not_cross_verify() {
        let a = SigningKey::new("key-a", TokenAlgorithm::Hs256).unwrap();
        let b = SigningKey::new("key-b", TokenAlgorithm::Hs256).unwrap();
        let tag = a.sign(b"payload").unwrap();
        assert!(!b.verify(b"payload", &tag));
    }

    #[test]
    fn empty_key_is_rejected_and_debug_is_redacted() {
        assert!(SigningKey::new("", TokenAlgorithm::Hs256).is_err());
        let key = SigningKey::new("super-secret", TokenAlgorithm::Hs384).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("Hs384"));
    }
}

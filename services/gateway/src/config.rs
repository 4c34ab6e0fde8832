//! 配置模块职责：
//! 1. 启动时一次性读取环境变量，运行期不再变化。
//! 2. 签名密钥必须由外部提供，缺失直接拒绝启动。
//! 3. 合并凭证文件与内联凭证，校验 CORS 来源格式。

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, anyhow, bail};
use url::Url;

use crate::auth::{
    credentials::{CredentialStore, load_credential_file, parse_inline_credentials},
    signing::{SigningKey, TokenAlgorithm},
    token::TokenAuthority,
};

/// 监听地址。
pub(crate) const ADDR_ENV: &str = "TOKENGATE_ADDR";
/// 签名密钥（必填）。
pub(crate) const SIGNING_KEY_ENV: &str = "TOKENGATE_SIGNING_KEY";
/// 签名算法。
pub(crate) const TOKEN_ALGORITHM_ENV: &str = "TOKENGATE_TOKEN_ALGORITHM";
/// token 有效期（分钟）。
pub(crate) const TOKEN_TTL_MIN_ENV: &str = "TOKENGATE_TOKEN_TTL_MIN";
/// 允许的浏览器来源（CSV）。
pub(crate) const CORS_ORIGINS_ENV: &str = "TOKENGATE_CORS_ORIGINS";
/// 凭证文件路径。
pub(crate) const CREDENTIALS_PATH_ENV: &str = "TOKENGATE_CREDENTIALS_PATH";
/// 内联凭证（`identity:secret` CSV）。
pub(crate) const CREDENTIALS_ENV: &str = "TOKENGATE_CREDENTIALS";

/// 默认监听地址。
pub(crate) const DEFAULT_ADDR: &str = "0.0.0.0:8000";
/// 默认 token 有效期（分钟）。
const DEFAULT_TOKEN_TTL_MIN: u64 = 30;
/// 默认允许的前端开发来源。
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

/// Gateway 运行时配置。
#[derive(Debug, Clone)]
pub(crate) struct GatewayConfig {
    /// 监听地址。
    pub(crate) addr: String,
    /// 签名密钥与算法。
    pub(crate) signing_key: SigningKey,
    /// token 固定有效期。
    pub(crate) token_ttl: Duration,
    /// 归一化后的 CORS 来源。
    pub(crate) cors_origins: Vec<String>,
    /// 凭证文件路径（可能不存在）。
    pub(crate) credentials_path: PathBuf,
    /// 凭证文件是否存在并已加载。
    pub(crate) credentials_file_loaded: bool,
    /// 预置凭证。
    pub(crate) credentials: CredentialStore,
}

impl GatewayConfig {
    /// 从进程环境变量读取配置。
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key/value 来源读取配置；空白值视为未设置。
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let addr = get(ADDR_ENV).unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let algorithm = match get(TOKEN_ALGORITHM_ENV) {
            Some(raw) => raw.parse::<TokenAlgorithm>().map_err(|err| anyhow!(err))?,
            None => TokenAlgorithm::Hs256,
        };
        let secret = get(SIGNING_KEY_ENV).ok_or_else(|| {
            anyhow!("{SIGNING_KEY_ENV} is required; refusing to start without a signing key")
        })?;
        let signing_key = SigningKey::new(secret, algorithm).map_err(|err| anyhow!(err))?;

        let token_ttl = match get(TOKEN_TTL_MIN_ENV) {
            Some(raw) => parse_ttl_minutes(&raw)?,
            None => Duration::from_secs(DEFAULT_TOKEN_TTL_MIN * 60),
        };

        let cors_origins = parse_origins(
            &get(CORS_ORIGINS_ENV).unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        )?;

        let credentials_path = get(CREDENTIALS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_credentials_path(get("HOME")));
        let file_records = load_credential_file(&credentials_path)?;
        let credentials_file_loaded = file_records.is_some();
        let inline_records = match get(CREDENTIALS_ENV) {
            Some(raw) => parse_inline_credentials(&raw)
                .with_context(|| format!("parse {CREDENTIALS_ENV}"))?,
            None => Vec::new(),
        };
        let credentials = CredentialStore::from_records(
            file_records.unwrap_or_default().into_iter().chain(inline_records),
        )?;

        Ok(Self {
            addr,
            signing_key,
            token_ttl,
            cors_origins,
            credentials_path,
            credentials_file_loaded,
            credentials,
        })
    }

    /// 用配置中的密钥与 TTL 构造 token 签发方。
    pub(crate) fn authority(&self) -> TokenAuthority {
        TokenAuthority::new(self.signing_key.clone(), self.token_ttl)
    }
}

/// 默认凭证文件路径：`$HOME/.config/tokengate/credentials.json`。
fn default_credentials_path(home: Option<String>) -> PathBuf {
    PathBuf::from(home.unwrap_or_else(|| ".".to_string()))
        .join(".config")
        .join("tokengate")
        .join("credentials.json")
}

/// 解析 TTL 分钟数，必须为正整数。
fn parse_ttl_minutes(raw: &str) -> anyhow::Result<Duration> {
    let minutes = raw
        .parse::<u64>()
        .with_context(|| format!("{TOKEN_TTL_MIN_ENV} must be a positive integer, got `{raw}`"))?;
    if minutes == 0 {
        bail!("{TOKEN_TTL_MIN_ENV} must be greater than zero");
    }
    Ok(Duration::from_secs(minutes.saturating_mul(60)))
}

/// 解析 CSV 来源列表，归一化为 `scheme://host[:port]`。
pub(crate) fn parse_origins(raw: &str) -> anyhow::Result<Vec<String>> {
    let mut origins = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let origin = normalize_origin(item)?;
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }
    Ok(origins)
}

fn normalize_origin(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid CORS origin `{raw}`"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("CORS origin `{raw}` must use http or https");
    }
    if url.host_str().is_none() {
        bail!("CORS origin `{raw}` has no host");
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        bail!("CORS origin `{raw}` must not contain a path, query or fragment");
    }
    Ok(url.origin().ascii_serialization())
}

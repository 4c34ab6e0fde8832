//! 凭证存储：启动时预置的 identity -> secret 映射，运行期只读。
//!
//! 校验为逐字节相等比较，不做归一化或哈希。

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt, fs,
    path::Path,
};

use anyhow::{Context, anyhow, bail};
use serde::Deserialize;

use crate::auth::{error::AuthError, token::Identity};

/// 单条凭证记录。
#[derive(Clone, Deserialize)]
pub(crate) struct CredentialRecord {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl CredentialRecord {
    pub(crate) fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// 凭证文件格式：`{"users": [{"username": "...", "password": "..."}]}`。
#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: Vec<CredentialRecord>,
}

/// 凭证存储。
#[derive(Clone, Default)]
pub(crate) struct CredentialStore {
    records: HashMap<String, String>,
}

impl CredentialStore {
    /// 由记录列表构造；同一 identity 出现多次视为配置错误。
    pub(crate) fn from_records(
        records: impl IntoIterator<Item = CredentialRecord>,
    ) -> anyhow::Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            match map.entry(record.username) {
                Entry::Occupied(entry) => {
                    bail!("duplicate credential record for identity `{}`", entry.key())
                }
                Entry::Vacant(entry) => {
                    entry.insert(record.password);
                }
            }
        }
        Ok(Self { records: map })
    }

    /// 记录存在且 secret 完全一致时返回 true；未知 identity 返回 false。
    pub(crate) fn verify(&self, identity: &str, presented_secret: &str) -> bool {
        self.records
            .get(identity)
            .is_some_and(|stored| stored.as_bytes() == presented_secret.as_bytes())
    }

    /// 校验凭证并返回对应身份；失败不区分 identity 与 secret。
    pub(crate) fn authenticate(
        &self,
        identity: &str,
        presented_secret: &str,
    ) -> Result<Identity, AuthError> {
        if self.verify(identity, presented_secret) {
            Ok(Identity::new(identity))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut identities = self.records.keys().collect::<Vec<_>>();
        identities.sort();
        f.debug_struct("CredentialStore")
            .field("identities", &identities)
            .finish()
    }
}

/// 读取凭证文件；文件不存在返回 `None`。
pub(crate) fn load_credential_file(path: &Path) -> anyhow::Result<Option<Vec<CredentialRecord>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path)
        .with_context(|| format!("read credential file: {}", path.display()))?;
    let parsed: CredentialFile = serde_json::from_slice(&raw)
        .with_context(|| format!("decode credential file: {}", path.display()))?;
    Ok(Some(parsed.users))
}

/// 解析内联凭证：`identity:secret,identity2:secret2`。
///
/// 只在第一个 `:` 处切分，secret 自身可以包含 `:`。
pub(crate) fn parse_inline_credentials(raw: &str) -> anyhow::Result<Vec<CredentialRecord>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| -> anyhow::Result<CredentialRecord> {
            let (username, password) = item
                .split_once(':')
                .ok_or_else(|| anyhow!("credential entry must be `identity:secret`"))?;
            if username.is_empty() {
                bail!("credential entry has empty identity");
            }
            Ok(CredentialRecord::new(username, password))
        })
        .collect()
}

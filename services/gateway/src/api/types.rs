//! API 请求类型。

use serde::Deserialize;

/// OAuth2 password 模式唯一允许的 grant_type。
pub(crate) const PASSWORD_GRANT_TYPE: &str = "password";

/// `POST /token` 表单（`application/x-www-form-urlencoded`）。
#[derive(Deserialize)]
pub(crate) struct LoginForm {
    pub(crate) username: String,
    pub(crate) password: String,
    /// 可选；出现时必须为 `password`。
    #[serde(default)]
    pub(crate) grant_type: Option<String>,
}

impl LoginForm {
    /// grant_type 缺省或为 `password` 时合法。
    pub(crate) fn has_supported_grant_type(&self) -> bool {
        self.grant_type
            .as_deref()
            .is_none_or(|grant| grant == PASSWORD_GRANT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::LoginForm;

    fn form(grant_type: Option<&str>) -> LoginForm {
        LoginForm {
            username: "testuser".to_string(),
            password: "testpass".to_string(),
            grant_type: grant_type.map(str::to_string),
        }
    }

    #[test]
    fn grant_type_is_optional_but_restricted() {
        assert!(form(None).has_supported_grant_type());
        assert!(form(Some("password")).has_supported_grant_type());
        assert!(!form(Some("client_credentials")).has_supported_grant_type());
        assert!(!form(Some("")).has_supported_grant_type());
    }
}

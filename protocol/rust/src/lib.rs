// 文件职责：
// 1) 定义 gateway 与浏览器客户端共用的 HTTP 协议数据结构。
// 2) 字段名保持 snake_case，与现有前端（`access_token` / `detail`）兼容。
// 3) 作为 Rust 侧协议唯一代码源，供服务端与测试复用。

use serde::{Deserialize, Serialize};

/// 凭证换发成功后返回的 token 类型。
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// `POST /token` 成功响应。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    // 已签名的 access token。
    pub access_token: String,
    // 固定为 `bearer`。
    pub token_type: String,
}

impl TokenResponse {
    /// 构造 bearer 类型响应。
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

/// `POST /chat` 请求体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    // 用户输入的消息内容。
    pub content: String,
}

/// `POST /chat` 响应体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    // 服务端回复内容。
    pub response: String,
}

/// 统一错误响应体，前端读取 `detail` 字段展示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    // 面向用户的错误描述（不区分内部原因）。
    pub detail: String,
    // 机器可读错误码。
    pub code: String,
}

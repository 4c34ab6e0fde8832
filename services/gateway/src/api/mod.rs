//! HTTP 接口层：错误映射、请求类型与路由处理函数。

pub(crate) mod error;
pub(crate) mod handlers;
pub(crate) mod types;

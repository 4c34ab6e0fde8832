//! 鉴权模块：凭证校验、token 签发/校验与请求身份提取。

pub(crate) mod bearer;
pub(crate) mod credentials;
pub(crate) mod error;
pub(crate) mod signing;
pub(crate) mod token;

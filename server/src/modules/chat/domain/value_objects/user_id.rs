use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use super::{check_path_segment, InvalidIdentity};

/// 用户标识
///
/// 存储命名空间的拥有者，每个用户对应一个目录。
/// 通常由客户端网络地址推导而来。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// 从字符串解析，只允许 ASCII 字母数字和 `.-_@`
    pub fn parse(s: &str) -> Result<Self, InvalidIdentity> {
        let invalid = |reason: String| InvalidIdentity {
            value: s.to_string(),
            reason,
        };
        check_path_segment(s).map_err(invalid)?;
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@')))
        {
            return Err(invalid(format!("user contains forbidden character {:?}", c)));
        }
        Ok(Self(s.to_string()))
    }

    /// 由客户端 IP 推导（IPv6 的 `:` 替换为 `-`）
    pub fn from_ip(ip: IpAddr) -> Self {
        let ip = match ip {
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .map(IpAddr::V4)
                .unwrap_or(IpAddr::V6(v6)),
            v4 => v4,
        };
        Self(ip.to_string().replace(':', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidIdentity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

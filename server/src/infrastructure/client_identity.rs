use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

use crate::modules::chat::UserId;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// 客户端身份识别
///
/// 用户由对端地址决定；只有在部署于可信反向代理之后时才读取 X-Forwarded-For
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    trust_forwarded_for: bool,
    default_user: UserId,
}

impl ClientIdentity {
    pub fn new(trust_forwarded_for: bool, default_user: UserId) -> Self {
        Self {
            trust_forwarded_for,
            default_user,
        }
    }

    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> UserId {
        if self.trust_forwarded_for {
            if let Some(ip) = forwarded_ip(headers) {
                return UserId::from_ip(ip);
            }
        }

        peer.map(|addr| UserId::from_ip(addr.ip()))
            .unwrap_or_else(|| self.default_user.clone())
    }
}

/// 取 X-Forwarded-For 的第一个地址
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

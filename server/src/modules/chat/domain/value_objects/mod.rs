// Chat Domain - Value Objects
// 值对象是不可变的，通过值而非标识来比较

mod conversation_id;
mod identity_scheme;
mod user_id;

pub use conversation_id::*;
pub use identity_scheme::*;
pub use user_id::*;

/// 文件名长度上限（字节），大多数文件系统限制为 255
pub(crate) const MAX_SEGMENT_BYTES: usize = 200;

/// 校验字符串能否作为单个路径片段（目录名或文件名主干）
pub(crate) fn check_path_segment(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("identity is empty".to_string());
    }
    if value == "." || value == ".." {
        return Err(format!("'{}' is a reserved path name", value));
    }
    if value.len() > MAX_SEGMENT_BYTES {
        return Err(format!(
            "identity is {} bytes long, limit is {}",
            value.len(),
            MAX_SEGMENT_BYTES
        ));
    }
    if let Some(c) = value
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(format!("identity contains forbidden character {:?}", c));
    }
    Ok(())
}

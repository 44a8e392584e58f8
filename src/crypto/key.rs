//! 会话密钥模块
//!
//! 本模块负责会话级 AES-256 密钥的生成与编码：
//!
//! - 新密钥由操作系统 CSPRNG 生成
//! - 持久化形式为原始 32 字节的标准 base64 编码（"密钥记录"）
//! - 密钥在离开作用域后自动清零
//!
//! 密钥记录不带版本号：若未来更换编码或算法，
//! 旧记录将无法被解析，需要显式迁移。

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::error::{NoteCryptError, Result};

/// 密钥长度（256-bit）
pub const KEY_LEN: usize = 32;

/// 会话对称密钥
///
/// 一经创建即不可变；内部字节在 drop 时清零。
pub struct SessionKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl SessionKey {
    /// 生成全新的随机密钥
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self { bytes }
    }

    /// 从密钥记录还原密钥
    ///
    /// #### 错误
    /// - base64 非法，或解码后长度不是 32 字节时返回 KeyDecode
    pub fn from_record(record: &str) -> Result<Self> {
        let raw = Zeroizing::new(
            STANDARD
                .decode(record.trim())
                .map_err(|e| NoteCryptError::KeyDecode(format!("invalid base64: {e}")))?,
        );

        if raw.len() != KEY_LEN {
            return Err(NoteCryptError::KeyDecode(format!(
                "expected {KEY_LEN} key bytes, found {}",
                raw.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(&raw);
        Ok(Self { bytes })
    }

    /// 编码为可持久化的密钥记录
    pub fn to_record(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(&self.bytes[..]))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

//! 密文信封（Envelope）格式
//!
//! 一次加密的全部输出被打包为一个信封：
//!
//! ```text
//! base64( nonce (12 bytes) || ciphertext || tag (16 bytes) )
//! ```
//!
//! 信封对调用方是不透明的字符串，只有解密流程会解析它。

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::{NoteCryptError, Result};

/// AES-GCM nonce 长度（96 bit）
pub const NONCE_LEN: usize = 12;

/// AES-GCM 认证标签长度
pub const TAG_LEN: usize = 16;

/// 一次加密的结果
///
/// `ciphertext` 末尾包含 GCM 认证标签。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// 编码为单个 base64 字符串（nonce 在前）
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.ciphertext);
        STANDARD.encode(raw)
    }

    /// 解析信封字符串
    ///
    /// 仅校验编码与最小长度；标签是否正确由 AEAD 解密判断。
    pub fn decode(encoded: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| NoteCryptError::EnvelopeDecode(format!("invalid base64: {e}")))?;

        if raw.len() < NONCE_LEN {
            return Err(NoteCryptError::EnvelopeDecode(format!(
                "envelope is {} bytes, shorter than the {NONCE_LEN}-byte nonce",
                raw.len()
            )));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

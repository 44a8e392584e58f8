//! AEAD 加解密模块
//!
//! 本模块基于 AES-256-GCM 实现 AEAD（Authenticated Encryption
//! with Associated Data）。
//!
//! 功能说明：
//! - 提供"加密 + 完整性校验"一体化能力
//! - 解密失败即表示：密钥错误 或 数据被篡改
//! - 使用随机 nonce，严禁复用
//!
//! 安全约束：
//! - 每次加密必须使用全新的 nonce
//! - 不允许在未校验通过的情况下输出任何明文
//! - 不使用关联数据（AAD）

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::crypto::key::SessionKey;
use crate::error::{NoteCryptError, Result};
use crate::format::envelope::Envelope;

fn cipher(key: &SessionKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// 使用 AES-256-GCM 加密数据
///
/// 每次调用都会生成全新的随机 nonce，
/// 因此相同明文两次加密的结果必然不同。
pub fn encrypt(key: &SessionKey, plaintext: &[u8]) -> Result<Envelope> {
    // 生成随机 nonce（96 bit）
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher(key)
        .encrypt(&nonce, plaintext)
        .map_err(|_| NoteCryptError::Internal)?;

    Ok(Envelope {
        nonce: nonce.into(),
        ciphertext,
    })
}

/// 使用 AES-256-GCM 解密数据
///
/// # 错误
/// - 若密钥错误或数据被篡改，返回 Authentication
pub fn decrypt(key: &SessionKey, envelope: &Envelope) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(&envelope.nonce);

    cipher(key)
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| NoteCryptError::Authentication)
}

/// 加密 UTF-8 文本，返回编码后的信封字符串
pub fn seal_text(key: &SessionKey, plaintext: &str) -> Result<String> {
    encrypt(key, plaintext.as_bytes()).map(|envelope| envelope.encode())
}

/// 解密信封字符串，返回 UTF-8 文本
///
/// 认证通过但内容不是合法 UTF-8 时视为外来数据，返回 EnvelopeDecode。
pub fn open_text(key: &SessionKey, encoded: &str) -> Result<String> {
    let envelope = Envelope::decode(encoded)?;
    let plaintext = decrypt(key, &envelope)?;

    String::from_utf8(plaintext)
        .map_err(|_| NoteCryptError::EnvelopeDecode("payload is not valid UTF-8".into()))
}

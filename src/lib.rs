//! 笔记客户端加密
//!
//! 会话级 AES-256-GCM 密钥管理与文本加解密：
//! - 密钥只保存在会话级存储中（见 `storage`）
//! - 每次加密使用全新随机 nonce，输出为 base64 信封
//! - 解密前必须通过完整性校验

pub mod config;
pub mod crypto;
pub mod error;
pub mod format;
pub mod fs;
pub mod manager;
pub mod notes;
pub mod storage;

pub use config::{DEFAULT_KEY_RECORD_ID, KeyScope, ManagerConfig};
pub use crypto::key::{KEY_LEN, SessionKey};
pub use error::{NoteCryptError, Result};
pub use format::envelope::{Envelope, NONCE_LEN, TAG_LEN};
pub use manager::{EncryptionManager, KeyState};
pub use notes::{Note, NoteBody, NoteDraft, NoteStore, StoredNote, load_notes, save_note};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

//! 管理器配置

use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

/// 密钥记录的默认标识符
pub const DEFAULT_KEY_RECORD_ID: &str = "encryptionKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// 密钥记录在会话存储中的标识符
    pub key_record_id: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            key_record_id: DEFAULT_KEY_RECORD_ID.to_owned(),
        }
    }
}

/// 密钥的共享范围
///
/// - `PerSession`：每个存储实例独立生成密钥，其他会话无法解密
/// - `Shared`：指向同一会话目录的所有进程共用一把密钥
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyScope {
    PerSession,
    Shared { session_dir: PathBuf },
}

impl KeyScope {
    /// 构造与该作用域对应的会话存储
    pub fn open_storage(&self) -> Arc<dyn SessionStorage> {
        match self {
            Self::PerSession => Arc::new(MemorySessionStorage::new()),
            Self::Shared { session_dir } => Arc::new(FileSessionStorage::new(session_dir)),
        }
    }
}

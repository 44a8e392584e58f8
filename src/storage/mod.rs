//! 会话级存储
//!
//! 密钥记录只保存在"会话级"存储中：
//!
//! - `MemorySessionStorage`：进程内存，每个实例即一个独立会话（按标签页隔离）
//! - `FileSessionStorage`：会话目录，多个进程指向同一目录即共享密钥
//!
//! 管理器只依赖 `SessionStorage` trait，具体作用域由调用方选择。

mod file;
mod memory;

pub use file::FileSessionStorage;
pub use memory::MemorySessionStorage;

use crate::error::Result;

/// 按标识符读写字符串记录的会话存储
pub trait SessionStorage: Send + Sync {
    /// 读取记录；不存在时返回 `None`
    fn get(&self, id: &str) -> Result<Option<String>>;

    /// 写入（覆盖）记录
    fn set(&self, id: &str, value: &str) -> Result<()>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<S> {
    fn get(&self, id: &str) -> Result<Option<String>> {
        (**self).get(id)
    }

    fn set(&self, id: &str, value: &str) -> Result<()> {
        (**self).set(id, value)
    }
}

//! 基于目录的会话存储
//!
//! 每条记录对应会话目录下的一个文件：
//! - 文件名即记录标识符
//! - 写入走原子替换，读取方不会看到半截内容
//! - 严格校验标识符，防止路径穿越写出到会话目录之外
//! - 记录内容不是 UTF-8 时返回 KeyDecode

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{NoteCryptError, Result};
use crate::fs::atomic::write_atomic;
use crate::storage::SessionStorage;

#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    /// 使用给定会话目录；目录在首次写入时创建
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 删除记录；不存在时视为成功
    pub fn remove(&self, id: &str) -> Result<()> {
        match std::fs::remove_file(self.record_path(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn record_path(&self, id: &str) -> io::Result<PathBuf> {
        let mut components = Path::new(id).components();

        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !id.starts_with('.') => {
                Ok(self.dir.join(name))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid session record id: {id:?}"),
            )),
        }
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, id: &str) -> Result<Option<String>> {
        let raw = match std::fs::read(self.record_path(id)?) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // 记录存在但内容损坏，属于解码错误而非存储错误
        String::from_utf8(raw)
            .map(Some)
            .map_err(|_| NoteCryptError::KeyDecode(format!("record {id:?} is not valid UTF-8")))
    }

    fn set(&self, id: &str, value: &str) -> Result<()> {
        write_atomic(&self.record_path(id)?, value.as_bytes())?;
        Ok(())
    }
}

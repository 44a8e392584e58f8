use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{NoteCryptError, Result};
use crate::storage::SessionStorage;

/// 进程内会话存储。
///
/// clone 出的句柄共享同一份内容（同一会话）；
/// 新建实例则是一个全新的、空的会话。
#[derive(Clone, Default)]
pub struct MemorySessionStorage {
    records: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 删除记录，返回旧值
    pub fn remove(&self, id: &str) -> Result<Option<String>> {
        let mut records = self.records.write().map_err(|_| NoteCryptError::Internal)?;
        Ok(records.remove(id))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, id: &str) -> Result<Option<String>> {
        let records = self.records.read().map_err(|_| NoteCryptError::Internal)?;
        Ok(records.get(id).cloned())
    }

    fn set(&self, id: &str, value: &str) -> Result<()> {
        let mut records = self.records.write().map_err(|_| NoteCryptError::Internal)?;
        records.insert(id.to_owned(), value.to_owned());
        Ok(())
    }
}

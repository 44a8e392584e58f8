//! 笔记读写与加密的衔接层
//!
//! 远端文档存储只保存信封字符串，本模块负责：
//! - 读取时逐条解密，单条失败不影响其余笔记
//! - 保存时先完整加密，成功后才写入存储（不会写出半条记录）

use tracing::warn;

use crate::error::{NoteCryptError, Result};
use crate::manager::EncryptionManager;
use crate::storage::SessionStorage;

/// 无法解密的笔记展示的占位内容
pub const UNREADABLE_PLACEHOLDER: &str = "[encrypted note could not be decrypted]";

/// 远端存储中的一条笔记，`content` 为信封字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub id: String,
    pub owner: String,
    pub subject: String,
    pub content: String,
}

/// 待保存的明文笔记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub subject: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(NoteCryptError::InvalidNote("subject is empty"));
        }
        if self.content.trim().is_empty() {
            return Err(NoteCryptError::InvalidNote("content is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBody {
    Readable(String),
    Unreadable,
}

/// 解密后的笔记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub subject: String,
    pub body: NoteBody,
}

impl Note {
    pub fn display_content(&self) -> &str {
        match &self.body {
            NoteBody::Readable(text) => text,
            NoteBody::Unreadable => UNREADABLE_PLACEHOLDER,
        }
    }
}

/// 远端文档存储
pub trait NoteStore {
    fn list(&self, owner: &str) -> Result<Vec<StoredNote>>;

    /// 新增笔记，返回其 id
    fn insert(&self, owner: &str, subject: &str, content: &str) -> Result<String>;

    fn update(&self, id: &str, subject: &str, content: &str) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;
}

/// 读取并解密某用户的全部笔记
///
/// 密钥未就绪时返回 KeyNotReady；单条解密失败只会把该条标记为 Unreadable。
pub async fn load_notes<S, N>(
    manager: &EncryptionManager<S>,
    store: &N,
    owner: &str,
) -> Result<Vec<Note>>
where
    S: SessionStorage + 'static,
    N: NoteStore + ?Sized,
{
    if !manager.is_ready() {
        return Err(NoteCryptError::KeyNotReady);
    }

    let stored = store.list(owner)?;
    let mut notes = Vec::with_capacity(stored.len());

    for record in stored {
        let body = match manager.decrypt(&record.content).await {
            Ok(text) => NoteBody::Readable(text),
            Err(e) => {
                warn!(note = %record.id, error = %e, "failed to decrypt note");
                NoteBody::Unreadable
            }
        };

        notes.push(Note {
            id: record.id,
            subject: record.subject,
            body,
        });
    }

    Ok(notes)
}

/// 加密并保存笔记
///
/// `existing_id` 为 `Some` 时更新该笔记，否则新增。
/// 加密失败时直接返回，存储不会被调用。
pub async fn save_note<S, N>(
    manager: &EncryptionManager<S>,
    store: &N,
    owner: &str,
    draft: &NoteDraft,
    existing_id: Option<&str>,
) -> Result<String>
where
    S: SessionStorage + 'static,
    N: NoteStore + ?Sized,
{
    draft.validate()?;

    let envelope = manager.encrypt(&draft.content).await?;

    match existing_id {
        Some(id) => {
            store.update(id, &draft.subject, &envelope)?;
            Ok(id.to_owned())
        }
        None => store.insert(owner, &draft.subject, &envelope),
    }
}

pub fn delete_note<N: NoteStore + ?Sized>(store: &N, id: &str) -> Result<()> {
    store.delete(id)
}

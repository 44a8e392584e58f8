//! 原子写入工具。
//!
//! 提供「先写临时文件，成功后再替换目标文件」的写出语义，
//! 保证会话记录要么是旧值，要么是完整的新值，不会出现半截内容。

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 原子写入一条记录。
///
/// 流程：
/// 1. 在目标目录创建临时文件（unix 下权限 0600）；
/// 2. 写入完整内容并 fsync；
/// 3. 使用 rename 原子替换目标文件。
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "目标路径没有父目录，无法执行原子写入",
        )
    })?;

    fs::create_dir_all(parent)?;

    let tmp_path = build_tmp_path(parent, target.file_name());
    let mut tmp_file = create_private(&tmp_path)?;

    if let Err(err) = tmp_file.write_all(contents).and_then(|_| tmp_file.sync_all()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    Ok(())
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

fn build_tmp_path(parent: &Path, file_name: Option<&std::ffi::OsStr>) -> PathBuf {
    let base_name = file_name
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("session-record");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    parent.join(format!(
        ".{base_name}.tmp-{}-{timestamp}-{counter}",
        std::process::id()
    ))
}

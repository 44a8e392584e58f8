use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tempfile::tempdir;

use notecrypt::{
    DEFAULT_KEY_RECORD_ID, EncryptionManager, FileSessionStorage, KEY_LEN, KeyScope, KeyState,
    ManagerConfig, MemorySessionStorage, NoteCryptError, SessionKey, SessionStorage,
};

#[tokio::test]
async fn fresh_session_generates_and_persists_key() {
    // 会话中没有密钥记录：初始化后应就绪，且记录已写入。
    let storage = MemorySessionStorage::new();
    assert!(storage.get(DEFAULT_KEY_RECORD_ID).unwrap().is_none());

    let manager = EncryptionManager::new(storage.clone());
    manager.initialize().await.expect("initialize");

    assert!(manager.is_ready());
    assert_eq!(manager.state(), KeyState::Ready);

    let record = storage
        .get(DEFAULT_KEY_RECORD_ID)
        .unwrap()
        .expect("key record persisted");
    SessionKey::from_record(&record).expect("persisted record decodes");
}

#[tokio::test]
async fn second_manager_on_same_session_reuses_key() {
    let storage = MemorySessionStorage::new();

    let first = EncryptionManager::new(storage.clone());
    first.initialize().await.expect("initialize first");
    let record = storage.get(DEFAULT_KEY_RECORD_ID).unwrap();
    let envelope = first.encrypt("survives reload").await.expect("encrypt");
    drop(first);

    let second = EncryptionManager::new(storage.clone());
    second.initialize().await.expect("initialize second");

    assert_eq!(storage.get(DEFAULT_KEY_RECORD_ID).unwrap(), record);
    assert_eq!(
        second.decrypt(&envelope).await.expect("decrypt"),
        "survives reload"
    );
}

#[tokio::test]
async fn malformed_record_fails_initialization() {
    // 记录不是合法 base64：初始化失败，保持未就绪，记录不被覆盖。
    let storage = MemorySessionStorage::new();
    storage.set(DEFAULT_KEY_RECORD_ID, "not-valid-base64!!").unwrap();

    let manager = EncryptionManager::new(storage.clone());
    let result = manager.initialize().await;

    assert!(matches!(result, Err(NoteCryptError::KeyDecode(_))));
    assert!(!manager.is_ready());
    assert!(matches!(manager.state(), KeyState::Unavailable(_)));
    assert_eq!(
        storage.get(DEFAULT_KEY_RECORD_ID).unwrap().as_deref(),
        Some("not-valid-base64!!")
    );
    assert!(matches!(
        manager.encrypt("x").await,
        Err(NoteCryptError::KeyNotReady)
    ));
}

#[tokio::test]
async fn wrong_length_record_fails_initialization() {
    let storage = MemorySessionStorage::new();
    storage.set(DEFAULT_KEY_RECORD_ID, &STANDARD.encode([7u8; 16])).unwrap();

    let manager = EncryptionManager::new(storage);
    assert!(matches!(
        manager.initialize().await,
        Err(NoteCryptError::KeyDecode(_))
    ));
    assert!(!manager.is_ready());
}

#[tokio::test]
async fn initialization_can_be_retried_after_discarding_bad_record() {
    let storage = MemorySessionStorage::new();
    storage.set(DEFAULT_KEY_RECORD_ID, "%%%").unwrap();

    let manager = EncryptionManager::new(storage.clone());
    assert!(manager.initialize().await.is_err());
    assert!(matches!(
        manager.wait_ready().await,
        Err(NoteCryptError::Unavailable(_))
    ));

    storage.remove(DEFAULT_KEY_RECORD_ID).unwrap();
    manager.initialize().await.expect("retry initialize");

    assert!(manager.is_ready());
    manager.wait_ready().await.expect("ready after retry");
}

#[tokio::test]
async fn start_initializes_in_background() {
    let storage = MemorySessionStorage::new();
    let manager = EncryptionManager::start(storage.clone(), ManagerConfig::default());

    manager.wait_ready().await.expect("background init");

    assert!(manager.is_ready());
    assert!(storage.get(DEFAULT_KEY_RECORD_ID).unwrap().is_some());
}

#[tokio::test]
async fn start_surfaces_background_failure() {
    let storage = MemorySessionStorage::new();
    storage.set(DEFAULT_KEY_RECORD_ID, "not-valid-base64!!").unwrap();

    let manager = EncryptionManager::start(storage, ManagerConfig::default());

    assert!(matches!(
        manager.wait_ready().await,
        Err(NoteCryptError::Unavailable(_))
    ));
    assert!(!manager.is_ready());
}

/// 记录写入次数的存储
#[derive(Default)]
struct CountingStorage {
    inner: MemorySessionStorage,
    writes: AtomicUsize,
}

impl SessionStorage for CountingStorage {
    fn get(&self, id: &str) -> notecrypt::Result<Option<String>> {
        self.inner.get(id)
    }

    fn set(&self, id: &str, value: &str) -> notecrypt::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(id, value)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initialize_generates_key_once() {
    let storage = Arc::new(CountingStorage::default());
    let manager = Arc::new(EncryptionManager::new(Arc::clone(&storage)));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { manager.initialize().await }));
    }
    for handle in handles {
        handle.await.expect("join").expect("initialize");
    }

    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    assert!(manager.is_ready());
}

#[tokio::test]
async fn custom_record_id_is_used() {
    let storage = MemorySessionStorage::new();
    let config = ManagerConfig {
        key_record_id: "notesKey".into(),
    };

    let manager = EncryptionManager::with_config(storage.clone(), config);
    manager.initialize().await.expect("initialize");

    assert!(storage.get("notesKey").unwrap().is_some());
    assert!(storage.get(DEFAULT_KEY_RECORD_ID).unwrap().is_none());
}

#[tokio::test]
async fn shared_session_dir_shares_key_between_managers() {
    let temp_dir = tempdir().expect("create temp dir");
    let scope = KeyScope::Shared {
        session_dir: temp_dir.path().join("session"),
    };

    let first = EncryptionManager::new(scope.open_storage());
    first.initialize().await.expect("initialize first");
    let envelope = first.encrypt("shared across processes").await.expect("encrypt");

    let second = EncryptionManager::new(scope.open_storage());
    second.initialize().await.expect("initialize second");

    assert_eq!(
        second.decrypt(&envelope).await.expect("decrypt"),
        "shared across processes"
    );

    let record_path = temp_dir.path().join("session").join(DEFAULT_KEY_RECORD_ID);
    let record = std::fs::read_to_string(record_path).expect("read record file");
    let key = SessionKey::from_record(&record).expect("record decodes");
    assert_eq!(format!("{key:?}"), "SessionKey { bytes: \"[REDACTED]\" }");

    assert_eq!(STANDARD.decode(record.trim()).unwrap().len(), KEY_LEN);
}

#[tokio::test]
async fn non_utf8_record_file_fails_with_key_decode() {
    // 记录文件存在但不是 UTF-8：属于密钥记录损坏，而非存储故障。
    let temp_dir = tempdir().expect("create temp dir");
    let record_path = temp_dir.path().join(DEFAULT_KEY_RECORD_ID);
    std::fs::write(&record_path, [0xff, 0xfe, 0x00]).expect("write record file");

    let manager = EncryptionManager::new(FileSessionStorage::new(temp_dir.path()));
    let result = manager.initialize().await;

    assert!(matches!(result, Err(NoteCryptError::KeyDecode(_))));
    assert!(!manager.is_ready());
    assert!(matches!(manager.state(), KeyState::Unavailable(_)));
    assert_eq!(
        std::fs::read(&record_path).expect("record kept"),
        [0xff, 0xfe, 0x00]
    );
}

#[tokio::test]
async fn per_session_scope_isolates_keys() {
    let scope = KeyScope::PerSession;

    let first = EncryptionManager::new(scope.open_storage());
    let second = EncryptionManager::new(scope.open_storage());
    first.initialize().await.expect("initialize first");
    second.initialize().await.expect("initialize second");

    let envelope = first.encrypt("tab one").await.expect("encrypt");
    assert!(matches!(
        second.decrypt(&envelope).await,
        Err(NoteCryptError::Authentication)
    ));
}

#[test]
fn file_storage_rejects_path_traversal_ids() {
    let temp_dir = tempdir().expect("create temp dir");
    let storage = FileSessionStorage::new(temp_dir.path());

    for id in ["../escape", "a/b", "", ".hidden", "/abs"] {
        assert!(
            matches!(storage.set(id, "value"), Err(NoteCryptError::Storage(_))),
            "id {id:?} should be rejected"
        );
    }

    storage.set("record", "value").expect("plain id accepted");
    assert_eq!(storage.get("record").unwrap().as_deref(), Some("value"));
    storage.remove("record").expect("remove");
    assert!(storage.get("record").unwrap().is_none());
}

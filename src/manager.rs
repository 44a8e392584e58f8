//! 客户端加密管理器
//!
//! 管理器持有一把会话级 AES-256-GCM 密钥，并对外提供
//! 文本的加密 / 解密操作。
//!
//! 状态机：
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──▶ Ready（终态）
//!                                       │
//!                                       └──失败──▶ Unavailable ──initialize()──▶ ...
//! ```
//!
//! 初始化流程（严格顺序）：
//! 1. 从会话存储读取密钥记录
//! 2. 若存在：解码为密钥（失败即 KeyDecode，记录保持原样）
//! 3. 若不存在：生成新密钥并写回会话存储
//! 4. 密钥完全就绪后才对加解密可见
//!
//! 存储读写与密钥生成在 tokio 阻塞线程池上执行。
//!
//! 并发约束：
//! - 同一实例上的并发 initialize() 会被串行化，密钥最多生成一次
//! - 密钥一旦设置即不可变，加解密之间没有共享可变状态

use std::error::Error as _;
use std::sync::Arc;

use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::crypto::{aead, key::SessionKey};
use crate::error::{NoteCryptError, Result};
use crate::storage::SessionStorage;

/// 管理器的可观测状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyState {
    Uninitialized,
    Initializing,
    Ready,
    /// 初始化失败，附带原因；可再次调用 initialize() 重试
    Unavailable(String),
}

pub struct EncryptionManager<S> {
    storage: Arc<S>,
    config: ManagerConfig,
    key: OnceCell<Arc<SessionKey>>,
    state: watch::Sender<KeyState>,
}

impl<S: SessionStorage + 'static> EncryptionManager<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, ManagerConfig::default())
    }

    pub fn with_config(storage: S, config: ManagerConfig) -> Self {
        let (state, _) = watch::channel(KeyState::Uninitialized);

        Self {
            storage: Arc::new(storage),
            config,
            key: OnceCell::new(),
            state,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// 加载或生成会话密钥。
    ///
    /// 已就绪时直接返回；失败后可再次调用重试。
    pub async fn initialize(&self) -> Result<()> {
        self.key.get_or_try_init(|| self.load_or_generate()).await?;

        self.state.send_if_modified(|state| {
            if *state == KeyState::Ready {
                return false;
            }
            *state = KeyState::Ready;
            true
        });

        Ok(())
    }

    /// 是否已进入 Ready
    ///
    /// 与 `state()` 同源：为 true 时密钥必然可用。
    pub fn is_ready(&self) -> bool {
        *self.state.borrow() == KeyState::Ready
    }

    pub fn state(&self) -> KeyState {
        self.state.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<KeyState> {
        self.state.subscribe()
    }

    /// 等待进入 Ready。
    ///
    /// 若初始化失败返回 Unavailable；
    /// 若从未有人触发初始化，将一直等待。
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.state.subscribe();

        loop {
            let state = rx.borrow_and_update().clone();

            match state {
                KeyState::Ready => return Ok(()),
                KeyState::Unavailable(reason) => return Err(NoteCryptError::Unavailable(reason)),
                KeyState::Uninitialized | KeyState::Initializing => {}
            }

            rx.changed().await.map_err(|_| NoteCryptError::Internal)?;
        }
    }

    /// 加密文本，返回编码后的信封
    ///
    /// 密钥未就绪时返回 KeyNotReady。
    pub async fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.key()?;
        let plaintext = plaintext.to_owned();

        run_blocking(move || aead::seal_text(&key, &plaintext)).await
    }

    /// 解密信封，返回原文
    ///
    /// 密钥未就绪时返回 KeyNotReady。
    pub async fn decrypt(&self, envelope: &str) -> Result<String> {
        let key = self.key()?;
        let envelope = envelope.to_owned();

        run_blocking(move || aead::open_text(&key, &envelope)).await
    }

    fn key(&self) -> Result<Arc<SessionKey>> {
        self.key.get().cloned().ok_or(NoteCryptError::KeyNotReady)
    }

    async fn load_or_generate(&self) -> Result<Arc<SessionKey>> {
        self.state.send_replace(KeyState::Initializing);

        let id = self.config.key_record_id.as_str();
        let storage = Arc::clone(&self.storage);
        let record_id = id.to_owned();

        // 存储读写可能落盘（FileSessionStorage），放到阻塞线程池执行
        let result = run_blocking(move || resolve_key(storage.as_ref(), &record_id)).await;

        match result {
            Ok(key) => {
                info!(record = id, "session key ready");
                Ok(Arc::new(key))
            }
            Err(e) => {
                let reason = describe(&e);
                warn!(record = id, error = %reason, "session key initialization failed");
                self.state.send_replace(KeyState::Unavailable(reason));
                Err(e)
            }
        }
    }

    /// 构造管理器并立即在后台开始初始化。
    ///
    /// 必须在 tokio 运行时内调用；初始化结果通过 `state()` /
    /// `wait_ready()` 观察。
    pub fn start(storage: S, config: ManagerConfig) -> Arc<Self> {
        let manager = Arc::new(Self::with_config(storage, config));
        let background = Arc::clone(&manager);

        tokio::spawn(async move {
            // 失败已记录在 Unavailable 状态中
            let _ = background.initialize().await;
        });

        manager
    }
}

fn resolve_key<S: SessionStorage + ?Sized>(storage: &S, id: &str) -> Result<SessionKey> {
    match storage.get(id)? {
        Some(record) => {
            debug!(record = id, "loading stored session key");
            SessionKey::from_record(&record)
        }
        None => {
            debug!(record = id, "no stored session key, generating a new one");
            let key = SessionKey::generate();
            storage.set(id, &key.to_record())?;
            Ok(key)
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| NoteCryptError::Internal)?
}

fn describe(err: &NoteCryptError) -> String {
    match err.source() {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

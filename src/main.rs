//! notecrypt 命令行入口
//!
//! 用法：
//!   notecrypt --session-dir <dir> status
//!   notecrypt --session-dir <dir> init
//!   notecrypt --session-dir <dir> encrypt <text>
//!   notecrypt --session-dir <dir> decrypt <envelope>
//!
//! 会话目录即共享作用域：指向同一目录的调用共用一把密钥。
//! 所有实际逻辑都委托给库中的 EncryptionManager。

use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notecrypt::{
    DEFAULT_KEY_RECORD_ID, EncryptionManager, FileSessionStorage, ManagerConfig, NoteCryptError,
    SessionKey, SessionStorage,
};

#[derive(Parser)]
#[command(name = "notecrypt", about = "Session-scoped note encryption")]
struct Cli {
    /// 会话目录（保存密钥记录）
    #[arg(long, env = "NOTECRYPT_SESSION_DIR")]
    session_dir: PathBuf,

    /// 密钥记录标识符
    #[arg(long, default_value = DEFAULT_KEY_RECORD_ID)]
    key_id: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 查看密钥记录状态
    Status,
    /// 加载或生成会话密钥
    Init,
    /// 加密文本，输出信封
    Encrypt { text: String },
    /// 解密信封，输出原文
    Decrypt { envelope: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let storage = FileSessionStorage::new(&cli.session_dir);
    let config = ManagerConfig {
        key_record_id: cli.key_id,
    };

    if let Command::Status = cli.command {
        return print_status(&storage, &config);
    }

    let manager = EncryptionManager::with_config(storage, config);
    manager.initialize().await.context("encryption unavailable")?;

    match cli.command {
        Command::Status => {}
        Command::Init => println!("ready"),
        Command::Encrypt { text } => println!("{}", manager.encrypt(&text).await?),
        Command::Decrypt { envelope } => println!("{}", manager.decrypt(&envelope).await?),
    }

    Ok(())
}

fn print_status(storage: &FileSessionStorage, config: &ManagerConfig) -> anyhow::Result<()> {
    let record = match storage.get(&config.key_record_id) {
        Err(e @ NoteCryptError::KeyDecode(_)) => {
            println!("key record unusable: {e}");
            return Ok(());
        }
        other => other.with_context(|| format!("reading {}", storage.dir().display()))?,
    };

    match record {
        None => println!("no key record"),
        Some(record) => match SessionKey::from_record(&record) {
            Ok(_) => println!("key record present"),
            Err(e) => println!("key record unusable: {e}"),
        },
    }

    Ok(())
}

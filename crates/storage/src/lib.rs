use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path, sync::Arc};
use tracing::info;

use domain::CommentStore;

mod memory;
mod models;
mod repo;

pub use memory::MemoryStore;

pub const MEMORY_URL: &str = "memory://";

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // Each connection to `:memory:` is its own database.
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options.connect(db_url).await?;

        if !in_memory {
            sqlx::query("PRAGMA journal_mode = WAL;")
                .execute(&pool)
                .await?;
        }
        sqlx::query("PRAGMA synchronous = NORMAL;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

/// Picks the backend for a configured database URL.
pub async fn open_store(db_url: &str) -> anyhow::Result<Arc<dyn CommentStore>> {
    if db_url == MEMORY_URL {
        info!("Using in-memory comment store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    info!("Opening SQLite comment store at {}", db_url);
    Ok(Arc::new(Db::new(db_url).await?))
}

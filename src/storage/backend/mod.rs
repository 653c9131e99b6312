//! SeaORM storage backend
//!
//! Record, destination, QR style and scan event persistence on
//! SQLite, MySQL/MariaDB or PostgreSQL.

mod analytics;
mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod scan_sink;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::errors::{Result, StudioError};

pub use connection::{connect_generic, connect_sqlite, ping, run_migrations};
pub use converters::{model_to_destination, model_to_qr_style, model_to_record};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(StudioError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(StudioError::database_config("DATABASE_URL 未设置"));
        }

        let retry_config = crate::config::try_get_config()
            .map(|config| retry::RetryConfig::from(&config.database))
            .unwrap_or_default();

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        run_migrations(&db).await?;

        let storage = Self::from_connection(db, backend_name, retry_config);
        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 使用已建立（且已迁移）的连接构建存储
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        retry_config: retry::RetryConfig,
    ) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查用的连通性探测
    pub async fn ping(&self) -> Result<()> {
        ping(&self.db).await
    }
}

//! Database lifecycle and schema migrations.

use sqlx::SqliteConnection;

use super::SqliteTaskStore;
use crate::domain::StoreError;

fn migration_error(step: &str, e: sqlx::Error) -> StoreError {
    StoreError::Migration(format!("{step}: {e}"))
}

impl SqliteTaskStore {
    /// Bring the schema up to the latest version.
    pub(super) async fn run_migrations(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| migration_error("create schema_version table", e))?;

        let current_version: Option<i64> =
            sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await?
                .flatten();

        if current_version.unwrap_or(0) < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: tasks table.
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<(), StoreError> {
        tracing::info!("applying task store migration v1");

        // partial failures must not leave a half-built schema behind
        sqlx::query("BEGIN")
            .execute(&mut *conn)
            .await
            .map_err(|e| migration_error("begin v1", e))?;

        let result = async {
            sqlx::query(
                r#"
                CREATE TABLE tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    status INTEGER NOT NULL DEFAULT 0,
                    attempts INTEGER NOT NULL DEFAULT 0,
                    last_error TEXT,
                    created_at INTEGER NOT NULL,
                    finished_at INTEGER
                )
                "#,
            )
            .execute(&mut *conn)
            .await
            .map_err(|e| migration_error("create tasks table", e))?;

            sqlx::query("CREATE INDEX idx_tasks_status_id ON tasks(status, id)")
                .execute(&mut *conn)
                .await
                .map_err(|e| migration_error("create tasks index", e))?;

            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
                .bind(1i64)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *conn)
                .await
                .map_err(|e| migration_error("record v1", e))?;

            Ok::<(), StoreError>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| migration_error("commit v1", e))?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!("task store migration v1 complete");
        Ok(())
    }
}

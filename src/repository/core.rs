use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{FromRow, SqlitePool};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::tags::delimited_needle;
use super::types::now_millis;
use super::{Comment, ImageRecord, ListQuery, RepositoryError, SortOrder, TagSet, split_tags};
use crate::DatabaseConfig;
use crate::store::ContentKey;

const COLUMNS: &str =
    "id, hash, date, tags, likes, shares, comments, last_updated, workspace_id";

#[derive(FromRow)]
struct ImageRow {
    id: i64,
    hash: i64,
    date: i64,
    tags: String,
    likes: i64,
    shares: i64,
    comments: String,
    last_updated: i64,
    workspace_id: String,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        let comments = serde_json::from_str::<Vec<Comment>>(&row.comments).unwrap_or_else(|e| {
            warn!(id = row.id, "Unreadable comment log, treating as empty: {}", e);
            Vec::new()
        });

        ImageRecord {
            id: row.id,
            hash: ContentKey::new(row.hash as u32),
            date: row.date,
            tags: TagSet::parse(&row.tags),
            likes: row.likes,
            shares: row.shares,
            comments,
            last_updated: row.last_updated,
            workspace_id: row.workspace_id,
        }
    }
}

/// SQLite-backed image metadata.
///
/// Every operation is a single statement against a pooled connection;
/// nothing here spans a transaction.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&config.url)?;
        Self::connect_with(options, config.max_connections, config.busy_timeout_seconds).await
    }

    /// Open (creating if missing) a database file.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect_with(options, max_connections, 5).await
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        max_connections: u32,
        busy_timeout_seconds: u64,
    ) -> Result<Self, RepositoryError> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(busy_timeout_seconds));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash INTEGER NOT NULL,
                date INTEGER NOT NULL,
                tags TEXT NOT NULL DEFAULT '',
                likes INTEGER NOT NULL DEFAULT 0,
                shares INTEGER NOT NULL DEFAULT 0,
                comments TEXT NOT NULL DEFAULT '[]',
                last_updated INTEGER NOT NULL,
                workspace_id TEXT NOT NULL DEFAULT 'default'
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_images_workspace_id ON images (workspace_id, id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_images_workspace_updated \
             ON images (workspace_id, last_updated, id)",
        )
        .execute(&self.pool)
        .await?;

        info!("Image metadata schema is up to date");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<ImageRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {COLUMNS} FROM images WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ImageRecord::from))
    }

    /// Create a record with zeroed counters and an empty comment log, then
    /// read it back.
    pub async fn insert(
        &self,
        hash: ContentKey,
        tags: &str,
        workspace_id: &str,
    ) -> Result<ImageRecord, RepositoryError> {
        let now = now_millis();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO images (hash, date, tags, likes, shares, comments, last_updated, workspace_id) \
             VALUES (?, ?, ?, 0, 0, '[]', ?, ?) RETURNING id",
        )
        .bind(i64::from(hash))
        .bind(now)
        .bind(TagSet::parse(tags).to_string())
        .bind(now)
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(id, hash = %hash, workspace = %workspace_id, "Inserted image record");

        self.get(id)
            .await?
            .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))
    }

    /// Remove the row. On-disk artifacts are left alone.
    pub async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, RepositoryError> {
        // SQLite reads a negative OFFSET as zero; past i64::MAX there is nothing left.
        let Ok(offset) = i64::try_from(query.offset) else {
            return Ok(Vec::new());
        };

        let mut sql = format!("SELECT {COLUMNS} FROM images WHERE workspace_id = ?");
        let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
        if tag.is_some() {
            sql.push_str(" AND instr(', ' || tags || ',', ?) > 0");
        }
        sql.push_str(match query.sort {
            SortOrder::Newest => " ORDER BY id DESC",
            SortOrder::RecentActivity => " ORDER BY last_updated DESC, id DESC",
        });
        sql.push_str(" LIMIT ? OFFSET ?");

        let mut statement = sqlx::query_as::<_, ImageRow>(&sql).bind(&query.workspace_id);
        if let Some(tag) = tag {
            statement = statement.bind(delimited_needle(tag));
        }
        let rows = statement
            .bind(i64::from(query.limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ImageRecord::from).collect())
    }

    /// Distinct labels used in a workspace, sorted lexicographically.
    pub async fn list_tags(&self, workspace_id: &str) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<String> = sqlx::query_scalar("SELECT tags FROM images WHERE workspace_id = ?")
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;

        let tags: BTreeSet<String> = rows
            .iter()
            .flat_map(|raw| split_tags(raw))
            .map(str::to_string)
            .collect();

        Ok(tags.into_iter().collect())
    }

    /// Record count per workspace across the whole store.
    pub async fn stats(&self) -> Result<BTreeMap<String, i64>, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT workspace_id, COUNT(*) FROM images GROUP BY workspace_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn update_tags(&self, id: i64, tags: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE images SET tags = ?, last_updated = ? WHERE id = ?")
            .bind(TagSet::parse(tags).to_string())
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the like count. Prefer [`Repository::increment_likes`] for
    /// user actions.
    pub async fn update_likes(&self, id: i64, count: i64) -> Result<bool, RepositoryError> {
        self.set_counter("likes", id, count).await
    }

    pub async fn update_shares(&self, id: i64, count: i64) -> Result<bool, RepositoryError> {
        self.set_counter("shares", id, count).await
    }

    /// Atomically add one like. Returns the new count, or `None` for an
    /// unknown id.
    pub async fn increment_likes(&self, id: i64) -> Result<Option<i64>, RepositoryError> {
        self.increment_counter("likes", id).await
    }

    pub async fn increment_shares(&self, id: i64) -> Result<Option<i64>, RepositoryError> {
        self.increment_counter("shares", id).await
    }

    pub async fn update_comments(
        &self,
        id: i64,
        comments: &[Comment],
    ) -> Result<bool, RepositoryError> {
        let json = serde_json::to_string(comments)?;
        let result = sqlx::query("UPDATE images SET comments = ?, last_updated = ? WHERE id = ?")
            .bind(json)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append one comment and return the updated log.
    ///
    /// Read and write are separate statements: concurrent appends to the same
    /// record can drop one of the comments.
    pub async fn append_comment(
        &self,
        id: i64,
        comment: Comment,
    ) -> Result<Option<Vec<Comment>>, RepositoryError> {
        let Some(record) = self.get(id).await? else {
            return Ok(None);
        };

        let mut comments = record.comments;
        comments.push(comment);

        if !self.update_comments(id, &comments).await? {
            return Ok(None);
        }
        Ok(Some(comments))
    }

    // Column names are fixed literals from this module, never user input.
    async fn set_counter(
        &self,
        column: &'static str,
        id: i64,
        count: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE images SET {column} = ?, last_updated = ? WHERE id = ?"
        ))
        .bind(count)
        .bind(now_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_counter(
        &self,
        column: &'static str,
        id: i64,
    ) -> Result<Option<i64>, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "UPDATE images SET {column} = {column} + 1, last_updated = ? WHERE id = ? RETURNING {column}"
        ))
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count)
    }
}

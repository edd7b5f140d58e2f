//! Database migrations
//!
//! Code-based migrations embedded in the binary. Each migration is a
//! `Migration` struct with a unique version and its SQL; applied versions are
//! tracked in the `_migrations` table so reruns are no-ops.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// A single database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements to apply
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in order.
///
/// The (name, kind) uniqueness of categories and tags among live rows is
/// enforced with partial unique indexes; soft-deleted rows fall out of the
/// index so a name can be reused after deletion.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_categories",
        up: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                kind VARCHAR(20) NOT NULL,
                parent_id INTEGER,
                sort_order INTEGER NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deleted INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (parent_id) REFERENCES categories(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_categories_parent_id ON categories(parent_id);
            CREATE INDEX IF NOT EXISTS idx_categories_kind ON categories(kind);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_live_name
                ON categories(name, kind) WHERE deleted = 0;
        "#,
    },
    Migration {
        version: 2,
        name: "create_tags",
        up: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                kind VARCHAR(20) NOT NULL,
                color VARCHAR(20),
                usage_count INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_tags_kind ON tags(kind);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_live_name
                ON tags(name, kind) WHERE deleted = 0;
        "#,
    },
    Migration {
        version: 3,
        name: "create_articles",
        up: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                summary TEXT,
                cover_image VARCHAR(512),
                tags TEXT NOT NULL DEFAULT '[]',
                source_url VARCHAR(512),
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                view_count INTEGER NOT NULL DEFAULT 0,
                like_count INTEGER NOT NULL DEFAULT 0,
                publish_time TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deleted INTEGER NOT NULL DEFAULT 0,
                category_id INTEGER,
                source_type VARCHAR(20) NOT NULL DEFAULT 'manual',
                is_top INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
            CREATE INDEX IF NOT EXISTS idx_articles_publish_time ON articles(publish_time);
            CREATE INDEX IF NOT EXISTS idx_articles_category_id ON articles(category_id);
            CREATE INDEX IF NOT EXISTS idx_articles_source_url ON articles(source_url);
        "#,
    },
    Migration {
        version: 4,
        name: "create_news_items",
        up: r#"
            CREATE TABLE IF NOT EXISTS news_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                summary TEXT,
                cover_image VARCHAR(512),
                tags TEXT NOT NULL DEFAULT '[]',
                source_url VARCHAR(512),
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                view_count INTEGER NOT NULL DEFAULT 0,
                like_count INTEGER NOT NULL DEFAULT 0,
                publish_time TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deleted INTEGER NOT NULL DEFAULT 0,
                category VARCHAR(100),
                source VARCHAR(100),
                is_hot INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_news_status ON news_items(status);
            CREATE INDEX IF NOT EXISTS idx_news_publish_time ON news_items(publish_time);
            CREATE INDEX IF NOT EXISTS idx_news_category ON news_items(category);
            CREATE INDEX IF NOT EXISTS idx_news_source ON news_items(source);
            CREATE INDEX IF NOT EXISTS idx_news_source_url ON news_items(source_url);
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &SqlitePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let up_to_date = is_up_to_date(&pool).await.expect("Failed to check");
        assert!(!up_to_date);

        run_migrations(&pool).await.expect("Failed to run migrations");
        let up_to_date = is_up_to_date(&pool).await.expect("Failed to check");
        assert!(up_to_date);
    }

    #[tokio::test]
    async fn test_live_name_index_allows_reuse_after_delete() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        sqlx::query("INSERT INTO tags (name, kind) VALUES ('rust', 'article')")
            .execute(&pool)
            .await
            .expect("first insert");

        // Same live (name, kind) must be rejected
        let dup = sqlx::query("INSERT INTO tags (name, kind) VALUES ('rust', 'article')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());

        // Soft-delete frees the name
        sqlx::query("UPDATE tags SET deleted = 1 WHERE name = 'rust'")
            .execute(&pool)
            .await
            .expect("soft delete");
        sqlx::query("INSERT INTO tags (name, kind) VALUES ('rust', 'article')")
            .execute(&pool)
            .await
            .expect("reuse after delete");
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_split_sql_ignores_comments() {
        let sql = r#"
            -- leading comment
            CREATE TABLE a (id INT);
            -- trailing comment
        "#;
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_split_sql_handles_missing_trailing_semicolon() {
        let sql = "CREATE TABLE a (id INT)";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_migration_versions_are_unique_and_ordered() {
        let mut last = 0;
        for m in MIGRATIONS {
            assert!(m.version > last, "version {} out of order", m.version);
            last = m.version;
        }
    }
}

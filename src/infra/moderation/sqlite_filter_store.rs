// SQLite-backed filter store for persistent moderation configuration.
//
// Tables:
// - moderation_filters: single-row table (id = 1) holding the live config.
//   List fields are stored as JSON text.

use crate::core::moderation::{AgeRestriction, FilterConfig, FilterStore, ModerationError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteFilterStore {
    pool: Pool<Sqlite>,
}

impl SqliteFilterStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_filters (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                violence_filter BOOLEAN NOT NULL DEFAULT 1,
                adult_content_filter BOOLEAN NOT NULL DEFAULT 1,
                hate_speech_filter BOOLEAN NOT NULL DEFAULT 1,
                spam_filter BOOLEAN NOT NULL DEFAULT 1,
                copyright_filter BOOLEAN NOT NULL DEFAULT 1,
                strict_mode BOOLEAN NOT NULL DEFAULT 0,
                custom_blocked_words TEXT NOT NULL DEFAULT '[]',
                custom_blocked_phrases TEXT NOT NULL DEFAULT '[]',
                allowed_content_types TEXT NOT NULL,
                age_restriction TEXT NOT NULL DEFAULT 'all',
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn decode_list(raw: &str) -> Result<Vec<String>, ModerationError> {
        serde_json::from_str(raw).map_err(|e| ModerationError::StorageError(e.to_string()))
    }

    fn encode_list(list: &[String]) -> Result<String, ModerationError> {
        serde_json::to_string(list).map_err(|e| ModerationError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl FilterStore for SqliteFilterStore {
    async fn load(&self) -> Result<FilterConfig, ModerationError> {
        let row = sqlx::query("SELECT * FROM moderation_filters WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        // No row yet means no admin has touched the filters; serve defaults.
        let Some(row) = row else {
            return Ok(FilterConfig::default());
        };

        let age_raw: String = row.get("age_restriction");
        let age_restriction = AgeRestriction::parse(&age_raw).ok_or_else(|| {
            ModerationError::StorageError(format!("unknown age restriction '{age_raw}'"))
        })?;

        let words: String = row.get("custom_blocked_words");
        let phrases: String = row.get("custom_blocked_phrases");
        let content_types: String = row.get("allowed_content_types");

        Ok(FilterConfig {
            violence_filter: row.get("violence_filter"),
            adult_content_filter: row.get("adult_content_filter"),
            hate_speech_filter: row.get("hate_speech_filter"),
            spam_filter: row.get("spam_filter"),
            copyright_filter: row.get("copyright_filter"),
            strict_mode: row.get("strict_mode"),
            custom_blocked_words: Self::decode_list(&words)?,
            custom_blocked_phrases: Self::decode_list(&phrases)?,
            allowed_content_types: Self::decode_list(&content_types)?,
            age_restriction,
        })
    }

    async fn save(&self, config: FilterConfig) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            INSERT INTO moderation_filters (
                id, violence_filter, adult_content_filter, hate_speech_filter,
                spam_filter, copyright_filter, strict_mode,
                custom_blocked_words, custom_blocked_phrases,
                allowed_content_types, age_restriction, updated_at
            )
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                violence_filter = excluded.violence_filter,
                adult_content_filter = excluded.adult_content_filter,
                hate_speech_filter = excluded.hate_speech_filter,
                spam_filter = excluded.spam_filter,
                copyright_filter = excluded.copyright_filter,
                strict_mode = excluded.strict_mode,
                custom_blocked_words = excluded.custom_blocked_words,
                custom_blocked_phrases = excluded.custom_blocked_phrases,
                allowed_content_types = excluded.allowed_content_types,
                age_restriction = excluded.age_restriction,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(config.violence_filter)
        .bind(config.adult_content_filter)
        .bind(config.hate_speech_filter)
        .bind(config.spam_filter)
        .bind(config.copyright_filter)
        .bind(config.strict_mode)
        .bind(Self::encode_list(&config.custom_blocked_words)?)
        .bind(Self::encode_list(&config.custom_blocked_phrases)?)
        .bind(Self::encode_list(&config.allowed_content_types)?)
        .bind(config.age_restriction.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{ScrapedStory, Story};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            // WAL keeps the search read path unblocked during batch commits
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Scrape-state operations

    /// Raw rotation pointer as persisted; `None` when the singleton row is
    /// missing or holds a non-integer value (SQLite's dynamic typing allows
    /// TEXT in the column). Range validation belongs to the scheduler.
    pub async fn scrape_pointer(&self) -> Result<Option<i64>> {
        let pointer = self
            .conn
            .call(|conn| {
                let value = conn
                    .query_row(
                        "SELECT last_scraped_category_index FROM scrape_state WHERE id = 1",
                        [],
                        |row| row.get::<_, Value>(0),
                    )
                    .optional()?;
                let pointer = match value {
                    Some(Value::Integer(index)) => Some(index),
                    _ => None,
                };
                Ok(pointer)
            })
            .await?;
        Ok(pointer)
    }

    pub async fn set_scrape_pointer(&self, index: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO scrape_state (id, last_scraped_category_index)
                       VALUES (1, ?1)
                       ON CONFLICT(id) DO UPDATE SET
                           last_scraped_category_index = excluded.last_scraped_category_index"#,
                    params![index],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Story operations

    /// URLs whose synopsis has already been fetched. Used to skip the
    /// expensive detail-page fetch for stories we already have.
    pub async fn urls_with_synopsis(&self) -> Result<HashSet<String>> {
        let urls = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT url FROM stories WHERE synopsis IS NOT NULL AND synopsis != ''",
                )?;
                let urls = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<HashSet<_>, _>>()?;
                Ok(urls)
            })
            .await?;
        Ok(urls)
    }

    /// Insert or overwrite a batch of stories in a single transaction. If
    /// any row fails to apply the whole batch rolls back and the error
    /// propagates; batches committed earlier in the run stay durable.
    pub async fn upsert_batch(&self, stories: Vec<ScrapedStory>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT INTO stories (url, title, synopsis, categories, last_scraped_at)
                           VALUES (?1, ?2, ?3, ?4, datetime('now'))
                           ON CONFLICT(url) DO UPDATE SET
                               title = excluded.title,
                               synopsis = excluded.synopsis,
                               categories = excluded.categories,
                               last_scraped_at = excluded.last_scraped_at"#,
                    )?;
                    for story in &stories {
                        stmt.execute(params![
                            story.url,
                            story.title,
                            story.synopsis,
                            story.categories.join(","),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn get_story(&self, url: &str) -> Result<Option<Story>> {
        let url = url.to_string();
        let story = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT url, title, synopsis, categories, last_scraped_at FROM stories WHERE url = ?1",
                )?;
                let story = stmt
                    .query_row(params![url], |row| Ok(story_from_row(row)))
                    .optional()?;
                Ok(story)
            })
            .await?;
        Ok(story)
    }

    #[allow(dead_code)]
    pub async fn story_count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count = conn.query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    #[cfg(test)]
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn story_from_row(row: &Row) -> Story {
    let categories: String = row.get(3).unwrap_or_default();
    Story {
        url: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        synopsis: row.get(2).unwrap(),
        categories: if categories.is_empty() {
            Vec::new()
        } else {
            categories.split(',').map(str::to_string).collect()
        },
        last_scraped_at: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

pub const SCHEMA: &str = r#"
-- stories table: one row per story URL, overwritten on re-scrape
CREATE TABLE IF NOT EXISTS stories (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    synopsis TEXT NOT NULL DEFAULT '',
    categories TEXT NOT NULL DEFAULT '',
    last_scraped_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- scrape_state: singleton row holding the category rotation pointer.
-- -1 means nothing has been scraped yet, so the next pass starts at 0.
CREATE TABLE IF NOT EXISTS scrape_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_scraped_category_index INTEGER NOT NULL
);

INSERT OR IGNORE INTO scrape_state (id, last_scraped_category_index) VALUES (1, -1);
"#;

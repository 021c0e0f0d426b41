pub const SCHEMA: &str = r#"
-- headlines table
CREATE TABLE IF NOT EXISTS headlines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    date TEXT NOT NULL,
    category TEXT,
    summary TEXT,
    keywords TEXT,
    comment TEXT,
    comment_type TEXT,
    quality TEXT NOT NULL DEFAULT 'ok',
    body TEXT
);

CREATE INDEX IF NOT EXISTS idx_headlines_url ON headlines(url);
CREATE INDEX IF NOT EXISTS idx_headlines_date ON headlines(date DESC);
CREATE INDEX IF NOT EXISTS idx_headlines_source ON headlines(source);
"#;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{CommentType, Headline, NewHeadline, Quality};

use super::schema::SCHEMA;

/// Storage seam for the ingestion pipeline: existence check, staged insert,
/// and transaction control. Inserts between `begin` and `commit` are staged
/// and become durable only on commit.
#[async_trait]
pub trait HeadlineStore: Send + Sync {
    async fn url_exists(&self, url: &str) -> Result<bool>;

    /// Stage one record inside the open transaction. Returns false when the
    /// url already exists (the UNIQUE constraint is the authoritative dedupe
    /// signal, so a lost insert race surfaces here instead of as an error).
    async fn insert(&self, headline: NewHeadline) -> Result<bool>;

    async fn begin(&self) -> Result<()>;
    async fn commit(&self) -> Result<()>;
    async fn rollback(&self) -> Result<()>;
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn count_headlines(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM headlines", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    pub async fn headlines_for_date(&self, date: NaiveDate) -> Result<Vec<Headline>> {
        let date_str = date.to_string();
        let headlines = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, source, title, url, date, category, summary, keywords,
                              comment, comment_type, quality, body
                       FROM headlines WHERE date = ?1 ORDER BY id"#,
                )?;
                let headlines = stmt
                    .query_map(params![date_str], |row| Ok(headline_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(headlines)
            })
            .await?;
        Ok(headlines)
    }
}

#[async_trait]
impl HeadlineStore for Repository {
    async fn url_exists(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM headlines WHERE url = ?1",
                    params![url],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    async fn insert(&self, headline: NewHeadline) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT OR IGNORE INTO headlines
                       (source, title, url, date, category, summary, keywords,
                        comment, comment_type, quality, body)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                    params![
                        headline.source,
                        headline.title,
                        headline.url,
                        headline.date.to_string(),
                        headline.category,
                        headline.summary,
                        headline.keywords,
                        headline.comment,
                        headline.comment_type.map(|ct| ct.as_str()),
                        headline.quality.as_str(),
                        headline.body,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    async fn begin(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("BEGIN")?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("COMMIT")?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("ROLLBACK")?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn headline_from_row(row: &Row) -> Headline {
    Headline {
        id: row.get(0).unwrap(),
        source: row.get(1).unwrap(),
        title: row.get(2).unwrap(),
        url: row.get(3).unwrap(),
        date: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_date(&s))
            .unwrap_or_default(),
        category: row.get(5).unwrap(),
        summary: row.get(6).unwrap(),
        keywords: row.get(7).unwrap(),
        comment: row.get(8).unwrap(),
        comment_type: row
            .get::<_, Option<String>>(9)
            .unwrap()
            .and_then(|s| CommentType::parse(&s)),
        quality: row
            .get::<_, String>(10)
            .ok()
            .and_then(|s| Quality::parse(&s))
            .unwrap_or_default(),
        body: row.get(11).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(url: &str) -> NewHeadline {
        NewHeadline {
            source: "NHK".to_string(),
            title: "Tokyo rain warning issued".to_string(),
            url: url.to_string(),
            date: Utc::now().date_naive(),
            category: Some("disaster".to_string()),
            summary: Some("Heavy rain expected in Tokyo.".to_string()),
            keywords: Some("tokyo,rain".to_string()),
            comment: None,
            comment_type: None,
            quality: Quality::Ok,
            body: None,
        }
    }

    async fn temp_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn insert_then_url_exists() {
        let (_dir, repo) = temp_repo().await;

        assert!(!repo.url_exists("https://x/1").await.unwrap());
        assert!(repo.insert(sample("https://x/1")).await.unwrap());
        assert!(repo.url_exists("https://x/1").await.unwrap());
        assert_eq!(repo.count_headlines().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_url_is_ignored_by_constraint() {
        let (_dir, repo) = temp_repo().await;

        assert!(repo.insert(sample("https://x/1")).await.unwrap());
        assert!(!repo.insert(sample("https://x/1")).await.unwrap());
        assert_eq!(repo.count_headlines().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_inserts() {
        let (_dir, repo) = temp_repo().await;

        repo.begin().await.unwrap();
        repo.insert(sample("https://x/1")).await.unwrap();
        repo.insert(sample("https://x/2")).await.unwrap();
        repo.rollback().await.unwrap();

        assert_eq!(repo.count_headlines().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn commit_makes_staged_inserts_durable() {
        let (_dir, repo) = temp_repo().await;

        repo.begin().await.unwrap();
        repo.insert(sample("https://x/1")).await.unwrap();
        repo.commit().await.unwrap();

        assert_eq!(repo.count_headlines().await.unwrap(), 1);

        let today = Utc::now().date_naive();
        let rows = repo.headlines_for_date(today).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, "https://x/1");
        assert_eq!(rows[0].quality, Quality::Ok);
        assert_eq!(rows[0].date, today);
    }
}

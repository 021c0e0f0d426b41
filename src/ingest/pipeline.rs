use std::sync::Arc;

use chrono::Utc;

use crate::ai::Summarize;
use crate::db::HeadlineStore;
use crate::error::Result;
use crate::models::{NewHeadline, SummaryRecord};
use crate::services::{categorizer, FetchArticleBody};

/// Staged records are flushed to durable storage every this many inserts.
pub const DEFAULT_COMMIT_BATCH: usize = 100;

/// Per-call outcome summary. Counts reflect per-item processing outcomes;
/// when `aborted` is set, items staged after the last batch commit were
/// rolled back and are not durable even though they were counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows staged for insertion (includes degraded ones).
    pub inserted: usize,
    /// Pairs whose url was already present.
    pub skipped: usize,
    /// Rows inserted with fallback enrichment after a summarizer failure.
    pub degraded: usize,
    /// Set when a storage error aborted the remainder of the call.
    pub aborted: Option<String>,
}

/// Sequential dedupe -> categorize -> fetch body -> summarize -> persist
/// pipeline for one source's headline list. Collaborators are injected and
/// owned by the caller; the store is exclusively this pipeline's for the
/// duration of an `ingest` call.
pub struct IngestPipeline {
    store: Arc<dyn HeadlineStore>,
    fetcher: Arc<dyn FetchArticleBody>,
    summarizer: Arc<dyn Summarize>,
    batch_size: usize,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn HeadlineStore>,
        fetcher: Arc<dyn FetchArticleBody>,
        summarizer: Arc<dyn Summarize>,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            batch_size: DEFAULT_COMMIT_BATCH,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Ingest one source's (title, url) pairs in order. Never returns an
    /// error: storage failures roll back the uncommitted batch, are logged,
    /// and surface only through `IngestReport::aborted`. Batches already
    /// committed earlier in the same call stay durable.
    pub async fn ingest(
        &self,
        source: &str,
        pairs: &[(String, String)],
        default_category: Option<&str>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        if let Err(e) = self.run(source, pairs, default_category, &mut report).await {
            tracing::error!("Ingestion for {} aborted: {}", source, e);
            if let Err(rollback_err) = self.store.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            report.aborted = Some(e.to_string());
        }

        tracing::info!(
            "{}: {} inserted, {} skipped, {} degraded",
            source,
            report.inserted,
            report.skipped,
            report.degraded
        );
        report
    }

    async fn run(
        &self,
        source: &str,
        pairs: &[(String, String)],
        default_category: Option<&str>,
        report: &mut IngestReport,
    ) -> Result<()> {
        self.store.begin().await?;

        let mut staged = 0usize;
        for (title, url) in pairs {
            // Re-running the same scrape must never create duplicates or
            // re-spend enrichment cost on an already-seen url.
            if self.store.url_exists(url).await? {
                report.skipped += 1;
                continue;
            }

            let category = categorizer::categorize_title(title)
                .or_else(|| default_category.map(|c| c.to_string()));

            // Body fetch is best-effort by contract: empty string on failure.
            let body = self.fetcher.fetch(url).await;

            let enrichment = match self.summarizer.summarize(title, source, &body).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Summarization failed for {}: {}", url, e);
                    report.degraded += 1;
                    SummaryRecord::fallback()
                }
            };

            let record = NewHeadline {
                source: source.to_string(),
                title: title.clone(),
                url: url.clone(),
                // Collection date, not publish date.
                date: Utc::now().date_naive(),
                category,
                summary: none_if_empty(enrichment.summary),
                keywords: if enrichment.keywords.is_empty() {
                    None
                } else {
                    Some(enrichment.keywords.join(","))
                },
                comment: enrichment.comment,
                comment_type: enrichment.comment_type,
                quality: enrichment.quality,
                body: none_if_empty(body),
            };

            if !self.store.insert(record).await? {
                // Lost an insert race; the unique constraint already holds
                // a row for this url.
                report.skipped += 1;
                continue;
            }
            report.inserted += 1;
            staged += 1;

            // Skipped pairs do not advance the batch counter.
            if staged % self.batch_size == 0 {
                self.store.commit().await?;
                self.store.begin().await?;
            }
        }

        self.store.commit().await?;
        Ok(())
    }
}

fn none_if_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

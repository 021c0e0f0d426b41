pub mod categorizer;
mod content_fetcher;

pub use content_fetcher::{ContentFetcher, FetchArticleBody};

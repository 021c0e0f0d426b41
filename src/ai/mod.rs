mod summarizer;

pub use summarizer::{BasicSummarizer, EnrichedSummarizer, OpenAiClient, Summarize};

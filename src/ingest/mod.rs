mod pipeline;

pub use pipeline::{IngestPipeline, IngestReport, DEFAULT_COMMIT_BATCH};

mod headline;

pub use headline::{CommentType, Headline, NewHeadline, Quality, SummaryRecord};

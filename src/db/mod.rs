mod repository;
mod schema;

pub use repository::{HeadlineStore, Repository};

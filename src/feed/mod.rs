// Feed module - paginated workspace views composed from repository reads
mod core;
mod handlers;
mod types;

pub use core::FeedService;
pub use handlers::{filters_handler, list_handler, record_handler, stats_handler, tags_handler};
pub use types::{FeedRequest, WorkspaceQuery};

#[cfg(test)]
mod tests;

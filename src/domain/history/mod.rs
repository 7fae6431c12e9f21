//! Query history domain

mod record;
mod repository;

pub use record::HistoryRecord;
pub use repository::HistoryRepository;

#[cfg(test)]
pub use repository::MockHistoryRepository;

//! Query history persistence

mod in_memory;
mod postgres;

pub use in_memory::InMemoryHistoryRepository;
pub use postgres::PostgresHistoryRepository;

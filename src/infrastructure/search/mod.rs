//! Web search provider implementations

mod tavily;

pub use tavily::{TavilyProvider, DEFAULT_TAVILY_BASE_URL};

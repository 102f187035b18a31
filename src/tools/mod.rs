pub mod search;

pub use search::{HttpWebSearch, SearchProvider, SearchResult, WebSearch};

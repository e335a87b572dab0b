pub mod scrape_cache;

pub use scrape_cache::{CachedResult, ScrapeCache};

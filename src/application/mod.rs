pub mod extract;
pub mod lookup;
pub mod matcher;
pub mod scrape;

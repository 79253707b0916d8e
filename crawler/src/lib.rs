pub mod clean;
pub mod crawl;
pub mod fetch;
pub mod links;

pub use crawl::WebCrawler;

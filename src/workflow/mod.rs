pub mod captcha_step;
pub mod case_flow;
pub mod crawl_flow;
pub mod fetch_ctx;

pub use case_flow::CaseFlow;
pub use crawl_flow::CrawlFlow;
pub use fetch_ctx::FetchCtx;

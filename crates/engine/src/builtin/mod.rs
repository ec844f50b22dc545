//! Minimal built-in processors and step executors (spec's carried-through
//! non-goal: "HTTP/HTML scraping internals, any specific AI model client
//! ... are invoked through narrow, named contracts; their implementations
//! are out of scope"). These are test fixtures, not production
//! processors — they exist so the pool, the executor, and the daemon
//! wiring can be exercised end-to-end without a real scraper or model
//! client.

mod agent_processor;
mod crawl_step_executor;
mod crawler_url_processor;
mod summarizer_processor;

pub use agent_processor::AgentProcessor;
pub use crawl_step_executor::CrawlStepExecutor;
pub use crawler_url_processor::CrawlerUrlProcessor;
pub use summarizer_processor::SummarizerProcessor;

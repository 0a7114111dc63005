//! Best-effort background enrichment of user records.

pub mod resolver;
pub mod task;

pub use resolver::{HttpResolver, Resolver};
pub use task::{Enricher, EnrichmentScheduler, RetryPolicy, UNKNOWN_DISPLAY_NAME};

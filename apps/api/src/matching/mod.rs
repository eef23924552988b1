// Matching engine: scores every (candidate, job) pair, ranks per anchor, and
// upserts the result keyed by the pair. Triggers run batches off the request path.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod finder;
pub mod handlers;
pub mod labels;
pub mod notifier;
pub mod persister;
pub mod pg_store;
pub mod scoring;
pub mod store;
pub mod triggers;
pub mod weights;

#[cfg(test)]
pub mod testing;

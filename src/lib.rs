pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod numeric;
pub mod query;
pub mod rank;
pub mod registry;
pub mod server;
pub mod snapshot;
pub mod types;

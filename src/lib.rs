pub mod batch;
pub mod clean;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod report;

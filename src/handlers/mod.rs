pub mod ingest;
pub mod listing;

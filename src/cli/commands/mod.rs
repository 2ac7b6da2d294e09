mod config;
mod ingest;
mod query;
mod status;

pub use config::{ConfigCommand, handle_config};
pub use ingest::{IngestArgs, handle_ingest};
pub use query::{QueryArgs, handle_query};
pub use status::handle_status;

mod ask;
mod config;
mod ingest;
mod search;
mod split;
mod status;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use search::SearchArgs;
pub use split::SplitArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use search::handle_search;
pub use split::handle_split;
pub use status::handle_status;

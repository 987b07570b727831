mod ingest;
mod init;
mod months;

pub use ingest::{run_collectors, RunOptions};
pub use init::init_config;
pub use months::print_months;

//! CLI command handlers, one file per command.

mod fetch;
mod link;
mod run;
mod status;

pub use fetch::run_fetch;
pub use link::run_link;
pub use run::run_batch;
pub use status::run_status;

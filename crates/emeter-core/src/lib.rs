pub mod config;
pub mod logging;

pub mod archive;
pub mod batch;
pub mod error;
pub mod http;
pub mod identifier;
pub mod link;
pub mod progress;
pub mod source;
pub mod storage;

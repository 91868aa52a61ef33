pub mod cache;
pub mod cli;
pub mod error;
pub mod github;
pub mod http;
pub mod licenses;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod pool;
pub mod progress;
pub mod run;
pub mod types;
pub mod whitesource;

pub mod batch;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod target;

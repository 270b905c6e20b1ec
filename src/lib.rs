pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod finder;
pub mod grants;
pub mod logging;
pub mod progress;
pub mod readme;
pub mod tabular;

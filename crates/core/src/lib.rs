//! AD Sync Core -- configuration, error taxonomy and log file setup shared by
//! the directory sync and the command-line entry point.

pub mod config;
pub mod error;
pub mod logging;

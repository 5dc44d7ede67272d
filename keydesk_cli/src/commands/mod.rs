//! CLI command implementations

pub mod clients;
pub mod inline;
pub mod serve;
pub mod watch;

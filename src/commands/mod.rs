pub mod config;
pub mod context;
pub mod detect;
pub mod fill;
pub mod infer;
pub mod insert;
pub mod projects;
pub mod status;
pub mod utils;
pub mod version;
pub mod watch;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;

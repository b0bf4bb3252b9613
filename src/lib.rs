pub mod cli;
pub mod client;
pub mod load_config;
pub mod session;

pub use cli::{run, Cli, Commands};

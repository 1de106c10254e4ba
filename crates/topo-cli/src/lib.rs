pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, NetworkCommands, SolveArgs, TrussCommands};
pub use config::DesignConfig;

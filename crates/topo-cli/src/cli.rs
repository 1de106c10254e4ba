use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use topo_algo::MilpBackend;

#[derive(Parser, Debug)]
#[command(name = "topo", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capacity-constrained network design
    Network {
        #[command(subcommand)]
        command: NetworkCommands,
    },
    /// Truss topology optimization
    Truss {
        #[command(subcommand)]
        command: TrussCommands,
    },
    /// List the MILP engines compiled into this binary
    Backends,
}

/// Options shared by every design command.
#[derive(Args, Debug, Clone, Default)]
pub struct SolveArgs {
    /// TOML parameter file ([solver], [network] and [truss] tables)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Wall-clock limit for the exact solve, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Relative MIP optimality gap
    #[arg(long)]
    pub mip_gap: Option<f64>,

    /// MILP engine
    #[arg(long)]
    pub backend: Option<MilpBackend>,

    /// Print the design as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum NetworkCommands {
    /// Ring of cities with a complete candidate graph and antipodal demands
    Ring {
        /// Number of cities
        #[arg(long, default_value_t = 6)]
        nodes: usize,

        /// Ring radius
        #[arg(long, default_value_t = 100.0)]
        radius: f64,

        /// Demand volume between antipodal cities
        #[arg(long, default_value_t = 10.0)]
        volume: f64,

        /// Spending cap on fixed plus variable cost
        #[arg(long)]
        budget: Option<f64>,

        /// Drop the per-node degree bounds
        #[arg(long)]
        no_degree_bounds: bool,

        #[command(flatten)]
        solve: SolveArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrussCommands {
    /// Ground structure on a regular grid
    Grid {
        /// Nodes along x
        #[arg(long)]
        nx: usize,

        /// Nodes along y
        #[arg(long)]
        ny: usize,

        /// Grid spacing in metres
        #[arg(long, default_value_t = 1.0)]
        spacing: f64,

        /// Fixed support node (repeatable)
        #[arg(long = "support", required = true)]
        supports: Vec<usize>,

        /// Loaded node
        #[arg(long)]
        load: usize,

        /// Horizontal load component in newtons
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        fx: f64,

        /// Vertical load component in newtons
        #[arg(long, allow_negative_numbers = true)]
        fy: f64,

        #[command(flatten)]
        solve: SolveArgs,
    },
}

//! Network design CLI commands

use anyhow::{Context, Result};
use topo_algo::network::{design_network, NetworkProblem};
use tracing::info;

use crate::commands::emit;
use topo_cli::cli::NetworkCommands;
use topo_cli::config::DesignConfig;

pub fn handle(command: &NetworkCommands) -> Result<()> {
    match command {
        NetworkCommands::Ring {
            nodes,
            radius,
            volume,
            budget,
            no_degree_bounds,
            solve,
        } => {
            let mut config = DesignConfig::load(solve.config.as_deref())?;
            config.apply_overrides(solve);
            if budget.is_some() {
                config.network.budget = *budget;
            }
            if *no_degree_bounds {
                config.network.degree_bounds = None;
            }

            let problem = NetworkProblem::ring(*nodes, *radius, *volume)
                .context("building ring instance")?
                .with_params(config.network);
            info!(
                nodes = problem.topology.num_nodes(),
                candidates = problem.topology.num_links(),
                demand = problem.total_demand(),
                "network problem built"
            );

            let design = design_network(&problem, &config.solver).context("designing network")?;
            emit(&design, || design.summary(), solve.json)
        }
    }
}

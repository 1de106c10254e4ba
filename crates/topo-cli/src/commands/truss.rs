//! Truss design CLI commands

use anyhow::{Context, Result};
use topo_algo::truss::{design_truss, TrussProblemBuilder};
use topo_core::NodeId;
use tracing::info;

use crate::commands::emit;
use topo_cli::cli::TrussCommands;
use topo_cli::config::DesignConfig;

pub fn handle(command: &TrussCommands) -> Result<()> {
    match command {
        TrussCommands::Grid {
            nx,
            ny,
            spacing,
            supports,
            load,
            fx,
            fy,
            solve,
        } => {
            let mut config = DesignConfig::load(solve.config.as_deref())?;
            config.apply_overrides(solve);

            let mut builder = TrussProblemBuilder::grid(*nx, *ny, *spacing)
                .context("building ground structure")?
                .params(config.truss);
            for support in supports {
                builder = builder.support(NodeId::new(*support));
            }
            let problem = builder.load(NodeId::new(*load), *fx, *fy).build();
            info!(
                nodes = problem.topology.num_nodes(),
                candidates = problem.topology.num_links(),
                supports = problem.supports.len(),
                "truss problem built"
            );

            let design = design_truss(&problem, &config.solver).context("designing truss")?;
            emit(&design, || design.summary(), solve.json)
        }
    }
}

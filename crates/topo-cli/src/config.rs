//! TOML parameter file.
//!
//! Every table is optional; missing keys take the library defaults. Flags on
//! the command line are applied on top by [`DesignConfig::apply_overrides`].

use crate::cli::SolveArgs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use topo_algo::{NetworkParams, SolverConfig, TrussParams};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignConfig {
    pub solver: SolverConfig,
    pub network: NetworkParams,
    pub truss: TrussParams,
}

impl DesignConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file: {}", path.display()))
    }

    pub fn apply_overrides(&mut self, args: &SolveArgs) {
        if let Some(seconds) = args.time_limit {
            self.solver.max_time_seconds = seconds;
        }
        if let Some(gap) = args.mip_gap {
            self.solver.mip_gap = gap;
        }
        if let Some(backend) = args.backend {
            self.solver.backend = backend;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = DesignConfig::load(None).unwrap();
        assert_eq!(config, DesignConfig::default());
        assert_eq!(config.solver.max_time_seconds, 60.0);
    }

    #[test]
    fn test_partial_tables_keep_defaults() {
        let file = write_config(
            r#"
            [solver]
            max_time_seconds = 5.0

            [network]
            budget = 2500.0
            unmet_demand_penalty = 100.0

            [network.degree_bounds]
            min = 1
            max = 3

            [truss]
            allowable_stress = 1.5e8
            "#,
        );
        let config = DesignConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.solver.max_time_seconds, 5.0);
        assert_eq!(config.solver.mip_gap, 1e-3);
        assert_eq!(config.network.budget, Some(2500.0));
        assert_eq!(config.network.unmet_demand_penalty, Some(100.0));
        let bounds = config.network.degree_bounds.unwrap();
        assert_eq!((bounds.min, bounds.max), (1, 3));
        assert_eq!(config.network.fallback.delivery_ratio, 0.8);
        assert_eq!(config.truss.allowable_stress, 1.5e8);
        assert_eq!(config.truss.density, 7850.0);
    }

    #[test]
    fn test_unknown_table_is_rejected() {
        let file = write_config("[routing]\nhops = 3\n");
        let err = DesignConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config file"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = write_config("[solver]\nmax_time_seconds = 5.0\nmip_gap = 0.01\n");
        let mut config = DesignConfig::load(Some(file.path())).unwrap();
        config.apply_overrides(&SolveArgs {
            time_limit: Some(1.5),
            ..Default::default()
        });
        assert_eq!(config.solver.max_time_seconds, 1.5);
        assert_eq!(config.solver.mip_gap, 0.01);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = DesignConfig::load(Some(Path::new("/nonexistent/topo.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/topo.toml"));
    }
}

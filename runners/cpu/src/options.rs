//! Command line and run-file configuration of the CPU runner.

use crate::CellKind;
use crate::error::{LaunchError, LaunchResult};
use crate::executor::ExecutionMode;
use crate::finish::Finish;
use crate::input;
use crate::launch::LaunchConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings that can come from a JSON run file, e.g.
///
/// ```json
/// { "groups": 8, "group_size": 64, "mode": "threaded", "cell": "bits", "finish": "host" }
/// ```
///
/// Missing fields take their defaults. Without `groups`, enough groups to
/// give every worker one element are launched (see [`LaunchConfig::covering`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub groups: Option<u32>,
    pub group_size: u32,
    pub mode: ExecutionMode,
    pub cell: CellKind,
    pub finish: Finish,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            groups: None,
            group_size: min_reduce::WORKGROUP_SIZE,
            mode: ExecutionMode::default(),
            cell: CellKind::default(),
            finish: Finish::default(),
        }
    }
}

impl RunConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> LaunchResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| LaunchError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn launch_for(&self, length: usize) -> LaunchConfig {
        match self.groups {
            Some(groups) => LaunchConfig::new(groups, self.group_size),
            None => LaunchConfig::covering(length, self.group_size),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(about = "Minimum of a vector of 64-bit cells via the min-reduce kernel, emulated on the CPU")]
pub struct Options {
    /// file of little-endian 64-bit cells
    #[arg(long, conflicts_with_all = ["values", "random"])]
    pub input: Option<PathBuf>,

    /// comma or whitespace separated values, floats for `--cell bits`, integers for `--cell widened`
    #[arg(long, allow_hyphen_values = true, conflicts_with = "random")]
    pub values: Option<String>,

    /// number of random cells to generate
    #[arg(long)]
    pub random: Option<usize>,

    /// seed for `--random`
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// JSON run file, overridden by the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub groups: Option<u32>,

    #[arg(long)]
    pub group_size: Option<u32>,

    #[arg(long)]
    pub mode: Option<ExecutionMode>,

    #[arg(long)]
    pub cell: Option<CellKind>,

    #[arg(long)]
    pub finish: Option<Finish>,

    /// print every group's partial minimum
    #[arg(long)]
    pub partials: bool,

    /// compare the kernel's answer with a plain parallel fold
    #[arg(long)]
    pub verify: bool,
}

impl Options {
    /// Run file (or defaults) with the command line flags applied on top.
    pub fn resolve(&self) -> LaunchResult<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("loading run configuration from {}", path.display());
                RunConfig::from_path(path)?
            }
            None => RunConfig::default(),
        };
        if let Some(groups) = self.groups {
            config.groups = Some(groups);
        }
        if let Some(group_size) = self.group_size {
            config.group_size = group_size;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(cell) = self.cell {
            config.cell = cell;
        }
        if let Some(finish) = self.finish {
            config.finish = finish;
        }
        Ok(config)
    }

    /// The input vector selected on the command line. Nothing selected means
    /// an empty vector.
    pub fn load_cells(&self, cell: CellKind) -> LaunchResult<Vec<u64>> {
        if let Some(path) = &self.input {
            input::read_cells(path)
        } else if let Some(values) = &self.values {
            input::parse_values(values, cell)
        } else if let Some(count) = self.random {
            Ok(input::random_cells(count, self.seed, cell))
        } else {
            Ok(Vec::new())
        }
    }
}

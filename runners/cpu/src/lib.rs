//! Host side of the `min-reduce` kernel.
//!
//! Emulates a compute dispatch on the CPU (work-groups, group-local scratch
//! and group barriers), checks the launch invariants the kernel leaves to
//! its caller, and finishes the reduction across groups.

use clap::ValueEnum;
use min_reduce::{CellFormat, LowBits, Widened};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod error;
pub mod executor;
pub mod finish;
pub mod input;
pub mod launch;
pub mod options;

pub use error::{LaunchError, LaunchResult};
pub use executor::{ExecutionMode, dispatch};
pub use finish::{Finish, Reduction, agrees, baseline_min, finish_on_host, reduce, reinvoke};
pub use launch::{LaunchConfig, LaunchShape, MAX_GROUP_SIZE};

/// Runtime choice between the kernel's cell formats.
#[derive(
    Debug,
    Default,
    EnumString,
    Display,
    PartialEq,
    Eq,
    Copy,
    Clone,
    ValueEnum,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Low 32 bits reinterpreted as an `f32` ([`LowBits`], `main_cs`).
    #[default]
    Bits,
    /// Unsigned integer converted to `f32` ([`Widened`], `main_cs_widened`).
    Widened,
}

impl CellKind {
    pub fn load(self, cell: u64) -> f32 {
        match self {
            CellKind::Bits => LowBits::load(cell),
            CellKind::Widened => Widened::load(cell),
        }
    }

    /// Parses one textual value into a cell: a float for `Bits`, an unsigned
    /// integer for `Widened`.
    pub fn parse_cell(self, token: &str) -> LaunchResult<u64> {
        let parse_error = || LaunchError::Parse {
            token: token.to_owned(),
            cell: self,
        };
        match self {
            CellKind::Bits => token
                .parse::<f32>()
                .map(LowBits::store)
                .map_err(|_| parse_error()),
            CellKind::Widened => token.parse::<u64>().map_err(|_| parse_error()),
        }
    }

    pub fn reduce(
        self,
        launch: &LaunchConfig,
        mode: ExecutionMode,
        finish: Finish,
        buffer: &[u64],
        mask: &[u8],
    ) -> LaunchResult<Reduction> {
        match self {
            CellKind::Bits => finish::reduce::<LowBits>(launch, mode, finish, buffer, mask),
            CellKind::Widened => finish::reduce::<Widened>(launch, mode, finish, buffer, mask),
        }
    }

    pub fn baseline_min(self, cells: &[u64]) -> f32 {
        match self {
            CellKind::Bits => finish::baseline_min::<LowBits>(cells),
            CellKind::Widened => finish::baseline_min::<Widened>(cells),
        }
    }
}

//! Turning the per-group partial minima into one value.
//!
//! The kernel stops at one cell per group. A caller either folds those cells
//! on the host or hands them back to the kernel as a fresh input vector,
//! launched as a single group so that `output[0]` is the answer.

use crate::error::LaunchResult;
use crate::executor::{ExecutionMode, dispatch};
use crate::launch::LaunchConfig;
use clap::ValueEnum;
use min_reduce::{CellFormat, min_f32};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

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
pub enum Finish {
    /// Fold the partials sequentially on the host.
    #[default]
    Host,
    /// Dispatch the kernel again over the partials with a single group.
    Reinvoke,
}

/// Result of a full reduction: the minimum plus the partial cells it came
/// from, one per group of the first dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub minimum: f32,
    pub partials: Vec<u64>,
}

pub fn finish_on_host<C: CellFormat>(partials: &[u64]) -> f32 {
    partials
        .iter()
        .fold(f32::INFINITY, |accumulator, &cell| min_f32(accumulator, C::load(cell)))
}

/// Second pass of the kernel over its own output.
pub fn reinvoke<C: CellFormat>(
    group_size: u32,
    mode: ExecutionMode,
    partials: &[u64],
) -> LaunchResult<f32> {
    let mask = vec![0u8; partials.len()];
    let mut output = [0u64; 1];
    dispatch::<C>(
        &LaunchConfig::single_group(group_size),
        mode,
        partials,
        &mask,
        partials.len(),
        &mut output,
    )?;
    Ok(C::load(output[0]))
}

/// Minimum of `cells` computed with a plain parallel fold, used to
/// cross-check the kernel.
///
/// The result goes through one `store`/`load` of `C`, as every kernel result
/// does, so an empty `Widened` input gives the same saturated value.
pub fn baseline_min<C: CellFormat>(cells: &[u64]) -> f32 {
    let minimum = cells
        .par_iter()
        .map(|&cell| C::load(cell))
        .reduce(|| f32::INFINITY, min_f32);
    C::load(C::store(minimum))
}

/// Whether a kernel minimum matches [`baseline_min`]. Two NaNs agree; inputs
/// containing NaN may still disagree, the kernel's select is order dependent
/// for NaN.
pub fn agrees(minimum: f32, baseline: f32) -> bool {
    minimum == baseline || (minimum.is_nan() && baseline.is_nan())
}

/// Dispatches the kernel over all of `buffer` and finishes the reduction.
pub fn reduce<C: CellFormat>(
    launch: &LaunchConfig,
    mode: ExecutionMode,
    finish: Finish,
    buffer: &[u64],
    mask: &[u8],
) -> LaunchResult<Reduction> {
    let shape = launch.validate(buffer.len(), mask.len(), buffer.len(), launch.groups as usize)?;
    let mut partials = vec![0u64; shape.groups as usize];
    dispatch::<C>(launch, mode, buffer, mask, buffer.len(), &mut partials)?;

    let minimum = match finish {
        Finish::Host => finish_on_host::<C>(&partials),
        Finish::Reinvoke => reinvoke::<C>(launch.group_size, mode, &partials)?,
    };
    debug!(
        "finished {} partial(s) with {finish}: {minimum}",
        partials.len()
    );
    Ok(Reduction { minimum, partials })
}

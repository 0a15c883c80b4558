//! Emulating a dispatch of the kernel on the CPU.
//!
//! Both executors run the same phase functions the SPIR-V entry points run;
//! they differ only in how they provide the group barrier.

use crate::error::LaunchResult;
use crate::launch::{LaunchConfig, LaunchShape};
use clap::ValueEnum;
use min_reduce::tree::{first_offset, fold_round, reduce_lockstep};
use min_reduce::{CellFormat, Scratch, scan};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Barrier;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use strum::{Display, EnumString};
use tracing::{debug, trace};

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
pub enum ExecutionMode {
    /// One thread per group; the end of each round stands in for the barrier.
    /// Groups run in parallel.
    #[default]
    Lockstep,
    /// One OS thread per worker, synchronised with a full-group barrier.
    /// Groups run one after another.
    Threaded,
}

/// Runs the kernel for every group of `launch` and writes one cell per group
/// into `output`.
///
/// `mask` is checked for length like the rest of the launch and otherwise not
/// looked at, the kernel never reads it.
pub fn dispatch<C: CellFormat>(
    launch: &LaunchConfig,
    mode: ExecutionMode,
    buffer: &[u64],
    mask: &[u8],
    length: usize,
    output: &mut [u64],
) -> LaunchResult<()> {
    let shape = launch.validate(buffer.len(), mask.len(), length, output.len())?;
    debug!("dispatching {} group(s) with the {mode} executor", shape.groups);

    let output = &mut output[..shape.groups as usize];
    match mode {
        ExecutionMode::Lockstep => {
            output.par_iter_mut().enumerate().for_each(|(group, cell)| {
                *cell = run_group_lockstep::<C>(&shape, group as u32, buffer);
                trace!("group {group} published {cell:#018x}");
            });
        }
        ExecutionMode::Threaded => {
            for (group, cell) in output.iter_mut().enumerate() {
                *cell = run_group_threaded::<C>(&shape, group as u32, buffer);
                trace!("group {group} published {cell:#018x}");
            }
        }
    }
    Ok(())
}

fn run_group_lockstep<C: CellFormat>(shape: &LaunchShape, group: u32, buffer: &[u64]) -> u64 {
    let mut scratch: Vec<f32> = (0..shape.group_size)
        .map(|local_index| {
            scan::grid_stride_min::<C>(
                buffer,
                shape.length,
                shape.global_index(group, local_index),
                shape.global_size,
            )
        })
        .collect();
    reduce_lockstep(scratch.as_mut_slice(), shape.group_size);
    C::store(scratch[0])
}

/// Workgroup memory shared by the threads of one group. Each worker holds its
/// own handle; the slots are `f32` bit patterns.
struct SharedScratch<'a>(&'a [AtomicU32]);

impl Scratch for SharedScratch<'_> {
    fn get(&self, index: u32) -> f32 {
        f32::from_bits(self.0[index as usize].load(Ordering::Relaxed))
    }

    fn set(&mut self, index: u32, value: f32) {
        self.0[index as usize].store(value.to_bits(), Ordering::Relaxed);
    }
}

fn run_group_threaded<C: CellFormat>(shape: &LaunchShape, group: u32, buffer: &[u64]) -> u64 {
    let group_size = shape.group_size;
    let slots: Vec<AtomicU32> = (0..group_size)
        .map(|_| AtomicU32::new(f32::INFINITY.to_bits()))
        .collect();
    // Relaxed slot accesses are ordered by `Barrier::wait`, which is the only
    // synchronisation between rounds, as on the device.
    let barrier = Barrier::new(group_size as usize);

    let published = thread::scope(|scope| {
        let workers: Vec<_> = (0..group_size)
            .map(|local_index| {
                let barrier = &barrier;
                let mut scratch = SharedScratch(&slots);
                scope.spawn(move || {
                    let accumulator = scan::grid_stride_min::<C>(
                        buffer,
                        shape.length,
                        shape.global_index(group, local_index),
                        shape.global_size,
                    );
                    scratch.set(local_index, accumulator);
                    barrier.wait();

                    let mut offset = first_offset(group_size);
                    while offset > 0 {
                        fold_round(&mut scratch, local_index, offset, group_size);
                        barrier.wait();
                        offset /= 2;
                    }

                    (local_index == 0).then(|| C::store(scratch.get(0)))
                })
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|worker| match worker.join() {
                Ok(published) => published,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<_>>()
    });

    debug_assert_eq!(published.len(), 1, "exactly worker 0 publishes");
    published[0]
}

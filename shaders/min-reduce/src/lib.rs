#![cfg_attr(target_arch = "spirv", no_std)]

//! Minimum of a vector of 64-bit cells, one partial result per work-group.
//!
//! Every invocation first folds its grid-stride share of the input into an
//! accumulator ([`scan`]), then the group folds its accumulators through
//! workgroup memory ([`tree`]) and invocation 0 writes the group minimum to
//! `output[group]`. Combining the per-group results is left to the caller,
//! which can either fold them on the host or dispatch this kernel again over
//! `output` with a single group.

use spirv_std::arch::workgroup_memory_barrier_with_group_sync;
use spirv_std::glam::UVec3;
use spirv_std::spirv;

pub mod cell;
pub mod scan;
pub mod tree;

pub use cell::{CellFormat, LowBits, Widened};
pub use tree::{Scratch, min_f32};

/// Invocations per work-group of the SPIR-V entry points. Must match the
/// `threads(..)` attributes below.
pub const WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ReduceParams {
    /// Number of leading cells of the input that take part in the reduction.
    pub length: u32,
}

#[inline]
fn group_barrier() {
    // `unsafe fn` in some `spirv-std` releases.
    #[allow(unused_unsafe)]
    unsafe {
        workgroup_memory_barrier_with_group_sync();
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn reduce_group<C: CellFormat>(
    global_index: u32,
    global_size: u32,
    local_index: u32,
    group_index: u32,
    params: &ReduceParams,
    buffer: &[u64],
    output: &mut [u64],
    scratch: &mut [f32; WORKGROUP_SIZE as usize],
) {
    let accumulator = scan::grid_stride_min::<C>(buffer, params.length, global_index, global_size);
    scratch.set(local_index, accumulator);
    group_barrier();

    let mut offset = tree::first_offset(WORKGROUP_SIZE);
    while offset > 0 {
        tree::fold_round(scratch, local_index, offset, WORKGROUP_SIZE);
        // Every invocation reaches this, including the idle ones.
        group_barrier();
        offset /= 2;
    }

    if local_index == 0 {
        output[group_index as usize] = C::store(scratch[0]);
    }
}

/// Cells are `f32` bit patterns in their low 32 bits.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(64)))]
pub fn main_cs(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(num_workgroups)] num_groups: UVec3,
    #[spirv(workgroup_id)] group_id: UVec3,
    #[spirv(local_invocation_index)] local_index: u32,
    #[spirv(push_constant)] params: &ReduceParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 0)] buffer: &[u64],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] _mask: &[u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)] output: &mut [u64],
    #[spirv(workgroup)] scratch: &mut [f32; WORKGROUP_SIZE as usize],
) {
    reduce_group::<LowBits>(
        global_id.x,
        num_groups.x * WORKGROUP_SIZE,
        local_index,
        group_id.x,
        params,
        buffer,
        output,
        scratch,
    );
}

/// Cells are unsigned integers converted to the nearest `f32`.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(64)))]
pub fn main_cs_widened(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(num_workgroups)] num_groups: UVec3,
    #[spirv(workgroup_id)] group_id: UVec3,
    #[spirv(local_invocation_index)] local_index: u32,
    #[spirv(push_constant)] params: &ReduceParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 0)] buffer: &[u64],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] _mask: &[u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)] output: &mut [u64],
    #[spirv(workgroup)] scratch: &mut [f32; WORKGROUP_SIZE as usize],
) {
    reduce_group::<Widened>(
        global_id.x,
        num_groups.x * WORKGROUP_SIZE,
        local_index,
        group_id.x,
        params,
        buffer,
        output,
        scratch,
    );
}

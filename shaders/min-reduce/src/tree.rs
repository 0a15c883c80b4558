//! Phase two: collapsing one group's accumulators into a single minimum.
//!
//! Each round halves a stride `offset`; worker `i < offset` folds slot
//! `i + offset` into slot `i`. Rounds must be separated by a group-wide
//! barrier because round `k + 1` reads slots a sibling wrote in round `k`.
//!
//! The first stride is half the next power of two above the group size and
//! every fold is bounds-checked, so groups that are not a power of two reduce
//! correctly without padding the scratch buffer with the identity.

/// Group-local storage the rounds fold in place.
pub trait Scratch {
    fn get(&self, index: u32) -> f32;
    fn set(&mut self, index: u32, value: f32);
}

impl<const N: usize> Scratch for [f32; N] {
    #[inline]
    fn get(&self, index: u32) -> f32 {
        self[index as usize]
    }

    #[inline]
    fn set(&mut self, index: u32, value: f32) {
        self[index as usize] = value;
    }
}

impl Scratch for [f32] {
    #[inline]
    fn get(&self, index: u32) -> f32 {
        self[index as usize]
    }

    #[inline]
    fn set(&mut self, index: u32, value: f32) {
        self[index as usize] = value;
    }
}

/// The kernel's minimum: `mine` if it is strictly smaller, otherwise `other`.
///
/// This is a select, not IEEE `minNum`: a NaN in `other` wins, a NaN in
/// `mine` is replaced by `other`.
#[inline]
pub fn min_f32(mine: f32, other: f32) -> f32 {
    if mine < other { mine } else { other }
}

/// Stride of the first round for a group of `group_size` workers.
pub const fn first_offset(group_size: u32) -> u32 {
    group_size.next_power_of_two() / 2
}

/// Number of barrier-separated rounds, `ceil(log2(group_size))`.
pub const fn rounds(group_size: u32) -> u32 {
    let mut rounds = 0;
    let mut offset = first_offset(group_size);
    while offset > 0 {
        rounds += 1;
        offset /= 2;
    }
    rounds
}

/// One worker's share of one round.
///
/// Workers at or above `offset` do nothing here, but the caller still has to
/// bring them to the barrier that ends the round.
#[inline]
pub fn fold_round<S: Scratch + ?Sized>(
    scratch: &mut S,
    local_index: u32,
    offset: u32,
    group_size: u32,
) {
    if local_index < offset && local_index + offset < group_size {
        let other = scratch.get(local_index + offset);
        let mine = scratch.get(local_index);
        scratch.set(local_index, min_f32(mine, other));
    }
}

/// Runs every round for a whole group on one thread.
///
/// Within a round no worker reads a slot another worker of that round
/// writes, so running the workers of a round back to back and treating the
/// end of the round as the barrier is equivalent to the parallel schedule.
pub fn reduce_lockstep<S: Scratch + ?Sized>(scratch: &mut S, group_size: u32) {
    let mut offset = first_offset(group_size);
    while offset > 0 {
        for local_index in 0..offset {
            fold_round(scratch, local_index, offset, group_size);
        }
        offset /= 2;
    }
}

//! Phase one: the grid-stride scan.
//!
//! A fixed number of workers covers an input of any length by having worker
//! `g` out of `W` visit `g, g + W, g + 2W, ...` until it runs off the end.

use crate::cell::CellFormat;
use crate::tree::min_f32;

/// Calls `visit` with every index worker `global_index` owns in `[0, length)`.
///
/// `global_size` is the total worker count of the dispatch and is never zero
/// for a worker that exists. The stepping stops before an increment could
/// wrap, so lengths close to `u32::MAX` are fine.
#[inline]
pub fn for_each_strided(
    length: u32,
    global_index: u32,
    global_size: u32,
    mut visit: impl FnMut(u32),
) {
    let mut index = global_index;
    while index < length {
        visit(index);
        if length - index <= global_size {
            break;
        }
        index += global_size;
    }
}

/// Folds every element owned by one worker into a running minimum.
///
/// Seeded with `+inf`, so a worker that owns no elements (`global_index >=
/// length`) reports the identity.
#[inline]
pub fn grid_stride_min<C: CellFormat>(
    buffer: &[u64],
    length: u32,
    global_index: u32,
    global_size: u32,
) -> f32 {
    let mut accumulator = f32::INFINITY;
    for_each_strided(length, global_index, global_size, |index| {
        accumulator = min_f32(accumulator, C::load(buffer[index as usize]));
    });
    accumulator
}

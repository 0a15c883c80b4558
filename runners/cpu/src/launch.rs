//! Launch shape and the caller-side checks the kernel depends on.

use crate::error::{LaunchError, LaunchResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the group count picked by [`LaunchConfig::covering`]. Past
/// that point the grid-stride scan does the rest.
pub const MAX_COVERING_GROUPS: u32 = 256;

/// Largest work-group accepted, the usual device limit on invocations per
/// group. The threaded executor runs one OS thread per worker.
pub const MAX_GROUP_SIZE: u32 = 1024;

/// A one-dimensional dispatch: `groups` work-groups of `group_size` workers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub groups: u32,
    pub group_size: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            groups: 1,
            group_size: min_reduce::WORKGROUP_SIZE,
        }
    }
}

/// A launch that passed [`LaunchConfig::validate`], with the values each
/// worker needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LaunchShape {
    pub groups: u32,
    pub group_size: u32,
    pub global_size: u32,
    pub length: u32,
}

impl LaunchShape {
    #[inline]
    pub fn global_index(&self, group: u32, local_index: u32) -> u32 {
        group * self.group_size + local_index
    }
}

impl LaunchConfig {
    pub fn new(groups: u32, group_size: u32) -> Self {
        Self { groups, group_size }
    }

    pub fn single_group(group_size: u32) -> Self {
        Self::new(1, group_size)
    }

    /// Enough groups for one element per worker, capped at
    /// [`MAX_COVERING_GROUPS`] and never fewer than one.
    pub fn covering(length: usize, group_size: u32) -> Self {
        let group_size = group_size.max(1);
        let groups = length
            .div_ceil(group_size as usize)
            .clamp(1, MAX_COVERING_GROUPS as usize) as u32;
        Self::new(groups, group_size)
    }

    /// Total worker count, `W` in the grid-stride scan.
    pub fn global_size(&self) -> LaunchResult<u32> {
        self.groups
            .checked_mul(self.group_size)
            .ok_or(LaunchError::WorkerCountOverflow {
                groups: self.groups,
                group_size: self.group_size,
            })
    }

    /// Checks every invariant the kernel assumes about its caller.
    ///
    /// The kernel silently produces garbage (or reads out of bounds) when
    /// these do not hold, so the host refuses to dispatch instead.
    pub fn validate(
        &self,
        buffer_len: usize,
        mask_len: usize,
        length: usize,
        output_len: usize,
    ) -> LaunchResult<LaunchShape> {
        if self.groups == 0 || self.group_size == 0 {
            return Err(LaunchError::EmptyLaunch {
                groups: self.groups,
                group_size: self.group_size,
            });
        }
        if self.group_size > MAX_GROUP_SIZE {
            return Err(LaunchError::GroupTooLarge {
                group_size: self.group_size,
                max: MAX_GROUP_SIZE,
            });
        }
        let global_size = self.global_size()?;
        let length_u32 =
            u32::try_from(length).map_err(|_| LaunchError::LengthOverflow { length })?;
        if length > buffer_len {
            return Err(LaunchError::LengthExceedsBuffer { length, buffer_len });
        }
        if mask_len < length {
            return Err(LaunchError::MaskTooShort { length, mask_len });
        }
        if output_len < self.groups as usize {
            return Err(LaunchError::OutputTooSmall {
                groups: self.groups,
                len: output_len,
            });
        }
        if !self.group_size.is_power_of_two() {
            debug!(
                "group size {} is not a power of two, the first round folds with stride {}",
                self.group_size,
                min_reduce::tree::first_offset(self.group_size)
            );
        }
        debug!(
            "launch validated: {} group(s) x {} worker(s), {} cell(s)",
            self.groups, self.group_size, length
        );
        Ok(LaunchShape {
            groups: self.groups,
            group_size: self.group_size,
            global_size,
            length: length_u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_launch() {
        let shape = LaunchConfig::new(4, 64)
            .validate(1000, 1000, 1000, 4)
            .expect("valid launch");
        assert_eq!(
            shape,
            LaunchShape {
                groups: 4,
                group_size: 64,
                global_size: 256,
                length: 1000,
            }
        );
        assert_eq!(shape.global_index(3, 5), 197);
    }

    #[test]
    fn length_may_be_shorter_than_the_buffer() {
        let shape = LaunchConfig::new(1, 4)
            .validate(10, 3, 3, 1)
            .expect("valid launch");
        assert_eq!(shape.length, 3);
    }

    #[test]
    fn rejects_empty_launches() {
        for (groups, group_size) in [(0, 64), (4, 0), (0, 0)] {
            match LaunchConfig::new(groups, group_size).validate(1, 1, 1, 4) {
                Err(LaunchError::EmptyLaunch { .. }) => {}
                other => panic!("expected EmptyLaunch, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_groups_past_the_device_limit() {
        LaunchConfig::single_group(MAX_GROUP_SIZE)
            .validate(1, 1, 1, 1)
            .expect("largest group");
        for group_size in [MAX_GROUP_SIZE + 1, 200_000, u32::MAX] {
            match LaunchConfig::single_group(group_size).validate(4, 4, 4, 1) {
                Err(LaunchError::GroupTooLarge { group_size: g, max }) => {
                    assert_eq!((g, max), (group_size, MAX_GROUP_SIZE));
                }
                other => panic!("expected GroupTooLarge, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_worker_count_overflow() {
        match LaunchConfig::new(u32::MAX, 2).validate(1, 1, 1, 1) {
            Err(LaunchError::WorkerCountOverflow { groups, group_size }) => {
                assert_eq!((groups, group_size), (u32::MAX, 2));
            }
            other => panic!("expected WorkerCountOverflow, got {other:?}"),
        }
    }

    #[test]
    fn rejects_length_past_the_buffer() {
        match LaunchConfig::new(1, 4).validate(5, 6, 6, 1) {
            Err(LaunchError::LengthExceedsBuffer { length, buffer_len }) => {
                assert_eq!((length, buffer_len), (6, 5));
            }
            other => panic!("expected LengthExceedsBuffer, got {other:?}"),
        }
    }

    #[test]
    fn rejects_a_short_mask() {
        match LaunchConfig::new(1, 4).validate(6, 2, 6, 1) {
            Err(LaunchError::MaskTooShort { length, mask_len }) => {
                assert_eq!((length, mask_len), (6, 2));
            }
            other => panic!("expected MaskTooShort, got {other:?}"),
        }
    }

    #[test]
    fn rejects_undersized_output() {
        match LaunchConfig::new(3, 4).validate(6, 6, 6, 2) {
            Err(LaunchError::OutputTooSmall { groups, len }) => assert_eq!((groups, len), (3, 2)),
            other => panic!("expected OutputTooSmall, got {other:?}"),
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn rejects_lengths_past_u32() {
        let length = u32::MAX as usize + 1;
        match LaunchConfig::new(1, 4).validate(length, length, length, 1) {
            Err(LaunchError::LengthOverflow { length: l }) => assert_eq!(l, length),
            other => panic!("expected LengthOverflow, got {other:?}"),
        }
    }

    #[test]
    fn covering_launches() {
        assert_eq!(LaunchConfig::covering(0, 64), LaunchConfig::new(1, 64));
        assert_eq!(LaunchConfig::covering(64, 64), LaunchConfig::new(1, 64));
        assert_eq!(LaunchConfig::covering(65, 64), LaunchConfig::new(2, 64));
        assert_eq!(
            LaunchConfig::covering(1 << 30, 64),
            LaunchConfig::new(MAX_COVERING_GROUPS, 64)
        );
        assert_eq!(LaunchConfig::covering(3, 0), LaunchConfig::new(3, 1));
    }
}

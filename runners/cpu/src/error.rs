use crate::CellKind;
use std::path::PathBuf;
use thiserror::Error;

/// Everything the host side can reject before or while emulating a dispatch.
///
/// The kernel itself has no error path; these are the caller-side invariants
/// it relies on, checked up front.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("launch has no workers: {groups} group(s) of {group_size}")]
    EmptyLaunch { groups: u32, group_size: u32 },
    #[error("group size {group_size} exceeds the limit of {max} workers per group")]
    GroupTooLarge { group_size: u32, max: u32 },
    #[error("{groups} group(s) of {group_size} workers overflow the 32-bit invocation index")]
    WorkerCountOverflow { groups: u32, group_size: u32 },
    #[error("length {length} does not fit the kernel's 32-bit length parameter")]
    LengthOverflow { length: usize },
    #[error("length {length} exceeds the input buffer of {buffer_len} cell(s)")]
    LengthExceedsBuffer { length: usize, buffer_len: usize },
    #[error("mask of {mask_len} byte(s) does not cover the {length} reduced cell(s)")]
    MaskTooShort { length: usize, mask_len: usize },
    #[error("output has {len} cell(s) but the launch has {groups} group(s)")]
    OutputTooSmall { groups: u32, len: usize },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("invalid run configuration in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("input file {path:?} is {len} bytes, not a whole number of 8-byte cells")]
    PartialCell { path: PathBuf, len: usize },
    #[error("cannot parse {token:?} as a `{cell}` cell")]
    Parse { token: String, cell: CellKind },
}

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

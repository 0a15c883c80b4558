//! Where input vectors come from: raw cell files, textual value lists and
//! seeded random data.

use crate::CellKind;
use crate::error::{LaunchError, LaunchResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads a file of little-endian 64-bit cells.
pub fn read_cells(path: &Path) -> LaunchResult<Vec<u64>> {
    let bytes = fs::read(path)?;
    if bytes.len() % size_of::<u64>() != 0 {
        return Err(LaunchError::PartialCell {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }
    let cells: Vec<u64> = bytes
        .chunks_exact(size_of::<u64>())
        .map(|chunk| {
            let mut cell = [0u8; size_of::<u64>()];
            cell.copy_from_slice(chunk);
            u64::from_le_bytes(cell)
        })
        .collect();
    debug!("read {} cell(s) from {}", cells.len(), path.display());
    Ok(cells)
}

pub fn write_cells(path: &Path, cells: &[u64]) -> LaunchResult<()> {
    let little_endian: Vec<u64> = cells.iter().map(|cell| cell.to_le()).collect();
    fs::write(path, bytemuck::cast_slice::<u64, u8>(&little_endian))?;
    Ok(())
}

/// Splits `text` on commas and whitespace and parses every token as a cell.
pub fn parse_values(text: &str, cell: CellKind) -> LaunchResult<Vec<u64>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| cell.parse_cell(token))
        .collect()
}

/// `count` reproducible cells. `Bits` cells hold floats in `[-1e6, 1e6)`,
/// `Widened` cells hold integers below `2^32`.
pub fn random_cells(count: usize, seed: u64, cell: CellKind) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| match cell {
            CellKind::Bits => u64::from(rng.gen_range(-1.0e6f32..1.0e6).to_bits()),
            CellKind::Widened => rng.gen_range(0..1u64 << 32),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn cell_files_round_trip() {
        let tmp = NamedTempFile::new().expect("temp file");
        let cells = [0u64, 1, u64::MAX, 0x0123_4567_89ab_cdef];
        write_cells(tmp.path(), &cells).expect("write");
        assert_eq!(fs::read(tmp.path()).expect("read").len(), 32);
        assert_eq!(read_cells(tmp.path()).expect("read cells"), cells);
    }

    #[test]
    fn cell_files_are_little_endian() {
        let tmp = NamedTempFile::new().expect("temp file");
        fs::write(tmp.path(), [1u8, 0, 0, 0, 0, 0, 0, 2]).expect("write");
        assert_eq!(
            read_cells(tmp.path()).expect("read cells"),
            [0x0200_0000_0000_0001]
        );
    }

    #[test]
    fn partial_cells_are_rejected() {
        let tmp = NamedTempFile::new().expect("temp file");
        fs::write(tmp.path(), [0u8; 12]).expect("write");
        match read_cells(tmp.path()) {
            Err(LaunchError::PartialCell { len, .. }) => assert_eq!(len, 12),
            other => panic!("expected PartialCell, got {other:?}"),
        }
    }

    #[test]
    fn value_lists() {
        let cells = parse_values("5, 3,8\n1 9,,2", CellKind::Widened).expect("parse");
        assert_eq!(cells, [5, 3, 8, 1, 9, 2]);

        let cells = parse_values("-0.5,2e3", CellKind::Bits).expect("parse");
        assert_eq!(
            cells,
            [
                u64::from((-0.5f32).to_bits()),
                u64::from(2000.0f32.to_bits())
            ]
        );

        assert!(parse_values("1,x", CellKind::Bits).is_err());
        assert!(parse_values("", CellKind::Bits).expect("empty").is_empty());
    }

    #[test]
    fn random_cells_are_seeded() {
        let a = random_cells(100, 7, CellKind::Bits);
        assert_eq!(a, random_cells(100, 7, CellKind::Bits));
        assert_ne!(a, random_cells(100, 8, CellKind::Bits));
        assert!(a.iter().all(|&cell| {
            let value = CellKind::Bits.load(cell);
            (-1.0e6..1.0e6).contains(&value)
        }));
        assert!(
            random_cells(100, 7, CellKind::Widened)
                .iter()
                .all(|&cell| cell < 1 << 32)
        );
    }
}

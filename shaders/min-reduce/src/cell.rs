//! How a 64-bit input cell becomes the `f32` the kernel reduces over.
//!
//! The input vector is made of 64-bit cells while the kernel reduces 32-bit
//! floats. Two readings of that mismatch exist and both are kept, so that
//! neither is silently substituted for the other:
//!
//! * [`LowBits`] treats the low 32 bits of a cell as an `f32` bit pattern.
//!   No numeric conversion happens, the upper 32 bits are ignored.
//! * [`Widened`] converts the cell's unsigned integer value to the nearest
//!   `f32`, the way a C-style implicit `ulong -> float` conversion does.
//!
//! Each format also knows how to write a group result back into a cell, so
//! that an `output` sequence can be handed to the kernel again as input.

/// Encoding between 64-bit storage cells and the reduced `f32` values.
pub trait CellFormat {
    fn load(cell: u64) -> f32;
    fn store(value: f32) -> u64;
}

/// Bit reinterpretation of the low half of the cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LowBits;

impl CellFormat for LowBits {
    #[inline]
    fn load(cell: u64) -> f32 {
        f32::from_bits(cell as u32)
    }

    #[inline]
    fn store(value: f32) -> u64 {
        value.to_bits() as u64
    }
}

/// Numeric `u64 -> f32` conversion.
///
/// Stores saturate: negative values and NaN become `0`, `+inf` becomes
/// `u64::MAX`. An integer cell has no infinity, so a group that saw no
/// elements does not round-trip through this format as `+inf`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Widened;

impl CellFormat for Widened {
    #[inline]
    fn load(cell: u64) -> f32 {
        cell as f32
    }

    #[inline]
    fn store(value: f32) -> u64 {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_bits_ignores_the_upper_half() {
        let cell = 0xdead_beef_0000_0000 | u64::from(1.5f32.to_bits());
        assert_eq!(LowBits::load(cell), 1.5);
    }

    #[test]
    fn low_bits_keeps_infinity() {
        let cell = LowBits::store(f32::INFINITY);
        assert_eq!(cell, u64::from(f32::INFINITY.to_bits()));
        assert_eq!(LowBits::load(cell), f32::INFINITY);
    }

    #[test]
    fn low_bits_does_not_convert_numerically() {
        // The integer 1 is the smallest positive subnormal, not 1.0.
        assert_eq!(LowBits::load(1), f32::from_bits(1));
        assert_ne!(LowBits::load(1), 1.0);
    }

    #[test]
    fn widened_converts_integers() {
        assert_eq!(Widened::load(5), 5.0);
        assert_eq!(Widened::load(0), 0.0);
        assert_eq!(Widened::load(u64::MAX), 18_446_744_073_709_551_616.0);
    }

    #[test]
    fn widened_store_saturates() {
        assert_eq!(Widened::store(3.75), 3);
        assert_eq!(Widened::store(-2.0), 0);
        assert_eq!(Widened::store(f32::NAN), 0);
        assert_eq!(Widened::store(f32::INFINITY), u64::MAX);
    }
}

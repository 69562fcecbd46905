use std::ops::RangeInclusive;

/// Helpers to read and write single bits and bit fields.
/// Bit indices go from lsb to msb (right to left).
pub trait Bits: Copy + Into<u32> + TryFrom<u32> {
    /// Number of bits in the type.
    const WIDTH: u8;

    fn get_bit(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < Self::WIDTH);
        (self.into() >> bit_idx) & 1 == 1
    }

    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let length = u32::from(*bits_range.end() - start + 1);
        debug_assert!(*bits_range.end() < Self::WIDTH);

        // `length` ones moved back to bit 0 once the field is shifted down.
        let mask = (1_u32 << length) - 1;
        let value = (self.into() >> start) & mask;

        // The field is never wider than `Self`, so the conversion can't fail.
        Self::try_from(value).unwrap_or_else(|_| unreachable!())
    }

    #[must_use]
    fn with_bit(self, bit_idx: u8, value: bool) -> Self {
        debug_assert!(bit_idx < Self::WIDTH);
        let mask = 1_u32 << bit_idx;
        let bits = if value {
            self.into() | mask
        } else {
            self.into() & !mask
        };

        Self::try_from(bits).unwrap_or_else(|_| unreachable!())
    }
}

impl Bits for u8 {
    const WIDTH: u8 = 8;
}

impl Bits for u16 {
    const WIDTH: u8 = 16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn get_bit() {
        let b = 0b1011_0011_1000_1110_u16;
        assert!(b.get_bit(1));
        assert!(!b.get_bit(0));
        assert!(b.get_bit(2));
        assert!(b.get_bit(15));
        assert!(!b.get_bit(14));
    }

    #[test]
    fn get_bits() {
        let word = 0b1110_1100_0000_0101_u16;
        assert_eq!(word.get_bits(0..=9), 0b00_0000_0101);
        assert_eq!(word.get_bits(10..=12), 0b011);
        assert_eq!(word.get_bits(13..=13), 1);
        assert_eq!(word.get_bits(14..=15), 0b11);
        assert_eq!(0xAB_u8.get_bits(4..=7), 0xA);
        assert_eq!(0xAB_u8.get_bits(0..=7), 0xAB);
    }

    #[test]
    fn with_bit() {
        let b = 0b0110_0110_u8;
        assert_eq!(b.with_bit(0, true), 0b0110_0111);
        assert_eq!(b.with_bit(1, false), 0b0110_0100);
        assert_eq!(b.with_bit(7, true), 0b1110_0110);
    }

    #[test]
    fn with_bit_then_get_bit() {
        let value = rand::thread_rng().gen_range(0..=u16::MAX);
        for i in 0..16 {
            assert!(value.with_bit(i, true).get_bit(i));
            assert!(!value.with_bit(i, false).get_bit(i));
        }
    }
}
